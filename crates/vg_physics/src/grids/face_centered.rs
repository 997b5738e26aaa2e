// crates/vg_physics/src/grids/face_centered.rs

//! 面心（MAC / 交错）向量网格
//!
//! 每个速度分量存放在对应单元面的中心：u 沿自身轴多一层采样
//! （尺寸 (nx+1, ny, nz)），在其余轴上偏移半格；v、w 对称。
//! 这种交错布局让压力投影能在不产生棋盘伪模式的情况下强制
//! 无散度流场——偏移约定是数值正确性的一部分，不是风格选择。

use glam::DVec3;

use super::geometry::{BoundingBox3, GridGeometry};
use crate::geometry::field::VectorField3;
use crate::numerics::array3::Array3;
use crate::numerics::samplers::LinearArraySampler3;
use crate::numerics::size3::Size3;

/// 面心向量网格
#[derive(Clone, Debug)]
pub struct FaceCenteredGrid3 {
    geometry: GridGeometry,
    u: Array3<f64>,
    v: Array3<f64>,
    w: Array3<f64>,
}

impl FaceCenteredGrid3 {
    /// u 分量数组尺寸：(nx+1, ny, nz)
    #[inline]
    pub fn u_size(resolution: Size3) -> Size3 {
        if resolution.is_empty() {
            Size3::ZERO
        } else {
            Size3::new(resolution.x + 1, resolution.y, resolution.z)
        }
    }

    /// v 分量数组尺寸：(nx, ny+1, nz)
    #[inline]
    pub fn v_size(resolution: Size3) -> Size3 {
        if resolution.is_empty() {
            Size3::ZERO
        } else {
            Size3::new(resolution.x, resolution.y + 1, resolution.z)
        }
    }

    /// w 分量数组尺寸：(nx, ny, nz+1)
    #[inline]
    pub fn w_size(resolution: Size3) -> Size3 {
        if resolution.is_empty() {
            Size3::ZERO
        } else {
            Size3::new(resolution.x, resolution.y, resolution.z + 1)
        }
    }

    /// 创建面心网格
    pub fn new(
        resolution: Size3,
        grid_spacing: DVec3,
        origin: DVec3,
        initial_value: DVec3,
    ) -> Self {
        let geometry = GridGeometry::new(resolution, grid_spacing, origin);
        Self {
            geometry,
            u: Array3::new(Self::u_size(resolution), initial_value.x),
            v: Array3::new(Self::v_size(resolution), initial_value.y),
            w: Array3::new(Self::w_size(resolution), initial_value.z),
        }
    }

    /// 分辨率
    #[inline]
    pub fn resolution(&self) -> Size3 {
        self.geometry.resolution()
    }

    /// 网格间距
    #[inline]
    pub fn grid_spacing(&self) -> DVec3 {
        self.geometry.grid_spacing()
    }

    /// 原点
    #[inline]
    pub fn origin(&self) -> DVec3 {
        self.geometry.origin()
    }

    /// 包围盒
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox3 {
        self.geometry.bounding_box()
    }

    /// 单元中心位置
    #[inline]
    pub fn cell_center_position(&self, i: usize, j: usize, k: usize) -> DVec3 {
        self.geometry.cell_center_position(i, j, k)
    }

    /// u 数据原点（自身轴无偏移，其余轴半格偏移）
    #[inline]
    pub fn u_origin(&self) -> DVec3 {
        let h = self.geometry.grid_spacing();
        self.geometry.origin() + DVec3::new(0.0, 0.5 * h.y, 0.5 * h.z)
    }

    /// v 数据原点
    #[inline]
    pub fn v_origin(&self) -> DVec3 {
        let h = self.geometry.grid_spacing();
        self.geometry.origin() + DVec3::new(0.5 * h.x, 0.0, 0.5 * h.z)
    }

    /// w 数据原点
    #[inline]
    pub fn w_origin(&self) -> DVec3 {
        let h = self.geometry.grid_spacing();
        self.geometry.origin() + DVec3::new(0.5 * h.x, 0.5 * h.y, 0.0)
    }

    /// u 面世界位置
    #[inline]
    pub fn u_position(&self, i: usize, j: usize, k: usize) -> DVec3 {
        let h = self.geometry.grid_spacing();
        self.u_origin() + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z)
    }

    /// v 面世界位置
    #[inline]
    pub fn v_position(&self, i: usize, j: usize, k: usize) -> DVec3 {
        let h = self.geometry.grid_spacing();
        self.v_origin() + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z)
    }

    /// w 面世界位置
    #[inline]
    pub fn w_position(&self, i: usize, j: usize, k: usize) -> DVec3 {
        let h = self.geometry.grid_spacing();
        self.w_origin() + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z)
    }

    /// u 分量数组
    #[inline]
    pub fn u(&self) -> &Array3<f64> {
        &self.u
    }

    /// u 分量数组（可变）
    #[inline]
    pub fn u_mut(&mut self) -> &mut Array3<f64> {
        &mut self.u
    }

    /// v 分量数组
    #[inline]
    pub fn v(&self) -> &Array3<f64> {
        &self.v
    }

    /// v 分量数组（可变）
    #[inline]
    pub fn v_mut(&mut self) -> &mut Array3<f64> {
        &mut self.v
    }

    /// w 分量数组
    #[inline]
    pub fn w(&self) -> &Array3<f64> {
        &self.w
    }

    /// w 分量数组（可变）
    #[inline]
    pub fn w_mut(&mut self) -> &mut Array3<f64> {
        &mut self.w
    }

    /// 三个分量数组的可变引用（分量间独立写入）
    #[inline]
    pub fn uvw_mut(&mut self) -> (&mut Array3<f64>, &mut Array3<f64>, &mut Array3<f64>) {
        (&mut self.u, &mut self.v, &mut self.w)
    }

    /// 填充为同一向量
    pub fn fill(&mut self, value: DVec3) {
        self.u.fill(value.x);
        self.v.fill(value.y);
        self.w.fill(value.z);
    }

    /// 按位置函数并行填充（每个面取该处向量的对应分量）
    pub fn fill_with<F>(&mut self, f: F)
    where
        F: Fn(DVec3) -> DVec3 + Sync + Send,
    {
        let u_origin = self.u_origin();
        let v_origin = self.v_origin();
        let w_origin = self.w_origin();
        let h = self.geometry.grid_spacing();
        let at = |origin: DVec3, i: usize, j: usize, k: usize| {
            origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z)
        };

        self.u
            .par_for_each_mut(|(i, j, k), val| *val = f(at(u_origin, i, j, k)).x);
        self.v
            .par_for_each_mut(|(i, j, k), val| *val = f(at(v_origin, i, j, k)).y);
        self.w
            .par_for_each_mut(|(i, j, k), val| *val = f(at(w_origin, i, j, k)).z);
    }

    /// 调整尺寸（重叠区域保留）
    pub fn resize(
        &mut self,
        resolution: Size3,
        grid_spacing: DVec3,
        origin: DVec3,
        initial_value: DVec3,
    ) {
        self.geometry = GridGeometry::new(resolution, grid_spacing, origin);
        self.u.resize(Self::u_size(resolution), initial_value.x);
        self.v.resize(Self::v_size(resolution), initial_value.y);
        self.w.resize(Self::w_size(resolution), initial_value.z);
    }

    /// 单元中心处的向量值（相邻面平均）
    #[inline]
    pub fn value_at_cell_center(&self, i: usize, j: usize, k: usize) -> DVec3 {
        DVec3::new(
            0.5 * (self.u[(i, j, k)] + self.u[(i + 1, j, k)]),
            0.5 * (self.v[(i, j, k)] + self.v[(i, j + 1, k)]),
            0.5 * (self.w[(i, j, k)] + self.w[(i, j, k + 1)]),
        )
    }

    /// 单元中心处的散度
    #[inline]
    pub fn divergence_at_cell_center(&self, i: usize, j: usize, k: usize) -> f64 {
        let h = self.geometry.grid_spacing();
        (self.u[(i + 1, j, k)] - self.u[(i, j, k)]) / h.x
            + (self.v[(i, j + 1, k)] - self.v[(i, j, k)]) / h.y
            + (self.w[(i, j, k + 1)] - self.w[(i, j, k)]) / h.z
    }

    /// u 分量线性采样器
    #[inline]
    pub fn u_sampler(&self) -> LinearArraySampler3<'_, f64> {
        LinearArraySampler3::new(&self.u, self.geometry.grid_spacing(), self.u_origin())
    }

    /// v 分量线性采样器
    #[inline]
    pub fn v_sampler(&self) -> LinearArraySampler3<'_, f64> {
        LinearArraySampler3::new(&self.v, self.geometry.grid_spacing(), self.v_origin())
    }

    /// w 分量线性采样器
    #[inline]
    pub fn w_sampler(&self) -> LinearArraySampler3<'_, f64> {
        LinearArraySampler3::new(&self.w, self.geometry.grid_spacing(), self.w_origin())
    }
}

impl VectorField3 for FaceCenteredGrid3 {
    fn sample(&self, point: DVec3) -> DVec3 {
        DVec3::new(
            self.u_sampler().sample(point),
            self.v_sampler().sample(point),
            self.w_sampler().sample(point),
        )
    }
}
