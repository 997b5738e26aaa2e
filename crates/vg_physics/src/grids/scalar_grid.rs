// crates/vg_physics/src/grids/scalar_grid.rs

//! 标量网格
//!
//! 数据布局（单元中心 / 顶点）以标签枚举表达，数组尺寸与数据
//! 原点由布局规则派生，始终与网格几何一致。采样器按需从借用
//! 构造，几何或数据一旦变化旧采样器随借用失效。

use glam::DVec3;

use super::geometry::{BoundingBox3, GridGeometry};
use crate::geometry::field::ScalarField3;
use crate::numerics::array3::Array3;
use crate::numerics::samplers::LinearArraySampler3;
use crate::numerics::size3::Size3;

/// 标量数据布局
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarLayout {
    /// 数据位于单元中心（数据尺寸 = 分辨率）
    CellCentered,
    /// 数据位于单元顶点（数据尺寸 = 分辨率 + 1）
    VertexCentered,
}

impl ScalarLayout {
    /// 布局对应的数据数组尺寸
    #[inline]
    pub fn data_size(&self, resolution: Size3) -> Size3 {
        match self {
            Self::CellCentered => resolution,
            Self::VertexCentered => {
                if resolution.is_empty() {
                    Size3::ZERO
                } else {
                    Size3::new(resolution.x + 1, resolution.y + 1, resolution.z + 1)
                }
            }
        }
    }

    /// 布局对应的数据原点偏移（以间距为单位的半格偏移）
    #[inline]
    pub fn data_offset(&self, grid_spacing: DVec3) -> DVec3 {
        match self {
            Self::CellCentered => 0.5 * grid_spacing,
            Self::VertexCentered => DVec3::ZERO,
        }
    }
}

/// 标量网格
#[derive(Clone, Debug)]
pub struct ScalarGrid3 {
    geometry: GridGeometry,
    layout: ScalarLayout,
    data: Array3<f64>,
}

impl ScalarGrid3 {
    /// 创建标量网格
    pub fn new(
        resolution: Size3,
        grid_spacing: DVec3,
        origin: DVec3,
        layout: ScalarLayout,
        initial_value: f64,
    ) -> Self {
        let geometry = GridGeometry::new(resolution, grid_spacing, origin);
        Self {
            geometry,
            layout,
            data: Array3::new(layout.data_size(resolution), initial_value),
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

    /// 数据布局
    #[inline]
    pub fn layout(&self) -> ScalarLayout {
        self.layout
    }

    /// 数据数组尺寸
    #[inline]
    pub fn data_size(&self) -> Size3 {
        self.data.size()
    }

    /// 数据原点（数据点 (0,0,0) 的世界坐标）
    #[inline]
    pub fn data_origin(&self) -> DVec3 {
        self.geometry.origin() + self.layout.data_offset(self.geometry.grid_spacing())
    }

    /// 数据点世界位置
    #[inline]
    pub fn data_position(&self, i: usize, j: usize, k: usize) -> DVec3 {
        let h = self.geometry.grid_spacing();
        self.data_origin() + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z)
    }

    /// 数据数组
    #[inline]
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    /// 数据数组（可变）
    #[inline]
    pub fn data_mut(&mut self) -> &mut Array3<f64> {
        &mut self.data
    }

    /// 填充为同一值
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// 按位置函数并行填充
    pub fn fill_with<F>(&mut self, f: F)
    where
        F: Fn(DVec3) -> f64 + Sync + Send,
    {
        let origin = self.data_origin();
        let h = self.geometry.grid_spacing();
        self.data.par_for_each_mut(|(i, j, k), v| {
            let pt = origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z);
            *v = f(pt);
        });
    }

    /// 调整尺寸（重叠区域保留，新增区域以 initial_value 填充）
    pub fn resize(
        &mut self,
        resolution: Size3,
        grid_spacing: DVec3,
        origin: DVec3,
        initial_value: f64,
    ) {
        self.geometry = GridGeometry::new(resolution, grid_spacing, origin);
        self.data
            .resize(self.layout.data_size(resolution), initial_value);
    }

    /// 线性采样器
    #[inline]
    pub fn sampler(&self) -> LinearArraySampler3<'_, f64> {
        LinearArraySampler3::new(&self.data, self.geometry.grid_spacing(), self.data_origin())
    }

    /// 数据点处的梯度（中心差分，边界单侧钳制）
    pub fn gradient_at_data_point(&self, i: usize, j: usize, k: usize) -> DVec3 {
        let size = self.data.size();
        let h = self.geometry.grid_spacing();
        let d = &self.data;

        let ip = (i + 1).min(size.x - 1);
        let im = i.saturating_sub(1);
        let jp = (j + 1).min(size.y - 1);
        let jm = j.saturating_sub(1);
        let kp = (k + 1).min(size.z - 1);
        let km = k.saturating_sub(1);

        DVec3::new(
            (d[(ip, j, k)] - d[(im, j, k)]) / ((ip - im).max(1) as f64 * h.x),
            (d[(i, jp, k)] - d[(i, jm, k)]) / ((jp - jm).max(1) as f64 * h.y),
            (d[(i, j, kp)] - d[(i, j, km)]) / ((kp - km).max(1) as f64 * h.z),
        )
    }

    /// 数据点处的拉普拉斯（7 点模板，边界零梯度钳制）
    pub fn laplacian_at_data_point(&self, i: usize, j: usize, k: usize) -> f64 {
        let size = self.data.size();
        let h = self.geometry.grid_spacing();
        let d = &self.data;
        let center = d[(i, j, k)];

        let mut sum = 0.0;
        if i > 0 {
            sum += (d[(i - 1, j, k)] - center) / (h.x * h.x);
        }
        if i + 1 < size.x {
            sum += (d[(i + 1, j, k)] - center) / (h.x * h.x);
        }
        if j > 0 {
            sum += (d[(i, j - 1, k)] - center) / (h.y * h.y);
        }
        if j + 1 < size.y {
            sum += (d[(i, j + 1, k)] - center) / (h.y * h.y);
        }
        if k > 0 {
            sum += (d[(i, j, k - 1)] - center) / (h.z * h.z);
        }
        if k + 1 < size.z {
            sum += (d[(i, j, k + 1)] - center) / (h.z * h.z);
        }
        sum
    }

    /// 任意点处的梯度（8 角点三线性混合）
    pub fn gradient(&self, point: DVec3) -> DVec3 {
        let sampler = self.sampler();
        let (indices, weights) = sampler.coordinates_and_weights(point);
        let mut result = DVec3::ZERO;
        for (&(i, j, k), &w) in indices.iter().zip(weights.iter()) {
            result += w * self.gradient_at_data_point(i, j, k);
        }
        result
    }
}

impl ScalarField3 for ScalarGrid3 {
    fn sample(&self, point: DVec3) -> f64 {
        self.sampler().sample(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_data_size() {
        let res = Size3::new(4, 5, 6);
        assert_eq!(ScalarLayout::CellCentered.data_size(res), res);
        assert_eq!(
            ScalarLayout::VertexCentered.data_size(res),
            Size3::new(5, 6, 7)
        );
    }

    #[test]
    fn test_cell_centered_data_position() {
        let grid = ScalarGrid3::new(
            Size3::new(4, 4, 4),
            DVec3::splat(1.0),
            DVec3::ZERO,
            ScalarLayout::CellCentered,
            0.0,
        );
        assert_eq!(grid.data_position(0, 0, 0), DVec3::splat(0.5));
    }

    #[test]
    fn test_vertex_centered_data_position() {
        let grid = ScalarGrid3::new(
            Size3::new(4, 4, 4),
            DVec3::splat(1.0),
            DVec3::ZERO,
            ScalarLayout::VertexCentered,
            0.0,
        );
        assert_eq!(grid.data_position(0, 0, 0), DVec3::ZERO);
        assert_eq!(grid.data_size(), Size3::new(5, 5, 5));
    }

    #[test]
    fn test_sample_exact_at_data_points() {
        // 线性采样在数据点位置上精确等于格点值
        let mut grid = ScalarGrid3::new(
            Size3::new(3, 3, 3),
            DVec3::new(0.5, 1.0, 2.0),
            DVec3::new(-1.0, 2.0, 0.0),
            ScalarLayout::CellCentered,
            0.0,
        );
        grid.data_mut()
            .par_for_each_mut(|(i, j, k), v| *v = (i + 3 * j + 9 * k) as f64);

        for k in 0..3 {
            for j in 0..3 {
                for i in 0..3 {
                    let pt = grid.data_position(i, j, k);
                    assert_eq!(grid.sample(pt), *grid.data().at(i, j, k));
                }
            }
        }
    }

    #[test]
    fn test_fill_with_position_function() {
        let mut grid = ScalarGrid3::new(
            Size3::new(4, 4, 4),
            DVec3::ONE,
            DVec3::ZERO,
            ScalarLayout::CellCentered,
            0.0,
        );
        grid.fill_with(|p| p.y);
        assert_eq!(*grid.data().at(0, 0, 0), 0.5);
        assert_eq!(*grid.data().at(0, 3, 0), 3.5);
    }

    #[test]
    fn test_gradient_of_linear_field() {
        let mut grid = ScalarGrid3::new(
            Size3::new(6, 6, 6),
            DVec3::splat(0.5),
            DVec3::ZERO,
            ScalarLayout::CellCentered,
            0.0,
        );
        grid.fill_with(|p| 2.0 * p.x - 3.0 * p.y + p.z);

        let g = grid.gradient_at_data_point(2, 2, 2);
        assert!((g - DVec3::new(2.0, -3.0, 1.0)).length() < 1e-12);

        // 任意点梯度同样线性
        let g = grid.gradient(DVec3::new(1.2, 1.7, 0.9));
        assert!((g - DVec3::new(2.0, -3.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn test_laplacian_of_quadratic_field() {
        let mut grid = ScalarGrid3::new(
            Size3::new(8, 8, 8),
            DVec3::splat(0.25),
            DVec3::ZERO,
            ScalarLayout::CellCentered,
            0.0,
        );
        grid.fill_with(|p| p.x * p.x);

        // ∇²(x²) = 2，内部点精确
        let lap = grid.laplacian_at_data_point(4, 4, 4);
        assert!((lap - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_resize_preserves_and_rebuilds_geometry() {
        let mut grid = ScalarGrid3::new(
            Size3::new(4, 4, 4),
            DVec3::ONE,
            DVec3::ZERO,
            ScalarLayout::CellCentered,
            1.0,
        );
        grid.resize(Size3::new(6, 6, 6), DVec3::splat(0.5), DVec3::ONE, -2.0);

        assert_eq!(grid.resolution(), Size3::new(6, 6, 6));
        assert_eq!(grid.grid_spacing(), DVec3::splat(0.5));
        // 旧区域保留，新区域为填充值
        assert_eq!(*grid.data().at(0, 0, 0), 1.0);
        assert_eq!(*grid.data().at(5, 5, 5), -2.0);
        // 包围盒随几何重建
        assert_eq!(grid.bounding_box().upper, DVec3::new(4.0, 4.0, 4.0));
    }
}
