// crates/vg_physics/src/grids/collocated.rs

//! 同位向量网格
//!
//! 三个分量存放在同一数据点上（单元中心或顶点），
//! 与 [`crate::grids::FaceCenteredGrid3`] 的交错布局相对。

use glam::DVec3;

use super::geometry::{BoundingBox3, GridGeometry};
use super::scalar_grid::ScalarLayout;
use crate::geometry::field::VectorField3;
use crate::numerics::array3::Array3;
use crate::numerics::samplers::LinearArraySampler3;
use crate::numerics::size3::Size3;

/// 同位向量网格
#[derive(Clone, Debug)]
pub struct CollocatedVectorGrid3 {
    geometry: GridGeometry,
    layout: ScalarLayout,
    data: Array3<DVec3>,
}

impl CollocatedVectorGrid3 {
    /// 创建同位向量网格
    pub fn new(
        resolution: Size3,
        grid_spacing: DVec3,
        origin: DVec3,
        layout: ScalarLayout,
        initial_value: DVec3,
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

    /// 数据原点
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
    pub fn data(&self) -> &Array3<DVec3> {
        &self.data
    }

    /// 数据数组（可变）
    #[inline]
    pub fn data_mut(&mut self) -> &mut Array3<DVec3> {
        &mut self.data
    }

    /// 填充为同一值
    pub fn fill(&mut self, value: DVec3) {
        self.data.fill(value);
    }

    /// 按位置函数并行填充
    pub fn fill_with<F>(&mut self, f: F)
    where
        F: Fn(DVec3) -> DVec3 + Sync + Send,
    {
        let origin = self.data_origin();
        let h = self.geometry.grid_spacing();
        self.data.par_for_each_mut(|(i, j, k), v| {
            let pt = origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z);
            *v = f(pt);
        });
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
        self.data
            .resize(self.layout.data_size(resolution), initial_value);
    }

    /// 线性采样器
    #[inline]
    pub fn sampler(&self) -> LinearArraySampler3<'_, DVec3> {
        LinearArraySampler3::new(&self.data, self.geometry.grid_spacing(), self.data_origin())
    }
}

impl VectorField3 for CollocatedVectorGrid3 {
    fn sample(&self, point: DVec3) -> DVec3 {
        self.sampler().sample(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_exact_at_data_points() {
        let mut grid = CollocatedVectorGrid3::new(
            Size3::new(3, 3, 3),
            DVec3::ONE,
            DVec3::ZERO,
            ScalarLayout::CellCentered,
            DVec3::ZERO,
        );
        grid.fill_with(|p| DVec3::new(p.x, 2.0 * p.y, -p.z));

        let pt = grid.data_position(1, 2, 0);
        assert!((grid.sample(pt) - *grid.data().at(1, 2, 0)).length() < 1e-14);
    }

    #[test]
    fn test_vertex_layout_size() {
        let grid = CollocatedVectorGrid3::new(
            Size3::new(2, 2, 2),
            DVec3::ONE,
            DVec3::ZERO,
            ScalarLayout::VertexCentered,
            DVec3::ONE,
        );
        assert_eq!(grid.data_size(), Size3::new(3, 3, 3));
        assert_eq!(grid.data_position(0, 0, 0), DVec3::ZERO);
    }

    #[test]
    fn test_resize_lockstep_geometry() {
        let mut grid = CollocatedVectorGrid3::new(
            Size3::new(2, 2, 2),
            DVec3::ONE,
            DVec3::ZERO,
            ScalarLayout::CellCentered,
            DVec3::X,
        );
        grid.resize(Size3::new(4, 4, 4), DVec3::splat(0.5), DVec3::ONE, DVec3::ZERO);
        assert_eq!(grid.resolution(), Size3::new(4, 4, 4));
        assert_eq!(*grid.data().at(0, 0, 0), DVec3::X);
        assert_eq!(*grid.data().at(3, 3, 3), DVec3::ZERO);
    }
}
