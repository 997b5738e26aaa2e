// crates/vg_physics/src/grids/vector_grid.rs

//! 向量网格标签联合
//!
//! 向量网格只有两种布局：同位与面心。层集合中的向量层以封闭的
//! 标签联合表达，平流调度用 `match` 按布局分派，替代运行时类型
//! 探测。布局在注册时确定，此后不再改变。

use glam::DVec3;

use super::collocated::CollocatedVectorGrid3;
use super::face_centered::FaceCenteredGrid3;
use super::scalar_grid::ScalarLayout;
use crate::geometry::field::VectorField3;
use crate::numerics::size3::Size3;

/// 向量网格布局
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VectorLayout {
    /// 同位，数据位于单元中心
    CellCentered,
    /// 同位，数据位于顶点
    VertexCentered,
    /// 面心（MAC）
    FaceCentered,
}

/// 向量网格（布局封闭联合）
#[derive(Clone, Debug)]
pub enum VectorGrid3 {
    /// 同位向量网格
    Collocated(CollocatedVectorGrid3),
    /// 面心向量网格
    FaceCentered(FaceCenteredGrid3),
}

impl VectorGrid3 {
    /// 按布局创建
    pub fn from_layout(
        layout: VectorLayout,
        resolution: Size3,
        grid_spacing: DVec3,
        origin: DVec3,
        initial_value: DVec3,
    ) -> Self {
        match layout {
            VectorLayout::CellCentered => Self::Collocated(CollocatedVectorGrid3::new(
                resolution,
                grid_spacing,
                origin,
                ScalarLayout::CellCentered,
                initial_value,
            )),
            VectorLayout::VertexCentered => Self::Collocated(CollocatedVectorGrid3::new(
                resolution,
                grid_spacing,
                origin,
                ScalarLayout::VertexCentered,
                initial_value,
            )),
            VectorLayout::FaceCentered => Self::FaceCentered(FaceCenteredGrid3::new(
                resolution,
                grid_spacing,
                origin,
                initial_value,
            )),
        }
    }

    /// 分辨率
    pub fn resolution(&self) -> Size3 {
        match self {
            Self::Collocated(g) => g.resolution(),
            Self::FaceCentered(g) => g.resolution(),
        }
    }

    /// 调整尺寸（重叠区域保留）
    pub fn resize(
        &mut self,
        resolution: Size3,
        grid_spacing: DVec3,
        origin: DVec3,
        initial_value: DVec3,
    ) {
        match self {
            Self::Collocated(g) => g.resize(resolution, grid_spacing, origin, initial_value),
            Self::FaceCentered(g) => g.resize(resolution, grid_spacing, origin, initial_value),
        }
    }

    /// 面心视图
    pub fn as_face_centered(&self) -> Option<&FaceCenteredGrid3> {
        match self {
            Self::FaceCentered(g) => Some(g),
            _ => None,
        }
    }

    /// 面心可变视图
    pub fn as_face_centered_mut(&mut self) -> Option<&mut FaceCenteredGrid3> {
        match self {
            Self::FaceCentered(g) => Some(g),
            _ => None,
        }
    }

    /// 同位视图
    pub fn as_collocated(&self) -> Option<&CollocatedVectorGrid3> {
        match self {
            Self::Collocated(g) => Some(g),
            _ => None,
        }
    }
}

impl VectorField3 for VectorGrid3 {
    fn sample(&self, point: DVec3) -> DVec3 {
        match self {
            Self::Collocated(g) => g.sample(point),
            Self::FaceCentered(g) => g.sample(point),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_layout_dispatch() {
        let res = Size3::new(2, 2, 2);
        let cc = VectorGrid3::from_layout(
            VectorLayout::CellCentered,
            res,
            DVec3::ONE,
            DVec3::ZERO,
            DVec3::ZERO,
        );
        assert!(cc.as_collocated().is_some());
        assert!(cc.as_face_centered().is_none());

        let fc = VectorGrid3::from_layout(
            VectorLayout::FaceCentered,
            res,
            DVec3::ONE,
            DVec3::ZERO,
            DVec3::ZERO,
        );
        assert!(fc.as_face_centered().is_some());
    }

    #[test]
    fn test_resize_dispatch() {
        let mut g = VectorGrid3::from_layout(
            VectorLayout::FaceCentered,
            Size3::new(2, 2, 2),
            DVec3::ONE,
            DVec3::ZERO,
            DVec3::ZERO,
        );
        g.resize(Size3::new(3, 3, 3), DVec3::ONE, DVec3::ZERO, DVec3::ZERO);
        assert_eq!(g.resolution(), Size3::new(3, 3, 3));
    }
}
