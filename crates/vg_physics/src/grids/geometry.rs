// crates/vg_physics/src/grids/geometry.rs

//! 网格几何描述
//!
//! 所有网格类型共享的形状信息：整数分辨率、逐轴网格间距与
//! 世界坐标原点。包围盒由三者派生，每次查询即时计算，
//! 调整尺寸后自动保持一致。

use glam::DVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::numerics::size3::Size3;

/// 轴对齐包围盒
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3 {
    /// 下角点
    pub lower: DVec3,
    /// 上角点
    pub upper: DVec3,
}

impl BoundingBox3 {
    /// 是否包含点（闭区间）
    #[inline]
    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.lower).all() && point.cmple(self.upper).all()
    }

    /// 对角线长度
    #[inline]
    pub fn diagonal_length(&self) -> f64 {
        (self.upper - self.lower).length()
    }
}

/// 网格几何
///
/// 不变量：间距各分量严格为正（构造与调整时断言）。
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    resolution: Size3,
    grid_spacing: DVec3,
    origin: DVec3,
}

impl GridGeometry {
    /// 创建网格几何
    ///
    /// # Panics
    /// 间距任一分量非正
    pub fn new(resolution: Size3, grid_spacing: DVec3, origin: DVec3) -> Self {
        assert!(
            grid_spacing.x > 0.0 && grid_spacing.y > 0.0 && grid_spacing.z > 0.0,
            "网格间距必须严格为正: {:?}",
            grid_spacing
        );
        Self {
            resolution,
            grid_spacing,
            origin,
        }
    }

    /// 分辨率
    #[inline]
    pub fn resolution(&self) -> Size3 {
        self.resolution
    }

    /// 网格间距
    #[inline]
    pub fn grid_spacing(&self) -> DVec3 {
        self.grid_spacing
    }

    /// 原点
    #[inline]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// 包围盒（由分辨率、间距、原点派生）
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox3 {
        BoundingBox3 {
            lower: self.origin,
            upper: self.origin
                + DVec3::new(
                    self.resolution.x as f64 * self.grid_spacing.x,
                    self.resolution.y as f64 * self.grid_spacing.y,
                    self.resolution.z as f64 * self.grid_spacing.z,
                ),
        }
    }

    /// 单元中心位置
    #[inline]
    pub fn cell_center_position(&self, i: usize, j: usize, k: usize) -> DVec3 {
        self.origin
            + DVec3::new(
                (i as f64 + 0.5) * self.grid_spacing.x,
                (j as f64 + 0.5) * self.grid_spacing.y,
                (k as f64 + 0.5) * self.grid_spacing.z,
            )
    }

    /// 串行按单元索引迭代（i 最快，k 最慢）
    pub fn for_each_cell_index<F: FnMut(usize, usize, usize)>(&self, mut f: F) {
        for k in 0..self.resolution.z {
            for j in 0..self.resolution.y {
                for i in 0..self.resolution.x {
                    f(i, j, k);
                }
            }
        }
    }

    /// 并行按单元索引迭代（顺序不确定）
    pub fn par_for_each_cell_index<F>(&self, f: F)
    where
        F: Fn(usize, usize, usize) + Sync + Send,
    {
        let res = self.resolution;
        (0..res.volume()).into_par_iter().for_each(|idx| {
            let (i, j, k) = res.coords(idx);
            f(i, j, k);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_derived() {
        let geom = GridGeometry::new(
            Size3::new(10, 20, 5),
            DVec3::new(0.5, 0.25, 1.0),
            DVec3::new(-1.0, 0.0, 2.0),
        );
        let bbox = geom.bounding_box();
        assert_eq!(bbox.lower, DVec3::new(-1.0, 0.0, 2.0));
        assert_eq!(bbox.upper, DVec3::new(4.0, 5.0, 7.0));
        assert!(bbox.contains(DVec3::new(0.0, 1.0, 3.0)));
        assert!(!bbox.contains(DVec3::new(5.0, 1.0, 3.0)));
    }

    #[test]
    fn test_cell_center_position() {
        let geom = GridGeometry::new(Size3::new(4, 4, 4), DVec3::splat(2.0), DVec3::ZERO);
        assert_eq!(geom.cell_center_position(0, 0, 0), DVec3::splat(1.0));
        assert_eq!(
            geom.cell_center_position(1, 2, 3),
            DVec3::new(3.0, 5.0, 7.0)
        );
    }

    #[test]
    #[should_panic]
    fn test_nonpositive_spacing_asserts() {
        let _ = GridGeometry::new(Size3::new(1, 1, 1), DVec3::new(1.0, -1.0, 1.0), DVec3::ZERO);
    }

    #[test]
    fn test_cell_iteration_order() {
        let geom = GridGeometry::new(Size3::new(2, 2, 1), DVec3::ONE, DVec3::ZERO);
        let mut visited = Vec::new();
        geom.for_each_cell_index(|i, j, k| visited.push((i, j, k)));
        assert_eq!(visited, vec![(0, 0, 0), (1, 0, 0), (0, 1, 0), (1, 1, 0)]);
    }
}
