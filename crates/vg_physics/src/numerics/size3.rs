// crates/vg_physics/src/numerics/size3.rs

//! 三维整数尺寸
//!
//! 网格分辨率与稠密数组尺寸的统一表示，提供线性索引换算
//! `linear = i + x*(j + y*k)`（i 最快，k 最慢）。

use serde::{Deserialize, Serialize};

/// 三维整数尺寸（分辨率 / 数组大小）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size3 {
    /// x 方向尺寸
    pub x: usize,
    /// y 方向尺寸
    pub y: usize,
    /// z 方向尺寸
    pub z: usize,
}

impl Size3 {
    /// 零尺寸
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    /// 创建尺寸
    #[inline]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// 元素总数
    #[inline]
    pub const fn volume(&self) -> usize {
        self.x * self.y * self.z
    }

    /// 是否为空（任一维为 0）
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.x == 0 || self.y == 0 || self.z == 0
    }

    /// 索引是否在界内
    #[inline]
    pub const fn contains(&self, i: usize, j: usize, k: usize) -> bool {
        i < self.x && j < self.y && k < self.z
    }

    /// 线性索引（i 最快，k 最慢）
    #[inline]
    pub const fn linear_index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.x * (j + self.y * k)
    }

    /// 由线性索引还原三维坐标
    #[inline]
    pub const fn coords(&self, idx: usize) -> (usize, usize, usize) {
        let i = idx % self.x;
        let j = (idx / self.x) % self.y;
        let k = idx / (self.x * self.y);
        (i, j, k)
    }

    /// 逐维最小值
    #[inline]
    pub fn min(&self, other: Self) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
        }
    }
}

impl std::fmt::Display for Size3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_index_roundtrip() {
        let size = Size3::new(4, 3, 5);
        for k in 0..5 {
            for j in 0..3 {
                for i in 0..4 {
                    let idx = size.linear_index(i, j, k);
                    assert_eq!(size.coords(idx), (i, j, k));
                }
            }
        }
    }

    #[test]
    fn test_linear_index_order() {
        // i 最快：相邻 i 的线性索引相差 1
        let size = Size3::new(8, 8, 8);
        assert_eq!(size.linear_index(1, 0, 0), 1);
        assert_eq!(size.linear_index(0, 1, 0), 8);
        assert_eq!(size.linear_index(0, 0, 1), 64);
    }

    #[test]
    fn test_volume_and_empty() {
        assert_eq!(Size3::new(2, 3, 4).volume(), 24);
        assert!(Size3::new(0, 3, 4).is_empty());
        assert!(!Size3::new(1, 1, 1).is_empty());
    }

    #[test]
    fn test_contains() {
        let size = Size3::new(2, 2, 2);
        assert!(size.contains(1, 1, 1));
        assert!(!size.contains(2, 0, 0));
    }
}
