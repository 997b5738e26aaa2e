// crates/vg_physics/src/numerics/array3.rs

//! 稠密三维数组
//!
//! 扁平、缓存友好的三维存储，行主序 `linear = i + x*(j + y*k)`。
//!
//! # 迭代语义
//!
//! - 串行迭代顺序确定：i 最快，j 次之，k 最慢
//! - 并行迭代（rayon）顺序不确定，仅适用于与访问顺序无关的内核
//!
//! # 访问语义
//!
//! - `at` / `at_mut`: 带边界检查，越界视为前置条件违反（panic）
//! - `Index` / `IndexMut`: 热路径访问，release 模式不做检查

use rayon::prelude::*;

use super::size3::Size3;

/// 稠密三维数组
#[derive(Clone, Debug, PartialEq)]
pub struct Array3<T> {
    size: Size3,
    data: Vec<T>,
}

impl<T: Clone> Array3<T> {
    /// 以尺寸和填充值构造
    pub fn new(size: Size3, initial_value: T) -> Self {
        Self {
            size,
            data: vec![initial_value; size.volume()],
        }
    }

    /// 获取尺寸
    #[inline]
    pub fn size(&self) -> Size3 {
        self.size
    }

    /// 带边界检查的访问
    ///
    /// # Panics
    /// 索引越界
    #[inline]
    pub fn at(&self, i: usize, j: usize, k: usize) -> &T {
        assert!(
            self.size.contains(i, j, k),
            "数组索引越界: ({}, {}, {}) 超出 {}",
            i,
            j,
            k,
            self.size
        );
        &self.data[self.size.linear_index(i, j, k)]
    }

    /// 带边界检查的可变访问
    ///
    /// # Panics
    /// 索引越界
    #[inline]
    pub fn at_mut(&mut self, i: usize, j: usize, k: usize) -> &mut T {
        assert!(
            self.size.contains(i, j, k),
            "数组索引越界: ({}, {}, {}) 超出 {}",
            i,
            j,
            k,
            self.size
        );
        let idx = self.size.linear_index(i, j, k);
        &mut self.data[idx]
    }

    /// 填充为同一值
    pub fn fill(&mut self, value: T) {
        for v in &mut self.data {
            *v = value.clone();
        }
    }

    /// 调整尺寸，保留重叠区域
    ///
    /// 逐维拷贝 min(旧尺寸, 新尺寸) 范围内的旧值，其余以 `initial_value`
    /// 填充。不做任何插值。
    pub fn resize(&mut self, new_size: Size3, initial_value: T) {
        if new_size == self.size {
            return;
        }
        let mut new_data = vec![initial_value; new_size.volume()];
        let overlap = self.size.min(new_size);
        for k in 0..overlap.z {
            for j in 0..overlap.y {
                for i in 0..overlap.x {
                    new_data[new_size.linear_index(i, j, k)] =
                        self.data[self.size.linear_index(i, j, k)].clone();
                }
            }
        }
        self.size = new_size;
        self.data = new_data;
    }

    /// O(1) 交换内容
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.size, &mut other.size);
        std::mem::swap(&mut self.data, &mut other.data);
    }

    /// 原始数据切片
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// 原始数据可变切片
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// 串行按索引迭代（i 最快，k 最慢）
    pub fn for_each_index<F: FnMut(usize, usize, usize)>(&self, mut f: F) {
        for k in 0..self.size.z {
            for j in 0..self.size.y {
                for i in 0..self.size.x {
                    f(i, j, k);
                }
            }
        }
    }
}

impl<T: Clone + Send + Sync> Array3<T> {
    /// 并行按索引迭代（只读，顺序不确定）
    pub fn par_for_each_index<F>(&self, f: F)
    where
        F: Fn(usize, usize, usize) + Sync + Send,
    {
        let size = self.size;
        (0..size.volume()).into_par_iter().for_each(|idx| {
            let (i, j, k) = size.coords(idx);
            f(i, j, k);
        });
    }

    /// 并行逐元素更新（顺序不确定）
    pub fn par_for_each_mut<F>(&mut self, f: F)
    where
        F: Fn((usize, usize, usize), &mut T) + Sync + Send,
    {
        let size = self.size;
        self.data.par_iter_mut().enumerate().for_each(|(idx, v)| {
            f(size.coords(idx), v);
        });
    }
}

impl<T> std::ops::Index<(usize, usize, usize)> for Array3<T> {
    type Output = T;

    #[inline]
    fn index(&self, (i, j, k): (usize, usize, usize)) -> &T {
        debug_assert!(self.size.contains(i, j, k));
        &self.data[self.size.linear_index(i, j, k)]
    }
}

impl<T> std::ops::IndexMut<(usize, usize, usize)> for Array3<T> {
    #[inline]
    fn index_mut(&mut self, (i, j, k): (usize, usize, usize)) -> &mut T {
        debug_assert!(self.size.contains(i, j, k));
        let idx = self.size.linear_index(i, j, k);
        &mut self.data[idx]
    }
}
