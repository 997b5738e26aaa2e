// crates/vg_physics/src/numerics/linear_algebra/csr.rs

//! 压缩稀疏行（CSR）矩阵格式
//!
//! CSR 使用三个数组存储：
//! - `row_ptr`: 行指针，长度 n_rows + 1，row_ptr[i] 是第 i 行第一个非零元的索引
//! - `col_idx`: 列索引，行内按列升序排列
//! - `values`: 非零元值
//!
//! 支持泛型标量类型 `S: Real`（f32 或 f64）。
//!
//! # 构建方式
//!
//! - [`CsrBuilder`]: 逐元素随机插入（BTreeMap 暂存）
//! - [`CsrMatrix::append_row`]: 按行追加（均摊 O(行长)），供压缩系统组装
//! - [`CsrMatrix::compress`]: 从稠密行压缩，丢弃幅值 ≤ ε 的元素
//!
//! # 使用示例
//!
//! ```ignore
//! let mut builder = CsrBuilder::<f64>::new_square(3);
//! builder.set(0, 0, 4.0);
//! builder.set(0, 1, -1.0);
//! let matrix = builder.build();
//!
//! let x = vec![1.0, 2.0, 3.0];
//! let mut y = vec![0.0; 3];
//! matrix.mul_vec(&x, &mut y);
//! ```

use rayon::prelude::*;
use std::collections::BTreeMap;

use vg_foundation::Real;

// =============================================================================
// CSR 矩阵主体
// =============================================================================

/// CSR 格式稀疏矩阵
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<S: Real> {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<S>,
}

impl<S: Real> CsrMatrix<S> {
    /// 创建空矩阵（0 行，可按行追加）
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_rows: 0,
            n_cols,
            row_ptr: vec![0],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// 从原始 CSR 数据创建矩阵
    ///
    /// # Panics
    /// - `row_ptr` 长度不为 n_rows + 1 或末尾不等于 nnz
    /// - `col_idx` 与 `values` 长度不等
    pub fn from_raw(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<S>,
    ) -> Self {
        assert_eq!(row_ptr.len(), n_rows + 1, "row_ptr 长度必须为 n_rows + 1");
        assert_eq!(col_idx.len(), values.len(), "col_idx 和 values 长度必须相等");
        assert_eq!(row_ptr[n_rows], col_idx.len(), "row_ptr 末尾必须等于 nnz");

        Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// 从稠密行压缩，丢弃幅值 ≤ epsilon 的元素
    pub fn compress(dense_rows: &[Vec<S>], epsilon: S) -> Self {
        let n_rows = dense_rows.len();
        let n_cols = dense_rows.first().map_or(0, |r| r.len());

        let mut row_ptr = Vec::with_capacity(n_rows + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);

        for row in dense_rows {
            assert_eq!(row.len(), n_cols, "稠密行长度必须一致");
            for (col, &v) in row.iter().enumerate() {
                if v.abs() > epsilon {
                    col_idx.push(col);
                    values.push(v);
                }
            }
            row_ptr.push(col_idx.len());
        }

        Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// 创建单位矩阵
    pub fn identity(n: usize) -> Self {
        let mut builder = CsrBuilder::<S>::new_square(n);
        for i in 0..n {
            builder.set(i, i, S::ONE);
        }
        builder.build()
    }

    /// 按行追加（列索引不必预先有序，内部排序）
    ///
    /// # Panics
    /// - `non_zeros` 与 `column_indices` 长度不等
    pub fn append_row(&mut self, non_zeros: &[S], column_indices: &[usize]) {
        assert_eq!(
            non_zeros.len(),
            column_indices.len(),
            "非零元与列索引数量必须相等"
        );

        let mut pairs: Vec<(usize, S)> = column_indices
            .iter()
            .copied()
            .zip(non_zeros.iter().copied())
            .collect();
        pairs.sort_unstable_by_key(|&(col, _)| col);

        for (col, v) in pairs {
            self.col_idx.push(col);
            self.values.push(v);
            self.n_cols = self.n_cols.max(col + 1);
        }
        self.n_rows += 1;
        self.row_ptr.push(self.col_idx.len());
    }

    /// 清空为 0 行（保留列数）
    pub fn clear(&mut self) {
        self.n_rows = 0;
        self.row_ptr.clear();
        self.row_ptr.push(0);
        self.col_idx.clear();
        self.values.clear();
    }

    /// 获取行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 获取列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// 获取非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 获取行指针切片
    #[inline]
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// 获取列索引切片
    #[inline]
    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    /// 获取值切片
    #[inline]
    pub fn values(&self) -> &[S] {
        &self.values
    }

    /// 获取值可变切片（矩阵值更新）
    #[inline]
    pub fn values_mut(&mut self) -> &mut [S] {
        &mut self.values
    }

    /// 查找 (row, col) 对应的值索引（行内二分查找）
    pub fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        match self.col_idx[start..end].binary_search(&col) {
            Ok(local) => Some(start + local),
            Err(_) => None,
        }
    }

    /// 获取 (row, col) 位置的值（不存在返回 0）
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> S {
        self.find_index(row, col)
            .map_or(S::ZERO, |idx| self.values[idx])
    }

    /// 设置 (row, col) 位置的值（位置必须已存在）
    ///
    /// # 返回
    /// 位置不存在时返回 false 且不修改
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: S) -> bool {
        if let Some(idx) = self.find_index(row, col) {
            self.values[idx] = value;
            true
        } else {
            false
        }
    }

    /// 获取第 row 行的 (列索引, 值) 视图
    #[inline]
    pub fn row(&self, row: usize) -> (&[usize], &[S]) {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        (&self.col_idx[start..end], &self.values[start..end])
    }

    /// 获取对角元素值
    #[inline]
    pub fn diagonal_value(&self, row: usize) -> Option<S> {
        self.find_index(row, row).map(|idx| self.values[idx])
    }

    /// 提取对角线向量（缺失处为 0）
    pub fn extract_diagonal(&self) -> Vec<S> {
        (0..self.n_rows)
            .map(|i| self.diagonal_value(i).unwrap_or(S::ZERO))
            .collect()
    }

    /// 矩阵-向量乘法 y = A * x
    ///
    /// # Panics
    /// 维度不匹配
    pub fn mul_vec(&self, x: &[S], y: &mut [S]) {
        assert_eq!(x.len(), self.n_cols, "x 长度必须等于矩阵列数");
        assert_eq!(y.len(), self.n_rows, "y 长度必须等于矩阵行数");

        for row in 0..self.n_rows {
            let start = self.row_ptr[row];
            let end = self.row_ptr[row + 1];

            let mut sum = S::ZERO;
            for idx in start..end {
                sum += self.values[idx] * x[self.col_idx[idx]];
            }
            y[row] = sum;
        }
    }

    /// 并行矩阵-向量乘法
    ///
    /// 行数较大时（> 1000）性能显著优于串行版本。
    ///
    /// # Panics
    /// 维度不匹配
    pub fn mul_vec_parallel(&self, x: &[S], y: &mut [S]) {
        assert_eq!(x.len(), self.n_cols, "x 长度必须等于矩阵列数");
        assert_eq!(y.len(), self.n_rows, "y 长度必须等于矩阵行数");

        y.par_iter_mut().enumerate().for_each(|(row, out)| {
            let start = self.row_ptr[row];
            let end = self.row_ptr[row + 1];

            let mut sum = S::ZERO;
            for idx in start..end {
                sum += self.values[idx] * x[self.col_idx[idx]];
            }
            *out = sum;
        });
    }

    /// 标量运算：对所有存储的非零元应用 f
    fn map_values(&self, f: impl Fn(S) -> S) -> Self {
        let mut out = self.clone();
        for v in &mut out.values {
            *v = f(*v);
        }
        out
    }

    /// 非零元加标量
    pub fn add_scalar(&self, s: S) -> Self {
        self.map_values(|v| v + s)
    }

    /// 非零元减标量
    pub fn sub_scalar(&self, s: S) -> Self {
        self.map_values(|v| v - s)
    }

    /// 乘标量
    pub fn mul_scalar(&self, s: S) -> Self {
        self.map_values(|v| v * s)
    }

    /// 除标量
    pub fn div_scalar(&self, s: S) -> Self {
        self.map_values(|v| v / s)
    }

    /// 矩阵加法（保持稀疏性的按列归并）
    ///
    /// # Panics
    /// 维度不匹配
    pub fn add_matrix(&self, other: &Self) -> Self {
        self.merge_with(other, |a, b| a + b)
    }

    /// 矩阵减法（保持稀疏性的按列归并）
    ///
    /// # Panics
    /// 维度不匹配
    pub fn sub_matrix(&self, other: &Self) -> Self {
        self.merge_with(other, |a, b| a - b)
    }

    fn merge_with(&self, other: &Self, f: impl Fn(S, S) -> S) -> Self {
        assert_eq!(self.n_rows, other.n_rows, "矩阵行数必须一致");
        assert_eq!(self.n_cols, other.n_cols, "矩阵列数必须一致");

        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);

        for row in 0..self.n_rows {
            let (cols_a, vals_a) = self.row(row);
            let (cols_b, vals_b) = other.row(row);

            let mut ia = 0;
            let mut ib = 0;
            while ia < cols_a.len() || ib < cols_b.len() {
                let ca = cols_a.get(ia).copied().unwrap_or(usize::MAX);
                let cb = cols_b.get(ib).copied().unwrap_or(usize::MAX);
                match ca.cmp(&cb) {
                    std::cmp::Ordering::Less => {
                        col_idx.push(ca);
                        values.push(f(vals_a[ia], S::ZERO));
                        ia += 1;
                    }
                    std::cmp::Ordering::Greater => {
                        col_idx.push(cb);
                        values.push(f(S::ZERO, vals_b[ib]));
                        ib += 1;
                    }
                    std::cmp::Ordering::Equal => {
                        col_idx.push(ca);
                        values.push(f(vals_a[ia], vals_b[ib]));
                        ia += 1;
                        ib += 1;
                    }
                }
            }
            row_ptr.push(col_idx.len());
        }

        Self {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// 矩阵-矩阵乘法（按行稀疏累加）
    ///
    /// # Panics
    /// self 列数不等于 other 行数
    pub fn mul_matrix(&self, other: &Self) -> Self {
        assert_eq!(self.n_cols, other.n_rows, "矩阵维度不匹配");

        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);

        let mut acc: BTreeMap<usize, S> = BTreeMap::new();
        for row in 0..self.n_rows {
            acc.clear();
            let (cols_a, vals_a) = self.row(row);
            for (&ca, &va) in cols_a.iter().zip(vals_a.iter()) {
                let (cols_b, vals_b) = other.row(ca);
                for (&cb, &vb) in cols_b.iter().zip(vals_b.iter()) {
                    *acc.entry(cb).or_insert(S::ZERO) += va * vb;
                }
            }
            for (&col, &v) in &acc {
                col_idx.push(col);
                values.push(v);
            }
            row_ptr.push(col_idx.len());
        }

        Self {
            n_rows: self.n_rows,
            n_cols: other.n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// 检查矩阵是否对称（容差范围内）
    pub fn is_symmetric(&self, tol: S) -> bool {
        for i in 0..self.n_rows {
            let (cols, vals) = self.row(i);
            for (&j, &a_ij) in cols.iter().zip(vals.iter()) {
                if j > i && (a_ij - self.get(j, i)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// 无穷范数（最大行绝对值和）
    pub fn infinity_norm(&self) -> S {
        let mut max_row_sum = S::ZERO;
        for row in 0..self.n_rows {
            let (_, vals) = self.row(row);
            let row_sum: S = vals.iter().map(|&v| v.abs()).sum();
            max_row_sum = max_row_sum.max(row_sum);
        }
        max_row_sum
    }

    /// 将所有值清零（保持稀疏模式）
    pub fn clear_values(&mut self) {
        self.values.fill(S::ZERO);
    }

    /// 缩放所有值
    pub fn scale(&mut self, factor: S) {
        for v in &mut self.values {
            *v *= factor;
        }
    }
}

// =============================================================================
// 构建器
// =============================================================================

/// CSR 矩阵构建器
///
/// 使用 BTreeMap 临时存储，构建时转换为紧凑 CSR 格式。
/// 适合逐元素或小批量构建。
pub struct CsrBuilder<S: Real> {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<BTreeMap<usize, S>>,
}

impl<S: Real> CsrBuilder<S> {
    /// 创建方阵构建器
    #[inline]
    pub fn new_square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// 创建构建器
    ///
    /// # Panics
    /// 行数或列数为 0
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        assert!(n_rows > 0, "行数必须大于 0");
        assert!(n_cols > 0, "列数必须大于 0");

        Self {
            n_rows,
            n_cols,
            rows: vec![BTreeMap::new(); n_rows],
        }
    }

    /// 设置 (row, col) 的值（覆盖）
    ///
    /// # Panics
    /// 索引越界
    pub fn set(&mut self, row: usize, col: usize, value: S) {
        assert!(row < self.n_rows, "行索引越界");
        assert!(col < self.n_cols, "列索引越界");
        self.rows[row].insert(col, value);
    }

    /// 累加到 (row, col)
    ///
    /// # Panics
    /// 索引越界
    pub fn add(&mut self, row: usize, col: usize, value: S) {
        assert!(row < self.n_rows, "行索引越界");
        assert!(col < self.n_cols, "列索引越界");
        *self.rows[row].entry(col).or_insert(S::ZERO) += value;
    }

    /// 获取 (row, col) 的当前值（不存在返回 0）
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> S {
        self.rows[row].get(&col).copied().unwrap_or(S::ZERO)
    }

    /// 当前非零元总数
    #[inline]
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    /// 构建 CSR 矩阵（消耗构建器）
    pub fn build(self) -> CsrMatrix<S> {
        let nnz = self.nnz();
        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        row_ptr.push(0);
        for row_map in self.rows {
            for (col, val) in row_map {
                col_idx.push(col);
                values.push(val);
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }
}

// =============================================================================
// 测试
// =============================================================================
