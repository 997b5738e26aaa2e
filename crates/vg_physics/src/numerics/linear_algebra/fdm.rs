// crates/vg_physics/src/numerics/linear_algebra/fdm.rs

//! 网格形状的有限差分线性系统
//!
//! 压力/扩散离散产生的 7 点模板系统有两种表示：
//!
//! - 网格形状（FDM）：矩阵按单元存储对称 7 点行
//!   [`FdmMatrixRow3`]（center/right/up/front，左/下/后由对称性隐含），
//!   向量即 [`FdmVector3`]（三维标量数组）
//! - 压缩（CSR）：高分辨率下更紧凑的 [`CsrMatrix`] 表示
//!
//! [`Blas`] trait 把两种表示的向量/矩阵原语统一起来，
//! CG/PCG 迭代核心对两者只写一份。

use rayon::prelude::*;

use super::csr::CsrMatrix;
use super::vector_ops;
use crate::numerics::array3::Array3;
use crate::numerics::size3::Size3;

/// 对称 7 点模板的单行存储
///
/// 只存中心与 +x/+y/+z 邻居系数，-x/-y/-z 由对称性取邻行的
/// 对应分量。
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FdmMatrixRow3 {
    /// 中心系数
    pub center: f64,
    /// +x 邻居系数
    pub right: f64,
    /// +y 邻居系数
    pub up: f64,
    /// +z 邻居系数
    pub front: f64,
}

/// 网格形状的系数矩阵
pub type FdmMatrix3 = Array3<FdmMatrixRow3>;

/// 网格形状的向量
pub type FdmVector3 = Array3<f64>;

// ============================================================
// 线性系统容器
// ============================================================

/// 网格形状的线性系统 Ax = b
#[derive(Clone, Debug)]
pub struct FdmLinearSystem3 {
    /// 系数矩阵
    pub a: FdmMatrix3,
    /// 解向量（输入初始猜测，输出解）
    pub x: FdmVector3,
    /// 右端项
    pub b: FdmVector3,
}

impl FdmLinearSystem3 {
    /// 以尺寸构造（全零）
    pub fn new(size: Size3) -> Self {
        Self {
            a: FdmMatrix3::new(size, FdmMatrixRow3::default()),
            x: FdmVector3::new(size, 0.0),
            b: FdmVector3::new(size, 0.0),
        }
    }

    /// 调整尺寸（内容清零）
    pub fn resize(&mut self, size: Size3) {
        self.a = FdmMatrix3::new(size, FdmMatrixRow3::default());
        self.x = FdmVector3::new(size, 0.0);
        self.b = FdmVector3::new(size, 0.0);
    }

    /// 系统尺寸
    #[inline]
    pub fn size(&self) -> Size3 {
        self.x.size()
    }
}

/// 压缩（CSR）线性系统 Ax = b
#[derive(Clone, Debug)]
pub struct FdmCompressedLinearSystem3 {
    /// 系数矩阵
    pub a: CsrMatrix<f64>,
    /// 解向量
    pub x: Vec<f64>,
    /// 右端项
    pub b: Vec<f64>,
}

impl FdmCompressedLinearSystem3 {
    /// 构造空系统
    pub fn new() -> Self {
        Self {
            a: CsrMatrix::new(0),
            x: Vec::new(),
            b: Vec::new(),
        }
    }

    /// 清空（释放内容）
    pub fn clear(&mut self) {
        self.a = CsrMatrix::new(0);
        self.x.clear();
        self.b.clear();
    }
}

impl Default for FdmCompressedLinearSystem3 {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// BLAS 抽象
// ============================================================

/// 迭代求解器的向量/矩阵原语集合
///
/// 网格形状与压缩表示各自实现一次，CG/PCG 核心只写一份。
pub trait Blas {
    /// 向量类型
    type Vector;
    /// 矩阵类型
    type Matrix;

    /// result[:] = s
    fn set(s: f64, result: &mut Self::Vector);
    /// result = v
    fn copy(v: &Self::Vector, result: &mut Self::Vector);
    /// a·b
    fn dot(a: &Self::Vector, b: &Self::Vector) -> f64;
    /// y += a*x
    fn axpy(a: f64, x: &Self::Vector, y: &mut Self::Vector);
    /// y = x + a*y
    fn xpay(x: &Self::Vector, a: f64, y: &mut Self::Vector);
    /// result = m * v
    fn mvm(m: &Self::Matrix, v: &Self::Vector, result: &mut Self::Vector);
    /// result = b - m*x
    fn residual(m: &Self::Matrix, x: &Self::Vector, b: &Self::Vector, result: &mut Self::Vector);
    /// ||v||₂
    fn l2_norm(v: &Self::Vector) -> f64;
    /// ||v||∞
    fn l_inf_norm(v: &Self::Vector) -> f64;
}

/// 网格形状表示的 BLAS
pub struct FdmBlas3;

impl Blas for FdmBlas3 {
    type Vector = FdmVector3;
    type Matrix = FdmMatrix3;

    fn set(s: f64, result: &mut FdmVector3) {
        result.fill(s);
    }

    fn copy(v: &FdmVector3, result: &mut FdmVector3) {
        debug_assert_eq!(v.size(), result.size());
        result.data_mut().copy_from_slice(v.data());
    }

    fn dot(a: &FdmVector3, b: &FdmVector3) -> f64 {
        debug_assert_eq!(a.size(), b.size());
        vector_ops::dot(a.data(), b.data())
    }

    fn axpy(a: f64, x: &FdmVector3, y: &mut FdmVector3) {
        debug_assert_eq!(x.size(), y.size());
        vector_ops::axpy(a, x.data(), y.data_mut());
    }

    fn xpay(x: &FdmVector3, a: f64, y: &mut FdmVector3) {
        debug_assert_eq!(x.size(), y.size());
        vector_ops::xpay(x.data(), a, y.data_mut());
    }

    fn mvm(m: &FdmMatrix3, v: &FdmVector3, result: &mut FdmVector3) {
        let size = m.size();
        assert_eq!(size, v.size(), "矩阵与向量尺寸必须一致");
        assert_eq!(size, result.size(), "结果向量尺寸必须一致");

        result.par_for_each_mut(|(i, j, k), out| {
            let row = m[(i, j, k)];
            let mut sum = row.center * v[(i, j, k)];
            if i > 0 {
                sum += m[(i - 1, j, k)].right * v[(i - 1, j, k)];
            }
            if i + 1 < size.x {
                sum += row.right * v[(i + 1, j, k)];
            }
            if j > 0 {
                sum += m[(i, j - 1, k)].up * v[(i, j - 1, k)];
            }
            if j + 1 < size.y {
                sum += row.up * v[(i, j + 1, k)];
            }
            if k > 0 {
                sum += m[(i, j, k - 1)].front * v[(i, j, k - 1)];
            }
            if k + 1 < size.z {
                sum += row.front * v[(i, j, k + 1)];
            }
            *out = sum;
        });
    }

    fn residual(m: &FdmMatrix3, x: &FdmVector3, b: &FdmVector3, result: &mut FdmVector3) {
        let size = m.size();
        assert_eq!(size, x.size(), "矩阵与向量尺寸必须一致");
        assert_eq!(size, b.size(), "右端项尺寸必须一致");
        assert_eq!(size, result.size(), "结果向量尺寸必须一致");

        result.par_for_each_mut(|(i, j, k), out| {
            let row = m[(i, j, k)];
            let mut sum = row.center * x[(i, j, k)];
            if i > 0 {
                sum += m[(i - 1, j, k)].right * x[(i - 1, j, k)];
            }
            if i + 1 < size.x {
                sum += row.right * x[(i + 1, j, k)];
            }
            if j > 0 {
                sum += m[(i, j - 1, k)].up * x[(i, j - 1, k)];
            }
            if j + 1 < size.y {
                sum += row.up * x[(i, j + 1, k)];
            }
            if k > 0 {
                sum += m[(i, j, k - 1)].front * x[(i, j, k - 1)];
            }
            if k + 1 < size.z {
                sum += row.front * x[(i, j, k + 1)];
            }
            *out = b[(i, j, k)] - sum;
        });
    }

    fn l2_norm(v: &FdmVector3) -> f64 {
        vector_ops::norm2(v.data())
    }

    fn l_inf_norm(v: &FdmVector3) -> f64 {
        vector_ops::norm_inf(v.data())
    }
}

/// 压缩表示的 BLAS
pub struct FdmCompressedBlas3;

impl Blas for FdmCompressedBlas3 {
    type Vector = Vec<f64>;
    type Matrix = CsrMatrix<f64>;

    fn set(s: f64, result: &mut Vec<f64>) {
        vector_ops::fill(s, result);
    }

    fn copy(v: &Vec<f64>, result: &mut Vec<f64>) {
        result.resize(v.len(), 0.0);
        vector_ops::copy(v, result);
    }

    fn dot(a: &Vec<f64>, b: &Vec<f64>) -> f64 {
        vector_ops::dot(a, b)
    }

    fn axpy(a: f64, x: &Vec<f64>, y: &mut Vec<f64>) {
        vector_ops::axpy(a, x, y);
    }

    fn xpay(x: &Vec<f64>, a: f64, y: &mut Vec<f64>) {
        vector_ops::xpay(x, a, y);
    }

    fn mvm(m: &CsrMatrix<f64>, v: &Vec<f64>, result: &mut Vec<f64>) {
        result.resize(m.n_rows(), 0.0);
        m.mul_vec(v, result);
    }

    fn residual(m: &CsrMatrix<f64>, x: &Vec<f64>, b: &Vec<f64>, result: &mut Vec<f64>) {
        result.resize(b.len(), 0.0);
        m.mul_vec(x, result);
        for (ri, &bi) in result.iter_mut().zip(b.iter()) {
            *ri = bi - *ri;
        }
    }

    fn l2_norm(v: &Vec<f64>) -> f64 {
        vector_ops::norm2(v)
    }

    fn l_inf_norm(v: &Vec<f64>) -> f64 {
        vector_ops::norm_inf(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 7 点拉普拉斯矩阵（单位间距，全内部视角）
    fn make_laplacian(size: Size3) -> FdmMatrix3 {
        let mut a = FdmMatrix3::new(size, FdmMatrixRow3::default());
        a.par_for_each_mut(|(i, j, k), row| {
            row.center = 6.0;
            if i + 1 < size.x {
                row.right = -1.0;
            }
            if j + 1 < size.y {
                row.up = -1.0;
            }
            if k + 1 < size.z {
                row.front = -1.0;
            }
        });
        a
    }

    #[test]
    fn test_mvm_constant_vector() {
        // 常向量上拉普拉斯算子：内部为 0，边界因缺邻而非零
        let size = Size3::new(3, 3, 3);
        let a = make_laplacian(size);
        let v = FdmVector3::new(size, 1.0);
        let mut result = FdmVector3::new(size, 0.0);

        FdmBlas3::mvm(&a, &v, &mut result);
        // 中心单元：6 - 6 = 0
        assert!((result[(1, 1, 1)]).abs() < 1e-14);
        // 角单元：6 - 3 = 3
        assert!((result[(0, 0, 0)] - 3.0).abs() < 1e-14);
    }

    #[test]
    fn test_mvm_symmetry_of_storage() {
        // 对称存储：A x 中 -x 邻居项取自左邻行的 right 系数
        let size = Size3::new(2, 1, 1);
        let mut a = FdmMatrix3::new(size, FdmMatrixRow3::default());
        a[(0, 0, 0)] = FdmMatrixRow3 {
            center: 2.0,
            right: -1.0,
            ..Default::default()
        };
        a[(1, 0, 0)] = FdmMatrixRow3 {
            center: 2.0,
            ..Default::default()
        };

        let mut v = FdmVector3::new(size, 0.0);
        v[(0, 0, 0)] = 1.0;
        v[(1, 0, 0)] = 3.0;

        let mut result = FdmVector3::new(size, 0.0);
        FdmBlas3::mvm(&a, &v, &mut result);
        // row0: 2*1 + (-1)*3 = -1; row1: (-1)*1 + 2*3 = 5
        assert!((result[(0, 0, 0)] + 1.0).abs() < 1e-14);
        assert!((result[(1, 0, 0)] - 5.0).abs() < 1e-14);
    }

    #[test]
    fn test_residual_zero_for_exact_solution() {
        let size = Size3::new(3, 3, 3);
        let a = make_laplacian(size);
        let x = FdmVector3::new(size, 0.0);
        let b = FdmVector3::new(size, 0.0);
        let mut r = FdmVector3::new(size, 1.0);

        FdmBlas3::residual(&a, &x, &b, &mut r);
        assert!(FdmBlas3::l2_norm(&r) < 1e-14);
    }

    #[test]
    fn test_blas_vector_ops() {
        let size = Size3::new(2, 2, 2);
        let mut x = FdmVector3::new(size, 1.0);
        let y = FdmVector3::new(size, 2.0);

        assert!((FdmBlas3::dot(&x, &y) - 16.0).abs() < 1e-14);
        FdmBlas3::axpy(3.0, &y, &mut x);
        assert!((x[(0, 0, 0)] - 7.0).abs() < 1e-14);
        assert!((FdmBlas3::l_inf_norm(&x) - 7.0).abs() < 1e-14);
    }

    #[test]
    fn test_compressed_blas_matches_grid_shaped() {
        // 同一系统在两种表示下的矩阵-向量乘法一致
        let size = Size3::new(3, 2, 2);
        let a = make_laplacian(size);
        let n = size.volume();

        let mut builder = crate::numerics::linear_algebra::CsrBuilder::<f64>::new_square(n);
        a.for_each_index(|i, j, k| {
            let row = size.linear_index(i, j, k);
            let entry = a[(i, j, k)];
            builder.set(row, row, entry.center);
            if i + 1 < size.x {
                let col = size.linear_index(i + 1, j, k);
                builder.set(row, col, entry.right);
                builder.set(col, row, entry.right);
            }
            if j + 1 < size.y {
                let col = size.linear_index(i, j + 1, k);
                builder.set(row, col, entry.up);
                builder.set(col, row, entry.up);
            }
            if k + 1 < size.z {
                let col = size.linear_index(i, j, k + 1);
                builder.set(row, col, entry.front);
                builder.set(col, row, entry.front);
            }
        });
        let a_csr = builder.build();

        let mut v = FdmVector3::new(size, 0.0);
        v.par_for_each_mut(|(i, j, k), out| *out = (i + 2 * j + 3 * k) as f64);
        let v_flat: Vec<f64> = v.data().to_vec();

        let mut r_grid = FdmVector3::new(size, 0.0);
        FdmBlas3::mvm(&a, &v, &mut r_grid);

        let mut r_comp = vec![0.0; n];
        FdmCompressedBlas3::mvm(&a_csr, &v_flat, &mut r_comp);

        for (idx, &rc) in r_comp.iter().enumerate() {
            let (i, j, k) = size.coords(idx);
            assert!((rc - r_grid[(i, j, k)]).abs() < 1e-12);
        }
    }
}
