// crates/vg_physics/src/numerics/linear_algebra/vector_ops.rs

//! 向量运算（BLAS Level 1 风格）
//!
//! 提供高效的向量运算函数，这些是迭代求解器的基础。
//! 支持泛型标量类型 `S: Real`（f32 或 f64）。
//!
//! # 函数列表
//!
//! - [`dot`]: 点积 x·y
//! - [`norm2`]: 二范数 ||x||₂
//! - [`norm_inf`]: 无穷范数 ||x||∞
//! - [`axpy`]: y = α*x + y
//! - [`xpay`]: y = x + α*y
//! - [`scale`]: x = α*x
//! - [`copy`]: y = x
//! - [`fill`]: x[:] = α

use vg_foundation::Real;

/// 点积 x·y
#[inline]
pub fn dot<S: Real>(x: &[S], y: &[S]) -> S {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y.iter()).map(|(&xi, &yi)| xi * yi).sum()
}

/// 二范数 ||x||₂
#[inline]
pub fn norm2<S: Real>(x: &[S]) -> S {
    dot(x, x).sqrt()
}

/// 无穷范数 ||x||∞（最大绝对值）
#[inline]
pub fn norm_inf<S: Real>(x: &[S]) -> S {
    x.iter().map(|&v| v.abs()).fold(S::ZERO, |a, b| a.max(b))
}

/// AXPY: y = α*x + y
#[inline]
pub fn axpy<S: Real>(alpha: S, x: &[S], y: &mut [S]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        *yi += alpha * xi;
    }
}

/// XPAY: y = x + α*y
#[inline]
pub fn xpay<S: Real>(x: &[S], alpha: S, y: &mut [S]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        *yi = xi + alpha * *yi;
    }
}

/// 缩放: x = α*x
#[inline]
pub fn scale<S: Real>(alpha: S, x: &mut [S]) {
    for xi in x.iter_mut() {
        *xi *= alpha;
    }
}

/// 复制: y = x
#[inline]
pub fn copy<S: Real>(x: &[S], y: &mut [S]) {
    debug_assert_eq!(x.len(), y.len());
    y.copy_from_slice(x);
}

/// 填充: x[:] = α
#[inline]
pub fn fill<S: Real>(alpha: S, x: &mut [S]) {
    x.fill(alpha);
}

/// 线性组合: z = α*x + β*y
#[inline]
pub fn linear_combination<S: Real>(alpha: S, x: &[S], beta: S, y: &[S], z: &mut [S]) {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.len(), z.len());
    for ((zi, &xi), &yi) in z.iter_mut().zip(x.iter()).zip(y.iter()) {
        *zi = alpha * xi + beta * yi;
    }
}

/// 向量差: z = x - y
#[inline]
pub fn sub<S: Real>(x: &[S], y: &[S], z: &mut [S]) {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.len(), z.len());
    for ((zi, &xi), &yi) in z.iter_mut().zip(x.iter()).zip(y.iter()) {
        *zi = xi - yi;
    }
}

/// 向量和: z = x + y
#[inline]
pub fn add<S: Real>(x: &[S], y: &[S], z: &mut [S]) {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.len(), z.len());
    for ((zi, &xi), &yi) in z.iter_mut().zip(x.iter()).zip(y.iter()) {
        *zi = xi + yi;
    }
}

/// 相对残差 ||r|| / ||b||
///
/// 若 ||b|| 接近零则返回绝对残差 ||r||。
#[inline]
pub fn relative_residual<S: Real>(residual: &[S], b: &[S]) -> S {
    let norm_r = norm2(residual);
    let norm_b = norm2(b);
    if norm_b <= S::MIN_POSITIVE {
        norm_r
    } else {
        norm_r / norm_b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot() {
        let x = vec![1.0f64, 2.0, 3.0];
        let y = vec![4.0, 5.0, 6.0];
        assert!((dot(&x, &y) - 32.0).abs() < 1e-14);
    }

    #[test]
    fn test_norm2() {
        let x = vec![3.0f64, 4.0];
        assert!((norm2(&x) - 5.0).abs() < 1e-14);
    }

    #[test]
    fn test_norm_inf() {
        let x = vec![-5.0f64, 2.0, 3.0];
        assert!((norm_inf(&x) - 5.0).abs() < 1e-14);
    }

    #[test]
    fn test_axpy() {
        let x = vec![1.0f64, 2.0, 3.0];
        let mut y = vec![4.0, 5.0, 6.0];
        axpy(2.0, &x, &mut y);
        assert_eq!(y, vec![6.0, 9.0, 12.0]);
    }

    #[test]
    fn test_xpay() {
        let x = vec![1.0f64, 2.0, 3.0];
        let mut y = vec![4.0, 5.0, 6.0];
        xpay(&x, 2.0, &mut y);
        assert_eq!(y, vec![9.0, 12.0, 15.0]);
    }

    #[test]
    fn test_scale_copy_fill() {
        let mut x = vec![1.0f64, 2.0];
        scale(3.0, &mut x);
        assert_eq!(x, vec![3.0, 6.0]);

        let mut y = vec![0.0f64; 2];
        copy(&x, &mut y);
        assert_eq!(y, x);

        fill(7.0, &mut y);
        assert_eq!(y, vec![7.0, 7.0]);
    }

    #[test]
    fn test_linear_combination() {
        let x = vec![1.0f64, 2.0];
        let y = vec![3.0, 4.0];
        let mut z = vec![0.0; 2];
        linear_combination(2.0, &x, 3.0, &y, &mut z);
        assert_eq!(z, vec![11.0, 16.0]);
    }

    #[test]
    fn test_relative_residual() {
        let r = vec![0.3f64, 0.4];
        let b = vec![3.0, 4.0];
        assert!((relative_residual(&r, &b) - 0.1).abs() < 1e-14);
    }

    #[test]
    fn test_generic_f32() {
        let x = vec![1.0f32, 2.0];
        let y = vec![3.0f32, 4.0];
        assert!((dot(&x, &y) - 11.0).abs() < 1e-6);
    }
}
