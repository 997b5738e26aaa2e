// crates/vg_physics/src/numerics/value.rs

//! 网格值类型抽象
//!
//! 采样器与外插例程同时作用于标量场（f64）和向量场（DVec3），
//! [`GridValue`] 以最小算子集合统一两者。单调 Catmull-Rom 的
//! 单调性钳制按分量进行，向量实现逐分量委托标量实现。

use glam::DVec3;

/// 可存储于网格并参与插值/外插的值类型
pub trait GridValue: Copy + Default + Send + Sync + 'static {
    /// 零值
    const ZERO: Self;

    /// 加法
    fn add(self, rhs: Self) -> Self;

    /// 标量缩放
    fn scale(self, s: f64) -> Self;

    /// 单调 Catmull-Rom 插值（4 控制点，t ∈ [0, 1]）
    fn monotonic_catmull_rom(f0: Self, f1: Self, f2: Self, f3: Self, t: f64) -> Self;
}

/// 标量单调 Catmull-Rom
///
/// 对导数做单调性钳制：导数与区间差分符号不一致时置零，
/// 保证插值结果不产生新的极值。
pub(crate) fn monotonic_catmull_rom_f64(f0: f64, f1: f64, f2: f64, f3: f64, t: f64) -> f64 {
    let mut d1 = (f2 - f0) / 2.0;
    let mut d2 = (f3 - f1) / 2.0;
    let delta = f2 - f1;

    if delta.abs() < f64::EPSILON {
        d1 = 0.0;
        d2 = 0.0;
    }
    if d1 * delta < 0.0 {
        d1 = 0.0;
    }
    if d2 * delta < 0.0 {
        d2 = 0.0;
    }

    let a3 = d1 + d2 - 2.0 * delta;
    let a2 = 3.0 * delta - 2.0 * d1 - d2;
    let a1 = d1;
    let a0 = f1;

    a3 * t * t * t + a2 * t * t + a1 * t + a0
}

impl GridValue for f64 {
    const ZERO: Self = 0.0;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    #[inline]
    fn scale(self, s: f64) -> Self {
        self * s
    }

    #[inline]
    fn monotonic_catmull_rom(f0: Self, f1: Self, f2: Self, f3: Self, t: f64) -> Self {
        monotonic_catmull_rom_f64(f0, f1, f2, f3, t)
    }
}

impl GridValue for DVec3 {
    const ZERO: Self = DVec3::ZERO;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    #[inline]
    fn scale(self, s: f64) -> Self {
        self * s
    }

    #[inline]
    fn monotonic_catmull_rom(f0: Self, f1: Self, f2: Self, f3: Self, t: f64) -> Self {
        DVec3::new(
            monotonic_catmull_rom_f64(f0.x, f1.x, f2.x, f3.x, t),
            monotonic_catmull_rom_f64(f0.y, f1.y, f2.y, f3.y, t),
            monotonic_catmull_rom_f64(f0.z, f1.z, f2.z, f3.z, t),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catmull_rom_endpoints() {
        // t=0 给出 f1，t=1 给出 f2
        let v = monotonic_catmull_rom_f64(0.0, 1.0, 2.0, 3.0, 0.0);
        assert!((v - 1.0).abs() < 1e-14);
        let v = monotonic_catmull_rom_f64(0.0, 1.0, 2.0, 3.0, 1.0);
        assert!((v - 2.0).abs() < 1e-14);
    }

    #[test]
    fn test_catmull_rom_linear_data() {
        // 线性数据上插值严格线性
        for step in 0..=10 {
            let t = step as f64 / 10.0;
            let v = monotonic_catmull_rom_f64(0.0, 1.0, 2.0, 3.0, t);
            assert!((v - (1.0 + t)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_catmull_rom_monotonic_clamp() {
        // 平坦区间内不产生过冲
        let v = monotonic_catmull_rom_f64(0.0, 1.0, 1.0, 0.0, 0.5);
        assert!((v - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_vector_componentwise() {
        let f0 = DVec3::new(0.0, 10.0, -1.0);
        let f1 = DVec3::new(1.0, 11.0, -2.0);
        let f2 = DVec3::new(2.0, 12.0, -3.0);
        let f3 = DVec3::new(3.0, 13.0, -4.0);
        let v = DVec3::monotonic_catmull_rom(f0, f1, f2, f3, 0.5);
        assert!((v.x - 1.5).abs() < 1e-12);
        assert!((v.y - 11.5).abs() < 1e-12);
        assert!((v.z + 2.5).abs() < 1e-12);
    }
}
