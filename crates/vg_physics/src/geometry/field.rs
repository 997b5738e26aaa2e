// crates/vg_physics/src/geometry/field.rs

//! 标量/向量场抽象
//!
//! 求解器之间以场接口交换数据：扩散/压力求解器接受任意
//! `ScalarField3` 作为边界与流体 SDF，平流求解器接受任意
//! `VectorField3` 作为流场。网格类型实现这些接口。

use glam::DVec3;

/// 标量场
pub trait ScalarField3: Send + Sync {
    /// 在点处采样
    fn sample(&self, point: DVec3) -> f64;
}

/// 向量场
pub trait VectorField3: Send + Sync {
    /// 在点处采样
    fn sample(&self, point: DVec3) -> DVec3;
}

/// 常量标量场
#[derive(Clone, Copy, Debug)]
pub struct ConstantScalarField3 {
    value: f64,
}

impl ConstantScalarField3 {
    /// 创建常量场
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl ScalarField3 for ConstantScalarField3 {
    #[inline]
    fn sample(&self, _point: DVec3) -> f64 {
        self.value
    }
}

/// 常量向量场
#[derive(Clone, Copy, Debug)]
pub struct ConstantVectorField3 {
    value: DVec3,
}

impl ConstantVectorField3 {
    /// 创建常量场
    pub fn new(value: DVec3) -> Self {
        Self { value }
    }
}

impl VectorField3 for ConstantVectorField3 {
    #[inline]
    fn sample(&self, _point: DVec3) -> DVec3 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_fields() {
        let s = ConstantScalarField3::new(-3.5);
        assert_eq!(s.sample(DVec3::new(1.0, 2.0, 3.0)), -3.5);

        let v = ConstantVectorField3::new(DVec3::new(1.0, 0.0, -1.0));
        assert_eq!(v.sample(DVec3::ZERO), DVec3::new(1.0, 0.0, -1.0));
    }
}
