// crates/vg_physics/src/geometry/surface.rs

//! 隐式曲面
//!
//! 边界条件缓存只需要对碰撞体几何做符号距离采样，
//! 这里以最小接口表达：负值在内部。

use glam::DVec3;

/// 隐式曲面（符号距离查询）
pub trait ImplicitSurface3: Send + Sync {
    /// 点到曲面的符号距离（负值在内部）
    fn signed_distance(&self, point: DVec3) -> f64;
}

/// 无限平面
///
/// 法向一侧为外部（正距离）。
#[derive(Clone, Copy, Debug)]
pub struct Plane3 {
    /// 单位法向
    pub normal: DVec3,
    /// 平面上一点
    pub point: DVec3,
}

impl Plane3 {
    /// 创建平面（法向自动归一化）
    pub fn new(normal: DVec3, point: DVec3) -> Self {
        assert!(
            normal.length_squared() > 0.0,
            "平面法向不能为零向量"
        );
        Self {
            normal: normal.normalize(),
            point,
        }
    }
}

impl ImplicitSurface3 for Plane3 {
    #[inline]
    fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point - self.point)
    }
}

/// 球面
#[derive(Clone, Copy, Debug)]
pub struct Sphere3 {
    /// 球心
    pub center: DVec3,
    /// 半径
    pub radius: f64,
}

impl Sphere3 {
    /// 创建球面
    pub fn new(center: DVec3, radius: f64) -> Self {
        assert!(radius > 0.0, "球半径必须为正");
        Self { center, radius }
    }
}

impl ImplicitSurface3 for Sphere3 {
    #[inline]
    fn signed_distance(&self, point: DVec3) -> f64 {
        (point - self.center).length() - self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_signed_distance() {
        // y = 0 平面，法向 +y
        let plane = Plane3::new(DVec3::Y, DVec3::ZERO);
        assert!((plane.signed_distance(DVec3::new(0.0, 2.0, 0.0)) - 2.0).abs() < 1e-14);
        assert!((plane.signed_distance(DVec3::new(5.0, -1.5, 3.0)) + 1.5).abs() < 1e-14);
    }

    #[test]
    fn test_plane_normalizes() {
        let plane = Plane3::new(DVec3::new(0.0, 10.0, 0.0), DVec3::ZERO);
        assert!((plane.signed_distance(DVec3::new(0.0, 1.0, 0.0)) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_sphere_signed_distance() {
        let sphere = Sphere3::new(DVec3::ZERO, 2.0);
        assert!((sphere.signed_distance(DVec3::new(3.0, 0.0, 0.0)) - 1.0).abs() < 1e-14);
        assert!((sphere.signed_distance(DVec3::ZERO) + 2.0).abs() < 1e-14);
    }
}
