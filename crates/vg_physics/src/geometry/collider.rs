// crates/vg_physics/src/geometry/collider.rs

//! 碰撞体
//!
//! 碰撞体 = 隐式曲面 + 刚体运动学。流体求解器与边界条件缓存
//! 同时引用同一个碰撞体，这是本 crate 唯一真正被多方别名的对象，
//! 以 `Arc<RwLock<dyn Collider3>>` 共享；其余对象保持独占所有权。

use std::sync::Arc;

use glam::DVec3;
use parking_lot::RwLock;

use super::surface::ImplicitSurface3;

/// 共享碰撞体句柄
pub type SharedCollider = Arc<RwLock<dyn Collider3>>;

/// 碰撞体
pub trait Collider3: Send + Sync {
    /// 点到碰撞体表面的符号距离（负值在内部）
    fn signed_distance(&self, point: DVec3) -> f64;

    /// 碰撞体在点处的速度
    fn velocity_at(&self, point: DVec3) -> DVec3;

    /// 摩擦系数（0 = 自由滑移）
    fn friction_coefficient(&self) -> f64 {
        0.0
    }

    /// 按时间推进碰撞体状态
    fn update(&mut self, current_time_in_seconds: f64, time_interval_in_seconds: f64) {
        let _ = (current_time_in_seconds, time_interval_in_seconds);
    }
}

/// 刚体碰撞体
///
/// `velocity_at(p) = v + ω × (p − 变换原点)`。平移速度按时间累积
/// 到变换原点上，SDF 查询随之平移（角速度只贡献速度场，
/// 不旋转几何）。
pub struct RigidBodyCollider3 {
    surface: Box<dyn ImplicitSurface3>,
    /// 平移速度
    pub linear_velocity: DVec3,
    /// 角速度
    pub angular_velocity: DVec3,
    /// 摩擦系数
    pub friction_coefficient: f64,
    translation: DVec3,
}

impl RigidBodyCollider3 {
    /// 以静止状态创建
    pub fn new(surface: Box<dyn ImplicitSurface3>) -> Self {
        Self {
            surface,
            linear_velocity: DVec3::ZERO,
            angular_velocity: DVec3::ZERO,
            friction_coefficient: 0.0,
            translation: DVec3::ZERO,
        }
    }

    /// 设置平移与角速度
    pub fn with_velocity(mut self, linear: DVec3, angular: DVec3) -> Self {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
        self
    }

    /// 设置摩擦系数
    pub fn with_friction(mut self, friction_coefficient: f64) -> Self {
        self.friction_coefficient = friction_coefficient.max(0.0);
        self
    }

    /// 当前变换原点（累积平移）
    pub fn translation(&self) -> DVec3 {
        self.translation
    }

    /// 包装为共享句柄
    pub fn into_shared(self) -> SharedCollider {
        Arc::new(RwLock::new(self))
    }
}

impl Collider3 for RigidBodyCollider3 {
    fn signed_distance(&self, point: DVec3) -> f64 {
        self.surface.signed_distance(point - self.translation)
    }

    fn velocity_at(&self, point: DVec3) -> DVec3 {
        self.linear_velocity + self.angular_velocity.cross(point - self.translation)
    }

    fn friction_coefficient(&self) -> f64 {
        self.friction_coefficient
    }

    fn update(&mut self, _current_time_in_seconds: f64, time_interval_in_seconds: f64) {
        self.translation += self.linear_velocity * time_interval_in_seconds;
    }
}

/// 碰撞体集合
///
/// 合并 SDF 取成员最小值，速度与摩擦取距离最近成员。
pub struct ColliderSet3 {
    colliders: Vec<SharedCollider>,
}

impl ColliderSet3 {
    /// 创建空集合
    pub fn new() -> Self {
        Self {
            colliders: Vec::new(),
        }
    }

    /// 加入碰撞体
    pub fn add_collider(&mut self, collider: SharedCollider) {
        self.colliders.push(collider);
    }

    /// 成员数量
    pub fn number_of_colliders(&self) -> usize {
        self.colliders.len()
    }

    /// 包装为共享句柄
    pub fn into_shared(self) -> SharedCollider {
        Arc::new(RwLock::new(self))
    }

    fn closest_index(&self, point: DVec3) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, c) in self.colliders.iter().enumerate() {
            let d = c.read().signed_distance(point);
            match best {
                Some((_, bd)) if d >= bd => {}
                _ => best = Some((idx, d)),
            }
        }
        best.map(|(idx, _)| idx)
    }
}

impl Default for ColliderSet3 {
    fn default() -> Self {
        Self::new()
    }
}

impl Collider3 for ColliderSet3 {
    fn signed_distance(&self, point: DVec3) -> f64 {
        self.colliders
            .iter()
            .map(|c| c.read().signed_distance(point))
            .fold(f64::MAX, f64::min)
    }

    fn velocity_at(&self, point: DVec3) -> DVec3 {
        match self.closest_index(point) {
            Some(idx) => self.colliders[idx].read().velocity_at(point),
            None => DVec3::ZERO,
        }
    }

    fn friction_coefficient(&self) -> f64 {
        // 集合整体无单一摩擦系数，取成员最大值以偏保守
        self.colliders
            .iter()
            .map(|c| c.read().friction_coefficient())
            .fold(0.0, f64::max)
    }

    fn update(&mut self, current_time_in_seconds: f64, time_interval_in_seconds: f64) {
        for c in &self.colliders {
            c.write()
                .update(current_time_in_seconds, time_interval_in_seconds);
        }
    }
}

/// 去除法向分量并施加摩擦衰减
///
/// 输入相对速度与界面法向，返回约束后的切向速度：
/// 切向分量按库仑型系数 `μ·|v_n| / |v_t|` 衰减，最多衰减至零。
pub fn project_and_apply_friction(
    relative_velocity: DVec3,
    normal: DVec3,
    friction_coefficient: f64,
) -> DVec3 {
    let normal_component = relative_velocity.dot(normal);
    let mut tangential = relative_velocity - normal_component * normal;

    if tangential.length_squared() > 0.0 && friction_coefficient > 0.0 {
        let normal_magnitude = (-normal_component).max(0.0);
        let scale =
            (1.0 - friction_coefficient * normal_magnitude / tangential.length()).max(0.0);
        tangential *= scale;
    }
    tangential
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::surface::{Plane3, Sphere3};

    #[test]
    fn test_rigid_body_velocity_at() {
        let collider = RigidBodyCollider3::new(Box::new(Plane3::new(DVec3::Y, DVec3::ZERO)))
            .with_velocity(DVec3::new(1.0, 0.0, 0.0), DVec3::new(0.0, 0.0, 2.0));

        // v + ω × (p - origin): (1,0,0) + (0,0,2) × (0,1,0) = (1,0,0) + (-2,0,0)
        let v = collider.velocity_at(DVec3::new(0.0, 1.0, 0.0));
        assert!((v - DVec3::new(-1.0, 0.0, 0.0)).length() < 1e-14);
    }

    #[test]
    fn test_update_translates_sdf() {
        let mut collider =
            RigidBodyCollider3::new(Box::new(Sphere3::new(DVec3::ZERO, 1.0)))
                .with_velocity(DVec3::new(2.0, 0.0, 0.0), DVec3::ZERO);

        // 推进 0.5 秒：球心移动到 x = 1
        collider.update(0.0, 0.5);
        assert!((collider.translation() - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-14);
        assert!((collider.signed_distance(DVec3::new(1.0, 0.0, 0.0)) + 1.0).abs() < 1e-14);
        assert!((collider.signed_distance(DVec3::new(3.0, 0.0, 0.0)) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_collider_set_merged_sdf() {
        let a = RigidBodyCollider3::new(Box::new(Sphere3::new(DVec3::ZERO, 1.0))).into_shared();
        let b = RigidBodyCollider3::new(Box::new(Sphere3::new(
            DVec3::new(5.0, 0.0, 0.0),
            1.0,
        )))
        .into_shared();

        let mut set = ColliderSet3::new();
        set.add_collider(a);
        set.add_collider(b);

        // 在第二个球附近，合并 SDF 由它主导
        let d = set.signed_distance(DVec3::new(5.0, 0.0, 0.0));
        assert!((d + 1.0).abs() < 1e-14);
        // 两球之间取较近者
        let d = set.signed_distance(DVec3::new(2.0, 0.0, 0.0));
        assert!((d - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_collider_set_velocity_of_closest() {
        let a = RigidBodyCollider3::new(Box::new(Sphere3::new(DVec3::ZERO, 1.0)))
            .with_velocity(DVec3::X, DVec3::ZERO)
            .into_shared();
        let b = RigidBodyCollider3::new(Box::new(Sphere3::new(DVec3::new(10.0, 0.0, 0.0), 1.0)))
            .with_velocity(DVec3::Y, DVec3::ZERO)
            .into_shared();

        let mut set = ColliderSet3::new();
        set.add_collider(a);
        set.add_collider(b);

        assert_eq!(set.velocity_at(DVec3::new(1.0, 0.0, 0.0)), DVec3::X);
        assert_eq!(set.velocity_at(DVec3::new(9.0, 0.0, 0.0)), DVec3::Y);
    }

    #[test]
    fn test_empty_set_velocity_zero() {
        let set = ColliderSet3::new();
        assert_eq!(set.velocity_at(DVec3::ZERO), DVec3::ZERO);
        assert_eq!(set.signed_distance(DVec3::ZERO), f64::MAX);
    }

    #[test]
    fn test_friction_projection_removes_normal() {
        // 无摩擦：只去掉法向分量
        let v = DVec3::new(1.0, -2.0, 0.0);
        let t = project_and_apply_friction(v, DVec3::Y, 0.0);
        assert!((t - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-14);
    }

    #[test]
    fn test_friction_damps_tangential() {
        // 大摩擦系数下切向完全衰减
        let v = DVec3::new(0.1, -10.0, 0.0);
        let t = project_and_apply_friction(v, DVec3::Y, 1.0);
        assert!(t.length() < 1e-14);
    }
}
