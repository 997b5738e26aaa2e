// crates/vg_physics/src/boundary/mod.rs

//! 边界条件求解器
//!
//! 给定碰撞体，构建其符号距离场 + 速度场缓存，并把面心速度场
//! 约束到碰撞体边界上（无穿透，可选无滑移/摩擦），同时处理
//! 计算域六个方向的封闭/开放标志。
//!
//! 两个变体：
//! - [`GridFractionalBoundaryConditionSolver3`]: 分数式（亚单元精度），
//!   与分数式压力求解器配对
//! - [`GridBlockedBoundaryConditionSolver3`]: 阻塞式（整单元标记），
//!   在分数式约束之后以精确的碰撞体运动学覆写流体邻接面

pub mod blocked;
pub mod fractional;

use glam::DVec3;

use crate::geometry::collider::SharedCollider;
use crate::grids::face_centered::FaceCenteredGrid3;
use crate::grids::scalar_grid::ScalarGrid3;
use crate::numerics::size3::Size3;

pub use blocked::GridBlockedBoundaryConditionSolver3;
pub use fractional::GridFractionalBoundaryConditionSolver3;

/// 边界条件求解器接口
///
/// 缓存契约：`update_collider` 每次调用都会重建 SDF + 速度缓存
/// （对相同参数的重复调用不做记忆化）；`constrain_velocity`
/// 在一次缓存有效期内可以被多次调用。
pub trait GridBoundaryConditionSolver3: Send + Sync {
    /// 应用新碰撞体并重建内部缓存
    ///
    /// 网格参数描述将被约束的速度场几何，作为缓存构建提示。
    fn update_collider(
        &mut self,
        collider: Option<SharedCollider>,
        grid_size: Size3,
        grid_spacing: DVec3,
        grid_origin: DVec3,
    );

    /// 当前关联的碰撞体
    fn collider(&self) -> Option<&SharedCollider>;

    /// 就地约束速度场
    ///
    /// `extrapolation_depth` 为向碰撞体内部外插速度的单元层数。
    fn constrain_velocity(&mut self, velocity: &mut FaceCenteredGrid3, extrapolation_depth: u32);

    /// 碰撞体符号距离场缓存（无碰撞体时处处为 +MAX）
    fn collider_sdf(&self) -> &ScalarGrid3;

    /// 碰撞体在点处的速度（无碰撞体时为零）
    fn collider_velocity_at(&self, point: DVec3) -> DVec3;

    /// 封闭域边界标志
    fn closed_domain_boundary_flag(&self) -> u32;

    /// 设置封闭域边界标志
    fn set_closed_domain_boundary_flag(&mut self, flag: u32);
}
