// crates/vg_physics/src/geometry/mod.rs

//! 几何抽象模块
//!
//! - [`surface`]: 隐式曲面（符号距离查询）
//! - [`field`]: 标量/向量场抽象与常量场
//! - [`collider`]: 碰撞体（曲面 + 刚体运动学）与碰撞体集合

pub mod collider;
pub mod field;
pub mod surface;

pub use collider::{
    project_and_apply_friction, Collider3, ColliderSet3, RigidBodyCollider3, SharedCollider,
};
pub use field::{ConstantScalarField3, ConstantVectorField3, ScalarField3, VectorField3};
pub use surface::{ImplicitSurface3, Plane3, Sphere3};
