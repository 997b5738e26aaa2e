// crates/vg_physics/src/engine/mod.rs

//! 引擎核心
//!
//! - [`frame`]: 帧状态（整数帧号 × 每帧秒数）
//! - [`integrator`]: CFL 自适应 / 固定计数子步进时间积分器
//! - [`fluid_solver`]: 网格流体求解器（逐子步物理管线编排）

pub mod fluid_solver;
pub mod frame;
pub mod integrator;

pub use fluid_solver::{GridFluidSolver3, GridFluidSolverConfig};
pub use frame::Frame;
pub use integrator::{PhysicsSolver, SubStepping, TimeIntegrator};
