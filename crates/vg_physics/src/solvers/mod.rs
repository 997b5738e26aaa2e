// crates/vg_physics/src/solvers/mod.rs

//! 可插拔方程求解器
//!
//! 流体求解管线的三个物理阶段各自定义窄接口，按配置注入：
//! - [`advection`]: 半拉格朗日平流（线性 / 单调三次采样）
//! - [`diffusion`]: 显式前向欧拉扩散
//! - [`pressure`]: 单相压力投影（FDM 或压缩 CSR 线性系统）
//! - [`emitter`]: 发射器接口（仅被调用，内部状态不被探查）

pub mod advection;
pub mod diffusion;
pub mod emitter;
pub mod pressure;

pub use advection::{AdvectionSolver3, CubicSemiLagrangian3, SemiLagrangian3};
pub use diffusion::{GridDiffusionSolver3, GridForwardEulerDiffusionSolver3};
pub use emitter::{FnGridEmitter3, GridEmitter3};
pub use pressure::{GridPressureSolver3, GridSinglePhasePressureSolver3};
