// crates/vg_physics/src/lib.rs

//! 物理求解器模块
//!
//! 提供交错网格（MAC）流体模拟核心，包括：
//! - 数值基础 (numerics) - 稠密数组、插值采样器、稀疏线性代数
//! - 几何抽象 (geometry) - 隐式曲面、场、碰撞体
//! - 网格数据模型 (grids) - 标量/向量/面心网格与网格系统数据
//! - 边界条件 (boundary) - 分数式与阻塞式边界条件求解器
//! - 可插拔方程求解器 (solvers) - 平流、扩散、压力
//! - 引擎核心 (engine) - 帧状态、CFL 子步进驱动、流体求解管线
//!
//! # Trait 抽象
//!
//! - [`AdvectionSolver3`] / [`GridDiffusionSolver3`] / [`GridPressureSolver3`]:
//!   各物理阶段的可插拔接口
//! - [`GridBoundaryConditionSolver3`]: 碰撞体边界约束接口
//! - [`PhysicsSolver`]: 时间积分器调用的逐子步钩子

pub mod boundary;
pub mod engine;
pub mod geometry;
pub mod grids;
pub mod numerics;
pub mod solvers;

// 重导出常用类型
pub use boundary::{
    GridBlockedBoundaryConditionSolver3, GridBoundaryConditionSolver3,
    GridFractionalBoundaryConditionSolver3,
};
pub use engine::{
    Frame, GridFluidSolver3, GridFluidSolverConfig, PhysicsSolver, SubStepping, TimeIntegrator,
};
pub use geometry::{
    Collider3, ColliderSet3, ConstantScalarField3, ConstantVectorField3, ImplicitSurface3, Plane3,
    RigidBodyCollider3, ScalarField3, SharedCollider, Sphere3, VectorField3,
};
pub use grids::{
    CollocatedVectorGrid3, FaceCenteredGrid3, GridGeometry, GridSystemData3, ScalarGrid3,
    ScalarGridSpec, ScalarLayout, VectorGrid3, VectorGridSpec, VectorLayout,
};
pub use numerics::linear_algebra::{
    CsrBuilder, CsrMatrix, FdmCgSolver3, FdmCompressedLinearSystem3, FdmJacobiSolver3,
    FdmLinearSystem3, FdmLinearSystemSolver3, FdmPcgSolver3, SolverConfig,
};
pub use numerics::{Array3, Size3};
pub use solvers::{
    AdvectionSolver3, CubicSemiLagrangian3, GridDiffusionSolver3, GridEmitter3,
    GridForwardEulerDiffusionSolver3, GridPressureSolver3, GridSinglePhasePressureSolver3,
    SemiLagrangian3,
};
