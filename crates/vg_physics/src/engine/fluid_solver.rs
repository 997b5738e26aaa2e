// crates/vg_physics/src/engine/fluid_solver.rs

//! 网格流体求解器
//!
//! 逐子步物理管线的编排器：
//!
//! 1. 子步开始：推进碰撞体/发射器运动学，刷新边界条件缓存，
//!    防御性地重新施加速度约束，触发用户钩子
//! 2. 外力：重力 × dt 加到速度场
//! 3. 粘性：按 (系数, dt) 扩散速度
//! 4. 压力：求解无散度场
//! 5. 平流：先平流各可平流层（速度除外），再让速度场穿过
//!    自身的平流前快照做自平流——顺序不可交换
//! 6. 子步结束：用户钩子
//!
//! 每个阶段之后重新施加边界约束；每个阶段都遵循"从上一阶段的
//! 不可变快照读、向活动网格写"的纪律，阶段内部无反馈。
//! 缺失的子求解器意味着跳过对应阶段，不是错误。

use std::sync::atomic::{AtomicU64, Ordering};

use glam::DVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use vg_foundation::constants::{DIRECTION_ALL, EPSILON_D, MAX_D};
use vg_foundation::{ensure, VgError, VgResult};

use super::integrator::PhysicsSolver;
use crate::boundary::GridBoundaryConditionSolver3;
use crate::geometry::collider::SharedCollider;
use crate::geometry::field::{ConstantScalarField3, ScalarField3, VectorField3};
use crate::grids::collocated::CollocatedVectorGrid3;
use crate::grids::face_centered::FaceCenteredGrid3;
use crate::grids::scalar_grid::ScalarGrid3;
use crate::grids::system_data::GridSystemData3;
use crate::grids::vector_grid::VectorGrid3;
use crate::numerics::array3::Array3;
use crate::numerics::extrapolation::extrapolate_to_region;
use crate::numerics::level_set::is_inside_sdf;
use crate::numerics::size3::Size3;
use crate::solvers::advection::{AdvectionSolver3, CubicSemiLagrangian3};
use crate::solvers::diffusion::{GridDiffusionSolver3, GridForwardEulerDiffusionSolver3};
use crate::solvers::emitter::GridEmitter3;
use crate::solvers::pressure::{GridPressureSolver3, GridSinglePhasePressureSolver3};

/// 流体求解器配置
///
/// 普通选项结构体 + 默认值，替代延迟构建链。
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GridFluidSolverConfig {
    /// 网格分辨率
    pub resolution: Size3,
    /// 网格间距
    pub grid_spacing: DVec3,
    /// 网格原点
    pub origin: DVec3,
    /// 重力加速度
    pub gravity: DVec3,
    /// 粘性系数
    pub viscosity_coefficient: f64,
    /// 最大允许 CFL 数
    pub max_cfl: f64,
    /// 压力求解使用压缩线性系统
    pub use_compressed_linear_system: bool,
    /// 封闭域边界标志
    pub closed_domain_boundary_flag: u32,
}

impl Default for GridFluidSolverConfig {
    fn default() -> Self {
        Self {
            resolution: Size3::new(1, 1, 1),
            grid_spacing: DVec3::ONE,
            origin: DVec3::ZERO,
            gravity: DVec3::new(0.0, -9.8, 0.0),
            viscosity_coefficient: 0.0,
            max_cfl: 5.0,
            use_compressed_linear_system: false,
            closed_domain_boundary_flag: DIRECTION_ALL,
        }
    }
}

impl GridFluidSolverConfig {
    /// 校验配置
    pub fn validate(&self) -> VgResult<()> {
        ensure!(
            self.grid_spacing.x > 0.0 && self.grid_spacing.y > 0.0 && self.grid_spacing.z > 0.0,
            VgError::invalid_input("网格间距必须严格为正")
        );
        ensure!(
            self.max_cfl > 0.0,
            VgError::out_of_range("max_cfl", self.max_cfl, 0.0, f64::MAX)
        );
        ensure!(
            self.viscosity_coefficient >= 0.0,
            VgError::out_of_range(
                "viscosity_coefficient",
                self.viscosity_coefficient,
                0.0,
                f64::MAX
            )
        );
        Ok(())
    }
}

/// 边界条件求解器缓存的碰撞体速度场视图
struct BoundaryVelocityField<'a> {
    solver: &'a dyn GridBoundaryConditionSolver3,
}

impl VectorField3 for BoundaryVelocityField<'_> {
    fn sample(&self, point: DVec3) -> DVec3 {
        self.solver.collider_velocity_at(point)
    }
}

/// 网格流体求解器
pub struct GridFluidSolver3 {
    grids: GridSystemData3,
    collider: Option<SharedCollider>,
    emitter: Option<Box<dyn GridEmitter3>>,

    advection_solver: Option<Box<dyn AdvectionSolver3>>,
    diffusion_solver: Option<Box<dyn GridDiffusionSolver3>>,
    pressure_solver: Option<Box<dyn GridPressureSolver3>>,
    boundary_condition_solver: Box<dyn GridBoundaryConditionSolver3>,

    gravity: DVec3,
    viscosity_coefficient: f64,
    max_cfl: f64,
    use_compressed_linear_system: bool,
    closed_domain_boundary_flag: u32,

    on_begin_advance_time_step: Option<Box<dyn FnMut(f64, f64) + Send>>,
    on_end_advance_time_step: Option<Box<dyn FnMut(f64, f64) + Send>>,
}

impl GridFluidSolver3 {
    /// 以配置创建求解器
    ///
    /// 默认管线：单调三次半拉格朗日平流 + 前向欧拉扩散 +
    /// 单相压力投影；边界条件求解器由压力求解器建议接线。
    pub fn new(config: GridFluidSolverConfig) -> Self {
        let grids = GridSystemData3::new(config.resolution, config.grid_spacing, config.origin);

        let pressure_solver = GridSinglePhasePressureSolver3::new();
        let mut boundary_condition_solver = pressure_solver.suggested_boundary_condition_solver();
        boundary_condition_solver
            .set_closed_domain_boundary_flag(config.closed_domain_boundary_flag);

        Self {
            grids,
            collider: None,
            emitter: None,
            advection_solver: Some(Box::new(CubicSemiLagrangian3::new())),
            diffusion_solver: Some(Box::new(GridForwardEulerDiffusionSolver3::new())),
            pressure_solver: Some(Box::new(pressure_solver)),
            boundary_condition_solver,
            gravity: config.gravity,
            viscosity_coefficient: config.viscosity_coefficient.max(0.0),
            max_cfl: config.max_cfl.max(EPSILON_D),
            use_compressed_linear_system: config.use_compressed_linear_system,
            closed_domain_boundary_flag: config.closed_domain_boundary_flag,
            on_begin_advance_time_step: None,
            on_end_advance_time_step: None,
        }
    }

    /// 校验配置后创建求解器
    pub fn try_new(config: GridFluidSolverConfig) -> VgResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    // ------------------------------------------------------------
    // 访问器与配置
    // ------------------------------------------------------------

    /// 重力加速度
    pub fn gravity(&self) -> DVec3 {
        self.gravity
    }

    /// 设置重力加速度
    pub fn set_gravity(&mut self, gravity: DVec3) {
        self.gravity = gravity;
    }

    /// 粘性系数
    pub fn viscosity_coefficient(&self) -> f64 {
        self.viscosity_coefficient
    }

    /// 设置粘性系数（负值钳为 0）
    pub fn set_viscosity_coefficient(&mut self, value: f64) {
        self.viscosity_coefficient = value.max(0.0);
    }

    /// 最大允许 CFL 数
    pub fn max_cfl(&self) -> f64 {
        self.max_cfl
    }

    /// 设置最大允许 CFL 数（下限为机器精度）
    pub fn set_max_cfl(&mut self, value: f64) {
        self.max_cfl = value.max(EPSILON_D);
    }

    /// 压力求解是否使用压缩线性系统
    pub fn use_compressed_linear_system(&self) -> bool {
        self.use_compressed_linear_system
    }

    /// 设置压缩线性系统开关
    pub fn set_use_compressed_linear_system(&mut self, on: bool) {
        self.use_compressed_linear_system = on;
    }

    /// 封闭域边界标志
    pub fn closed_domain_boundary_flag(&self) -> u32 {
        self.closed_domain_boundary_flag
    }

    /// 设置封闭域边界标志（同步到边界条件求解器）
    pub fn set_closed_domain_boundary_flag(&mut self, flag: u32) {
        self.closed_domain_boundary_flag = flag;
        self.boundary_condition_solver
            .set_closed_domain_boundary_flag(flag);
    }

    /// 碰撞体
    pub fn collider(&self) -> Option<&SharedCollider> {
        self.collider.as_ref()
    }

    /// 设置碰撞体
    pub fn set_collider(&mut self, collider: Option<SharedCollider>) {
        self.collider = collider;
    }

    /// 设置发射器
    pub fn set_emitter(&mut self, emitter: Option<Box<dyn GridEmitter3>>) {
        self.emitter = emitter;
    }

    /// 设置平流求解器（None 表示跳过平流阶段）
    pub fn set_advection_solver(&mut self, solver: Option<Box<dyn AdvectionSolver3>>) {
        self.advection_solver = solver;
    }

    /// 设置扩散求解器（None 表示跳过粘性阶段）
    pub fn set_diffusion_solver(&mut self, solver: Option<Box<dyn GridDiffusionSolver3>>) {
        self.diffusion_solver = solver;
    }

    /// 设置压力求解器（None 表示跳过压力阶段）
    ///
    /// 安装新压力求解器时，自动换上它建议的边界条件求解器并
    /// 重新施加封闭域标志。
    pub fn set_pressure_solver(&mut self, solver: Option<Box<dyn GridPressureSolver3>>) {
        self.pressure_solver = solver;
        if let Some(s) = &self.pressure_solver {
            self.boundary_condition_solver = s.suggested_boundary_condition_solver();
            self.boundary_condition_solver
                .set_closed_domain_boundary_flag(self.closed_domain_boundary_flag);
        }
    }

    /// 网格系统数据
    pub fn grid_system_data(&self) -> &GridSystemData3 {
        &self.grids
    }

    /// 网格系统数据（可变，供注册层使用）
    pub fn grid_system_data_mut(&mut self) -> &mut GridSystemData3 {
        &mut self.grids
    }

    /// 速度场
    pub fn velocity(&self) -> &FaceCenteredGrid3 {
        self.grids.velocity()
    }

    /// 调整网格尺寸（所有层步调一致）
    pub fn resize_grid(&mut self, resolution: Size3, grid_spacing: DVec3, origin: DVec3) {
        self.grids.resize(resolution, grid_spacing, origin);
    }

    /// 分辨率
    pub fn resolution(&self) -> Size3 {
        self.grids.resolution()
    }

    /// 网格间距
    pub fn grid_spacing(&self) -> DVec3 {
        self.grids.grid_spacing()
    }

    /// 网格原点
    pub fn grid_origin(&self) -> DVec3 {
        self.grids.origin()
    }

    /// 子步开始钩子
    pub fn set_on_begin_advance_time_step<F>(&mut self, callback: F)
    where
        F: FnMut(f64, f64) + Send + 'static,
    {
        self.on_begin_advance_time_step = Some(Box::new(callback));
    }

    /// 子步结束钩子
    pub fn set_on_end_advance_time_step<F>(&mut self, callback: F)
    where
        F: FnMut(f64, f64) + Send + 'static,
    {
        self.on_end_advance_time_step = Some(Box::new(callback));
    }

    // ------------------------------------------------------------
    // CFL
    // ------------------------------------------------------------

    /// 候选时间步的 CFL 数
    ///
    /// `max_{cell} |v_center + dt·g| · dt / min(h)`，逐分量取绝对值。
    pub fn cfl(&self, time_interval_in_seconds: f64) -> f64 {
        let vel = self.grids.velocity();
        let res = vel.resolution();
        if res.is_empty() {
            return 0.0;
        }

        let gravity = self.gravity;
        let max_vel_bits = AtomicU64::new(0f64.to_bits());
        (0..res.volume()).into_par_iter().for_each(|idx| {
            let (i, j, k) = res.coords(idx);
            let v = vel.value_at_cell_center(i, j, k) + time_interval_in_seconds * gravity;
            let m = v.x.abs().max(v.y.abs()).max(v.z.abs());
            max_vel_bits.fetch_max(m.to_bits(), Ordering::Relaxed);
        });
        let max_vel = f64::from_bits(max_vel_bits.load(Ordering::Relaxed));

        let h = self.grids.grid_spacing();
        let min_grid_size = h.x.min(h.y).min(h.z);
        max_vel * time_interval_in_seconds / min_grid_size
    }

    // ------------------------------------------------------------
    // 子步阶段
    // ------------------------------------------------------------

    fn update_collider(&mut self, current_time: f64, dt: f64) {
        if let Some(c) = &self.collider {
            c.write().update(current_time, dt);
        }
    }

    fn update_emitter(&mut self, current_time: f64, dt: f64) {
        if let Some(emitter) = &mut self.emitter {
            emitter.update(&mut self.grids, current_time, dt);
        }
    }

    fn begin_advance_time_step(&mut self, current_time: f64, dt: f64) {
        // 推进碰撞体与发射器运动学
        self.update_collider(current_time, dt);
        self.update_emitter(current_time, dt);

        // 以最新碰撞体 + 网格几何刷新边界条件缓存
        let resolution = self.grids.resolution();
        let grid_spacing = self.grids.grid_spacing();
        let origin = self.grids.origin();
        self.boundary_condition_solver.update_collider(
            self.collider.clone(),
            resolution,
            grid_spacing,
            origin,
        );

        // 外部代码可能改动过速度场，防御性地重新约束
        self.apply_boundary_condition();

        if let Some(callback) = &mut self.on_begin_advance_time_step {
            callback(current_time, dt);
        }
    }

    fn end_advance_time_step(&mut self, current_time: f64, dt: f64) {
        if let Some(callback) = &mut self.on_end_advance_time_step {
            callback(current_time, dt);
        }
    }

    fn apply_boundary_condition(&mut self) {
        let depth = self.max_cfl.ceil() as u32;
        let Self {
            grids,
            boundary_condition_solver,
            ..
        } = self;
        boundary_condition_solver.constrain_velocity(grids.velocity_mut(), depth);
    }

    fn compute_external_forces(&mut self, dt: f64) {
        self.compute_gravity(dt);
    }

    fn compute_gravity(&mut self, dt: f64) {
        if self.gravity.length_squared() <= EPSILON_D {
            return;
        }

        let g = self.gravity;
        let vel = self.grids.velocity_mut();
        if g.x.abs() > EPSILON_D {
            vel.u_mut().par_for_each_mut(|_, v| *v += dt * g.x);
        }
        if g.y.abs() > EPSILON_D {
            vel.v_mut().par_for_each_mut(|_, v| *v += dt * g.y);
        }
        if g.z.abs() > EPSILON_D {
            vel.w_mut().par_for_each_mut(|_, v| *v += dt * g.z);
        }

        self.apply_boundary_condition();
    }

    /// 流体 SDF：单相求解器视整个域为流体
    fn fluid_sdf() -> ConstantScalarField3 {
        ConstantScalarField3::new(-MAX_D)
    }

    fn compute_viscosity(&mut self, dt: f64) {
        if self.viscosity_coefficient <= EPSILON_D {
            return;
        }

        let Self {
            grids,
            diffusion_solver,
            boundary_condition_solver,
            viscosity_coefficient,
            ..
        } = self;
        let Some(solver) = diffusion_solver else {
            return;
        };

        // 快照-再-变换：从上一阶段的不可变克隆读，写入活动网格
        let vel0 = grids.velocity().clone();
        let fluid_sdf = Self::fluid_sdf();
        solver.solve_face_centered_vector(
            &vel0,
            *viscosity_coefficient,
            dt,
            grids.velocity_mut(),
            boundary_condition_solver.collider_sdf(),
            &fluid_sdf,
        );

        self.apply_boundary_condition();
    }

    fn compute_pressure(&mut self, dt: f64) {
        let Self {
            grids,
            pressure_solver,
            boundary_condition_solver,
            use_compressed_linear_system,
            ..
        } = self;
        let Some(solver) = pressure_solver else {
            return;
        };

        let vel0 = grids.velocity().clone();
        let fluid_sdf = Self::fluid_sdf();
        let bc: &dyn GridBoundaryConditionSolver3 = &**boundary_condition_solver;
        let boundary_velocity = BoundaryVelocityField { solver: bc };
        solver.solve(
            &vel0,
            dt,
            grids.velocity_mut(),
            bc.collider_sdf(),
            &boundary_velocity,
            &fluid_sdf,
            *use_compressed_linear_system,
        );

        self.apply_boundary_condition();
    }

    fn compute_advection(&mut self, dt: f64) {
        let depth = self.max_cfl.ceil() as u32;
        {
            let Self {
                grids,
                advection_solver,
                boundary_condition_solver,
                ..
            } = self;
            let Some(solver) = advection_solver else {
                return;
            };
            let bc: &dyn GridBoundaryConditionSolver3 = &**boundary_condition_solver;

            // 各可平流标量层：以当前（平流前）速度为流场
            let (scalars, velocity) = grids.split_scalars_and_velocity();
            for grid in scalars.iter_mut() {
                let grid0 = grid.clone();
                solver.advect_scalar(&grid0, velocity, dt, grid, bc.collider_sdf());
                extrapolate_into_collider_scalar(grid, bc, depth);
            }

            // 各可平流向量层（速度层除外）
            let (before, after, velocity) = grids.split_vectors_and_velocity();
            for grid in before.iter_mut().chain(after.iter_mut()) {
                match grid {
                    VectorGrid3::Collocated(g) => {
                        let g0 = g.clone();
                        solver.advect_collocated_vector(&g0, velocity, dt, g, bc.collider_sdf());
                        extrapolate_into_collider_collocated(g, bc, depth);
                    }
                    VectorGrid3::FaceCentered(g) => {
                        let g0 = g.clone();
                        solver.advect_face_centered_vector(
                            &g0,
                            velocity,
                            dt,
                            g,
                            bc.collider_sdf(),
                        );
                        extrapolate_into_collider_face_centered(g, bc, depth);
                    }
                }
            }

            // 速度自平流：快照既是流场也是被输运量，结果写入活动网格
            let vel0 = grids.velocity().clone();
            solver.advect_face_centered_vector(
                &vel0,
                &vel0,
                dt,
                grids.velocity_mut(),
                bc.collider_sdf(),
            );
        }

        self.apply_boundary_condition();
    }
}

impl PhysicsSolver for GridFluidSolver3 {
    fn on_initialize(&mut self, current_time_in_seconds: f64) {
        // 碰撞体与发射器同样影响初始条件
        self.update_collider(current_time_in_seconds, 0.0);
        self.update_emitter(current_time_in_seconds, 0.0);
    }

    fn on_advance_time_step(&mut self, current_time_in_seconds: f64, time_interval_in_seconds: f64) {
        if self.grids.resolution().is_empty() {
            log::warn!("空网格，跳过本子步模拟");
            return;
        }

        self.begin_advance_time_step(current_time_in_seconds, time_interval_in_seconds);

        self.compute_external_forces(time_interval_in_seconds);
        self.compute_viscosity(time_interval_in_seconds);
        self.compute_pressure(time_interval_in_seconds);
        self.compute_advection(time_interval_in_seconds);

        self.end_advance_time_step(current_time_in_seconds, time_interval_in_seconds);
    }

    fn number_of_sub_time_steps(&self, time_interval_in_seconds: f64) -> u32 {
        let current_cfl = self.cfl(time_interval_in_seconds);
        (current_cfl / self.max_cfl).ceil().max(1.0) as u32
    }
}

// ------------------------------------------------------------
// 向碰撞体遮挡单元外插
// ------------------------------------------------------------
//
// 标记约定：0 = 被碰撞体遮挡（待外插），1 = 有效流体侧。
// 深度为 ceil(max_cfl) 个单元层，超出深度的单元保持原值。

fn build_collider_marker<P>(
    size: Size3,
    pos: P,
    bc: &dyn GridBoundaryConditionSolver3,
) -> Array3<u8>
where
    P: Fn(usize, usize, usize) -> DVec3 + Sync + Send,
{
    let sdf = bc.collider_sdf();
    let mut marker = Array3::new(size, 1u8);
    marker.par_for_each_mut(|(i, j, k), m| {
        *m = if is_inside_sdf(sdf.sample(pos(i, j, k))) {
            0
        } else {
            1
        };
    });
    marker
}

fn extrapolate_into_collider_scalar(
    grid: &mut ScalarGrid3,
    bc: &dyn GridBoundaryConditionSolver3,
    depth: u32,
) {
    let origin = grid.data_origin();
    let h = grid.grid_spacing();
    let marker = build_collider_marker(
        grid.data_size(),
        move |i, j, k| origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z),
        bc,
    );
    let input = grid.data().clone();
    extrapolate_to_region(&input, &marker, depth, grid.data_mut());
}

fn extrapolate_into_collider_collocated(
    grid: &mut CollocatedVectorGrid3,
    bc: &dyn GridBoundaryConditionSolver3,
    depth: u32,
) {
    let origin = grid.data_origin();
    let h = grid.grid_spacing();
    let marker = build_collider_marker(
        grid.data_size(),
        move |i, j, k| origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z),
        bc,
    );
    let input = grid.data().clone();
    extrapolate_to_region(&input, &marker, depth, grid.data_mut());
}

fn extrapolate_into_collider_face_centered(
    grid: &mut FaceCenteredGrid3,
    bc: &dyn GridBoundaryConditionSolver3,
    depth: u32,
) {
    let h = grid.grid_spacing();

    let u_origin = grid.u_origin();
    let u_marker = build_collider_marker(
        grid.u().size(),
        move |i, j, k| u_origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z),
        bc,
    );
    let u_input = grid.u().clone();
    extrapolate_to_region(&u_input, &u_marker, depth, grid.u_mut());

    let v_origin = grid.v_origin();
    let v_marker = build_collider_marker(
        grid.v().size(),
        move |i, j, k| v_origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z),
        bc,
    );
    let v_input = grid.v().clone();
    extrapolate_to_region(&v_input, &v_marker, depth, grid.v_mut());

    let w_origin = grid.w_origin();
    let w_marker = build_collider_marker(
        grid.w().size(),
        move |i, j, k| w_origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z),
        bc,
    );
    let w_input = grid.w().clone();
    extrapolate_to_region(&w_input, &w_marker, depth, grid.w_mut());
}
