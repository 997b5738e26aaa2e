// crates/vg_physics/tests/pipeline_tests.rs

//! 管线语义测试：各阶段的组合行为与帧/子步核算

use glam::DVec3;
use vg_physics::solvers::emitter::FnGridEmitter3;
use vg_physics::{
    Frame, GridFluidSolver3, GridFluidSolverConfig, ScalarGridSpec, Size3, TimeIntegrator,
};

/// 仅重力的求解器：一帧内所有自适应子步的贡献累加为 g·T
#[test]
fn gravity_accumulates_over_full_frame() {
    let mut solver = GridFluidSolver3::new(GridFluidSolverConfig {
        resolution: Size3::new(4, 4, 4),
        ..Default::default()
    });
    solver.set_advection_solver(None);
    solver.set_diffusion_solver(None);
    solver.set_pressure_solver(None);

    let interval = 1.0 / 60.0;
    let mut integrator = TimeIntegrator::default();
    integrator.update(&mut solver, Frame::new(0, interval));

    let expected = -9.8 * interval;
    let v = solver.velocity().v()[(2, 2, 2)];
    assert!(
        (v - expected).abs() < 1e-9,
        "期望 {}, 实际 {}",
        expected,
        v
    );
    // 封闭域边界面保持为零
    assert_eq!(solver.velocity().v()[(2, 0, 2)], 0.0);
    assert_eq!(solver.velocity().v()[(2, 4, 2)], 0.0);
}

/// 压力阶段使重力注入的散度场重新归于无散
#[test]
fn pressure_projection_keeps_divergence_small() {
    let mut solver = GridFluidSolver3::new(GridFluidSolverConfig {
        resolution: Size3::new(6, 6, 6),
        ..Default::default()
    });
    solver.set_advection_solver(None);
    solver.set_diffusion_solver(None);

    let mut integrator = TimeIntegrator::default();
    integrator.update(&mut solver, Frame::new(0, 1.0 / 60.0));

    let vel = solver.velocity();
    let size = vel.resolution();
    for k in 0..size.z {
        for j in 0..size.y {
            for i in 0..size.x {
                let div = vel.divergence_at_cell_center(i, j, k);
                assert!(
                    div.abs() < 1e-6,
                    "单元 ({}, {}, {}) 散度 {} 过大",
                    i,
                    j,
                    k,
                    div
                );
            }
        }
    }
}

/// 发射器在每个子步被调用，可平流标量层随流场输运
#[test]
fn emitter_and_advectable_scalar_layer() {
    let mut solver = GridFluidSolver3::new(GridFluidSolverConfig {
        resolution: Size3::new(8, 8, 8),
        gravity: DVec3::ZERO,
        ..Default::default()
    });
    solver.set_diffusion_solver(None);
    solver.set_pressure_solver(None);

    let density_idx = solver
        .grid_system_data_mut()
        .add_advectable_scalar_data(ScalarGridSpec::default());

    // 发射器：维持 +x 方向单位速度，并在左侧注入密度
    solver.set_emitter(Some(Box::new(FnGridEmitter3::new(
        move |grids: &mut vg_physics::GridSystemData3, _t, _dt| {
            grids.velocity_mut().fill(DVec3::new(1.0, 0.0, 0.0));
            let density = grids.advectable_scalar_data_at_mut(density_idx);
            let size = density.data_size();
            for k in 0..size.z {
                for j in 0..size.y {
                    *density.data_mut().at_mut(0, j, k) = 1.0;
                }
            }
        },
    ))));

    let mut integrator = TimeIntegrator::default();
    for frame in 0..4 {
        integrator.update(&mut solver, Frame::new(frame, 0.25));
    }

    // 密度沿 +x 方向被携带：下游单元非零
    let density = solver.grid_system_data().advectable_scalar_data_at(density_idx);
    let downstream = *density.data().at(2, 4, 4);
    assert!(
        downstream > 1e-3,
        "密度未随流场输运, 下游值 = {}",
        downstream
    );
}

/// 帧追赶：一次 update 跨多帧时逐帧推进
#[test]
fn multi_frame_catch_up_advances_clock() {
    let mut solver = GridFluidSolver3::new(GridFluidSolverConfig {
        resolution: Size3::new(3, 3, 3),
        ..Default::default()
    });
    solver.set_advection_solver(None);
    solver.set_diffusion_solver(None);
    solver.set_pressure_solver(None);

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    let substeps = Arc::new(AtomicU32::new(0));
    let counter = substeps.clone();
    solver.set_on_begin_advance_time_step(move |_t, _dt| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let mut integrator = TimeIntegrator::default();
    integrator.update(&mut solver, Frame::new(4, 0.05));

    assert_eq!(integrator.current_frame().index, 4);
    assert!((integrator.current_time_in_seconds() - 0.25).abs() < 1e-9);
    // 5 个整帧，每帧至少 1 个子步
    assert!(substeps.load(Ordering::Relaxed) >= 5);
}

/// 网格整体缩放：层在 resize 后保持步调一致并可继续模拟
#[test]
fn resize_then_continue_simulation() {
    let mut solver = GridFluidSolver3::new(GridFluidSolverConfig {
        resolution: Size3::new(3, 3, 3),
        ..Default::default()
    });
    solver
        .grid_system_data_mut()
        .add_advectable_scalar_data(ScalarGridSpec::default());

    let mut integrator = TimeIntegrator::default();
    integrator.update(&mut solver, Frame::new(0, 1.0 / 60.0));

    solver.resize_grid(Size3::new(5, 5, 5), DVec3::splat(0.5), DVec3::ZERO);
    assert_eq!(solver.resolution(), Size3::new(5, 5, 5));
    assert_eq!(
        solver
            .grid_system_data()
            .advectable_scalar_data_at(0)
            .resolution(),
        Size3::new(5, 5, 5)
    );

    integrator.update(&mut solver, Frame::new(1, 1.0 / 60.0));
    assert!(solver
        .velocity()
        .v()
        .data()
        .iter()
        .all(|v| v.is_finite()));
}
