// crates/vg_physics/tests/smoke_test.rs

//! 冒烟测试：默认管线整帧推进不崩溃、结果有限

use glam::DVec3;
use vg_physics::{
    Frame, GridFluidSolver3, GridFluidSolverConfig, RigidBodyCollider3, Size3, Sphere3,
    SubStepping, TimeIntegrator,
};

fn assert_all_finite(solver: &GridFluidSolver3) {
    let vel = solver.velocity();
    assert!(vel.u().data().iter().all(|v| v.is_finite()));
    assert!(vel.v().data().iter().all(|v| v.is_finite()));
    assert!(vel.w().data().iter().all(|v| v.is_finite()));
}

#[test]
fn default_pipeline_advances_two_frames() {
    let mut solver = GridFluidSolver3::new(GridFluidSolverConfig {
        resolution: Size3::new(6, 6, 6),
        grid_spacing: DVec3::splat(0.5),
        ..Default::default()
    });
    let mut integrator = TimeIntegrator::default();

    integrator.update(&mut solver, Frame::new(0, 1.0 / 60.0));
    integrator.update(&mut solver, Frame::new(1, 1.0 / 60.0));

    assert_eq!(integrator.current_frame().index, 1);
    assert_all_finite(&solver);
}

#[test]
fn pipeline_with_collider_stays_finite() {
    let mut solver = GridFluidSolver3::new(GridFluidSolverConfig {
        resolution: Size3::new(8, 8, 8),
        grid_spacing: DVec3::ONE,
        origin: DVec3::new(-4.0, -4.0, -4.0),
        ..Default::default()
    });
    let collider =
        RigidBodyCollider3::new(Box::new(Sphere3::new(DVec3::ZERO, 1.5))).into_shared();
    solver.set_collider(Some(collider));

    let mut integrator = TimeIntegrator::default();
    for frame in 0..3 {
        integrator.update(&mut solver, Frame::new(frame, 1.0 / 60.0));
    }

    assert_all_finite(&solver);
}

#[test]
fn fixed_substepping_pipeline() {
    let mut solver = GridFluidSolver3::new(GridFluidSolverConfig {
        resolution: Size3::new(4, 4, 4),
        ..Default::default()
    });
    let mut integrator = TimeIntegrator::new(SubStepping::Fixed(3));

    integrator.update(&mut solver, Frame::new(0, 0.1));
    assert!((integrator.current_time_in_seconds() - 0.1).abs() < 1e-12);
    assert_all_finite(&solver);
}

#[test]
fn compressed_linear_system_path() {
    let mut solver = GridFluidSolver3::new(GridFluidSolverConfig {
        resolution: Size3::new(4, 4, 4),
        use_compressed_linear_system: true,
        ..Default::default()
    });
    let mut integrator = TimeIntegrator::default();

    integrator.update(&mut solver, Frame::new(0, 1.0 / 60.0));
    assert_all_finite(&solver);
}
