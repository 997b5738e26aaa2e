// crates/vg_physics/src/solvers/diffusion.rs

//! 显式扩散求解器
//!
//! 前向欧拉中心差分：`dest = src + c·dt·∇²src`，拉普拉斯模板
//! 按单元标记掩蔽——只有流体单元参与扩散，碰撞体（边界）与
//! 空气单元既不接收也不贡献通量。
//!
//! 显式格式要求 `c·dt ≤ h²/(2·维数)` 以保持稳定；该约束由
//! 调用方的子步进策略负责。

use std::ops::{Add, Mul, Sub};

use glam::DVec3;

use crate::geometry::field::ScalarField3;
use crate::grids::collocated::CollocatedVectorGrid3;
use crate::grids::face_centered::FaceCenteredGrid3;
use crate::grids::scalar_grid::ScalarGrid3;
use crate::numerics::array3::Array3;
use crate::numerics::level_set::is_inside_sdf;
use crate::numerics::size3::Size3;

/// 流体单元
const FLUID: u8 = 0;
/// 空气单元
const AIR: u8 = 1;
/// 边界（碰撞体）单元
const BOUNDARY: u8 = 2;

/// 扩散求解器接口
///
/// 对 `(源, 扩散系数, dt)` 求解一步扩散，边界与流体 SDF
/// 决定模板的有效区域。
pub trait GridDiffusionSolver3: Send {
    /// 标量网格扩散
    fn solve_scalar(
        &mut self,
        source: &ScalarGrid3,
        diffusion_coefficient: f64,
        dt: f64,
        dest: &mut ScalarGrid3,
        boundary_sdf: &dyn ScalarField3,
        fluid_sdf: &dyn ScalarField3,
    );

    /// 同位向量网格扩散
    fn solve_collocated_vector(
        &mut self,
        source: &CollocatedVectorGrid3,
        diffusion_coefficient: f64,
        dt: f64,
        dest: &mut CollocatedVectorGrid3,
        boundary_sdf: &dyn ScalarField3,
        fluid_sdf: &dyn ScalarField3,
    );

    /// 面心向量网格扩散
    fn solve_face_centered_vector(
        &mut self,
        source: &FaceCenteredGrid3,
        diffusion_coefficient: f64,
        dt: f64,
        dest: &mut FaceCenteredGrid3,
        boundary_sdf: &dyn ScalarField3,
        fluid_sdf: &dyn ScalarField3,
    );
}

/// 按数据点位置构建单元标记
fn build_markers<P>(
    size: Size3,
    pos: P,
    boundary_sdf: &dyn ScalarField3,
    fluid_sdf: &dyn ScalarField3,
) -> Array3<u8>
where
    P: Fn(usize, usize, usize) -> DVec3 + Sync + Send,
{
    let mut markers = Array3::new(size, AIR);
    markers.par_for_each_mut(|(i, j, k), m| {
        let pt = pos(i, j, k);
        *m = if is_inside_sdf(boundary_sdf.sample(pt)) {
            BOUNDARY
        } else if is_inside_sdf(fluid_sdf.sample(pt)) {
            FLUID
        } else {
            AIR
        };
    });
    markers
}

/// 掩蔽的 7 点拉普拉斯
///
/// 仅流体邻居贡献通量，缺失邻居按零通量处理。
fn masked_laplacian<T>(
    data: &Array3<T>,
    markers: &Array3<u8>,
    h: DVec3,
    i: usize,
    j: usize,
    k: usize,
) -> T
where
    T: Copy + Default + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>,
{
    let size = data.size();
    let center = data[(i, j, k)];
    let zero = T::default();

    let mut dleft = zero;
    let mut dright = zero;
    let mut ddown = zero;
    let mut dup = zero;
    let mut dback = zero;
    let mut dfront = zero;

    if i > 0 && markers[(i - 1, j, k)] == FLUID {
        dleft = center - data[(i - 1, j, k)];
    }
    if i + 1 < size.x && markers[(i + 1, j, k)] == FLUID {
        dright = data[(i + 1, j, k)] - center;
    }
    if j > 0 && markers[(i, j - 1, k)] == FLUID {
        ddown = center - data[(i, j - 1, k)];
    }
    if j + 1 < size.y && markers[(i, j + 1, k)] == FLUID {
        dup = data[(i, j + 1, k)] - center;
    }
    if k > 0 && markers[(i, j, k - 1)] == FLUID {
        dback = center - data[(i, j, k - 1)];
    }
    if k + 1 < size.z && markers[(i, j, k + 1)] == FLUID {
        dfront = data[(i, j, k + 1)] - center;
    }

    (dright - dleft) * (1.0 / (h.x * h.x))
        + (dup - ddown) * (1.0 / (h.y * h.y))
        + (dfront - dback) * (1.0 / (h.z * h.z))
}

/// 对单个分量数组做一步前向欧拉扩散
fn diffuse_array<T, P>(
    source: &Array3<T>,
    coefficient_times_dt: f64,
    h: DVec3,
    pos: P,
    boundary_sdf: &dyn ScalarField3,
    fluid_sdf: &dyn ScalarField3,
    dest: &mut Array3<T>,
) where
    T: Copy + Default + Send + Sync + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>,
    P: Fn(usize, usize, usize) -> DVec3 + Sync + Send,
{
    assert_eq!(source.size(), dest.size(), "输入输出数组必须同构");
    let markers = build_markers(source.size(), pos, boundary_sdf, fluid_sdf);

    dest.par_for_each_mut(|(i, j, k), v| {
        *v = if markers[(i, j, k)] == FLUID {
            source[(i, j, k)]
                + masked_laplacian(source, &markers, h, i, j, k) * coefficient_times_dt
        } else {
            source[(i, j, k)]
        };
    });
}

/// 前向欧拉扩散求解器
#[derive(Debug, Clone, Copy, Default)]
pub struct GridForwardEulerDiffusionSolver3;

impl GridForwardEulerDiffusionSolver3 {
    /// 创建求解器
    pub fn new() -> Self {
        Self
    }
}

impl GridDiffusionSolver3 for GridForwardEulerDiffusionSolver3 {
    fn solve_scalar(
        &mut self,
        source: &ScalarGrid3,
        diffusion_coefficient: f64,
        dt: f64,
        dest: &mut ScalarGrid3,
        boundary_sdf: &dyn ScalarField3,
        fluid_sdf: &dyn ScalarField3,
    ) {
        let h = source.grid_spacing();
        let origin = source.data_origin();
        let pos = move |i: usize, j: usize, k: usize| {
            origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z)
        };
        diffuse_array(
            source.data(),
            diffusion_coefficient * dt,
            h,
            pos,
            boundary_sdf,
            fluid_sdf,
            dest.data_mut(),
        );
    }

    fn solve_collocated_vector(
        &mut self,
        source: &CollocatedVectorGrid3,
        diffusion_coefficient: f64,
        dt: f64,
        dest: &mut CollocatedVectorGrid3,
        boundary_sdf: &dyn ScalarField3,
        fluid_sdf: &dyn ScalarField3,
    ) {
        let h = source.grid_spacing();
        let origin = source.data_origin();
        let pos = move |i: usize, j: usize, k: usize| {
            origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z)
        };
        diffuse_array(
            source.data(),
            diffusion_coefficient * dt,
            h,
            pos,
            boundary_sdf,
            fluid_sdf,
            dest.data_mut(),
        );
    }

    fn solve_face_centered_vector(
        &mut self,
        source: &FaceCenteredGrid3,
        diffusion_coefficient: f64,
        dt: f64,
        dest: &mut FaceCenteredGrid3,
        boundary_sdf: &dyn ScalarField3,
        fluid_sdf: &dyn ScalarField3,
    ) {
        let h = source.grid_spacing();
        let c_dt = diffusion_coefficient * dt;

        let u_origin = source.u_origin();
        diffuse_array(
            source.u(),
            c_dt,
            h,
            move |i, j, k| u_origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z),
            boundary_sdf,
            fluid_sdf,
            dest.u_mut(),
        );

        let v_origin = source.v_origin();
        diffuse_array(
            source.v(),
            c_dt,
            h,
            move |i, j, k| v_origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z),
            boundary_sdf,
            fluid_sdf,
            dest.v_mut(),
        );

        let w_origin = source.w_origin();
        diffuse_array(
            source.w(),
            c_dt,
            h,
            move |i, j, k| w_origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z),
            boundary_sdf,
            fluid_sdf,
            dest.w_mut(),
        );
    }
}
