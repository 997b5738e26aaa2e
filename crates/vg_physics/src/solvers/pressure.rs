// crates/vg_physics/src/solvers/pressure.rs

//! 单相压力投影求解器
//!
//! 以单元中心 SDF 把每个单元分类为流体 / 空气 / 边界（碰撞体），
//! 在流体单元上组装 7 点泊松系统并求解，再把压力梯度施加到
//! 流体内部的面上，使速度场无散度。
//!
//! 线性系统有两条路径：网格形状（FDM）与压缩（CSR），由
//! `use_compressed` 标志选择；高分辨率下压缩路径更紧凑。
//! 求解不收敛时只记录日志，结果照常回写——部分收敛的压力场
//! 仍能有效降低散度。

use glam::DVec3;

use crate::boundary::{GridBlockedBoundaryConditionSolver3, GridBoundaryConditionSolver3};
use crate::geometry::field::{ScalarField3, VectorField3};
use crate::grids::face_centered::FaceCenteredGrid3;
use crate::numerics::array3::Array3;
use crate::numerics::level_set::is_inside_sdf;
use crate::numerics::linear_algebra::{
    FdmCompressedLinearSystem3, FdmLinearSystem3, FdmLinearSystemSolver3, FdmPcgSolver3,
    SolverConfig,
};
use crate::numerics::size3::Size3;

/// 流体单元
const FLUID: u8 = 0;
/// 空气单元
const AIR: u8 = 1;
/// 边界（碰撞体）单元
const BOUNDARY: u8 = 2;

/// 压力求解器接口
pub trait GridPressureSolver3: Send {
    /// 求解无散度速度场
    ///
    /// 读取 `input`，把投影结果写入 `output`（可与 input 同构的
    /// 任意网格）。`use_compressed` 选择压缩 CSR 线性系统路径。
    #[allow(clippy::too_many_arguments)]
    fn solve(
        &mut self,
        input: &FaceCenteredGrid3,
        dt: f64,
        output: &mut FaceCenteredGrid3,
        boundary_sdf: &dyn ScalarField3,
        boundary_velocity: &dyn VectorField3,
        fluid_sdf: &dyn ScalarField3,
        use_compressed: bool,
    );

    /// 建议配套的边界条件求解器
    ///
    /// 安装压力求解器时由流体求解器调用，自动接线兼容的
    /// 边界条件变体。
    fn suggested_boundary_condition_solver(&self) -> Box<dyn GridBoundaryConditionSolver3>;
}

/// 单相压力投影求解器
pub struct GridSinglePhasePressureSolver3 {
    system: FdmLinearSystem3,
    comp_system: FdmCompressedLinearSystem3,
    system_solver: Box<dyn FdmLinearSystemSolver3 + Send>,
    markers: Array3<u8>,
}

impl GridSinglePhasePressureSolver3 {
    /// 以默认线性求解器（Jacobi 预条件 CG）创建
    pub fn new() -> Self {
        Self {
            system: FdmLinearSystem3::new(Size3::ZERO),
            comp_system: FdmCompressedLinearSystem3::new(),
            system_solver: Box::new(FdmPcgSolver3::new(SolverConfig::default())),
            markers: Array3::new(Size3::ZERO, AIR),
        }
    }

    /// 替换线性系统求解器
    pub fn set_linear_system_solver(&mut self, solver: Box<dyn FdmLinearSystemSolver3 + Send>) {
        self.system_solver = solver;
    }

    /// 单元标记数组（0 = 流体，1 = 空气，2 = 边界）
    pub fn markers(&self) -> &Array3<u8> {
        &self.markers
    }

    fn build_markers(
        &mut self,
        input: &FaceCenteredGrid3,
        boundary_sdf: &dyn ScalarField3,
        fluid_sdf: &dyn ScalarField3,
    ) {
        let size = input.resolution();
        let origin = input.origin();
        let h = input.grid_spacing();

        let mut markers = Array3::new(size, AIR);
        markers.par_for_each_mut(|(i, j, k), m| {
            let pt = origin
                + DVec3::new(
                    (i as f64 + 0.5) * h.x,
                    (j as f64 + 0.5) * h.y,
                    (k as f64 + 0.5) * h.z,
                );
            *m = if is_inside_sdf(boundary_sdf.sample(pt)) {
                BOUNDARY
            } else if is_inside_sdf(fluid_sdf.sample(pt)) {
                FLUID
            } else {
                AIR
            };
        });
        self.markers = markers;
    }

    fn build_system(&mut self, input: &FaceCenteredGrid3) {
        let size = input.resolution();
        if self.system.size() != size {
            self.system.resize(size);
        }

        let h = input.grid_spacing();
        let inv_h_sqr = DVec3::new(1.0 / (h.x * h.x), 1.0 / (h.y * h.y), 1.0 / (h.z * h.z));
        let markers = &self.markers;

        self.system.a.par_for_each_mut(|(i, j, k), row| {
            *row = Default::default();
            if markers[(i, j, k)] != FLUID {
                row.center = 1.0;
                return;
            }

            if i + 1 < size.x && markers[(i + 1, j, k)] != BOUNDARY {
                row.center += inv_h_sqr.x;
                if markers[(i + 1, j, k)] == FLUID {
                    row.right -= inv_h_sqr.x;
                }
            }
            if i > 0 && markers[(i - 1, j, k)] != BOUNDARY {
                row.center += inv_h_sqr.x;
            }
            if j + 1 < size.y && markers[(i, j + 1, k)] != BOUNDARY {
                row.center += inv_h_sqr.y;
                if markers[(i, j + 1, k)] == FLUID {
                    row.up -= inv_h_sqr.y;
                }
            }
            if j > 0 && markers[(i, j - 1, k)] != BOUNDARY {
                row.center += inv_h_sqr.y;
            }
            if k + 1 < size.z && markers[(i, j, k + 1)] != BOUNDARY {
                row.center += inv_h_sqr.z;
                if markers[(i, j, k + 1)] == FLUID {
                    row.front -= inv_h_sqr.z;
                }
            }
            if k > 0 && markers[(i, j, k - 1)] != BOUNDARY {
                row.center += inv_h_sqr.z;
            }
        });

        self.system.b.par_for_each_mut(|(i, j, k), b| {
            *b = if markers[(i, j, k)] == FLUID {
                input.divergence_at_cell_center(i, j, k)
            } else {
                0.0
            };
        });
    }

    fn build_compressed_system(&mut self, input: &FaceCenteredGrid3) {
        let size = input.resolution();
        let n = size.volume();
        let h = input.grid_spacing();
        let inv_h_sqr = DVec3::new(1.0 / (h.x * h.x), 1.0 / (h.y * h.y), 1.0 / (h.z * h.z));
        let markers = &self.markers;

        let mut a = crate::numerics::linear_algebra::CsrMatrix::<f64>::new(n);
        let mut b = vec![0.0; n];

        // 行按线性索引升序追加（i 最快，与单元迭代顺序一致）
        let mut row_values: Vec<f64> = Vec::with_capacity(7);
        let mut row_cols: Vec<usize> = Vec::with_capacity(7);
        markers.for_each_index(|i, j, k| {
            let row = size.linear_index(i, j, k);
            row_values.clear();
            row_cols.clear();

            if markers[(i, j, k)] != FLUID {
                a.append_row(&[1.0], &[row]);
                return;
            }

            b[row] = input.divergence_at_cell_center(i, j, k);

            let mut center = 0.0;
            if i + 1 < size.x && markers[(i + 1, j, k)] != BOUNDARY {
                center += inv_h_sqr.x;
                if markers[(i + 1, j, k)] == FLUID {
                    row_values.push(-inv_h_sqr.x);
                    row_cols.push(size.linear_index(i + 1, j, k));
                }
            }
            if i > 0 && markers[(i - 1, j, k)] != BOUNDARY {
                center += inv_h_sqr.x;
                if markers[(i - 1, j, k)] == FLUID {
                    row_values.push(-inv_h_sqr.x);
                    row_cols.push(size.linear_index(i - 1, j, k));
                }
            }
            if j + 1 < size.y && markers[(i, j + 1, k)] != BOUNDARY {
                center += inv_h_sqr.y;
                if markers[(i, j + 1, k)] == FLUID {
                    row_values.push(-inv_h_sqr.y);
                    row_cols.push(size.linear_index(i, j + 1, k));
                }
            }
            if j > 0 && markers[(i, j - 1, k)] != BOUNDARY {
                center += inv_h_sqr.y;
                if markers[(i, j - 1, k)] == FLUID {
                    row_values.push(-inv_h_sqr.y);
                    row_cols.push(size.linear_index(i, j - 1, k));
                }
            }
            if k + 1 < size.z && markers[(i, j, k + 1)] != BOUNDARY {
                center += inv_h_sqr.z;
                if markers[(i, j, k + 1)] == FLUID {
                    row_values.push(-inv_h_sqr.z);
                    row_cols.push(size.linear_index(i, j, k + 1));
                }
            }
            if k > 0 && markers[(i, j, k - 1)] != BOUNDARY {
                center += inv_h_sqr.z;
                if markers[(i, j, k - 1)] == FLUID {
                    row_values.push(-inv_h_sqr.z);
                    row_cols.push(size.linear_index(i, j, k - 1));
                }
            }
            row_values.push(center);
            row_cols.push(row);

            a.append_row(&row_values, &row_cols);
        });

        self.comp_system.a = a;
        self.comp_system.b = b;
        if self.comp_system.x.len() != n {
            self.comp_system.x = vec![0.0; n];
        }
    }

    fn apply_pressure_gradient(
        &self,
        input: &FaceCenteredGrid3,
        output: &mut FaceCenteredGrid3,
        use_compressed: bool,
    ) {
        let size = input.resolution();
        let h = input.grid_spacing();
        let inv_h = DVec3::new(1.0 / h.x, 1.0 / h.y, 1.0 / h.z);
        let markers = &self.markers;

        let pressure = |i: usize, j: usize, k: usize| -> f64 {
            if use_compressed {
                self.comp_system.x[size.linear_index(i, j, k)]
            } else {
                self.system.x[(i, j, k)]
            }
        };

        let (u, v, w) = output.uvw_mut();
        markers.for_each_index(|i, j, k| {
            if markers[(i, j, k)] != FLUID {
                return;
            }
            if i + 1 < size.x && markers[(i + 1, j, k)] != BOUNDARY {
                u[(i + 1, j, k)] =
                    input.u()[(i + 1, j, k)] + inv_h.x * (pressure(i + 1, j, k) - pressure(i, j, k));
            }
            if j + 1 < size.y && markers[(i, j + 1, k)] != BOUNDARY {
                v[(i, j + 1, k)] =
                    input.v()[(i, j + 1, k)] + inv_h.y * (pressure(i, j + 1, k) - pressure(i, j, k));
            }
            if k + 1 < size.z && markers[(i, j, k + 1)] != BOUNDARY {
                w[(i, j, k + 1)] =
                    input.w()[(i, j, k + 1)] + inv_h.z * (pressure(i, j, k + 1) - pressure(i, j, k));
            }
        });
    }
}

impl Default for GridSinglePhasePressureSolver3 {
    fn default() -> Self {
        Self::new()
    }
}

impl GridPressureSolver3 for GridSinglePhasePressureSolver3 {
    fn solve(
        &mut self,
        input: &FaceCenteredGrid3,
        _dt: f64,
        output: &mut FaceCenteredGrid3,
        boundary_sdf: &dyn ScalarField3,
        _boundary_velocity: &dyn VectorField3,
        fluid_sdf: &dyn ScalarField3,
        use_compressed: bool,
    ) {
        assert_eq!(
            input.resolution(),
            output.resolution(),
            "输入输出网格必须同构"
        );

        self.build_markers(input, boundary_sdf, fluid_sdf);

        // 先整体拷贝，未被梯度更新的面保持输入值
        *output = input.clone();

        let converged = if use_compressed {
            self.build_compressed_system(input);
            self.system_solver.solve_compressed(&mut self.comp_system)
        } else {
            self.build_system(input);
            self.system_solver.solve(&mut self.system)
        };

        if !converged {
            // 部分收敛的压力场仍可用
            log::debug!(
                "压力求解未完全收敛: iterations = {}, residual = {:.6e}",
                self.system_solver.last_number_of_iterations(),
                self.system_solver.last_residual()
            );
        }

        self.apply_pressure_gradient(input, output, use_compressed);
    }

    fn suggested_boundary_condition_solver(&self) -> Box<dyn GridBoundaryConditionSolver3> {
        Box::new(GridBlockedBoundaryConditionSolver3::new())
    }
}
