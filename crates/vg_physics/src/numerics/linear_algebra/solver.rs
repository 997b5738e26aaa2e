// crates/vg_physics/src/numerics/linear_algebra/solver.rs

//! 迭代线性求解器
//!
//! 提供压力/扩散线性系统 Ax = b 的迭代求解：
//!
//! - [`FdmCgSolver3`]: 共轭梯度法（无预条件）
//! - [`FdmPcgSolver3`]: 预条件共轭梯度法（Jacobi 对角预条件）
//! - [`FdmJacobiSolver3`]: Jacobi 松弛（固定扫描次数 + 周期残差复查）
//!
//! 所有求解器同时支持网格形状（FDM）与压缩（CSR）两条路径，
//! 两条路径的数值语义一致。不收敛不是异常：`solve` 返回布尔标志，
//! 最近一次迭代次数与残差可经 [`FdmLinearSystemSolver3`] 查询，
//! 由调用方决定是否沿用未收敛的结果。

use serde::{Deserialize, Serialize};

use super::csr::CsrMatrix;
use super::fdm::{
    Blas, FdmBlas3, FdmCompressedBlas3, FdmCompressedLinearSystem3, FdmLinearSystem3, FdmMatrix3,
    FdmVector3,
};
use crate::numerics::size3::Size3;

// ============================================================
// 配置
// ============================================================

/// 迭代求解器配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolverConfig {
    /// 残差收敛容差（二范数）
    pub tolerance: f64,
    /// 最大迭代次数
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 100,
        }
    }
}

impl SolverConfig {
    /// 创建配置
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }
}

// ============================================================
// 预条件器
// ============================================================

/// 预条件器 trait
///
/// 核心操作 `solve`: x = M⁻¹ b。任何暴露 `build` + `solve`
/// 的对象都可接入 [`pcg`]。
pub trait Preconditioner<B: Blas> {
    /// 由系数矩阵构建内部状态
    fn build(&mut self, a: &B::Matrix);

    /// 应用预条件器: x = M⁻¹ b
    fn solve(&mut self, b: &B::Vector, x: &mut B::Vector);
}

/// 恒等预条件器（无预条件）
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCgPreconditioner;

impl<B: Blas> Preconditioner<B> for NullCgPreconditioner {
    fn build(&mut self, _a: &B::Matrix) {}

    fn solve(&mut self, b: &B::Vector, x: &mut B::Vector) {
        B::copy(b, x);
    }
}

/// 压缩路径的 Jacobi（对角）预条件器
#[derive(Debug, Clone, Default)]
pub struct JacobiPreconditioner {
    inv_diag: Vec<f64>,
}

impl Preconditioner<FdmCompressedBlas3> for JacobiPreconditioner {
    fn build(&mut self, a: &CsrMatrix<f64>) {
        self.inv_diag = a
            .extract_diagonal()
            .iter()
            .map(|&d| if d.abs() > 1e-14 { 1.0 / d } else { 1.0 })
            .collect();
    }

    fn solve(&mut self, b: &Vec<f64>, x: &mut Vec<f64>) {
        x.resize(b.len(), 0.0);
        for ((xi, &bi), &inv) in x.iter_mut().zip(b.iter()).zip(self.inv_diag.iter()) {
            *xi = bi * inv;
        }
    }
}

/// 网格形状路径的 Jacobi（对角）预条件器
#[derive(Debug, Clone)]
pub struct FdmJacobiPreconditioner3 {
    inv_diag: FdmVector3,
}

impl Default for FdmJacobiPreconditioner3 {
    fn default() -> Self {
        Self {
            inv_diag: FdmVector3::new(Size3::ZERO, 0.0),
        }
    }
}

impl Preconditioner<FdmBlas3> for FdmJacobiPreconditioner3 {
    fn build(&mut self, a: &FdmMatrix3) {
        let mut inv = FdmVector3::new(a.size(), 0.0);
        inv.par_for_each_mut(|(i, j, k), v| {
            let c = a[(i, j, k)].center;
            *v = if c.abs() > 1e-14 { 1.0 / c } else { 1.0 };
        });
        self.inv_diag = inv;
    }

    fn solve(&mut self, b: &FdmVector3, x: &mut FdmVector3) {
        debug_assert_eq!(b.size(), self.inv_diag.size());
        x.data_mut()
            .iter_mut()
            .zip(b.data().iter())
            .zip(self.inv_diag.data().iter())
            .for_each(|((xi, &bi), &inv)| *xi = bi * inv);
    }
}

// ============================================================
// CG / PCG 迭代核心
// ============================================================

/// 预条件共轭梯度法
///
/// 标准 PCG，带周期性残差重算抑制浮点漂移。收敛判据
/// `σ = r·M⁻¹r ≤ max(tolerance², ε²)`，以机器精度为下限，
/// 保证 tolerance = 0 时在数值收敛点正常退出。
#[allow(clippy::too_many_arguments)]
pub fn pcg<B: Blas, P: Preconditioner<B>>(
    a: &B::Matrix,
    b: &B::Vector,
    max_number_of_iterations: u32,
    tolerance: f64,
    precond: &mut P,
    x: &mut B::Vector,
    r: &mut B::Vector,
    d: &mut B::Vector,
    q: &mut B::Vector,
    s: &mut B::Vector,
    last_number_of_iterations: &mut u32,
    last_residual: &mut f64,
) {
    let tol_sq = (tolerance * tolerance).max(f64::EPSILON * f64::EPSILON);

    precond.build(a);

    // r = b - A x
    B::set(0.0, r);
    B::residual(a, x, b, r);

    // d = M⁻¹ r
    precond.solve(r, d);

    // σ = r · d
    let mut sigma_new = B::dot(r, d);

    let mut iter = 0u32;
    let mut trigger = false;
    while sigma_new > tol_sq && iter < max_number_of_iterations {
        // q = A d
        B::mvm(a, d, q);

        let dq = B::dot(d, q);
        if dq.abs() <= f64::MIN_POSITIVE {
            // 搜索方向退化，停滞退出
            break;
        }
        let alpha = sigma_new / dq;

        // x += α d
        B::axpy(alpha, d, x);

        // 周期性重算残差，其余轮次用递推更新
        if trigger || (iter % 50 == 0 && iter > 0) {
            B::residual(a, x, b, r);
            trigger = false;
        } else {
            B::axpy(-alpha, q, r);
        }

        // s = M⁻¹ r
        precond.solve(r, s);

        let sigma_old = sigma_new;
        sigma_new = B::dot(r, s);
        if sigma_new > sigma_old {
            trigger = true;
        }

        // d = s + β d
        let beta = sigma_new / sigma_old;
        B::xpay(s, beta, d);

        iter += 1;
        log::trace!("PCG iter {}: sigma = {:.6e}", iter, sigma_new);
    }

    *last_number_of_iterations = iter;
    *last_residual = B::l2_norm(r);
}

/// 无预条件共轭梯度法
#[allow(clippy::too_many_arguments)]
pub fn cg<B: Blas>(
    a: &B::Matrix,
    b: &B::Vector,
    max_number_of_iterations: u32,
    tolerance: f64,
    x: &mut B::Vector,
    r: &mut B::Vector,
    d: &mut B::Vector,
    q: &mut B::Vector,
    s: &mut B::Vector,
    last_number_of_iterations: &mut u32,
    last_residual: &mut f64,
) {
    let mut precond = NullCgPreconditioner;
    pcg::<B, _>(
        a,
        b,
        max_number_of_iterations,
        tolerance,
        &mut precond,
        x,
        r,
        d,
        q,
        s,
        last_number_of_iterations,
        last_residual,
    );
}

// ============================================================
// 求解器 trait
// ============================================================

/// 网格形状线性系统求解器
///
/// 不收敛以布尔返回值报告，绝不升级为 panic。
pub trait FdmLinearSystemSolver3 {
    /// 求解网格形状系统
    fn solve(&mut self, system: &mut FdmLinearSystem3) -> bool;

    /// 求解压缩系统
    fn solve_compressed(&mut self, system: &mut FdmCompressedLinearSystem3) -> bool;

    /// 最近一次求解的迭代次数
    fn last_number_of_iterations(&self) -> u32;

    /// 最近一次求解的残差
    fn last_residual(&self) -> f64;

    /// 求解器名称
    fn name(&self) -> &'static str;
}

// ============================================================
// CG 求解器
// ============================================================

/// 共轭梯度求解器（适用于对称正定系统）
pub struct FdmCgSolver3 {
    max_number_of_iterations: u32,
    last_number_of_iterations: u32,
    tolerance: f64,
    last_residual: f64,

    // 网格形状工作向量
    r: FdmVector3,
    d: FdmVector3,
    q: FdmVector3,
    s: FdmVector3,

    // 压缩工作向量
    r_comp: Vec<f64>,
    d_comp: Vec<f64>,
    q_comp: Vec<f64>,
    s_comp: Vec<f64>,
}

impl FdmCgSolver3 {
    /// 以配置构造
    pub fn new(config: SolverConfig) -> Self {
        Self {
            max_number_of_iterations: config.max_iterations,
            last_number_of_iterations: 0,
            tolerance: config.tolerance,
            last_residual: f64::MAX,
            r: FdmVector3::new(Size3::ZERO, 0.0),
            d: FdmVector3::new(Size3::ZERO, 0.0),
            q: FdmVector3::new(Size3::ZERO, 0.0),
            s: FdmVector3::new(Size3::ZERO, 0.0),
            r_comp: Vec::new(),
            d_comp: Vec::new(),
            q_comp: Vec::new(),
            s_comp: Vec::new(),
        }
    }

    /// 最大迭代次数
    pub fn max_number_of_iterations(&self) -> u32 {
        self.max_number_of_iterations
    }

    /// 收敛容差
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn ensure_grid_workspace(&mut self, size: Size3) {
        if self.r.size() != size {
            self.r = FdmVector3::new(size, 0.0);
            self.d = FdmVector3::new(size, 0.0);
            self.q = FdmVector3::new(size, 0.0);
            self.s = FdmVector3::new(size, 0.0);
        } else {
            self.r.fill(0.0);
            self.d.fill(0.0);
            self.q.fill(0.0);
            self.s.fill(0.0);
        }
    }

    fn ensure_compressed_workspace(&mut self, n: usize) {
        self.r_comp.clear();
        self.r_comp.resize(n, 0.0);
        self.d_comp.clear();
        self.d_comp.resize(n, 0.0);
        self.q_comp.clear();
        self.q_comp.resize(n, 0.0);
        self.s_comp.clear();
        self.s_comp.resize(n, 0.0);
    }
}

impl Default for FdmCgSolver3 {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl FdmLinearSystemSolver3 for FdmCgSolver3 {
    fn solve(&mut self, system: &mut FdmLinearSystem3) -> bool {
        self.ensure_grid_workspace(system.size());

        cg::<FdmBlas3>(
            &system.a,
            &system.b,
            self.max_number_of_iterations,
            self.tolerance,
            &mut system.x,
            &mut self.r,
            &mut self.d,
            &mut self.q,
            &mut self.s,
            &mut self.last_number_of_iterations,
            &mut self.last_residual,
        );

        self.last_residual <= self.tolerance
    }

    fn solve_compressed(&mut self, system: &mut FdmCompressedLinearSystem3) -> bool {
        self.ensure_compressed_workspace(system.b.len());

        cg::<FdmCompressedBlas3>(
            &system.a,
            &system.b,
            self.max_number_of_iterations,
            self.tolerance,
            &mut system.x,
            &mut self.r_comp,
            &mut self.d_comp,
            &mut self.q_comp,
            &mut self.s_comp,
            &mut self.last_number_of_iterations,
            &mut self.last_residual,
        );

        self.last_residual <= self.tolerance
    }

    fn last_number_of_iterations(&self) -> u32 {
        self.last_number_of_iterations
    }

    fn last_residual(&self) -> f64 {
        self.last_residual
    }

    fn name(&self) -> &'static str {
        "CG"
    }
}

// ============================================================
// PCG 求解器
// ============================================================

/// 预条件共轭梯度求解器（Jacobi 对角预条件）
pub struct FdmPcgSolver3 {
    inner: FdmCgSolver3,
    precond: FdmJacobiPreconditioner3,
    precond_comp: JacobiPreconditioner,
}

impl FdmPcgSolver3 {
    /// 以配置构造
    pub fn new(config: SolverConfig) -> Self {
        Self {
            inner: FdmCgSolver3::new(config),
            precond: FdmJacobiPreconditioner3::default(),
            precond_comp: JacobiPreconditioner::default(),
        }
    }
}

impl FdmLinearSystemSolver3 for FdmPcgSolver3 {
    fn solve(&mut self, system: &mut FdmLinearSystem3) -> bool {
        self.inner.ensure_grid_workspace(system.size());

        pcg::<FdmBlas3, _>(
            &system.a,
            &system.b,
            self.inner.max_number_of_iterations,
            self.inner.tolerance,
            &mut self.precond,
            &mut system.x,
            &mut self.inner.r,
            &mut self.inner.d,
            &mut self.inner.q,
            &mut self.inner.s,
            &mut self.inner.last_number_of_iterations,
            &mut self.inner.last_residual,
        );

        self.inner.last_residual <= self.inner.tolerance
    }

    fn solve_compressed(&mut self, system: &mut FdmCompressedLinearSystem3) -> bool {
        self.inner.ensure_compressed_workspace(system.b.len());

        pcg::<FdmCompressedBlas3, _>(
            &system.a,
            &system.b,
            self.inner.max_number_of_iterations,
            self.inner.tolerance,
            &mut self.precond_comp,
            &mut system.x,
            &mut self.inner.r_comp,
            &mut self.inner.d_comp,
            &mut self.inner.q_comp,
            &mut self.inner.s_comp,
            &mut self.inner.last_number_of_iterations,
            &mut self.inner.last_residual,
        );

        self.inner.last_residual <= self.inner.tolerance
    }

    fn last_number_of_iterations(&self) -> u32 {
        self.inner.last_number_of_iterations
    }

    fn last_residual(&self) -> f64 {
        self.inner.last_residual
    }

    fn name(&self) -> &'static str {
        "PCG"
    }
}

// ============================================================
// Jacobi 求解器
// ============================================================

/// Jacobi 松弛求解器
///
/// 单次扫描 `x_new[i] = (b[i] - Σ_{j≠i} A[i][j] x[j]) / A[i][i]`，
/// 固定扫描次数，每 `residual_check_interval` 轮复查残差以便提前退出。
pub struct FdmJacobiSolver3 {
    max_number_of_iterations: u32,
    last_number_of_iterations: u32,
    residual_check_interval: u32,
    tolerance: f64,
    last_residual: f64,

    // 网格形状工作向量
    x_temp: FdmVector3,
    residual: FdmVector3,

    // 压缩工作向量
    x_temp_comp: Vec<f64>,
    residual_comp: Vec<f64>,
}

impl FdmJacobiSolver3 {
    /// 以参数构造
    pub fn new(max_number_of_iterations: u32, residual_check_interval: u32, tolerance: f64) -> Self {
        assert!(residual_check_interval > 0, "残差复查间隔必须大于 0");
        Self {
            max_number_of_iterations,
            last_number_of_iterations: 0,
            residual_check_interval,
            tolerance,
            last_residual: f64::MAX,
            x_temp: FdmVector3::new(Size3::ZERO, 0.0),
            residual: FdmVector3::new(Size3::ZERO, 0.0),
            x_temp_comp: Vec::new(),
            residual_comp: Vec::new(),
        }
    }

    /// 最大迭代次数
    pub fn max_number_of_iterations(&self) -> u32 {
        self.max_number_of_iterations
    }

    /// 收敛容差
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// 单次 Jacobi 松弛（网格形状）
    pub fn relax(a: &FdmMatrix3, b: &FdmVector3, x: &FdmVector3, x_temp: &mut FdmVector3) {
        let size = a.size();
        debug_assert_eq!(size, b.size());
        debug_assert_eq!(size, x.size());
        debug_assert_eq!(size, x_temp.size());

        x_temp.par_for_each_mut(|(i, j, k), out| {
            let row = a[(i, j, k)];
            let mut off_diag = 0.0;
            if i > 0 {
                off_diag += a[(i - 1, j, k)].right * x[(i - 1, j, k)];
            }
            if i + 1 < size.x {
                off_diag += row.right * x[(i + 1, j, k)];
            }
            if j > 0 {
                off_diag += a[(i, j - 1, k)].up * x[(i, j - 1, k)];
            }
            if j + 1 < size.y {
                off_diag += row.up * x[(i, j + 1, k)];
            }
            if k > 0 {
                off_diag += a[(i, j, k - 1)].front * x[(i, j, k - 1)];
            }
            if k + 1 < size.z {
                off_diag += row.front * x[(i, j, k + 1)];
            }

            *out = if row.center.abs() > f64::MIN_POSITIVE {
                (b[(i, j, k)] - off_diag) / row.center
            } else {
                x[(i, j, k)]
            };
        });
    }

    /// 单次 Jacobi 松弛（压缩）
    pub fn relax_compressed(a: &CsrMatrix<f64>, b: &[f64], x: &[f64], x_temp: &mut [f64]) {
        debug_assert_eq!(a.n_rows(), b.len());
        debug_assert_eq!(a.n_rows(), x.len());
        debug_assert_eq!(a.n_rows(), x_temp.len());

        for row in 0..a.n_rows() {
            let (cols, vals) = a.row(row);
            let mut diag = 0.0;
            let mut off_diag = 0.0;
            for (&col, &v) in cols.iter().zip(vals.iter()) {
                if col == row {
                    diag = v;
                } else {
                    off_diag += v * x[col];
                }
            }
            x_temp[row] = if diag.abs() > f64::MIN_POSITIVE {
                (b[row] - off_diag) / diag
            } else {
                x[row]
            };
        }
    }
}

impl FdmLinearSystemSolver3 for FdmJacobiSolver3 {
    fn solve(&mut self, system: &mut FdmLinearSystem3) -> bool {
        let size = system.size();
        self.x_temp_comp.clear();
        self.residual_comp.clear();
        if self.x_temp.size() != size {
            self.x_temp = FdmVector3::new(size, 0.0);
            self.residual = FdmVector3::new(size, 0.0);
        }

        self.last_number_of_iterations = self.max_number_of_iterations;
        for iter in 0..self.max_number_of_iterations {
            Self::relax(&system.a, &system.b, &system.x, &mut self.x_temp);
            system.x.swap(&mut self.x_temp);

            if iter != 0 && iter % self.residual_check_interval == 0 {
                FdmBlas3::residual(&system.a, &system.x, &system.b, &mut self.residual);
                if FdmBlas3::l2_norm(&self.residual) < self.tolerance {
                    self.last_number_of_iterations = iter + 1;
                    break;
                }
            }
        }

        FdmBlas3::residual(&system.a, &system.x, &system.b, &mut self.residual);
        self.last_residual = FdmBlas3::l2_norm(&self.residual);
        self.last_residual < self.tolerance
    }

    fn solve_compressed(&mut self, system: &mut FdmCompressedLinearSystem3) -> bool {
        let n = system.b.len();
        self.x_temp = FdmVector3::new(Size3::ZERO, 0.0);
        self.residual = FdmVector3::new(Size3::ZERO, 0.0);
        self.x_temp_comp.clear();
        self.x_temp_comp.resize(n, 0.0);
        self.residual_comp.clear();
        self.residual_comp.resize(n, 0.0);

        self.last_number_of_iterations = self.max_number_of_iterations;
        for iter in 0..self.max_number_of_iterations {
            Self::relax_compressed(&system.a, &system.b, &system.x, &mut self.x_temp_comp);
            std::mem::swap(&mut system.x, &mut self.x_temp_comp);

            if iter != 0 && iter % self.residual_check_interval == 0 {
                FdmCompressedBlas3::residual(
                    &system.a,
                    &system.x,
                    &system.b,
                    &mut self.residual_comp,
                );
                if FdmCompressedBlas3::l2_norm(&self.residual_comp) < self.tolerance {
                    self.last_number_of_iterations = iter + 1;
                    break;
                }
            }
        }

        FdmCompressedBlas3::residual(&system.a, &system.x, &system.b, &mut self.residual_comp);
        self.last_residual = FdmCompressedBlas3::l2_norm(&self.residual_comp);
        self.last_residual < self.tolerance
    }

    fn last_number_of_iterations(&self) -> u32 {
        self.last_number_of_iterations
    }

    fn last_residual(&self) -> f64 {
        self.last_residual
    }

    fn name(&self) -> &'static str {
        "Jacobi"
    }
}

// ============================================================
// 测试
// ============================================================
