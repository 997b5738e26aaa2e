// crates/vg_physics/src/boundary/fractional.rs

//! 分数式边界条件求解器
//!
//! 以符号距离场的亚单元交叉分数约束速度：完全落入碰撞体的面
//! 取碰撞体速度；跨越界面的面先从流体侧外插，再沿 SDF 梯度
//! 去除相对法向分量并施加摩擦。与分数式压力离散配对可获得
//! 亚网格分辨率的速度投影。

use glam::DVec3;

use vg_foundation::constants::{
    DIRECTION_ALL, DIRECTION_BACK, DIRECTION_DOWN, DIRECTION_FRONT, DIRECTION_LEFT,
    DIRECTION_RIGHT, DIRECTION_UP,
};

use super::GridBoundaryConditionSolver3;
use crate::geometry::collider::{project_and_apply_friction, SharedCollider};
use crate::geometry::field::{ScalarField3, VectorField3};
use crate::grids::face_centered::FaceCenteredGrid3;
use crate::grids::scalar_grid::{ScalarGrid3, ScalarLayout};
use crate::numerics::array3::Array3;
use crate::numerics::extrapolation::extrapolate_to_region;
use crate::numerics::level_set::{fraction_inside_sdf, is_inside_sdf};
use crate::numerics::size3::Size3;

/// 分数式边界条件求解器
pub struct GridFractionalBoundaryConditionSolver3 {
    collider: Option<SharedCollider>,
    closed_domain_boundary_flag: u32,
    grid_size: Size3,
    grid_spacing: DVec3,
    grid_origin: DVec3,
    collider_sdf: ScalarGrid3,
}

impl GridFractionalBoundaryConditionSolver3 {
    /// 创建求解器（默认全封闭域）
    pub fn new() -> Self {
        Self {
            collider: None,
            closed_domain_boundary_flag: DIRECTION_ALL,
            grid_size: Size3::ZERO,
            grid_spacing: DVec3::ONE,
            grid_origin: DVec3::ZERO,
            collider_sdf: ScalarGrid3::new(
                Size3::ZERO,
                DVec3::ONE,
                DVec3::ZERO,
                ScalarLayout::CellCentered,
                f64::MAX,
            ),
        }
    }

    /// 重建 SDF 缓存
    fn rebuild_cache(&mut self) {
        let mut sdf = ScalarGrid3::new(
            self.grid_size,
            self.grid_spacing,
            self.grid_origin,
            ScalarLayout::CellCentered,
            f64::MAX,
        );
        if let Some(c) = &self.collider {
            let c = c.read();
            sdf.fill_with(|p| c.signed_distance(p));
        }
        self.collider_sdf = sdf;
    }

    fn collider_friction(&self) -> f64 {
        self.collider
            .as_ref()
            .map_or(0.0, |c| c.read().friction_coefficient())
    }
}

impl Default for GridFractionalBoundaryConditionSolver3 {
    fn default() -> Self {
        Self::new()
    }
}

impl GridBoundaryConditionSolver3 for GridFractionalBoundaryConditionSolver3 {
    fn update_collider(
        &mut self,
        collider: Option<SharedCollider>,
        grid_size: Size3,
        grid_spacing: DVec3,
        grid_origin: DVec3,
    ) {
        self.collider = collider;
        self.grid_size = grid_size;
        self.grid_spacing = grid_spacing;
        self.grid_origin = grid_origin;
        self.rebuild_cache();
    }

    fn collider(&self) -> Option<&SharedCollider> {
        self.collider.as_ref()
    }

    fn constrain_velocity(&mut self, velocity: &mut FaceCenteredGrid3, extrapolation_depth: u32) {
        let size = velocity.resolution();
        if size.is_empty() {
            return;
        }

        // 缓存几何与目标场不一致时就地重建
        if self.grid_size != size
            || self.grid_spacing != velocity.grid_spacing()
            || self.grid_origin != velocity.origin()
        {
            self.grid_size = size;
            self.grid_spacing = velocity.grid_spacing();
            self.grid_origin = velocity.origin();
            self.rebuild_cache();
        }

        let h = velocity.grid_spacing();
        let u_origin = velocity.u_origin();
        let v_origin = velocity.v_origin();
        let w_origin = velocity.w_origin();
        let pos = |origin: DVec3, i: usize, j: usize, k: usize| {
            origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z)
        };

        let friction = self.collider_friction();
        let guard = self.collider.as_ref().map(|c| c.read());
        let collider_vel =
            |pt: DVec3| guard.as_ref().map_or(DVec3::ZERO, |g| g.velocity_at(pt));
        let sdf = &self.collider_sdf;

        // 步骤 1：按面上的 SDF 交叉分数分类。完全落入碰撞体的面
        // 直接取碰撞体速度并标记为无效（待外插覆盖周边）。
        let mut u_marker = Array3::new(velocity.u().size(), 1u8);
        let mut v_marker = Array3::new(velocity.v().size(), 1u8);
        let mut w_marker = Array3::new(velocity.w().size(), 1u8);

        let face_fraction = |pt: DVec3, half: DVec3| {
            let phi0 = sdf.sample(pt - half);
            let phi1 = sdf.sample(pt + half);
            1.0 - fraction_inside_sdf(phi0, phi1).clamp(0.0, 1.0)
        };

        u_marker.par_for_each_mut(|(i, j, k), m| {
            let pt = pos(u_origin, i, j, k);
            let frac = face_fraction(pt, DVec3::new(0.5 * h.x, 0.0, 0.0));
            *m = if frac > 0.0 { 1 } else { 0 };
        });
        v_marker.par_for_each_mut(|(i, j, k), m| {
            let pt = pos(v_origin, i, j, k);
            let frac = face_fraction(pt, DVec3::new(0.0, 0.5 * h.y, 0.0));
            *m = if frac > 0.0 { 1 } else { 0 };
        });
        w_marker.par_for_each_mut(|(i, j, k), m| {
            let pt = pos(w_origin, i, j, k);
            let frac = face_fraction(pt, DVec3::new(0.0, 0.0, 0.5 * h.z));
            *m = if frac > 0.0 { 1 } else { 0 };
        });

        {
            let (u, v, w) = velocity.uvw_mut();
            u.par_for_each_mut(|(i, j, k), val| {
                if u_marker[(i, j, k)] == 0 {
                    *val = collider_vel(pos(u_origin, i, j, k)).x;
                }
            });
            v.par_for_each_mut(|(i, j, k), val| {
                if v_marker[(i, j, k)] == 0 {
                    *val = collider_vel(pos(v_origin, i, j, k)).y;
                }
            });
            w.par_for_each_mut(|(i, j, k), val| {
                if w_marker[(i, j, k)] == 0 {
                    *val = collider_vel(pos(w_origin, i, j, k)).z;
                }
            });
        }

        // 步骤 2：自由滑移——把流体侧速度外插进碰撞体占据的面
        let u_input = velocity.u().clone();
        extrapolate_to_region(&u_input, &u_marker, extrapolation_depth, velocity.u_mut());
        let v_input = velocity.v().clone();
        extrapolate_to_region(&v_input, &v_marker, extrapolation_depth, velocity.v_mut());
        let w_input = velocity.w().clone();
        extrapolate_to_region(&w_input, &w_marker, extrapolation_depth, velocity.w_mut());

        // 步骤 3：无通量——碰撞体内部的面沿 SDF 梯度去除相对法向
        // 分量并施加摩擦。三个分量先各自算入临时数组，再统一写回，
        // 避免投影读到本轮已修改的分量。
        let mut u_temp = velocity.u().clone();
        let mut v_temp = velocity.v().clone();
        let mut w_temp = velocity.w().clone();

        let project = |pt: DVec3| -> Option<DVec3> {
            if !is_inside_sdf(sdf.sample(pt)) {
                return None;
            }
            let c_vel = collider_vel(pt);
            let vel = velocity.sample(pt);
            let g = sdf.gradient(pt);
            if g.length_squared() > 0.0 {
                let n = g.normalize();
                let vel_t = project_and_apply_friction(vel - c_vel, n, friction);
                Some(vel_t + c_vel)
            } else {
                Some(c_vel)
            }
        };

        u_temp.par_for_each_mut(|(i, j, k), val| {
            if let Some(vp) = project(pos(u_origin, i, j, k)) {
                *val = vp.x;
            }
        });
        v_temp.par_for_each_mut(|(i, j, k), val| {
            if let Some(vp) = project(pos(v_origin, i, j, k)) {
                *val = vp.y;
            }
        });
        w_temp.par_for_each_mut(|(i, j, k), val| {
            if let Some(vp) = project(pos(w_origin, i, j, k)) {
                *val = vp.z;
            }
        });

        drop(guard);

        *velocity.u_mut() = u_temp;
        *velocity.v_mut() = v_temp;
        *velocity.w_mut() = w_temp;

        // 步骤 4：封闭域边界面法向速度置零，开放方向不动
        let flag = self.closed_domain_boundary_flag;
        let (u, v, w) = velocity.uvw_mut();

        if flag & DIRECTION_LEFT != 0 {
            for k in 0..size.z {
                for j in 0..size.y {
                    u[(0, j, k)] = 0.0;
                }
            }
        }
        if flag & DIRECTION_RIGHT != 0 {
            for k in 0..size.z {
                for j in 0..size.y {
                    u[(size.x, j, k)] = 0.0;
                }
            }
        }
        if flag & DIRECTION_DOWN != 0 {
            for k in 0..size.z {
                for i in 0..size.x {
                    v[(i, 0, k)] = 0.0;
                }
            }
        }
        if flag & DIRECTION_UP != 0 {
            for k in 0..size.z {
                for i in 0..size.x {
                    v[(i, size.y, k)] = 0.0;
                }
            }
        }
        if flag & DIRECTION_BACK != 0 {
            for j in 0..size.y {
                for i in 0..size.x {
                    w[(i, j, 0)] = 0.0;
                }
            }
        }
        if flag & DIRECTION_FRONT != 0 {
            for j in 0..size.y {
                for i in 0..size.x {
                    w[(i, j, size.z)] = 0.0;
                }
            }
        }
    }

    fn collider_sdf(&self) -> &ScalarGrid3 {
        &self.collider_sdf
    }

    fn collider_velocity_at(&self, point: DVec3) -> DVec3 {
        self.collider
            .as_ref()
            .map_or(DVec3::ZERO, |c| c.read().velocity_at(point))
    }

    fn closed_domain_boundary_flag(&self) -> u32 {
        self.closed_domain_boundary_flag
    }

    fn set_closed_domain_boundary_flag(&mut self, flag: u32) {
        self.closed_domain_boundary_flag = flag;
    }
}
