// crates/vg_physics/src/boundary/blocked.rs

//! 阻塞式边界条件求解器
//!
//! 在分数式约束的基础上，以整单元粒度把每个单元分类为流体或
//! 碰撞体（单元中心 SDF 内外测试），并将碰撞体单元与流体单元
//! 之间的共享面硬性设为碰撞体在该面位置的速度（无通量）。
//! 覆写发生在分数式基座之后，以精确的碰撞体运动学为准。

use glam::DVec3;

use super::fractional::GridFractionalBoundaryConditionSolver3;
use super::GridBoundaryConditionSolver3;
use crate::geometry::collider::SharedCollider;
use crate::grids::face_centered::FaceCenteredGrid3;
use crate::grids::scalar_grid::ScalarGrid3;
use crate::numerics::array3::Array3;
use crate::numerics::level_set::is_inside_sdf;
use crate::numerics::size3::Size3;

/// 流体单元标记
const FLUID: u8 = 1;
/// 碰撞体单元标记
const COLLIDER: u8 = 0;

/// 阻塞式边界条件求解器
pub struct GridBlockedBoundaryConditionSolver3 {
    fractional: GridFractionalBoundaryConditionSolver3,
    marker: Array3<u8>,
}

impl GridBlockedBoundaryConditionSolver3 {
    /// 创建求解器
    pub fn new() -> Self {
        Self {
            fractional: GridFractionalBoundaryConditionSolver3::new(),
            marker: Array3::new(Size3::ZERO, FLUID),
        }
    }

    /// 单元标记数组（0 = 碰撞体，1 = 流体）
    pub fn marker(&self) -> &Array3<u8> {
        &self.marker
    }

    /// 由 SDF 缓存重建单元标记
    fn rebuild_marker(&mut self, grid_size: Size3) {
        let sdf = self.fractional.collider_sdf();
        let mut marker = Array3::new(grid_size, FLUID);
        marker.par_for_each_mut(|(i, j, k), m| {
            *m = if is_inside_sdf(*sdf.data().at(i, j, k)) {
                COLLIDER
            } else {
                FLUID
            };
        });
        self.marker = marker;
    }
}

impl Default for GridBlockedBoundaryConditionSolver3 {
    fn default() -> Self {
        Self::new()
    }
}

impl GridBoundaryConditionSolver3 for GridBlockedBoundaryConditionSolver3 {
    fn update_collider(
        &mut self,
        collider: Option<SharedCollider>,
        grid_size: Size3,
        grid_spacing: DVec3,
        grid_origin: DVec3,
    ) {
        self.fractional
            .update_collider(collider, grid_size, grid_spacing, grid_origin);
        self.rebuild_marker(grid_size);
    }

    fn collider(&self) -> Option<&SharedCollider> {
        self.fractional.collider()
    }

    fn constrain_velocity(&mut self, velocity: &mut FaceCenteredGrid3, extrapolation_depth: u32) {
        self.fractional
            .constrain_velocity(velocity, extrapolation_depth);

        let size = velocity.resolution();
        if size.is_empty() {
            return;
        }
        if self.marker.size() != size {
            self.rebuild_marker(size);
        }

        // 无通量：碰撞体单元与流体单元的共享面取碰撞体速度
        let marker = &self.marker;
        let u_origin = velocity.u_origin();
        let v_origin = velocity.v_origin();
        let w_origin = velocity.w_origin();
        let h = velocity.grid_spacing();
        let pos = |origin: DVec3, i: usize, j: usize, k: usize| {
            origin + DVec3::new(i as f64 * h.x, j as f64 * h.y, k as f64 * h.z)
        };

        let mut face_overrides: Vec<(u8, usize, usize, usize, f64)> = Vec::new();
        marker.for_each_index(|i, j, k| {
            if marker[(i, j, k)] != COLLIDER {
                return;
            }
            if i > 0 && marker[(i - 1, j, k)] == FLUID {
                let pt = pos(u_origin, i, j, k);
                face_overrides.push((0, i, j, k, self.fractional.collider_velocity_at(pt).x));
            }
            if i + 1 < size.x && marker[(i + 1, j, k)] == FLUID {
                let pt = pos(u_origin, i + 1, j, k);
                face_overrides.push((0, i + 1, j, k, self.fractional.collider_velocity_at(pt).x));
            }
            if j > 0 && marker[(i, j - 1, k)] == FLUID {
                let pt = pos(v_origin, i, j, k);
                face_overrides.push((1, i, j, k, self.fractional.collider_velocity_at(pt).y));
            }
            if j + 1 < size.y && marker[(i, j + 1, k)] == FLUID {
                let pt = pos(v_origin, i, j + 1, k);
                face_overrides.push((1, i, j + 1, k, self.fractional.collider_velocity_at(pt).y));
            }
            if k > 0 && marker[(i, j, k - 1)] == FLUID {
                let pt = pos(w_origin, i, j, k);
                face_overrides.push((2, i, j, k, self.fractional.collider_velocity_at(pt).z));
            }
            if k + 1 < size.z && marker[(i, j, k + 1)] == FLUID {
                let pt = pos(w_origin, i, j, k + 1);
                face_overrides.push((2, i, j, k + 1, self.fractional.collider_velocity_at(pt).z));
            }
        });

        let (u, v, w) = velocity.uvw_mut();
        for (axis, i, j, k, value) in face_overrides {
            match axis {
                0 => u[(i, j, k)] = value,
                1 => v[(i, j, k)] = value,
                _ => w[(i, j, k)] = value,
            }
        }
    }

    fn collider_sdf(&self) -> &ScalarGrid3 {
        self.fractional.collider_sdf()
    }

    fn collider_velocity_at(&self, point: DVec3) -> DVec3 {
        self.fractional.collider_velocity_at(point)
    }

    fn closed_domain_boundary_flag(&self) -> u32 {
        self.fractional.closed_domain_boundary_flag()
    }

    fn set_closed_domain_boundary_flag(&mut self, flag: u32) {
        self.fractional.set_closed_domain_boundary_flag(flag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::collider::RigidBodyCollider3;
    use crate::geometry::surface::{Plane3, Sphere3};
    use vg_foundation::constants::DIRECTION_ALL;

    #[test]
    fn test_marker_classification() {
        // 下半空间为碰撞体：y < 0 的单元标记为 0
        let collider =
            RigidBodyCollider3::new(Box::new(Plane3::new(DVec3::Y, DVec3::ZERO))).into_shared();

        let mut solver = GridBlockedBoundaryConditionSolver3::new();
        solver.update_collider(
            Some(collider),
            Size3::new(4, 4, 4),
            DVec3::ONE,
            DVec3::new(0.0, -2.0, 0.0),
        );

        let marker = solver.marker();
        assert_eq!(marker[(0, 0, 0)], COLLIDER);
        assert_eq!(marker[(0, 1, 0)], COLLIDER);
        assert_eq!(marker[(0, 2, 0)], FLUID);
        assert_eq!(marker[(0, 3, 0)], FLUID);
    }

    #[test]
    fn test_interface_faces_take_collider_velocity() {
        // 运动的半空间碰撞体：界面共享面应取碰撞体速度分量
        let collider = RigidBodyCollider3::new(Box::new(Plane3::new(DVec3::Y, DVec3::ZERO)))
            .with_velocity(DVec3::new(0.0, 0.5, 0.0), DVec3::ZERO)
            .into_shared();

        let mut solver = GridBlockedBoundaryConditionSolver3::new();
        solver.set_closed_domain_boundary_flag(DIRECTION_ALL);
        solver.update_collider(
            Some(collider),
            Size3::new(4, 4, 4),
            DVec3::ONE,
            DVec3::new(0.0, -2.0, 0.0),
        );

        let mut velocity = FaceCenteredGrid3::new(
            Size3::new(4, 4, 4),
            DVec3::ONE,
            DVec3::new(0.0, -2.0, 0.0),
            DVec3::ZERO,
        );
        velocity.fill(DVec3::new(0.0, -1.0, 0.0));
        solver.constrain_velocity(&mut velocity, 4);

        // 界面在 j=2（单元 j=1 为碰撞体、j=2 为流体），共享面 v(i,2,k)
        assert!((velocity.v()[(1, 2, 1)] - 0.5).abs() < 1e-12);
        assert!((velocity.v()[(2, 2, 2)] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_no_collider_leaves_interior_untouched() {
        let mut solver = GridBlockedBoundaryConditionSolver3::new();
        solver.update_collider(None, Size3::new(6, 6, 6), DVec3::ONE, DVec3::ZERO);

        let mut velocity =
            FaceCenteredGrid3::new(Size3::new(6, 6, 6), DVec3::ONE, DVec3::ZERO, DVec3::ZERO);
        velocity.fill(DVec3::new(2.0, 0.0, 0.0));
        solver.constrain_velocity(&mut velocity, 3);

        // 全部为流体单元，无覆写；内部 u 面保持
        assert_eq!(velocity.u()[(3, 3, 3)], 2.0);
        // 封闭域边界仍然为零
        assert_eq!(velocity.u()[(0, 3, 3)], 0.0);
        assert_eq!(velocity.u()[(6, 3, 3)], 0.0);
    }

    #[test]
    fn test_sphere_collider_marker_inside() {
        let collider = RigidBodyCollider3::new(Box::new(Sphere3::new(
            DVec3::new(2.0, 2.0, 2.0),
            1.2,
        )))
        .into_shared();

        let mut solver = GridBlockedBoundaryConditionSolver3::new();
        solver.update_collider(Some(collider), Size3::new(4, 4, 4), DVec3::ONE, DVec3::ZERO);

        // 球心所在单元在内部
        assert_eq!(solver.marker()[(1, 1, 1)], COLLIDER);
        // 远角单元在外部
        assert_eq!(solver.marker()[(3, 3, 3)], FLUID);
    }
}
