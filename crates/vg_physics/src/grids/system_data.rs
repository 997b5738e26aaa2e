// crates/vg_physics/src/grids/system_data.rs

//! 网格系统数据
//!
//! 流体模拟的核心数据容器：一个必备的面心速度层（始终可平流），
//! 外加任意数量用户注册的标量/向量层，按"是否随流平流"分类。
//! 所有层在同一分辨率/间距/原点下保持步调一致。
//!
//! 不变量：
//! - 速度层位于可平流向量层列表内，其索引在注册后始终有效
//! - "可平流"属性在注册时确定，之后不再改变

use glam::DVec3;

use super::face_centered::FaceCenteredGrid3;
use super::geometry::{BoundingBox3, GridGeometry};
use super::scalar_grid::{ScalarGrid3, ScalarLayout};
use super::vector_grid::{VectorGrid3, VectorLayout};
use crate::numerics::size3::Size3;

/// 标量层注册规格
///
/// 延迟构建的网格描述：布局 + 初始填充值。
#[derive(Clone, Copy, Debug)]
pub struct ScalarGridSpec {
    /// 数据布局
    pub layout: ScalarLayout,
    /// 初始值
    pub initial_value: f64,
}

impl Default for ScalarGridSpec {
    fn default() -> Self {
        Self {
            layout: ScalarLayout::CellCentered,
            initial_value: 0.0,
        }
    }
}

/// 向量层注册规格
#[derive(Clone, Copy, Debug)]
pub struct VectorGridSpec {
    /// 数据布局
    pub layout: VectorLayout,
    /// 初始值
    pub initial_value: DVec3,
}

impl Default for VectorGridSpec {
    fn default() -> Self {
        Self {
            layout: VectorLayout::CellCentered,
            initial_value: DVec3::ZERO,
        }
    }
}

/// 网格系统数据
pub struct GridSystemData3 {
    geometry: GridGeometry,
    velocity_idx: usize,
    scalar_data: Vec<ScalarGrid3>,
    vector_data: Vec<VectorGrid3>,
    advectable_scalar_data: Vec<ScalarGrid3>,
    advectable_vector_data: Vec<VectorGrid3>,
}

impl GridSystemData3 {
    /// 以给定几何构造系统（含零初始化的速度层）
    pub fn new(resolution: Size3, grid_spacing: DVec3, origin: DVec3) -> Self {
        let geometry = GridGeometry::new(resolution, grid_spacing, origin);
        let velocity = VectorGrid3::FaceCentered(FaceCenteredGrid3::new(
            resolution,
            grid_spacing,
            origin,
            DVec3::ZERO,
        ));
        Self {
            geometry,
            velocity_idx: 0,
            scalar_data: Vec::new(),
            vector_data: Vec::new(),
            advectable_scalar_data: Vec::new(),
            advectable_vector_data: vec![velocity],
        }
    }

    /// 分辨率
    #[inline]
    pub fn resolution(&self) -> Size3 {
        self.geometry.resolution()
    }

    /// 网格间距
    #[inline]
    pub fn grid_spacing(&self) -> DVec3 {
        self.geometry.grid_spacing()
    }

    /// 原点
    #[inline]
    pub fn origin(&self) -> DVec3 {
        self.geometry.origin()
    }

    /// 包围盒
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox3 {
        self.geometry.bounding_box()
    }

    /// 整体调整尺寸，所有层保持步调一致
    pub fn resize(&mut self, resolution: Size3, grid_spacing: DVec3, origin: DVec3) {
        self.geometry = GridGeometry::new(resolution, grid_spacing, origin);

        for g in &mut self.scalar_data {
            g.resize(resolution, grid_spacing, origin, 0.0);
        }
        for g in &mut self.vector_data {
            g.resize(resolution, grid_spacing, origin, DVec3::ZERO);
        }
        for g in &mut self.advectable_scalar_data {
            g.resize(resolution, grid_spacing, origin, 0.0);
        }
        for g in &mut self.advectable_vector_data {
            g.resize(resolution, grid_spacing, origin, DVec3::ZERO);
        }
    }

    /// 注册不可平流标量层，返回索引
    pub fn add_scalar_data(&mut self, spec: ScalarGridSpec) -> usize {
        self.scalar_data.push(ScalarGrid3::new(
            self.geometry.resolution(),
            self.geometry.grid_spacing(),
            self.geometry.origin(),
            spec.layout,
            spec.initial_value,
        ));
        self.scalar_data.len() - 1
    }

    /// 注册不可平流向量层，返回索引
    pub fn add_vector_data(&mut self, spec: VectorGridSpec) -> usize {
        self.vector_data.push(VectorGrid3::from_layout(
            spec.layout,
            self.geometry.resolution(),
            self.geometry.grid_spacing(),
            self.geometry.origin(),
            spec.initial_value,
        ));
        self.vector_data.len() - 1
    }

    /// 注册可平流标量层，返回索引
    pub fn add_advectable_scalar_data(&mut self, spec: ScalarGridSpec) -> usize {
        self.advectable_scalar_data.push(ScalarGrid3::new(
            self.geometry.resolution(),
            self.geometry.grid_spacing(),
            self.geometry.origin(),
            spec.layout,
            spec.initial_value,
        ));
        self.advectable_scalar_data.len() - 1
    }

    /// 注册可平流向量层，返回索引
    pub fn add_advectable_vector_data(&mut self, spec: VectorGridSpec) -> usize {
        self.advectable_vector_data.push(VectorGrid3::from_layout(
            spec.layout,
            self.geometry.resolution(),
            self.geometry.grid_spacing(),
            self.geometry.origin(),
            spec.initial_value,
        ));
        self.advectable_vector_data.len() - 1
    }

    /// 速度层（始终为面心网格）
    #[inline]
    pub fn velocity(&self) -> &FaceCenteredGrid3 {
        match &self.advectable_vector_data[self.velocity_idx] {
            VectorGrid3::FaceCentered(g) => g,
            // 速度层布局不变量由构造保证
            _ => unreachable!("速度层必须是面心网格"),
        }
    }

    /// 速度层（可变）
    #[inline]
    pub fn velocity_mut(&mut self) -> &mut FaceCenteredGrid3 {
        match &mut self.advectable_vector_data[self.velocity_idx] {
            VectorGrid3::FaceCentered(g) => g,
            _ => unreachable!("速度层必须是面心网格"),
        }
    }

    /// 速度层在可平流向量层列表中的索引
    #[inline]
    pub fn velocity_index(&self) -> usize {
        self.velocity_idx
    }

    /// 不可平流标量层
    pub fn scalar_data_at(&self, idx: usize) -> &ScalarGrid3 {
        &self.scalar_data[idx]
    }

    /// 不可平流标量层（可变）
    pub fn scalar_data_at_mut(&mut self, idx: usize) -> &mut ScalarGrid3 {
        &mut self.scalar_data[idx]
    }

    /// 不可平流向量层
    pub fn vector_data_at(&self, idx: usize) -> &VectorGrid3 {
        &self.vector_data[idx]
    }

    /// 不可平流向量层（可变）
    pub fn vector_data_at_mut(&mut self, idx: usize) -> &mut VectorGrid3 {
        &mut self.vector_data[idx]
    }

    /// 可平流标量层
    pub fn advectable_scalar_data_at(&self, idx: usize) -> &ScalarGrid3 {
        &self.advectable_scalar_data[idx]
    }

    /// 可平流标量层（可变）
    pub fn advectable_scalar_data_at_mut(&mut self, idx: usize) -> &mut ScalarGrid3 {
        &mut self.advectable_scalar_data[idx]
    }

    /// 可平流向量层
    pub fn advectable_vector_data_at(&self, idx: usize) -> &VectorGrid3 {
        &self.advectable_vector_data[idx]
    }

    /// 可平流向量层（可变）
    pub fn advectable_vector_data_at_mut(&mut self, idx: usize) -> &mut VectorGrid3 {
        &mut self.advectable_vector_data[idx]
    }

    /// 不可平流标量层数量
    pub fn number_of_scalar_data(&self) -> usize {
        self.scalar_data.len()
    }

    /// 不可平流向量层数量
    pub fn number_of_vector_data(&self) -> usize {
        self.vector_data.len()
    }

    /// 可平流标量层数量
    pub fn number_of_advectable_scalar_data(&self) -> usize {
        self.advectable_scalar_data.len()
    }

    /// 可平流向量层数量
    pub fn number_of_advectable_vector_data(&self) -> usize {
        self.advectable_vector_data.len()
    }

    /// 拆分借用：可平流标量层（可变）+ 速度层（只读）
    ///
    /// 平流阶段需要一边写各标量层、一边以当前速度作为流场，
    /// 两者位于不同字段，借用不相交。
    pub fn split_scalars_and_velocity(
        &mut self,
    ) -> (&mut [ScalarGrid3], &FaceCenteredGrid3) {
        let velocity = match &self.advectable_vector_data[self.velocity_idx] {
            VectorGrid3::FaceCentered(g) => g,
            _ => unreachable!("速度层必须是面心网格"),
        };
        (&mut self.advectable_scalar_data, velocity)
    }

    /// 拆分借用：速度层之外的可平流向量层（可变）+ 速度层（只读）
    ///
    /// 返回 (速度之前的层, 速度之后的层, 速度)。
    pub fn split_vectors_and_velocity(
        &mut self,
    ) -> (&mut [VectorGrid3], &mut [VectorGrid3], &FaceCenteredGrid3) {
        let (before, rest) = self.advectable_vector_data.split_at_mut(self.velocity_idx);
        let (vel_slice, after) = rest.split_at_mut(1);
        let velocity = match &vel_slice[0] {
            VectorGrid3::FaceCentered(g) => g,
            _ => unreachable!("速度层必须是面心网格"),
        };
        (before, after, velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_system() -> GridSystemData3 {
        GridSystemData3::new(Size3::new(4, 4, 4), DVec3::ONE, DVec3::ZERO)
    }

    #[test]
    fn test_velocity_layer_exists_by_default() {
        let system = make_system();
        assert_eq!(system.number_of_advectable_vector_data(), 1);
        assert_eq!(system.velocity_index(), 0);
        assert_eq!(system.velocity().resolution(), Size3::new(4, 4, 4));
    }

    #[test]
    fn test_layer_registration_returns_indices() {
        let mut system = make_system();

        let s0 = system.add_scalar_data(ScalarGridSpec::default());
        let s1 = system.add_scalar_data(ScalarGridSpec {
            layout: ScalarLayout::VertexCentered,
            initial_value: 5.0,
        });
        assert_eq!((s0, s1), (0, 1));
        assert_eq!(system.number_of_scalar_data(), 2);
        assert_eq!(*system.scalar_data_at(1).data().at(0, 0, 0), 5.0);

        let a0 = system.add_advectable_scalar_data(ScalarGridSpec {
            layout: ScalarLayout::CellCentered,
            initial_value: -1.0,
        });
        assert_eq!(a0, 0);
        assert_eq!(system.number_of_advectable_scalar_data(), 1);

        let v0 = system.add_advectable_vector_data(VectorGridSpec {
            layout: VectorLayout::FaceCentered,
            initial_value: DVec3::X,
        });
        // 速度层占据索引 0
        assert_eq!(v0, 1);
    }

    #[test]
    fn test_resize_lockstep() {
        let mut system = make_system();
        system.add_scalar_data(ScalarGridSpec::default());
        system.add_advectable_scalar_data(ScalarGridSpec::default());
        system.add_advectable_vector_data(VectorGridSpec {
            layout: VectorLayout::CellCentered,
            initial_value: DVec3::ZERO,
        });

        let new_res = Size3::new(8, 6, 4);
        system.resize(new_res, DVec3::splat(0.25), DVec3::ONE);

        assert_eq!(system.resolution(), new_res);
        assert_eq!(system.velocity().resolution(), new_res);
        assert_eq!(system.scalar_data_at(0).resolution(), new_res);
        assert_eq!(system.advectable_scalar_data_at(0).resolution(), new_res);
        assert_eq!(system.advectable_vector_data_at(1).resolution(), new_res);
        // 速度层索引保持有效
        assert_eq!(system.velocity_index(), 0);
    }

    #[test]
    fn test_split_vectors_excludes_velocity() {
        let mut system = make_system();
        system.add_advectable_vector_data(VectorGridSpec {
            layout: VectorLayout::CellCentered,
            initial_value: DVec3::ZERO,
        });
        system.add_advectable_vector_data(VectorGridSpec {
            layout: VectorLayout::FaceCentered,
            initial_value: DVec3::ZERO,
        });

        let (before, after, velocity) = system.split_vectors_and_velocity();
        assert_eq!(before.len(), 0);
        assert_eq!(after.len(), 2);
        assert_eq!(velocity.resolution(), Size3::new(4, 4, 4));
    }

    #[test]
    fn test_split_scalars_and_velocity() {
        let mut system = make_system();
        system.add_advectable_scalar_data(ScalarGridSpec::default());
        system.velocity_mut().fill(DVec3::X);

        let (scalars, velocity) = system.split_scalars_and_velocity();
        assert_eq!(scalars.len(), 1);
        assert_eq!(velocity.u()[(0, 0, 0)], 1.0);
        scalars[0].fill(3.0);
        assert_eq!(*system.advectable_scalar_data_at(0).data().at(0, 0, 0), 3.0);
    }
}
