// crates/vg_physics/src/grids/mod.rs

//! 网格数据模型
//!
//! - [`geometry`]: 网格几何描述（分辨率、间距、原点、包围盒）
//! - [`scalar_grid`]: 标量网格（单元中心 / 顶点布局）
//! - [`collocated`]: 同位向量网格
//! - [`face_centered`]: 面心（MAC / 交错）向量网格
//! - [`vector_grid`]: 向量网格布局的封闭标签联合
//! - [`system_data`]: 多层网格系统数据容器

pub mod collocated;
pub mod face_centered;
pub mod geometry;
pub mod scalar_grid;
pub mod system_data;
pub mod vector_grid;

pub use collocated::CollocatedVectorGrid3;
pub use face_centered::FaceCenteredGrid3;
pub use geometry::{BoundingBox3, GridGeometry};
pub use scalar_grid::{ScalarGrid3, ScalarLayout};
pub use system_data::{GridSystemData3, ScalarGridSpec, VectorGridSpec};
pub use vector_grid::{VectorGrid3, VectorLayout};
