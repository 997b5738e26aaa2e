// crates/vg_physics/src/numerics/mod.rs

//! 数值基础模块
//!
//! 提供网格求解器所需的数值底座：
//! - [`size3`]: 三维整数尺寸与线性索引
//! - [`array3`]: 稠密三维数组（i 最快的行主序）
//! - [`value`]: 可存储于网格的值类型抽象（f64 / DVec3）
//! - [`samplers`]: 最近邻 / 三线性 / 单调 Catmull-Rom 插值采样器
//! - [`level_set`]: 符号距离场辅助函数
//! - [`extrapolation`]: 标记引导的区域外插
//! - [`linear_algebra`]: CSR 稀疏矩阵、FDM 线性系统与迭代求解器

pub mod array3;
pub mod extrapolation;
pub mod level_set;
pub mod linear_algebra;
pub mod samplers;
pub mod size3;
pub mod value;

pub use array3::Array3;
pub use extrapolation::extrapolate_to_region;
pub use level_set::{fraction_inside_sdf, is_inside_sdf};
pub use samplers::{
    get_barycentric, CubicArraySampler3, LinearArraySampler3, NearestArraySampler3,
};
pub use size3::Size3;
pub use value::GridValue;
