// crates/vg_foundation/src/lib.rs

//! VortiGrid Foundation Layer
//!
//! 轻量基础层，提供整个项目的基础抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`scalar`]: 密封的标量类型抽象（f32/f64）
//! - [`constants`]: 全局数值常量与方向位掩码
//!
//! # 设计原则
//!
//! 1. **最小依赖**: 仅依赖 thiserror、num-traits、bytemuck
//! 2. **类型安全**: 标量 trait 密封，禁止外部实现
//! 3. **零开销抽象**: release 模式下最小化运行时开销

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod error;
pub mod scalar;

// 重导出常用类型
pub use error::{VgError, VgResult};
pub use scalar::Real;

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::constants::*;
    pub use crate::error::{VgError, VgResult};
    pub use crate::scalar::Real;
    pub use crate::{ensure, require};
}

/// 条件检查宏：条件不满足时提前返回错误
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err);
        }
    };
}

/// Option 解包宏：None 时提前返回错误
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr) => {
        match $opt {
            Some(v) => v,
            None => return Err($err),
        }
    };
}
