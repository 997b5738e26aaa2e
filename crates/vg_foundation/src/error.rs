// crates/vg_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `VgError` 枚举和 `VgResult` 类型别名，用于整个项目的错误处理。
//!
//! # 设计原则
//!
//! 1. **分层**: 热路径数值内核中的前置条件违反使用断言（致命），
//!    本错误类型只覆盖配置/注册层面可恢复的错误
//! 2. **易用性**: 提供便捷的构造方法
//!
//! # 示例
//!
//! ```
//! use vg_foundation::error::{VgError, VgResult};
//!
//! fn register_layer(expected: usize, actual: usize) -> VgResult<()> {
//!     VgError::check_size("layer", expected, actual)
//! }
//! ```

use thiserror::Error;

/// 统一结果类型
pub type VgResult<T> = Result<T, VgError>;

/// VortiGrid 错误类型
///
/// 覆盖配置与注册层面的可恢复错误。数值内核的前置条件违反
/// （越界索引、非正网格间距、矩阵维度不匹配）以断言方式处理。
#[derive(Error, Debug)]
pub enum VgError {
    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    /// 数据超出范围
    #[error("数据超出范围: {field}={value}, 期望范围=[{min}, {max}]")]
    OutOfRange {
        /// 字段名
        field: &'static str,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 资源未找到
    #[error("资源未找到: {resource}")]
    NotFound {
        /// 资源名称
        resource: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl VgError {
    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 数据超出范围
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 资源未找到
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl VgError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> VgResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查值是否在范围内
    #[inline]
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> VgResult<()> {
        if value < min || value > max {
            Err(Self::out_of_range(field, value, min, max))
        } else {
            Ok(())
        }
    }

    /// 检查索引是否在范围内
    #[inline]
    pub fn check_index(index_type: &'static str, index: usize, len: usize) -> VgResult<()> {
        if index >= len {
            Err(Self::index_out_of_bounds(index_type, index, len))
        } else {
            Ok(())
        }
    }
}

// ========================================================================
// 测试
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VgError::config("测试配置错误");
        assert!(err.to_string().contains("配置错误"));
    }

    #[test]
    fn test_size_mismatch() {
        let err = VgError::size_mismatch("velocity", 10, 5);
        assert!(err.to_string().contains("velocity"));
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_check_size() {
        assert!(VgError::check_size("test", 10, 10).is_ok());
        assert!(VgError::check_size("test", 10, 5).is_err());
    }

    #[test]
    fn test_check_range() {
        assert!(VgError::check_range("value", 5.0, 0.0, 10.0).is_ok());
        assert!(VgError::check_range("value", -1.0, 0.0, 10.0).is_err());
        assert!(VgError::check_range("value", 11.0, 0.0, 10.0).is_err());
    }

    #[test]
    fn test_check_index() {
        assert!(VgError::check_index("layer", 5, 10).is_ok());
        assert!(VgError::check_index("layer", 10, 10).is_err());
    }

    #[test]
    fn test_ensure_macro() {
        fn check(value: i32) -> VgResult<()> {
            crate::ensure!(value > 0, VgError::invalid_input("value must be positive"));
            Ok(())
        }

        assert!(check(1).is_ok());
        assert!(check(-1).is_err());
    }

    #[test]
    fn test_require_macro() {
        fn get_value(opt: Option<i32>) -> VgResult<i32> {
            let v = crate::require!(opt, VgError::not_found("value"));
            Ok(v)
        }

        assert_eq!(get_value(Some(42)).unwrap(), 42);
        assert!(get_value(None).is_err());
    }
}
