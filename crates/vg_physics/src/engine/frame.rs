// crates/vg_physics/src/engine/frame.rs

//! 模拟帧状态
//!
//! 帧 = (整数帧号, 每帧秒数)，当前时刻由二者导出。
//! 帧号每次恰好递增 1，不允许跳帧。

use serde::{Deserialize, Serialize};

/// 模拟帧
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// 帧号（-1 表示尚未模拟任何帧）
    pub index: i32,
    /// 每帧时长（秒）
    pub time_interval_in_seconds: f64,
}

impl Frame {
    /// 创建帧
    pub fn new(index: i32, time_interval_in_seconds: f64) -> Self {
        Self {
            index,
            time_interval_in_seconds,
        }
    }

    /// 当前时刻（秒）= 帧号 × 每帧时长
    #[inline]
    pub fn time_in_seconds(&self) -> f64 {
        self.index as f64 * self.time_interval_in_seconds
    }

    /// 推进一帧
    #[inline]
    pub fn advance(&mut self) {
        self.index += 1;
    }

    /// 推进多帧
    #[inline]
    pub fn advance_by(&mut self, delta: i32) {
        self.index += delta;
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            index: 0,
            time_interval_in_seconds: 1.0 / 60.0,
        }
    }
}
