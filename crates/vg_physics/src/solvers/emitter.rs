// crates/vg_physics/src/solvers/emitter.rs

//! 发射器接口
//!
//! 发射器在每个子步开始时被调用一次，向网格系统注入速度/标量
//! （副作用式）。编排器只调用 `update`，从不探查发射器内部状态。
//! 目标网格系统以显式可变引用传入，发射器不持有网格指针。

use crate::grids::system_data::GridSystemData3;

/// 网格发射器
pub trait GridEmitter3: Send {
    /// 按时间推进发射器，副作用写入网格系统
    fn update(
        &mut self,
        grids: &mut GridSystemData3,
        current_time_in_seconds: f64,
        time_interval_in_seconds: f64,
    );
}

/// 闭包包装的发射器
///
/// 测试与简单场景用：把一个闭包当作发射器。
pub struct FnGridEmitter3<F>
where
    F: FnMut(&mut GridSystemData3, f64, f64) + Send,
{
    callback: F,
}

impl<F> FnGridEmitter3<F>
where
    F: FnMut(&mut GridSystemData3, f64, f64) + Send,
{
    /// 包装闭包
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> GridEmitter3 for FnGridEmitter3<F>
where
    F: FnMut(&mut GridSystemData3, f64, f64) + Send,
{
    fn update(
        &mut self,
        grids: &mut GridSystemData3,
        current_time_in_seconds: f64,
        time_interval_in_seconds: f64,
    ) {
        (self.callback)(grids, current_time_in_seconds, time_interval_in_seconds);
    }
}
