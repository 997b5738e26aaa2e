// crates/vg_physics/src/engine/integrator.rs

//! 子步进时间积分器
//!
//! 把一个粗粒度的帧间隔摊销为一串物理稳定的子步：
//!
//! - 固定模式：间隔均分为 N 个相等子步
//! - 自适应模式（默认）：每轮按**剩余**间隔向求解器询问
//!   `number_of_sub_time_steps`，取等分子步，直到剩余时间耗尽——
//!   子步大小随剩余时间逐轮重算，而不是由初始间隔一次定死
//!
//! 两种模式都精确消耗完整个请求间隔（浮点容差内）。
//! 状态机：{未初始化, 已初始化}，首次 `update` 触发一次性
//! 初始化钩子；帧号不增时 `update` 是空操作，从不重算或回退。

use vg_foundation::constants::EPSILON_D;

use super::frame::Frame;

/// 逐子步物理求解器钩子
///
/// 时间积分器对求解器的全部要求。
pub trait PhysicsSolver {
    /// 一次性初始化（首次 update 时调用）
    fn on_initialize(&mut self, current_time_in_seconds: f64) {
        let _ = current_time_in_seconds;
    }

    /// 推进一个子步
    fn on_advance_time_step(&mut self, current_time_in_seconds: f64, time_interval_in_seconds: f64);

    /// 给定间隔所需的子步数（自适应模式下逐轮询问）
    fn number_of_sub_time_steps(&self, time_interval_in_seconds: f64) -> u32 {
        let _ = time_interval_in_seconds;
        1
    }
}

/// 子步进策略
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SubStepping {
    /// CFL 自适应（默认）
    #[default]
    Adaptive,
    /// 固定子步数
    Fixed(u32),
}

/// 时间积分器
///
/// 驱动帧/子步状态机，持有当前帧与模拟内时钟。
pub struct TimeIntegrator {
    current_frame: Frame,
    current_time: f64,
    is_initialized: bool,
    sub_stepping: SubStepping,
}

impl TimeIntegrator {
    /// 以子步策略创建（当前帧号为 -1，首帧尚未模拟）
    pub fn new(sub_stepping: SubStepping) -> Self {
        Self {
            current_frame: Frame::new(-1, 1.0 / 60.0),
            current_time: 0.0,
            is_initialized: false,
            sub_stepping,
        }
    }

    /// 当前帧
    #[inline]
    pub fn current_frame(&self) -> Frame {
        self.current_frame
    }

    /// 设置当前帧（不触发模拟）
    pub fn set_current_frame(&mut self, frame: Frame) {
        self.current_frame = frame;
    }

    /// 当前模拟时刻（秒）
    #[inline]
    pub fn current_time_in_seconds(&self) -> f64 {
        self.current_time
    }

    /// 子步策略
    #[inline]
    pub fn sub_stepping(&self) -> SubStepping {
        self.sub_stepping
    }

    /// 设置子步策略
    pub fn set_sub_stepping(&mut self, sub_stepping: SubStepping) {
        if let SubStepping::Fixed(n) = sub_stepping {
            assert!(n > 0, "固定子步数必须大于 0");
        }
        self.sub_stepping = sub_stepping;
    }

    /// 推进到目标帧
    ///
    /// 帧号大于当前帧时，按整帧逐一推进（支持一次调用追赶多帧）；
    /// 否则为空操作。
    pub fn update<S: PhysicsSolver>(&mut self, solver: &mut S, frame: Frame) {
        if frame.index <= self.current_frame.index {
            return;
        }

        if !self.is_initialized {
            solver.on_initialize(self.current_time);
            self.is_initialized = true;
        }

        let number_of_frames = frame.index - self.current_frame.index;
        for _ in 0..number_of_frames {
            self.advance_time_step(solver, frame.time_interval_in_seconds);
        }
        self.current_frame = frame;
    }

    /// 推进单帧
    pub fn advance_single_frame<S: PhysicsSolver>(&mut self, solver: &mut S) {
        let mut frame = self.current_frame;
        frame.advance();
        self.update(solver, frame);
    }

    /// 把一个帧间隔拆为子步执行
    ///
    /// 内部时钟先重置到当前帧起点。
    fn advance_time_step<S: PhysicsSolver>(&mut self, solver: &mut S, time_interval: f64) {
        self.current_time = self.current_frame.time_in_seconds();

        match self.sub_stepping {
            SubStepping::Fixed(num_steps) => {
                log::debug!("使用固定子步数: {}", num_steps);
                let actual_time_interval = time_interval / num_steps as f64;
                for _ in 0..num_steps {
                    solver.on_advance_time_step(self.current_time, actual_time_interval);
                    self.current_time += actual_time_interval;
                }
            }
            SubStepping::Adaptive => {
                log::debug!("使用自适应子步");
                let mut remaining_time = time_interval;
                while remaining_time > EPSILON_D {
                    let num_steps = solver.number_of_sub_time_steps(remaining_time).max(1);
                    let actual_time_interval = remaining_time / num_steps as f64;

                    log::trace!(
                        "剩余子步数: {}, 子步长: {:.6e}",
                        num_steps,
                        actual_time_interval
                    );

                    solver.on_advance_time_step(self.current_time, actual_time_interval);

                    remaining_time -= actual_time_interval;
                    self.current_time += actual_time_interval;
                }
            }
        }
    }
}

impl Default for TimeIntegrator {
    fn default() -> Self {
        Self::new(SubStepping::Adaptive)
    }
}
