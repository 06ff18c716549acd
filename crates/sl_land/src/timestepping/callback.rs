// crates/sl_land/src/timestepping/callback.rs

//! 积分回调
//!
//! 回调在积分器初始化时触发一次，之后每步结束时检查是否有到期的时刻。
//! 回调声明的时刻会作为 `tstops` 交给积分器，积分步恰好落在这些时刻上。

use std::sync::Arc;

use crate::error::LandResult;
use crate::model::{Cache, LandModel, StateVector};

/// 时刻比较容差 [s]
pub const TIME_TOLERANCE: f64 = 1e-6;

/// 积分回调
pub trait Callback: Send {
    /// 回调名称
    fn name(&self) -> &'static str;

    /// 积分器必须停靠的时刻
    fn tstops(&self) -> Vec<f64> {
        Vec::new()
    }

    /// 积分器初始化时调用
    fn initialize(&mut self, t: f64, u: &StateVector, p: &mut Cache) -> LandResult<()>;

    /// 每步结束后调用，`t` 为步末时刻
    fn after_step(&mut self, t: f64, u: &StateVector, p: &mut Cache) -> LandResult<()>;

    /// 已触发的时刻
    fn history(&self) -> &[f64] {
        &[]
    }
}

/// 周期性驱动更新
///
/// 触发时刻为 `t0 + k·interval ≤ tf`，由 `k` 直接计算，不累加，
/// 因此与积分步长无关。每次触发都在其计划时刻重新插值驱动场。
pub struct DriverUpdateCallback {
    model: Arc<LandModel>,
    t0: f64,
    interval: f64,
    n_updates: usize,
    next: usize,
    fired: Vec<f64>,
}

impl DriverUpdateCallback {
    /// 创建回调
    pub fn new(model: Arc<LandModel>, t0: f64, tf: f64, interval: f64) -> Self {
        let n_updates = if interval > 0.0 && tf >= t0 {
            ((tf - t0) / interval + TIME_TOLERANCE / interval).floor() as usize + 1
        } else {
            1
        };
        Self {
            model,
            t0,
            interval,
            n_updates,
            next: 0,
            fired: Vec::with_capacity(n_updates),
        }
    }

    /// 第 `k` 次触发的时刻
    #[inline]
    pub fn scheduled_time(&self, k: usize) -> f64 {
        self.t0 + k as f64 * self.interval
    }

    /// 全部计划时刻
    pub fn schedule(&self) -> Vec<f64> {
        (0..self.n_updates).map(|k| self.scheduled_time(k)).collect()
    }

    fn fire(&mut self, p: &mut Cache) -> LandResult<()> {
        let t = self.scheduled_time(self.next);
        self.model.forcing.update_drivers(&mut p.drivers, t)?;
        self.fired.push(t);
        self.next += 1;
        Ok(())
    }
}

impl Callback for DriverUpdateCallback {
    fn name(&self) -> &'static str {
        "DriverUpdateCallback"
    }

    fn tstops(&self) -> Vec<f64> {
        self.schedule()
    }

    fn initialize(&mut self, _t: f64, _u: &StateVector, p: &mut Cache) -> LandResult<()> {
        self.next = 0;
        self.fired.clear();
        self.fire(p)
    }

    fn after_step(&mut self, t: f64, _u: &StateVector, p: &mut Cache) -> LandResult<()> {
        while self.next < self.n_updates && self.scheduled_time(self.next) <= t + TIME_TOLERANCE {
            self.fire(p)?;
        }
        Ok(())
    }

    fn history(&self) -> &[f64] {
        &self.fired
    }
}

impl std::fmt::Debug for DriverUpdateCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverUpdateCallback")
            .field("t0", &self.t0)
            .field("interval", &self.interval)
            .field("n_updates", &self.n_updates)
            .field("next", &self.next)
            .finish()
    }
}

/// 回调集合，按加入顺序调用
#[derive(Default)]
pub struct CallbackSet {
    callbacks: Vec<Box<dyn Callback>>,
}

impl CallbackSet {
    /// 空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入回调
    pub fn with(mut self, callback: impl Callback + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }

    /// 回调数量
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// 按名称查找
    pub fn find(&self, name: &str) -> Option<&dyn Callback> {
        self.callbacks.iter().find(|c| c.name() == name).map(|c| c.as_ref())
    }

    /// 合并后的停靠时刻（升序、去重）
    pub fn tstops(&self) -> Vec<f64> {
        let mut stops: Vec<f64> = self.callbacks.iter().flat_map(|c| c.tstops()).collect();
        stops.sort_by(f64::total_cmp);
        stops.dedup_by(|a, b| (*a - *b).abs() <= TIME_TOLERANCE);
        stops
    }

    /// 初始化全部回调
    pub fn initialize(&mut self, t: f64, u: &StateVector, p: &mut Cache) -> LandResult<()> {
        for callback in self.callbacks.iter_mut() {
            callback.initialize(t, u, p)?;
        }
        Ok(())
    }

    /// 步末调用全部回调
    pub fn after_step(&mut self, t: f64, u: &StateVector, p: &mut Cache) -> LandResult<()> {
        for callback in self.callbacks.iter_mut() {
            callback.after_step(t, u, p)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for CallbackSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.callbacks.iter().map(|c| c.name()))
            .finish()
    }
}
