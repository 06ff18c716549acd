// crates/sl_land/src/forcing/timeseries.rs

//! 时间轴与时间插值
//!
//! 提供外部数据集原生时间轴上的区间查找，支持：
//! - 截断外推（超出范围返回边界快照）
//! - 周期日历（按日历年长度循环，最后一个快照与下一年的第一个快照之间线性插值）
//!
//! # 使用示例
//!
//! ```ignore
//! use sl_land::forcing::timeseries::{TimeAxis, ExtrapolationMode};
//!
//! let axis = TimeAxis::new(vec![0.0, 10.0, 20.0], ExtrapolationMode::PeriodicCalendar { period: 30.0 })?;
//! let (i0, i1, w) = axis.bracket(25.0);   // (2, 0, 0.5)
//! ```

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// 日历年天数，年份超出 chrono 范围时按平年计
pub fn days_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .map(|d| d.ordinal())
        .unwrap_or(365)
}

/// 外推模式
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationMode {
    /// 截断模式：超出范围时返回边界值
    #[default]
    Clamp,

    /// 周期日历：t -> t mod period
    PeriodicCalendar {
        /// 周期 [s]，通常为一个日历年
        period: f64,
    },
}

impl ExtrapolationMode {
    /// 获取模式名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clamp => "Clamp",
            Self::PeriodicCalendar { .. } => "PeriodicCalendar",
        }
    }
}

/// 时间插值方法
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum TimeInterpolation {
    /// 线性插值，周期性日历外推（周期由数据集年份决定）
    #[default]
    LinearPeriodicCalendar,
    /// 线性插值，截断外推
    LinearClamp,
}

/// 数据集原生时间轴
///
/// # 约束
///
/// - 时间数组非空且严格单调递增
/// - 周期模式下所有时间点位于 `[0, period)`
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    times: Vec<f64>,
    mode: ExtrapolationMode,
}

impl TimeAxis {
    /// 创建时间轴，返回不满足约束的原因
    pub fn new(times: Vec<f64>, mode: ExtrapolationMode) -> Result<Self, String> {
        if times.is_empty() {
            return Err("时间轴不能为空".to_string());
        }
        for i in 1..times.len() {
            if times[i] <= times[i - 1] {
                return Err(format!(
                    "时间必须严格递增: times[{}]={} <= times[{}]={}",
                    i,
                    times[i],
                    i - 1,
                    times[i - 1]
                ));
            }
        }
        if let ExtrapolationMode::PeriodicCalendar { period } = mode {
            let last = times[times.len() - 1];
            if period <= 0.0 || times[0] < 0.0 || last >= period {
                return Err(format!("时间点必须位于 [0, {}) 内", period));
            }
        }
        Ok(Self { times, mode })
    }

    /// 时间点
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// 外推模式
    pub fn mode(&self) -> ExtrapolationMode {
        self.mode
    }

    /// 时间点数量
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// 查找包含 `t` 的区间，返回 `(i0, i1, w)`，插值结果为 `(1-w)·v[i0] + w·v[i1]`
    pub fn bracket(&self, t: f64) -> (usize, usize, f64) {
        let n = self.times.len();
        let first = self.times[0];
        let last = self.times[n - 1];

        if n == 1 {
            return (0, 0, 0.0);
        }

        match self.mode {
            ExtrapolationMode::Clamp => {
                if t <= first {
                    return (0, 0, 0.0);
                }
                if t >= last {
                    return (n - 1, n - 1, 0.0);
                }
                self.interior(t)
            }
            ExtrapolationMode::PeriodicCalendar { period } => {
                let t = t.rem_euclid(period);
                if t < first {
                    let gap = first + period - last;
                    let w = (t + period - last) / gap;
                    return (n - 1, 0, w);
                }
                if t >= last {
                    let gap = first + period - last;
                    let w = (t - last) / gap;
                    return (n - 1, 0, w);
                }
                self.interior(t)
            }
        }
    }

    fn interior(&self, t: f64) -> (usize, usize, f64) {
        // 第一个大于 t 的位置
        let i1 = self.times.partition_point(|&x| x <= t);
        let i0 = i1 - 1;
        let (t0, t1) = (self.times[i0], self.times[i1]);
        (i0, i1, (t - t0) / (t1 - t0))
    }
}
