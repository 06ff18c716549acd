// crates/sl_land/src/forcing/prescribed.rs

//! 预设时变场
//!
//! 把数据源中的一个时变变量包装成地表场上的时间函数：
//! 快照按需读取并缓存（最多保留两个），两个快照之间按 [`TimeAxis`] 线性插值。

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use std::sync::Arc;

use super::timeseries::{days_in_year, ExtrapolationMode, TimeAxis, TimeInterpolation};
use crate::data::{DataSource, DatasetLocation};
use crate::domain::{Domain, Space, SpatialField};
use crate::error::DataAccessError;

const SNAPSHOT_SLOTS: usize = 2;

fn year_seconds(year: i32) -> f64 {
    f64::from(days_in_year(year)) * 86_400.0
}

/// `date` 相对 `year` 年 1 月 1 日 00:00 的秒数
fn seconds_since_year_start(date: NaiveDateTime, year: i32) -> f64 {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|start| (date - start).num_milliseconds() as f64 / 1000.0)
        .unwrap_or(0.0)
}

/// 预设时变场
#[derive(Debug)]
pub struct PrescribedField {
    variable: String,
    location: DatasetLocation,
    source: Arc<dyn DataSource>,
    domain: Arc<Domain>,
    axis: TimeAxis,
    offset: f64,
    snapshots: Mutex<Vec<(usize, Arc<Vec<f64>>)>>,
}

impl PrescribedField {
    /// 创建预设场
    ///
    /// 模拟时间 `t` 对应的日历时间为 `start_date + t`。周期模式下按起始日期
    /// 在其日历年中的位置对齐数据集时间轴，因此可以用其他年份的数据驱动。
    pub fn new(
        source: Arc<dyn DataSource>,
        location: DatasetLocation,
        variable: &str,
        domain: Arc<Domain>,
        start_date: NaiveDateTime,
        interpolation: TimeInterpolation,
    ) -> Result<Self, DataAccessError> {
        let times = source.time_axis(&location, variable)?;
        let dataset_year = location.key.year().unwrap_or_else(|| start_date.year());

        let (mode, offset) = match interpolation {
            TimeInterpolation::LinearPeriodicCalendar => (
                ExtrapolationMode::PeriodicCalendar {
                    period: year_seconds(dataset_year),
                },
                seconds_since_year_start(start_date, start_date.year()),
            ),
            TimeInterpolation::LinearClamp => (
                ExtrapolationMode::Clamp,
                seconds_since_year_start(start_date, dataset_year),
            ),
        };

        let axis = TimeAxis::new(times, mode).map_err(|message| DataAccessError::Malformed {
            path: location.path.clone(),
            message: format!("{}: {}", variable, message),
        })?;

        tracing::debug!(
            "预设场 {}:{} ({} 个时刻, {})",
            location.key,
            variable,
            axis.len(),
            mode.name()
        );

        Ok(Self {
            variable: variable.to_string(),
            location,
            source,
            domain,
            axis,
            offset,
            snapshots: Mutex::new(Vec::with_capacity(SNAPSHOT_SLOTS)),
        })
    }

    /// 变量名
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// 数据集位置
    pub fn location(&self) -> &DatasetLocation {
        &self.location
    }

    /// 原生时间轴
    pub fn axis(&self) -> &TimeAxis {
        &self.axis
    }

    /// 场所在空间（地表）
    pub fn space(&self) -> Space {
        self.domain.surface_space()
    }

    fn snapshot(&self, index: usize) -> Result<Arc<Vec<f64>>, DataAccessError> {
        if let Some((_, data)) = self.snapshots.lock().iter().find(|(i, _)| *i == index) {
            return Ok(Arc::clone(data));
        }

        let data = Arc::new(self.source.read_snapshot(
            &self.location,
            &self.variable,
            index,
            self.domain.coords(),
        )?);

        let mut slots = self.snapshots.lock();
        if slots.len() >= SNAPSHOT_SLOTS {
            slots.remove(0);
        }
        slots.push((index, Arc::clone(&data)));
        Ok(data)
    }

    /// 在模拟时间 `t` 处插值，结果写入 `out`
    pub fn evaluate_into(&self, t: f64, out: &mut SpatialField<f64>) -> Result<(), DataAccessError> {
        debug_assert_eq!(*out.space(), self.space());
        let (i0, i1, w) = self.axis.bracket(self.offset + t);
        let a = self.snapshot(i0)?;
        let b = self.snapshot(i1)?;
        for ((o, &va), &vb) in out.data_mut().iter_mut().zip(a.iter()).zip(b.iter()) {
            *o = (1.0 - w) * va + w * vb;
        }
        Ok(())
    }

    /// 在模拟时间 `t` 处插值
    pub fn evaluate(&self, t: f64) -> Result<SpatialField<f64>, DataAccessError> {
        let mut out = SpatialField::zeros(self.space());
        self.evaluate_into(t, &mut out)?;
        Ok(out)
    }
}
