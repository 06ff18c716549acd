// crates/sl_land/src/data/synthetic.rs

//! 合成数据源
//!
//! 用解析函数生成确定性的驱动数据和属性图，无需外部文件。
//! 用于基准测试和单元测试：同一坐标、同一时刻总是返回完全相同的值。

use std::f64::consts::PI;
use std::path::PathBuf;

use super::variables::*;
use super::{DataSource, DatasetKey, DatasetLocation};
use crate::domain::ColumnCoord;
use crate::error::DataAccessError;
use crate::forcing::timeseries::days_in_year;

const STEFAN_BOLTZMANN: f64 = 5.670374419e-8;
const ERA5_STEP: f64 = 3.0 * 3600.0;
const LAI_STEP: f64 = 8.0 * 86_400.0;

/// 合成数据源
#[derive(Debug, Clone, Default)]
pub struct SyntheticDataSource {
    missing: Vec<DatasetKey>,
}

impl SyntheticDataSource {
    /// 创建数据源
    pub fn new() -> Self {
        Self::default()
    }

    /// 让某个数据集解析失败（用于测试错误传播）
    pub fn without(mut self, key: DatasetKey) -> Self {
        self.missing.push(key);
        self
    }

    fn step(key: &DatasetKey) -> Option<f64> {
        match key {
            DatasetKey::Era5Forcing { .. } => Some(ERA5_STEP),
            DatasetKey::ModisLai { .. } => Some(LAI_STEP),
            _ => None,
        }
    }

    fn missing_variable(location: &DatasetLocation, variable: &str) -> DataAccessError {
        DataAccessError::MissingVariable {
            dataset: location.key.file_stem(),
            variable: variable.to_string(),
        }
    }
}

fn calendar_days(year: i32) -> f64 {
    f64::from(days_in_year(year))
}

/// 季节因子：北半球 7 月为正
fn seasonal(lat: f64, tau: f64, year_days: f64) -> f64 {
    let day = tau / 86_400.0;
    -(2.0 * PI * (day - 15.0) / year_days).cos() * lat.to_radians().sin()
}

/// 地方太阳时 [h]
fn solar_hour(lon: f64, tau: f64) -> f64 {
    (tau / 3600.0 + lon / 15.0).rem_euclid(24.0)
}

fn air_temperature(c: &ColumnCoord, tau: f64, year_days: f64) -> f64 {
    let hour = solar_hour(c.lon, tau);
    258.0 + 40.0 * c.lat.to_radians().cos()
        + 12.0 * seasonal(c.lat, tau, year_days)
        + 5.0 * (2.0 * PI * (hour - 9.0) / 24.0).sin()
}

fn era5_value(variable: &str, c: &ColumnCoord, tau: f64, year_days: f64) -> Option<f64> {
    let lat = c.lat.to_radians();
    let day = tau / 86_400.0;
    let value = match variable {
        AIR_TEMPERATURE => air_temperature(c, tau, year_days),
        SPECIFIC_HUMIDITY => 0.002 + 0.008 * lat.cos().powi(2),
        SURFACE_PRESSURE => 101_325.0 - 500.0 * (c.lon.to_radians() * 2.0).sin().abs(),
        WIND_SPEED => 3.0 + 2.0 * (c.lon.to_radians() + 0.3 * day).sin().abs(),
        PRECIPITATION => 2.0e-8 * (1.0 + (3.0 * c.lon.to_radians() + 0.5 * day).sin()),
        SHORTWAVE_DOWN => {
            let hour = solar_hour(c.lon, tau);
            let elevation = (PI * (hour - 6.0) / 12.0).sin();
            (1000.0 * lat.cos() * elevation).max(0.0)
        }
        LONGWAVE_DOWN => 0.8 * STEFAN_BOLTZMANN * air_temperature(c, tau, year_days).powi(4),
        _ => return None,
    };
    Some(value)
}

fn lai_value(c: &ColumnCoord, tau: f64, year_days: f64) -> f64 {
    let lat = c.lat.to_radians();
    let s = seasonal(c.lat, tau, year_days);
    (lat.cos() * (1.0 + 2.0 * (0.5 + 0.5 * s))).max(0.0)
}

fn static_value(key: &DatasetKey, variable: &str, c: &ColumnCoord) -> Option<f64> {
    let lat = c.lat.to_radians();
    let lon = c.lon.to_radians();
    let value = match (key, variable) {
        (DatasetKey::SoilProperties, POROSITY) => 0.45 + 0.05 * (2.0 * lon).sin() * lat.cos(),
        (DatasetKey::SoilProperties, RESIDUAL_WATER) => 0.05 + 0.02 * lon.cos().abs(),
        (DatasetKey::SoilProperties, SATURATED_CONDUCTIVITY) => 1.0e-5 * (1.0 + 0.5 * lon.cos()),
        (DatasetKey::SoilProperties, SPECIFIC_STORAGE) => 1.0e-3,
        (DatasetKey::SoilProperties, VG_ALPHA) => 2.0 + lat.sin(),
        (DatasetKey::SoilProperties, VG_N) => 1.5 + 0.3 * lon.cos(),
        (DatasetKey::SoilProperties, ORGANIC_FRACTION) => 0.05,
        (DatasetKey::SoilProperties, QUARTZ_FRACTION) => 0.3 + 0.1 * lat.sin().abs(),
        (DatasetKey::SoilProperties, GRAVEL_FRACTION) => 0.1,
        (DatasetKey::SoilProperties, F_MAX) => 0.3 + 0.1 * lon.sin().abs(),
        (DatasetKey::SoilAlbedo, PAR_ALBEDO_DRY) => 0.2 + 0.05 * lat.sin().abs(),
        (DatasetKey::SoilAlbedo, NIR_ALBEDO_DRY) => 0.3 + 0.05 * lat.sin().abs(),
        (DatasetKey::SoilAlbedo, PAR_ALBEDO_WET) => 0.1 + 0.02 * lat.sin().abs(),
        (DatasetKey::SoilAlbedo, NIR_ALBEDO_WET) => 0.2 + 0.02 * lat.sin().abs(),
        (DatasetKey::CanopyProperties, G1) => 141.0 + 50.0 * lat.cos(),
        (DatasetKey::CanopyProperties, VCMAX25) => 5.0e-5 * (1.0 + 0.5 * lat.cos()),
        (DatasetKey::CanopyProperties, IS_C3) => {
            if c.lat.abs() > 25.0 {
                1.0
            } else {
                0.0
            }
        }
        (DatasetKey::CanopyProperties, ROOTING_DEPTH) => 0.5 + 0.5 * lat.cos(),
        (DatasetKey::CanopyProperties, ALPHA_PAR_LEAF) => 0.1,
        (DatasetKey::CanopyProperties, ALPHA_NIR_LEAF) => 0.45,
        (DatasetKey::CanopyProperties, TAU_PAR_LEAF) => 0.05,
        (DatasetKey::CanopyProperties, TAU_NIR_LEAF) => 0.25,
        (DatasetKey::CanopyProperties, CHI_L) => 0.1 * lon.sin(),
        (DatasetKey::SoilOrganicCarbon, SOIL_ORGANIC_CARBON) => 5.0 + 10.0 * lat.sin().abs(),
        _ => return None,
    };
    Some(value)
}

impl DataSource for SyntheticDataSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn resolve(&self, key: &DatasetKey) -> Result<DatasetLocation, DataAccessError> {
        let path = PathBuf::from(format!("synthetic/{}", key.file_stem()));
        if self.missing.contains(key) {
            return Err(DataAccessError::NotFound { path });
        }
        Ok(DatasetLocation {
            key: key.clone(),
            path,
        })
    }

    fn read_static(
        &self,
        location: &DatasetLocation,
        variable: &str,
        coords: &[ColumnCoord],
    ) -> Result<Vec<f64>, DataAccessError> {
        coords
            .iter()
            .map(|c| {
                static_value(&location.key, variable, c)
                    .ok_or_else(|| Self::missing_variable(location, variable))
            })
            .collect()
    }

    fn time_axis(&self, location: &DatasetLocation, variable: &str) -> Result<Vec<f64>, DataAccessError> {
        let (step, year) = match (Self::step(&location.key), location.key.year()) {
            (Some(step), Some(year)) => (step, year),
            _ => return Err(Self::missing_variable(location, variable)),
        };
        let valid = match location.key {
            DatasetKey::ModisLai { .. } => variable == LAI,
            _ => era5_value(variable, &ColumnCoord { lat: 0.0, lon: 0.0 }, 0.0, 365.0).is_some(),
        };
        if !valid {
            return Err(Self::missing_variable(location, variable));
        }
        let n = (calendar_days(year) * 86_400.0 / step) as usize;
        Ok((0..n).map(|k| k as f64 * step).collect())
    }

    fn read_snapshot(
        &self,
        location: &DatasetLocation,
        variable: &str,
        index: usize,
        coords: &[ColumnCoord],
    ) -> Result<Vec<f64>, DataAccessError> {
        let (step, year) = match (Self::step(&location.key), location.key.year()) {
            (Some(step), Some(year)) => (step, year),
            _ => return Err(Self::missing_variable(location, variable)),
        };
        let year_days = calendar_days(year);
        let tau = index as f64 * step;
        coords
            .iter()
            .map(|c| {
                let value = match location.key {
                    DatasetKey::ModisLai { .. } if variable == LAI => Some(lai_value(c, tau, year_days)),
                    DatasetKey::ModisLai { .. } => None,
                    _ => era5_value(variable, c, tau, year_days),
                };
                value.ok_or_else(|| Self::missing_variable(location, variable))
            })
            .collect()
    }
}
