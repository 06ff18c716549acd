// crates/sl_land/src/forcing/atmosphere.rs

//! 预设大气与辐射驱动
//!
//! 从再分析数据集构建近地面大气状态（气温、比湿、气压、风速、降水）
//! 和向下辐射（短波、长波）。降水按气温拆分为降雨与降雪。

use sl_config::{ParameterRegistry, SimulationConfig};
use std::sync::Arc;

use super::prescribed::PrescribedField;
use super::timeseries::TimeInterpolation;
use super::Drivers;
use crate::data::variables::*;
use crate::data::{DataSource, DatasetKey};
use crate::domain::{Domain, Space};
use crate::error::{DataAccessError, LandResult};

/// 预设大气
#[derive(Debug)]
pub struct PrescribedAtmosphere {
    /// 2 m 气温 [K]
    pub air_temperature: PrescribedField,
    /// 比湿 [kg/kg]
    pub specific_humidity: PrescribedField,
    /// 地面气压 [Pa]
    pub pressure: PrescribedField,
    /// 风速 [m/s]
    pub wind_speed: PrescribedField,
    /// 总降水 [m/s]
    pub precipitation: PrescribedField,
    /// 大气 CO2 体积混合比
    pub co2: f64,
    /// 降雪判别气温 [K]
    pub snow_threshold: f64,
}

impl PrescribedAtmosphere {
    /// 所在空间
    pub fn space(&self) -> Space {
        self.air_temperature.space()
    }

    /// 更新驱动场中的大气部分
    pub fn update(&self, drivers: &mut Drivers, t: f64) -> Result<(), DataAccessError> {
        self.air_temperature.evaluate_into(t, &mut drivers.air_temperature)?;
        self.specific_humidity.evaluate_into(t, &mut drivers.specific_humidity)?;
        self.pressure.evaluate_into(t, &mut drivers.pressure)?;
        self.wind_speed.evaluate_into(t, &mut drivers.wind_speed)?;
        self.precipitation.evaluate_into(t, &mut drivers.liquid_precipitation)?;

        let threshold = self.snow_threshold;
        let temps = drivers.air_temperature.data();
        let liquid = drivers.liquid_precipitation.data_mut();
        let snow = drivers.snow_precipitation.data_mut();
        for i in 0..liquid.len() {
            // 负降水截断为 0
            let total = liquid[i].max(0.0);
            if temps[i] < threshold {
                snow[i] = total;
                liquid[i] = 0.0;
            } else {
                snow[i] = 0.0;
                liquid[i] = total;
            }
        }
        drivers.co2.fill(self.co2);
        Ok(())
    }
}

/// 预设辐射
#[derive(Debug)]
pub struct PrescribedRadiation {
    /// 向下短波 [W/m²]
    pub shortwave_down: PrescribedField,
    /// 向下长波 [W/m²]
    pub longwave_down: PrescribedField,
}

impl PrescribedRadiation {
    /// 所在空间
    pub fn space(&self) -> Space {
        self.shortwave_down.space()
    }

    /// 更新驱动场中的辐射部分
    pub fn update(&self, drivers: &mut Drivers, t: f64) -> Result<(), DataAccessError> {
        self.shortwave_down.evaluate_into(t, &mut drivers.shortwave_down)?;
        self.longwave_down.evaluate_into(t, &mut drivers.longwave_down)?;
        Ok(())
    }
}

/// 从再分析数据集构建大气与辐射驱动
///
/// 数据集按 `(forcing_year, forcing_tier)` 解析；解析或读取失败原样返回。
pub fn prescribed_forcing_era5(
    source: &Arc<dyn DataSource>,
    domain: &Arc<Domain>,
    sim: &SimulationConfig,
    registry: &ParameterRegistry,
    interpolation: TimeInterpolation,
) -> LandResult<(PrescribedAtmosphere, PrescribedRadiation)> {
    let key = DatasetKey::Era5Forcing {
        year: sim.forcing_year,
        tier: sim.forcing_tier.clone(),
    };
    let location = source.resolve(&key)?;
    let field = |variable: &str| {
        PrescribedField::new(
            Arc::clone(source),
            location.clone(),
            variable,
            Arc::clone(domain),
            sim.start_date,
            interpolation,
        )
    };

    let atmosphere = PrescribedAtmosphere {
        air_temperature: field(AIR_TEMPERATURE)?,
        specific_humidity: field(SPECIFIC_HUMIDITY)?,
        pressure: field(SURFACE_PRESSURE)?,
        wind_speed: field(WIND_SPEED)?,
        precipitation: field(PRECIPITATION)?,
        co2: registry.get("co2_reference_mixing_ratio")?,
        snow_threshold: registry.get("temperature_water_freeze")?,
    };
    let radiation = PrescribedRadiation {
        shortwave_down: field(SHORTWAVE_DOWN)?,
        longwave_down: field(LONGWAVE_DOWN)?,
    };

    tracing::info!("大气驱动: {} ({})", key, source.name());
    Ok((atmosphere, radiation))
}
