// crates/sl_land/src/forcing/mod.rs

//! 外部驱动模块
//!
//! - [`timeseries`]: 原生时间轴上的区间查找（截断 / 周期日历）
//! - [`prescribed`]: 按需读取快照并线性插值的预设场
//! - [`atmosphere`]: 再分析大气与辐射驱动
//! - [`lai`]: 卫星叶面积指数
//!
//! 所有驱动都落在地表空间上。[`ForcingInputs::update_drivers`] 把它们在给定
//! 模拟时间的值写入 [`Drivers`]，由驱动更新回调按固定周期调用。

pub mod atmosphere;
pub mod lai;
pub mod prescribed;
pub mod timeseries;

use sl_config::{ParameterRegistry, SimulationConfig};
use std::sync::Arc;

use crate::data::DataSource;
use crate::domain::{Domain, Space, SpatialField};
use crate::error::{ConfigError, LandResult};

pub use atmosphere::{prescribed_forcing_era5, PrescribedAtmosphere, PrescribedRadiation};
pub use lai::prescribed_lai_modis;
pub use prescribed::PrescribedField;
pub use timeseries::{ExtrapolationMode, TimeAxis, TimeInterpolation};

/// 当前时刻的驱动场（全部在地表空间上）
#[derive(Debug, Clone, PartialEq)]
pub struct Drivers {
    /// 驱动对应的模拟时间 [s]
    pub time: f64,
    /// 气温 [K]
    pub air_temperature: SpatialField,
    /// 比湿 [kg/kg]
    pub specific_humidity: SpatialField,
    /// 气压 [Pa]
    pub pressure: SpatialField,
    /// 风速 [m/s]
    pub wind_speed: SpatialField,
    /// 降雨 [m/s]
    pub liquid_precipitation: SpatialField,
    /// 降雪（水当量）[m/s]
    pub snow_precipitation: SpatialField,
    /// CO2 混合比
    pub co2: SpatialField,
    /// 向下短波 [W/m²]
    pub shortwave_down: SpatialField,
    /// 向下长波 [W/m²]
    pub longwave_down: SpatialField,
    /// 叶面积指数
    pub lai: SpatialField,
}

impl Drivers {
    /// 全零驱动场
    pub fn zeros(surface: Space) -> Self {
        let z = || SpatialField::zeros(surface);
        Self {
            time: f64::NAN,
            air_temperature: z(),
            specific_humidity: z(),
            pressure: z(),
            wind_speed: z(),
            liquid_precipitation: z(),
            snow_precipitation: z(),
            co2: z(),
            shortwave_down: z(),
            longwave_down: z(),
            lai: z(),
        }
    }
}

/// 模型的全部外部驱动
#[derive(Debug)]
pub struct ForcingInputs {
    /// 大气
    pub atmosphere: PrescribedAtmosphere,
    /// 辐射
    pub radiation: PrescribedRadiation,
    /// 叶面积指数
    pub lai: PrescribedField,
}

impl ForcingInputs {
    /// 组合驱动，检查三者位于同一地表空间
    pub fn new(
        atmosphere: PrescribedAtmosphere,
        radiation: PrescribedRadiation,
        lai: PrescribedField,
    ) -> Result<Self, ConfigError> {
        let expected = atmosphere.space();
        for (name, space) in [("radiation", radiation.space()), ("lai", lai.space())] {
            if space != expected {
                return Err(ConfigError::PartitionMismatch {
                    field: name.to_string(),
                    expected: expected.to_string(),
                    actual: space.to_string(),
                });
            }
        }
        Ok(Self {
            atmosphere,
            radiation,
            lai,
        })
    }

    /// 按模拟配置加载再分析驱动和卫星 LAI
    pub fn load(
        source: &Arc<dyn DataSource>,
        domain: &Arc<Domain>,
        sim: &SimulationConfig,
        registry: &ParameterRegistry,
    ) -> LandResult<Self> {
        let interpolation = TimeInterpolation::LinearPeriodicCalendar;
        let (atmosphere, radiation) = prescribed_forcing_era5(source, domain, sim, registry, interpolation)?;
        let lai = prescribed_lai_modis(source, domain, sim.forcing_year, sim.start_date, interpolation)?;
        Ok(Self::new(atmosphere, radiation, lai)?)
    }

    /// 驱动所在空间
    pub fn space(&self) -> Space {
        self.atmosphere.space()
    }

    /// 把时刻 `t` 的驱动写入 `drivers`
    pub fn update_drivers(&self, drivers: &mut Drivers, t: f64) -> LandResult<()> {
        let _span = tracing::debug_span!("update_drivers").entered();
        self.atmosphere.update(drivers, t)?;
        self.radiation.update(drivers, t)?;
        self.lai.evaluate_into(t, &mut drivers.lai)?;
        drivers.time = t;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DatasetKey, SyntheticDataSource};
    use crate::error::{DataAccessError, LandError};
    use sl_config::DomainConfig;

    fn setup(source: SyntheticDataSource) -> (Arc<dyn DataSource>, Arc<Domain>) {
        let source: Arc<dyn DataSource> = Arc::new(source);
        let domain = Domain::spherical_shell(&DomainConfig::tiny()).unwrap();
        (source, domain)
    }

    #[test]
    fn test_update_drivers_splits_precipitation() {
        let (source, domain) = setup(SyntheticDataSource::new());
        let sim = SimulationConfig::tiny();
        let forcing = ForcingInputs::load(&source, &domain, &sim, &ParameterRegistry::defaults()).unwrap();
        let mut drivers = Drivers::zeros(domain.surface_space());
        forcing.update_drivers(&mut drivers, 0.0).unwrap();

        assert_eq!(drivers.time, 0.0);
        for i in 0..drivers.co2.len() {
            let rain = drivers.liquid_precipitation.data()[i];
            let snow = drivers.snow_precipitation.data()[i];
            assert!(rain == 0.0 || snow == 0.0);
            assert_eq!(drivers.co2.data()[i], 0.000412);
        }
        assert!(drivers.air_temperature.data().iter().all(|t| *t > 180.0));
    }

    #[test]
    fn test_missing_forcing_propagates() {
        let sim = SimulationConfig::tiny();
        let key = DatasetKey::Era5Forcing {
            year: sim.forcing_year,
            tier: sim.forcing_tier.clone(),
        };
        let (source, domain) = setup(SyntheticDataSource::new().without(key));
        let err = ForcingInputs::load(&source, &domain, &sim, &ParameterRegistry::defaults()).unwrap_err();
        assert!(matches!(err, LandError::DataAccess(DataAccessError::NotFound { .. })));
    }

    #[test]
    fn test_mixed_domains_rejected() {
        let (source, domain) = setup(SyntheticDataSource::new());
        let other = Domain::spherical_shell(&DomainConfig::tiny()).unwrap();
        let sim = SimulationConfig::tiny();
        let registry = ParameterRegistry::defaults();
        let interp = TimeInterpolation::LinearPeriodicCalendar;
        let (atmos, radiation) = prescribed_forcing_era5(&source, &domain, &sim, &registry, interp).unwrap();
        let lai = prescribed_lai_modis(&source, &other, sim.forcing_year, sim.start_date, interp).unwrap();
        let err = ForcingInputs::new(atmos, radiation, lai).unwrap_err();
        assert!(matches!(err, ConfigError::PartitionMismatch { .. }));
    }
}
