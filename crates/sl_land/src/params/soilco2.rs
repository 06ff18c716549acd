// crates/sl_land/src/params/soilco2.rs

//! 土壤 CO2 参数与土壤有机碳

use sl_config::ParameterRegistry;

use super::{check_coords, read_map};
use crate::data::variables::SOIL_ORGANIC_CARBON;
use crate::data::{DataSource, DatasetKey};
use crate::domain::{ColumnCoord, Space, SpatialField};
use crate::error::{ConfigError, LandResult};

/// 土壤 CO2 参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilCO2Parameters {
    /// 大气参考混合比
    pub reference_mixing_ratio: f64,
    /// 地表与大气交换速率 [1/s]
    pub exchange_rate: f64,
    /// 单位有机碳呼吸速率 [1/s]
    pub respiration_base_rate: f64,
    subsurface: Space,
}

impl SoilCO2Parameters {
    /// 从注册表读取
    pub fn new(subsurface: Space, registry: &ParameterRegistry) -> Result<Self, ConfigError> {
        Ok(Self {
            reference_mixing_ratio: registry.get("co2_reference_mixing_ratio")?,
            exchange_rate: registry.get("soil_co2_exchange_rate")?,
            respiration_base_rate: registry.get("soil_respiration_base_rate")?,
            subsurface,
        })
    }

    /// 地下空间
    pub fn subsurface_space(&self) -> Space {
        self.subsurface
    }
}

/// 加载土壤有机碳 [kg C/m³]，按列广播到所有层
pub fn soil_organic_carbon(
    subsurface: Space,
    coords: &[ColumnCoord],
    source: &dyn DataSource,
) -> LandResult<SpatialField> {
    check_coords(subsurface, coords)?;
    let location = source.resolve(&DatasetKey::SoilOrganicCarbon)?;
    read_map(source, &location, SOIL_ORGANIC_CARBON, subsurface, coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Partition;

    #[test]
    fn test_registry_values() {
        let subsurface = Space::new(5, Partition::Subsurface, 2, 3);
        let params = SoilCO2Parameters::new(subsurface, &ParameterRegistry::defaults()).unwrap();
        assert_eq!(params.reference_mixing_ratio, 0.000412);
        assert_eq!(params.subsurface_space(), subsurface);
    }

    #[test]
    fn test_missing_rate() {
        let mut registry = ParameterRegistry::defaults();
        registry.remove("soil_co2_exchange_rate");
        let subsurface = Space::new(5, Partition::Subsurface, 2, 3);
        assert!(matches!(
            SoilCO2Parameters::new(subsurface, &registry),
            Err(ConfigError::MissingParameter(_))
        ));
    }
}
