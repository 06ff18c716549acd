// crates/sl_config/src/registry.rs

//! 参数注册表
//!
//! 可注入的"名称 → 数值"默认参数表。参数构建器通过传入的注册表解析
//! 默认值，构建过程不读取任何隐藏的全局状态。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;

/// 默认参数表
const DEFAULT_PARAMETERS: &[(&str, f64)] = &[
    // 水与冰
    ("density_liquid_water", 1000.0),
    ("density_ice_water", 916.7),
    ("isobaric_specific_heat_liquid", 4181.0),
    ("isobaric_specific_heat_ice", 2100.0),
    ("latent_heat_fusion_at_reference", 3.34e5),
    ("temperature_water_freeze", 273.16),
    ("gravitational_acceleration", 9.81),
    ("stefan_boltzmann_constant", 5.670374419e-8),
    // 土壤
    ("emissivity_bare_soil", 0.96),
    ("soil_momentum_roughness_length", 0.01),
    ("soil_scalar_roughness_length", 0.001),
    ("volumetric_heat_capacity_organic", 2.5e6),
    ("volumetric_heat_capacity_quartz", 2.01e6),
    ("volumetric_heat_capacity_gravel", 2.01e6),
    ("volumetric_heat_capacity_mineral", 2.0e6),
    ("thermal_conductivity_dry_soil", 0.25),
    ("thermal_conductivity_saturated_soil", 2.0),
    ("surface_heat_transfer_coefficient", 10.0),
    // 冠层
    ("canopy_emissivity", 0.97),
    ("canopy_heat_capacity", 2.0e3),
    ("stomatal_conductance_g0", 1.0e-4),
    ("leaf_angle_distribution", 0.0),
    ("clumping_index", 0.69),
    ("N_factor_Vcmax", 8.0e-4),
    ("leaf_nitrogen_fraction", 0.01),
    ("stem_nitrogen_ratio", 0.05),
    ("root_nitrogen_ratio", 1.0),
    ("maintenance_respiration_factor", 0.012),
    ("growth_respiration_fraction", 0.25),
    // 积雪
    ("snow_albedo", 0.8),
    ("snow_density", 200.0),
    ("snow_emissivity", 0.97),
    ("snow_momentum_roughness_length", 0.0024),
    ("snow_scalar_roughness_length", 0.00024),
    ("holding_capacity_of_water_in_snow", 0.08),
    ("snow_melt_factor", 3.5e-8),
    // 土壤 CO2
    ("co2_reference_mixing_ratio", 0.000412),
    ("soil_co2_exchange_rate", 1.0e-5),
    ("soil_respiration_base_rate", 1.0e-10),
];

/// 参数注册表
///
/// # 示例
///
/// ```rust
/// use sl_config::ParameterRegistry;
///
/// let registry = ParameterRegistry::defaults();
/// assert_eq!(registry.get("emissivity_bare_soil").unwrap(), 0.96);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterRegistry {
    values: BTreeMap<String, f64>,
}

impl ParameterRegistry {
    /// 空注册表
    pub fn empty() -> Self {
        Self::default()
    }

    /// 带内置默认值的注册表
    pub fn defaults() -> Self {
        let values = DEFAULT_PARAMETERS
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();
        Self { values }
    }

    /// 从 JSON / YAML 文件加载覆盖值，并合并到内置默认值之上
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let overrides: ParameterRegistry = if yaml {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        let mut registry = Self::defaults();
        registry.merge(overrides);
        Ok(registry)
    }

    /// 查询参数
    pub fn get(&self, name: &str) -> Result<f64, ConfigError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::MissingParameter(name.to_string()))
    }

    /// 覆盖值优先，否则查询注册表
    pub fn resolve(&self, override_value: Option<f64>, name: &str) -> Result<f64, ConfigError> {
        match override_value {
            Some(v) => Ok(v),
            None => self.get(name),
        }
    }

    /// 设置参数（链式）
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    /// 设置参数
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// 移除参数
    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.values.remove(name)
    }

    /// 合并另一张表，后者优先
    pub fn merge(&mut self, other: ParameterRegistry) {
        self.values.extend(other.values);
    }

    /// 是否包含参数
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// 参数数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_present() {
        let registry = ParameterRegistry::defaults();
        assert_eq!(registry.get("soil_momentum_roughness_length").unwrap(), 0.01);
        assert_eq!(registry.get("soil_scalar_roughness_length").unwrap(), 0.001);
        assert_eq!(registry.len(), DEFAULT_PARAMETERS.len());
    }

    #[test]
    fn test_missing_parameter() {
        let registry = ParameterRegistry::empty();
        assert!(matches!(
            registry.get("emissivity_bare_soil"),
            Err(ConfigError::MissingParameter(name)) if name == "emissivity_bare_soil"
        ));
    }

    #[test]
    fn test_override_wins() {
        let registry = ParameterRegistry::defaults();
        assert_eq!(registry.resolve(Some(0.5), "emissivity_bare_soil").unwrap(), 0.5);
        assert_eq!(registry.resolve(None, "emissivity_bare_soil").unwrap(), 0.96);
    }

    #[test]
    fn test_from_file_merges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.yaml");
        std::fs::write(&path, "snow_albedo: 0.67\nextra_parameter: 1.5\n").unwrap();
        let registry = ParameterRegistry::from_file(&path).unwrap();
        assert_eq!(registry.get("snow_albedo").unwrap(), 0.67);
        assert_eq!(registry.get("extra_parameter").unwrap(), 1.5);
        assert_eq!(registry.get("snow_density").unwrap(), 200.0);
    }
}
