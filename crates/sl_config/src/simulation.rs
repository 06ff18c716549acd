// crates/sl_config/src/simulation.rs

//! SimulationConfig - 模拟配置
//!
//! 描述一次陆面模拟的时间范围、步长、驱动更新周期、Newton 迭代次数
//! 以及球壳网格参数。全部字段使用 f64 存储以便序列化。

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// 一天的秒数
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// 模拟配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 起始时间 [s]
    #[serde(default)]
    pub t0: f64,

    /// 结束时间 [s]
    #[serde(default = "default_tf")]
    pub tf: f64,

    /// 时间步长 [s]
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// 外部驱动更新周期 [s]，与积分步长无关
    #[serde(default = "default_driver_update_interval")]
    pub driver_update_interval: f64,

    /// 每步 Newton 迭代次数（固定，不做收敛提前退出）
    #[serde(default = "default_newton_iterations")]
    pub newton_iterations: usize,

    /// 模拟起始日期（t = 0 对应的日历时间）
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDateTime,

    /// 再分析驱动数据年份
    #[serde(default = "default_forcing_year")]
    pub forcing_year: i32,

    /// 再分析驱动数据分辨率档位
    #[serde(default = "default_forcing_tier")]
    pub forcing_tier: String,

    /// 网格配置
    #[serde(default)]
    pub domain: DomainConfig,
}

fn default_tf() -> f64 { 7.0 * SECONDS_PER_DAY }
fn default_dt() -> f64 { 450.0 }
fn default_driver_update_interval() -> f64 { 3.0 * 3600.0 }
fn default_newton_iterations() -> usize { 3 }
fn default_forcing_year() -> i32 { 2008 }
fn default_forcing_tier() -> String { "1.0x1.0".to_string() }

fn default_start_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2008, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            t0: 0.0,
            tf: default_tf(),
            dt: default_dt(),
            driver_update_interval: default_driver_update_interval(),
            newton_iterations: default_newton_iterations(),
            start_date: default_start_date(),
            forcing_year: default_forcing_year(),
            forcing_tier: default_forcing_tier(),
            domain: DomainConfig::default(),
        }
    }
}

/// 球壳网格配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// 球半径 [m]
    #[serde(default = "default_radius")]
    pub radius: f64,

    /// 土壤深度 [m]
    #[serde(default = "default_depth")]
    pub depth: f64,

    /// (每个立方体面每边的水平单元数, 垂直层数)
    #[serde(default = "default_nelements")]
    pub nelements: (usize, usize),

    /// 水平多项式阶数
    #[serde(default = "default_npolynomial")]
    pub npolynomial: usize,

    /// (底层厚度, 顶层厚度) [m]
    #[serde(default = "default_dz_tuple")]
    pub dz_tuple: (f64, f64),
}

fn default_radius() -> f64 { 6378.1e3 }
fn default_depth() -> f64 { 50.0 }
fn default_nelements() -> (usize, usize) { (6, 15) }
fn default_npolynomial() -> usize { 1 }
fn default_dz_tuple() -> (f64, f64) { (10.0, 0.05) }

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            depth: default_depth(),
            nelements: default_nelements(),
            npolynomial: default_npolynomial(),
            dz_tuple: default_dz_tuple(),
        }
    }
}

impl DomainConfig {
    /// 全球基准分辨率 (101, 15)
    pub fn global() -> Self {
        Self {
            nelements: (101, 15),
            ..Default::default()
        }
    }

    /// 测试用极小网格
    pub fn tiny() -> Self {
        Self {
            nelements: (2, 3),
            depth: 5.0,
            dz_tuple: (2.0, 0.5),
            ..Default::default()
        }
    }

    /// 验证网格配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radius <= 0.0 {
            return Err(ConfigError::invalid("domain.radius", self.radius, "半径必须为正"));
        }
        if self.depth <= 0.0 {
            return Err(ConfigError::invalid("domain.depth", self.depth, "深度必须为正"));
        }
        if self.nelements.0 == 0 || self.nelements.1 == 0 {
            return Err(ConfigError::invalid(
                "domain.nelements",
                format!("{:?}", self.nelements),
                "单元数必须为正",
            ));
        }
        if self.npolynomial == 0 {
            return Err(ConfigError::invalid("domain.npolynomial", self.npolynomial, "多项式阶数至少为 1"));
        }
        let (bottom, top) = self.dz_tuple;
        if bottom <= 0.0 || top <= 0.0 {
            return Err(ConfigError::invalid(
                "domain.dz_tuple",
                format!("{:?}", self.dz_tuple),
                "层厚必须为正",
            ));
        }
        Ok(())
    }
}

impl SimulationConfig {
    /// 从 JSON 或 YAML 文件加载配置（按扩展名判断）
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let config: SimulationConfig = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 测试用小规模配置
    pub fn tiny() -> Self {
        Self {
            tf: 6.0 * 3600.0,
            dt: 900.0,
            domain: DomainConfig::tiny(),
            ..Default::default()
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dt <= 0.0 {
            return Err(ConfigError::invalid("dt", self.dt, "时间步长必须为正"));
        }
        if self.tf <= self.t0 {
            return Err(ConfigError::invalid("tf", self.tf, "结束时间必须大于起始时间"));
        }
        if self.driver_update_interval <= 0.0 {
            return Err(ConfigError::invalid(
                "driver_update_interval",
                self.driver_update_interval,
                "驱动更新周期必须为正",
            ));
        }
        if self.newton_iterations == 0 {
            return Err(ConfigError::invalid("newton_iterations", 0, "至少需要一次 Newton 迭代"));
        }
        self.domain.validate()
    }

    /// 模拟时长 [s]
    pub fn duration(&self) -> f64 {
        self.tf - self.t0
    }

    /// 起始日期所在日历年的长度 [s]，用于周期性时间插值
    pub fn calendar_year_seconds(&self) -> f64 {
        let year = self.start_date.year();
        let days = NaiveDate::from_ymd_opt(year, 12, 31)
            .map(|d| d.ordinal())
            .unwrap_or(365);
        days as f64 * SECONDS_PER_DAY
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.newton_iterations, 3);
        assert_eq!(config.driver_update_interval, 10_800.0);
        assert_eq!(config.dt, 450.0);
    }

    #[test]
    fn test_leap_year_calendar() {
        let config = SimulationConfig::default();
        assert_eq!(config.calendar_year_seconds(), 366.0 * SECONDS_PER_DAY);
    }

    #[test]
    fn test_invalid_dt() {
        let config = SimulationConfig {
            dt: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_domain() {
        let mut config = SimulationConfig::default();
        config.domain.nelements = (0, 15);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.yaml");
        let config = SimulationConfig::tiny();
        config.save_to_file(&path).unwrap();
        let loaded = SimulationConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.json");
        std::fs::write(&path, r#"{ "dt": 300.0 }"#).unwrap();
        let loaded = SimulationConfig::from_file(&path).unwrap();
        assert_eq!(loaded.dt, 300.0);
        assert_eq!(loaded.domain, DomainConfig::default());
    }
}
