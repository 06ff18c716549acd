// crates/sl_land/src/params/snow.rs

//! 积雪参数

use sl_config::ParameterRegistry;

use crate::domain::Space;
use crate::error::ConfigError;

/// 积雪参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnowParameters {
    /// 时间步长 [s]
    pub dt: f64,
    /// 反照率
    pub albedo: f64,
    /// 密度 [kg/m³]
    pub density: f64,
    /// 比辐射率
    pub emissivity: f64,
    /// 动量粗糙度长度 [m]
    pub z_0m: f64,
    /// 标量粗糙度长度 [m]
    pub z_0b: f64,
    /// 液态水持水能力
    pub theta_r: f64,
    /// 融雪因子 [m/s/K]
    pub melt_factor: f64,
    surface: Space,
}

impl SnowParameters {
    /// 地表空间
    pub fn surface_space(&self) -> Space {
        self.surface
    }
}

/// 积雪参数构建器
#[derive(Debug, Clone, Default)]
pub struct SnowParametersBuilder {
    albedo: Option<f64>,
    density: Option<f64>,
    emissivity: Option<f64>,
    z_0m: Option<f64>,
    z_0b: Option<f64>,
    theta_r: Option<f64>,
    melt_factor: Option<f64>,
}

impl SnowParametersBuilder {
    /// 创建构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 覆盖反照率
    pub fn with_albedo(mut self, value: f64) -> Self {
        self.albedo = Some(value);
        self
    }

    /// 覆盖密度
    pub fn with_density(mut self, value: f64) -> Self {
        self.density = Some(value);
        self
    }

    /// 覆盖比辐射率
    pub fn with_emissivity(mut self, value: f64) -> Self {
        self.emissivity = Some(value);
        self
    }

    /// 覆盖粗糙度长度
    pub fn with_roughness(mut self, z_0m: f64, z_0b: f64) -> Self {
        self.z_0m = Some(z_0m);
        self.z_0b = Some(z_0b);
        self
    }

    /// 覆盖持水能力
    pub fn with_theta_r(mut self, value: f64) -> Self {
        self.theta_r = Some(value);
        self
    }

    /// 覆盖融雪因子
    pub fn with_melt_factor(mut self, value: f64) -> Self {
        self.melt_factor = Some(value);
        self
    }

    /// 构建积雪参数
    pub fn build(self, surface: Space, dt: f64, registry: &ParameterRegistry) -> Result<SnowParameters, ConfigError> {
        if dt.is_nan() || dt <= 0.0 {
            return Err(ConfigError::invalid("snow.dt", dt, "时间步长必须为正"));
        }
        let albedo = registry.resolve(self.albedo, "snow_albedo")?;
        if !(0.0..=1.0).contains(&albedo) {
            return Err(ConfigError::invalid("snow.albedo", albedo, "反照率必须位于 [0, 1]"));
        }
        Ok(SnowParameters {
            dt,
            albedo,
            density: registry.resolve(self.density, "snow_density")?,
            emissivity: registry.resolve(self.emissivity, "snow_emissivity")?,
            z_0m: registry.resolve(self.z_0m, "snow_momentum_roughness_length")?,
            z_0b: registry.resolve(self.z_0b, "snow_scalar_roughness_length")?,
            theta_r: registry.resolve(self.theta_r, "holding_capacity_of_water_in_snow")?,
            melt_factor: registry.resolve(self.melt_factor, "snow_melt_factor")?,
            surface,
        })
    }
}
