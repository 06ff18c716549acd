// crates/sl_land/src/model/thermo.rs

//! 热力学关系
//!
//! - 体积热容：`ρc_s = ϑ_l·ρ_l·c_l + θ_i·ρ_i·c_i + ρc_ds`
//! - 体积内能：`ρe_int = ρc_s·(T - T_freeze) - θ_i·ρ_i·L_f`

use sl_config::ParameterRegistry;

use crate::error::ConfigError;

/// 物理常数（全部取自注册表）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalConstants {
    /// 液态水密度 ρ_l [kg/m³]
    pub rho_liquid: f64,
    /// 冰密度 ρ_i [kg/m³]
    pub rho_ice: f64,
    /// 液态水比热 c_l [J/kg/K]
    pub cp_liquid: f64,
    /// 冰比热 c_i [J/kg/K]
    pub cp_ice: f64,
    /// 融化潜热 L_f [J/kg]
    pub latent_heat_fusion: f64,
    /// 冰点 [K]
    pub t_freeze: f64,
    /// 重力加速度 [m/s²]
    pub gravity: f64,
    /// Stefan-Boltzmann 常数
    pub stefan_boltzmann: f64,
    /// 地表感热交换系数 [W/m²/K]
    pub surface_heat_transfer: f64,
}

impl PhysicalConstants {
    /// 从注册表读取
    pub fn from_registry(registry: &ParameterRegistry) -> Result<Self, ConfigError> {
        Ok(Self {
            rho_liquid: registry.get("density_liquid_water")?,
            rho_ice: registry.get("density_ice_water")?,
            cp_liquid: registry.get("isobaric_specific_heat_liquid")?,
            cp_ice: registry.get("isobaric_specific_heat_ice")?,
            latent_heat_fusion: registry.get("latent_heat_fusion_at_reference")?,
            t_freeze: registry.get("temperature_water_freeze")?,
            gravity: registry.get("gravitational_acceleration")?,
            stefan_boltzmann: registry.get("stefan_boltzmann_constant")?,
            surface_heat_transfer: registry.get("surface_heat_transfer_coefficient")?,
        })
    }

    /// 体积热容 ρc_s [J/m³/K]
    #[inline]
    pub fn volumetric_heat_capacity(&self, theta_l: f64, theta_i: f64, rho_c_ds: f64) -> f64 {
        theta_l * self.rho_liquid * self.cp_liquid + theta_i * self.rho_ice * self.cp_ice + rho_c_ds
    }

    /// 体积内能 ρe_int [J/m³]
    #[inline]
    pub fn volumetric_internal_energy(&self, theta_i: f64, rho_c_s: f64, temperature: f64) -> f64 {
        rho_c_s * (temperature - self.t_freeze) - theta_i * self.rho_ice * self.latent_heat_fusion
    }

    /// 由内能反解温度 [K]
    #[inline]
    pub fn temperature_from_energy(&self, rho_e_int: f64, theta_i: f64, rho_c_s: f64) -> f64 {
        self.t_freeze + (rho_e_int + theta_i * self.rho_ice * self.latent_heat_fusion) / rho_c_s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_energy_temperature_inverse() {
        let c = PhysicalConstants::from_registry(&ParameterRegistry::defaults()).unwrap();
        let rho_c_s = c.volumetric_heat_capacity(0.25, 0.05, 1.2e6);
        let e = c.volumetric_internal_energy(0.05, rho_c_s, 276.85);
        assert_relative_eq!(c.temperature_from_energy(e, 0.05, rho_c_s), 276.85, epsilon = 1e-9);
    }

    #[test]
    fn test_heat_capacity_terms() {
        let c = PhysicalConstants::from_registry(&ParameterRegistry::defaults()).unwrap();
        assert_relative_eq!(c.volumetric_heat_capacity(0.0, 0.0, 1.0e6), 1.0e6);
        assert_relative_eq!(c.volumetric_heat_capacity(1.0, 0.0, 0.0), 1000.0 * 4181.0);
    }
}
