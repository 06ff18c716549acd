// crates/sl_land/src/model/init.rs

//! 初始状态与初始缓存
//!
//! 初值全部取字面常数，不依赖随机数或外部状态，相同输入两次初始化得到
//! 逐位相同的状态向量。

use super::cache::Cache;
use super::land::LandModel;
use super::physics::update_soil_diagnostics;
use super::state::StateVector;
use crate::domain::ColumnCoord;
use crate::error::LandResult;

/// 初始土壤温度 [K]
pub const INITIAL_SOIL_TEMPERATURE: f64 = 276.85;
/// 初始土壤 CO2 混合比
pub const INITIAL_SOIL_CO2: f64 = 0.000412;

/// 网格坐标
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    /// 列坐标（地表）
    pub columns: Vec<ColumnCoord>,
    /// 层中心深度 [m]，地表以下为负
    pub layer_centers: Vec<f64>,
}

/// 构建初始状态 Y、缓存 p 和坐标，并完成 `set_initial_cache`
pub fn initialize(model: &LandModel, t0: f64) -> LandResult<(StateVector, Cache, Coordinates)> {
    let _span = tracing::debug_span!("initialize").entered();
    let subsurface = model.subsurface_space();
    let surface = model.surface_space();
    let mut y = StateVector::zeros(subsurface, surface, model.n_compartments());
    let mut p = Cache::allocate(subsurface, surface);

    // 土壤：含水量取残余含水量与孔隙度的中点，无冰
    let soil = &model.soil;
    let c = &model.constants;
    let rho_c_ds = soil.dry_heat_capacity().data();
    for i in 0..y.soil.theta_l.len() {
        let nu = soil.porosity.data()[i];
        let theta_r = soil.residual_water.data()[i];
        let theta_l = theta_r + (nu - theta_r) / 2.0;
        let theta_i = 0.0;
        let rho_c_s = c.volumetric_heat_capacity(theta_l, theta_i, rho_c_ds[i]);
        y.soil.theta_l.data_mut()[i] = theta_l;
        y.soil.theta_i.data_mut()[i] = theta_i;
        y.soil.rho_e_int.data_mut()[i] = c.volumetric_internal_energy(theta_i, rho_c_s, INITIAL_SOIL_TEMPERATURE);
    }
    y.soilco2.c.fill(INITIAL_SOIL_CO2);

    // 冠层：隔室饱和，温度取初始时刻气温
    for compartment in y.canopy.hydraulics_theta_l.iter_mut() {
        compartment.fill(model.canopy.hydraulics.nu);
    }
    model
        .forcing
        .atmosphere
        .air_temperature
        .evaluate_into(t0, &mut y.canopy.energy_t)?;

    // 积雪保持为零

    set_initial_cache(model, &mut p, &y, t0)?;

    let domain = model.domain();
    let coords = Coordinates {
        columns: domain.coords().to_vec(),
        layer_centers: domain.layer_centers().to_vec(),
    };
    tracing::debug!("初始状态: {} 个自由度", y.len());
    Ok((y, p, coords))
}

/// 按 `(Y, t0)` 填充缓存：驱动场与土壤诊断量，完成后缓存可读
pub fn set_initial_cache(model: &LandModel, p: &mut Cache, y: &StateVector, t0: f64) -> LandResult<()> {
    model.forcing.update_drivers(&mut p.drivers, t0)?;
    update_soil_diagnostics(model, y, p);
    p.mark_initialized();
    Ok(())
}
