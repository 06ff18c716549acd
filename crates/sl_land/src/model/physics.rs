// crates/sl_land/src/model/physics.rs

//! 简化柱模型倾向
//!
//! 隐式部分（刚性）：
//! - 土壤水垂直扩散 `∂ϑ_l/∂t = -∂q/∂z`，`q = -K·∂(ψ + z)/∂z`，上下边界零通量
//! - 土壤热传导 `∂ρe_int/∂t = ∂/∂z(κ·∂T/∂z)`，上下边界零通量
//! - 冠层能量平衡（逐点松弛）
//!
//! 显式部分：
//! - 积雪累积、融化与液态水排出
//! - 入渗、地表径流、基流与自由排水
//! - 蒸腾取水、冻融、地表热通量
//! - 土壤 CO2 产生与交换
//! - 植物隔室水分松弛
//!
//! 所有通量都是单列局部的，列与列之间只通过 DSS 耦合。

use super::cache::Cache;
use super::land::LandModel;
use super::state::StateVector;

/// 冻融时间尺度 [s]
const FREEZE_THAW_TIMESCALE: f64 = 86_400.0;
/// 土壤 CO2 呼吸的 Q10
const Q10: f64 = 2.0;
/// 蒸腾系数 [m/s per (W/m²)]
const TRANSPIRATION_COEFFICIENT: f64 = 1.0e-11;

/// 有效饱和度 (ϑ_l - θ_r)/(ν - θ_r)，截断到 [0, 1]
#[inline]
fn effective_saturation(theta_l: f64, nu: f64, theta_r: f64) -> f64 {
    ((theta_l - theta_r) / (nu - theta_r)).clamp(0.0, 1.0)
}

/// 冠层截获率
#[inline]
fn canopy_fraction(omega: f64, lai: f64) -> f64 {
    1.0 - (-0.5 * omega * lai.max(0.0)).exp()
}

/// 由状态更新土壤诊断量
pub fn update_soil_diagnostics(model: &LandModel, y: &StateVector, p: &mut Cache) {
    let _span = tracing::debug_span!("update_soil_diagnostics").entered();
    let soil = &model.soil;
    let c = &model.constants;
    let rho_c_ds = soil.dry_heat_capacity().data();

    let theta_l = y.soil.theta_l.data();
    let theta_i = y.soil.theta_i.data();
    let rho_e = y.soil.rho_e_int.data();
    let cache = &mut p.soil;

    for i in 0..theta_l.len() {
        let nu = soil.porosity.data()[i];
        let theta_r = soil.residual_water.data()[i];
        let curve = soil.retention.data()[i];

        let s = effective_saturation(theta_l[i], nu, theta_r);
        let total = ((theta_l[i] + theta_i[i]) / nu).clamp(0.0, 1.0);
        let rho_c_s = c.volumetric_heat_capacity(theta_l[i], theta_i[i], rho_c_ds[i]);

        cache.effective_saturation.data_mut()[i] = s;
        cache.matric_potential.data_mut()[i] = curve.matric_potential(s);
        cache.hydraulic_conductivity.data_mut()[i] =
            soil.saturated_conductivity.data()[i] * curve.relative_conductivity(s);
        cache.heat_capacity.data_mut()[i] = rho_c_s;
        cache.thermal_conductivity.data_mut()[i] = soil.kappa_dry + (soil.kappa_sat - soil.kappa_dry) * total;
        cache.temperature.data_mut()[i] = c.temperature_from_energy(rho_e[i], theta_i[i], rho_c_s);
    }
}

/// 隐式倾向；调用前缓存中的土壤诊断量必须与 `y` 一致
pub fn implicit_tendency(model: &LandModel, dy: &mut StateVector, y: &StateVector, p: &Cache) {
    let _span = tracing::debug_span!("implicit_tendency").entered();
    dy.fill(0.0);

    let domain = model.domain();
    let n = domain.n_layers();
    let dz = domain.layer_thickness();
    let dzc = domain.center_spacing();
    let psi = p.soil.matric_potential.data();
    let k = p.soil.hydraulic_conductivity.data();
    let t = p.soil.temperature.data();
    let kappa = p.soil.thermal_conductivity.data();

    let water = dy.soil.theta_l.data_mut();
    let energy = dy.soil.rho_e_int.data_mut();
    for col in 0..domain.n_columns() {
        let base = col * n;
        for face in 0..n.saturating_sub(1) {
            let (lo, hi) = (base + face, base + face + 1);
            // 向上为正
            let k_face = 0.5 * (k[lo] + k[hi]);
            let q = -k_face * ((psi[hi] - psi[lo]) / dzc[face] + 1.0);
            water[lo] -= q / dz[face];
            water[hi] += q / dz[face + 1];

            let kappa_face = 0.5 * (kappa[lo] + kappa[hi]);
            let qh = -kappa_face * (t[hi] - t[lo]) / dzc[face];
            energy[lo] -= qh / dz[face];
            energy[hi] += qh / dz[face + 1];
        }
    }

    let ac = model.canopy.energy.ac_canopy;
    let t_c = y.canopy.energy_t.data();
    let tendency = dy.canopy.energy_t.data_mut();
    for col in 0..tendency.len() {
        tendency[col] = canopy_energy_balance(model, p, col, t_c[col]) / ac;
    }
}

/// 冠层净能量通量 [W/m²]
#[inline]
fn canopy_energy_balance(model: &LandModel, p: &Cache, col: usize, t_c: f64) -> f64 {
    let canopy = &model.canopy;
    let sigma = model.constants.stefan_boltzmann;
    let h = model.constants.surface_heat_transfer;
    let d = &p.drivers;
    let rt = &canopy.radiative_transfer;
    let n = model.domain().n_layers();

    let f_c = canopy_fraction(rt.omega, d.lai.data()[col]);
    let albedo = 0.5 * (rt.alpha_par_leaf.data()[col] + rt.alpha_nir_leaf.data()[col]);
    let eps = canopy.emissivity;
    let t_soil = p.soil.temperature.data()[col * n + n - 1];

    let radiation = (1.0 - albedo) * d.shortwave_down.data()[col]
        + eps * (d.longwave_down.data()[col] + sigma * t_soil.powi(4))
        - 2.0 * eps * sigma * t_c.powi(4);
    f_c * radiation + h * (d.air_temperature.data()[col] - t_c)
}

/// 冠层能量倾向对冠层温度的导数 [1/s]
#[inline]
pub fn canopy_energy_derivative(model: &LandModel, p: &Cache, col: usize, t_c: f64) -> f64 {
    let sigma = model.constants.stefan_boltzmann;
    let h = model.constants.surface_heat_transfer;
    let canopy = &model.canopy;
    let f_c = canopy_fraction(canopy.radiative_transfer.omega, p.drivers.lai.data()[col]);
    -(8.0 * f_c * canopy.emissivity * sigma * t_c.powi(3) + h) / canopy.energy.ac_canopy
}

/// 显式倾向；会先更新缓存中的土壤诊断量与地表通量
pub fn explicit_tendency(model: &LandModel, dy: &mut StateVector, y: &StateVector, p: &mut Cache) {
    let _span = tracing::debug_span!("explicit_tendency").entered();
    update_soil_diagnostics(model, y, p);
    dy.fill(0.0);

    snow_tendency(model, dy, y, p);
    soil_water_tendency(model, dy, y, p);
    soil_energy_tendency(model, dy, y, p);
    soilco2_tendency(model, dy, y, p);
    canopy_water_tendency(model, dy, y);
}

fn snow_tendency(model: &LandModel, dy: &mut StateVector, y: &StateVector, p: &mut Cache) {
    let snow = &model.snow;
    let c = &model.constants;
    let d = &p.drivers;
    let dt = snow.dt;

    for col in 0..y.snow.s.len() {
        let s = y.snow.s.data()[col].max(0.0);
        let s_l = y.snow.s_l.data()[col].max(0.0);
        let p_snow = d.snow_precipitation.data()[col];

        let potential = snow.melt_factor * (d.air_temperature.data()[col] - c.t_freeze).max(0.0);
        let melt = potential.min(s / dt + p_snow);
        let s_new = s + dt * (p_snow - melt);
        let liquid = s_l + dt * melt;
        let drainage = (liquid - snow.theta_r * s_new).max(0.0) / dt;

        dy.snow.s.data_mut()[col] = p_snow - melt;
        dy.snow.s_l.data_mut()[col] = melt - drainage;
        dy.snow.u.data_mut()[col] = -c.rho_liquid * c.latent_heat_fusion * (p_snow - melt);

        p.surface.snowmelt.data_mut()[col] = melt;
        p.surface.snow_drainage.data_mut()[col] = drainage;
    }
}

fn soil_water_tendency(model: &LandModel, dy: &mut StateVector, y: &StateVector, p: &mut Cache) {
    let domain = model.domain();
    let soil = &model.soil;
    let runoff = &model.runoff;
    let c = &model.constants;
    let n = domain.n_layers();
    let dz = domain.layer_thickness();
    let centers = domain.layer_centers();
    let dt = model.snow.dt;
    let top = n - 1;

    let theta_l = y.soil.theta_l.data();
    let theta_i = y.soil.theta_i.data();
    let sat = p.soil.effective_saturation.data();
    let k = p.soil.hydraulic_conductivity.data();
    let temp = p.soil.temperature.data();

    for col in 0..domain.n_columns() {
        let base = col * n;
        let d = &p.drivers;

        // 入渗与地表径流
        let input = d.liquid_precipitation.data()[col] + p.surface.snow_drainage.data()[col];
        let s_top = sat[base + top];
        let f_sat = runoff.f_max.data()[col] * (-0.5 * runoff.f_over * (1.0 - s_top)).exp();
        let room = (soil.porosity.data()[base + top] - theta_l[base + top] - theta_i[base + top]).max(0.0)
            * dz[top]
            / dt;
        let infiltration = ((1.0 - f_sat) * input).min(room);
        dy.soil.theta_l.data_mut()[base + top] += infiltration / dz[top];

        // 基流与底部自由排水
        let s_mean = sat[base..base + n].iter().sum::<f64>() / n as f64;
        let baseflow = runoff.r_sb * (-runoff.f_over * (1.0 - s_mean)).exp();
        let available = (theta_l[base] - soil.residual_water.data()[base]).max(0.0) * dz[0] / dt;
        let drainage = (k[base] + baseflow).min(available);
        dy.soil.theta_l.data_mut()[base] -= drainage / dz[0];

        // 蒸腾：按根系深度在各层之间分配
        let lai = d.lai.data()[col];
        let beta = s_top;
        let transpiration = TRANSPIRATION_COEFFICIENT * lai * d.shortwave_down.data()[col].max(0.0) * beta;
        let rooting_depth = model.canopy.hydraulics.rooting_depth.data()[col];
        let rooted: f64 = (0..n).filter(|&l| -centers[l] <= rooting_depth).map(|l| dz[l]).sum();
        let mut extracted = 0.0;
        if rooted > 0.0 {
            for l in (0..n).filter(|&l| -centers[l] <= rooting_depth) {
                let i = base + l;
                let available = (theta_l[i] - soil.residual_water.data()[i]).max(0.0) / dt;
                let uptake = (transpiration / rooted).min(available);
                dy.soil.theta_l.data_mut()[i] -= uptake;
                extracted += uptake * dz[l];
            }
        }

        // 冻融
        for l in 0..n {
            let i = base + l;
            let rate = if temp[i] < c.t_freeze {
                let liquid = (theta_l[i] - soil.residual_water.data()[i]).max(0.0);
                liquid * (c.t_freeze - temp[i]).min(1.0) / FREEZE_THAW_TIMESCALE
            } else {
                -theta_i[i].max(0.0) * (temp[i] - c.t_freeze).min(1.0) / FREEZE_THAW_TIMESCALE
            };
            dy.soil.theta_i.data_mut()[i] += rate;
            dy.soil.theta_l.data_mut()[i] -= rate * c.rho_ice / c.rho_liquid;
        }

        p.surface.infiltration.data_mut()[col] = infiltration;
        p.surface.surface_runoff.data_mut()[col] = input - infiltration;
        p.surface.subsurface_runoff.data_mut()[col] = drainage;
        p.surface.transpiration.data_mut()[col] = extracted;
    }
}

fn soil_energy_tendency(model: &LandModel, dy: &mut StateVector, y: &StateVector, p: &mut Cache) {
    let domain = model.domain();
    let soil = &model.soil;
    let c = &model.constants;
    let n = domain.n_layers();
    let top = n - 1;
    let dz_top = domain.layer_thickness()[top];
    let omega = model.canopy.radiative_transfer.omega;

    for col in 0..domain.n_columns() {
        let i = col * n + top;
        let d = &p.drivers;
        let t_top = p.soil.temperature.data()[i];
        let s = p.soil.effective_saturation.data()[i];
        let f_c = canopy_fraction(omega, d.lai.data()[col]);

        let albedo_dry = 0.5 * (soil.albedo.par_albedo_dry.data()[col] + soil.albedo.nir_albedo_dry.data()[col]);
        let albedo_wet = 0.5 * (soil.albedo.par_albedo_wet.data()[col] + soil.albedo.nir_albedo_wet.data()[col]);
        let albedo = (1.0 - s) * albedo_dry + s * albedo_wet;

        let t_c = y.canopy.energy_t.data()[col];
        let lw_in = (1.0 - f_c) * d.longwave_down.data()[col] + f_c * c.stefan_boltzmann * t_c.powi(4);
        let g = (1.0 - f_c) * (1.0 - albedo) * d.shortwave_down.data()[col]
            + soil.emissivity * (lw_in - c.stefan_boltzmann * t_top.powi(4))
            + c.surface_heat_transfer * (d.air_temperature.data()[col] - t_top)
            - c.rho_liquid * c.latent_heat_fusion * p.surface.snowmelt.data()[col];

        dy.soil.rho_e_int.data_mut()[i] += g / dz_top;
        p.surface.ground_heat_flux.data_mut()[col] = g;
    }
}

fn soilco2_tendency(model: &LandModel, dy: &mut StateVector, y: &StateVector, p: &Cache) {
    let params = &model.soilco2;
    let n = model.domain().n_layers();
    let soc = model.soil_organic_carbon.data();
    let temp = p.soil.temperature.data();
    let co2 = y.soilco2.c.data();
    let out = dy.soilco2.c.data_mut();

    for i in 0..co2.len() {
        let atmosphere = p.drivers.co2.data()[i / n];
        let respiration = params.respiration_base_rate * soc[i] * Q10.powf((temp[i] - 283.15) / 10.0);
        out[i] = respiration - params.exchange_rate * (co2[i] - atmosphere);
    }
}

fn canopy_water_tendency(model: &LandModel, dy: &mut StateVector, y: &StateVector) {
    let hydraulics = &model.canopy.hydraulics;
    let rate = hydraulics.k_sat_plant / hydraulics.h_leaf;
    for (dtheta, theta) in dy
        .canopy
        .hydraulics_theta_l
        .iter_mut()
        .zip(y.canopy.hydraulics_theta_l.iter())
    {
        for (d, &v) in dtheta.data_mut().iter_mut().zip(theta.data()) {
            *d = rate * (hydraulics.nu - v);
        }
    }
}

/// 土壤水基质势对含水量的导数 dψ/dϑ [m]
#[inline]
pub fn matric_potential_derivative(model: &LandModel, i: usize, s: f64) -> f64 {
    const DELTA: f64 = 1e-4;
    const CAP: f64 = 1e5;
    let soil = &model.soil;
    let curve = soil.retention.data()[i];
    let lo = (s - DELTA).clamp(DELTA, 1.0 - 2.0 * DELTA);
    let hi = lo + 2.0 * DELTA;
    let dpsi_ds = (curve.matric_potential(hi) - curve.matric_potential(lo)) / (hi - lo);
    let width = soil.porosity.data()[i] - soil.residual_water.data()[i];
    (dpsi_ds / width).clamp(0.0, CAP)
}
