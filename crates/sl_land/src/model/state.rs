// crates/sl_land/src/model/state.rs

//! 预报状态向量 Y
//!
//! ```text
//! Y
//! ├── soil      { ϑ_l, θ_i, ρe_int }      地下
//! ├── soilco2   { C }                      地下
//! ├── canopy
//! │   ├── hydraulics { ϑ_l[隔室] }        地表
//! │   └── energy     { T }                 地表
//! └── snow      { S, S_l, U }              地表
//! ```
//!
//! 分层路径（如 `"soil.ϑ_l"`、`"canopy.hydraulics.ϑ_l.0"`）可用于只读访问。
//! 向量运算按固定的字段顺序逐场执行。

use crate::domain::{Space, SpatialField};

/// 土壤状态
#[derive(Debug, Clone, PartialEq)]
pub struct SoilState {
    /// 体积液态含水量 ϑ_l
    pub theta_l: SpatialField,
    /// 体积含冰量 θ_i
    pub theta_i: SpatialField,
    /// 体积内能 ρe_int [J/m³]
    pub rho_e_int: SpatialField,
}

/// 土壤 CO2 状态
#[derive(Debug, Clone, PartialEq)]
pub struct SoilCO2State {
    /// 土壤孔隙 CO2 混合比
    pub c: SpatialField,
}

/// 冠层状态
#[derive(Debug, Clone, PartialEq)]
pub struct CanopyState {
    /// 各隔室体积含水量
    pub hydraulics_theta_l: Vec<SpatialField>,
    /// 冠层温度 [K]
    pub energy_t: SpatialField,
}

/// 积雪状态
#[derive(Debug, Clone, PartialEq)]
pub struct SnowState {
    /// 雪水当量 [m]
    pub s: SpatialField,
    /// 液态水当量 [m]
    pub s_l: SpatialField,
    /// 积雪内能 [J/m²]
    pub u: SpatialField,
}

/// 状态向量
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    /// 土壤
    pub soil: SoilState,
    /// 土壤 CO2
    pub soilco2: SoilCO2State,
    /// 冠层
    pub canopy: CanopyState,
    /// 积雪
    pub snow: SnowState,
}

impl StateVector {
    /// 全零状态
    pub fn zeros(subsurface: Space, surface: Space, n_compartments: usize) -> Self {
        let sub = || SpatialField::zeros(subsurface);
        let sfc = || SpatialField::zeros(surface);
        Self {
            soil: SoilState {
                theta_l: sub(),
                theta_i: sub(),
                rho_e_int: sub(),
            },
            soilco2: SoilCO2State { c: sub() },
            canopy: CanopyState {
                hydraulics_theta_l: (0..n_compartments).map(|_| sfc()).collect(),
                energy_t: sfc(),
            },
            snow: SnowState {
                s: sfc(),
                s_l: sfc(),
                u: sfc(),
            },
        }
    }

    /// 同形状的全零状态
    pub fn zeros_like(&self) -> Self {
        let mut out = self.clone();
        out.fill(0.0);
        out
    }

    /// 按固定顺序列出所有字段及其路径
    pub fn fields(&self) -> Vec<(String, &SpatialField)> {
        let mut out = vec![
            ("soil.ϑ_l".to_string(), &self.soil.theta_l),
            ("soil.θ_i".to_string(), &self.soil.theta_i),
            ("soil.ρe_int".to_string(), &self.soil.rho_e_int),
            ("soilco2.C".to_string(), &self.soilco2.c),
        ];
        for (i, f) in self.canopy.hydraulics_theta_l.iter().enumerate() {
            out.push((format!("canopy.hydraulics.ϑ_l.{}", i), f));
        }
        out.push(("canopy.energy.T".to_string(), &self.canopy.energy_t));
        out.push(("snow.S".to_string(), &self.snow.s));
        out.push(("snow.S_l".to_string(), &self.snow.s_l));
        out.push(("snow.U".to_string(), &self.snow.u));
        out
    }

    /// 按与 [`fields`](Self::fields) 相同的顺序列出可变字段
    pub fn fields_mut(&mut self) -> Vec<&mut SpatialField> {
        let mut out = vec![
            &mut self.soil.theta_l,
            &mut self.soil.theta_i,
            &mut self.soil.rho_e_int,
            &mut self.soilco2.c,
        ];
        out.extend(self.canopy.hydraulics_theta_l.iter_mut());
        out.push(&mut self.canopy.energy_t);
        out.push(&mut self.snow.s);
        out.push(&mut self.snow.s_l);
        out.push(&mut self.snow.u);
        out
    }

    /// 按路径取字段
    pub fn get(&self, path: &str) -> Option<&SpatialField> {
        self.fields().into_iter().find(|(p, _)| p == path).map(|(_, f)| f)
    }

    /// 全部置为同一值
    pub fn fill(&mut self, value: f64) {
        for f in self.fields_mut() {
            f.fill(value);
        }
    }

    /// 从另一状态复制
    pub fn copy_from(&mut self, other: &Self) {
        for (dst, (_, src)) in self.fields_mut().into_iter().zip(other.fields()) {
            dst.copy_from(src);
        }
    }

    /// self = self + alpha * x
    pub fn axpy(&mut self, alpha: f64, x: &Self) {
        for (dst, (_, src)) in self.fields_mut().into_iter().zip(x.fields()) {
            dst.axpy(alpha, src);
        }
    }

    /// 所有字段的最大绝对值
    pub fn max_abs(&self) -> f64 {
        self.fields().iter().fold(0.0_f64, |m, (_, f)| m.max(f.max_abs()))
    }

    /// 所有值都是有限值
    pub fn is_finite(&self) -> bool {
        self.fields().iter().all(|(_, f)| f.is_finite())
    }

    /// 总自由度
    pub fn len(&self) -> usize {
        self.fields().iter().map(|(_, f)| f.len()).sum()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
