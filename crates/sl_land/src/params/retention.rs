// crates/sl_land/src/params/retention.rs

//! 土壤水分特征曲线
//!
//! 临界饱和度 `S_c` 由曲线形状参数在构造时导出，不提供单独设置的途径。
//!
//! | 模型 | 形状参数 | S_c |
//! |------|----------|-----|
//! | van Genuchten | α, n (m = 1 - 1/n) | (1 + ((n-1)/n)^(1-2n))^(-m) |
//! | Brooks-Corey | c, ψ_b | (1 + 1/c)^(-c) |

use serde::{Deserialize, Serialize};

use super::source::FieldSource;
use crate::error::ConfigError;

/// van Genuchten 曲线
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VanGenuchten {
    alpha: f64,
    n: f64,
    m: f64,
    s_c: f64,
}

impl VanGenuchten {
    /// 由 α [1/m] 和 n (> 1) 构造
    pub fn new(alpha: f64, n: f64) -> Result<Self, ConfigError> {
        if alpha.is_nan() || alpha <= 0.0 {
            return Err(ConfigError::invalid("vg_alpha", alpha, "必须为正"));
        }
        if n.is_nan() || n <= 1.0 {
            return Err(ConfigError::invalid("vg_n", n, "必须大于 1"));
        }
        let m = 1.0 - 1.0 / n;
        let s_c = (1.0 + ((n - 1.0) / n).powf(1.0 - 2.0 * n)).powf(-m);
        Ok(Self { alpha, n, m, s_c })
    }

    /// α [1/m]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// n
    pub fn n(&self) -> f64 {
        self.n
    }

    /// m = 1 - 1/n
    pub fn m(&self) -> f64 {
        self.m
    }

    /// 临界饱和度
    pub fn critical_saturation(&self) -> f64 {
        self.s_c
    }

    /// 基质势 ψ(S) [m]
    pub fn matric_potential(&self, s: f64) -> f64 {
        let s = s.clamp(1e-8, 1.0);
        -((s.powf(-1.0 / self.m) - 1.0).max(0.0)).powf(1.0 / self.n) / self.alpha
    }

    /// 相对导水率 K(S)/K_sat
    pub fn relative_conductivity(&self, s: f64) -> f64 {
        let s = s.clamp(0.0, 1.0);
        let inner = 1.0 - (1.0 - s.powf(1.0 / self.m)).powf(self.m);
        s.sqrt() * inner * inner
    }
}

/// Brooks-Corey 曲线
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrooksCorey {
    c: f64,
    psi_b: f64,
    s_c: f64,
}

impl BrooksCorey {
    /// 由孔径分布指数 c (> 0) 和进气值 ψ_b (< 0) [m] 构造
    pub fn new(c: f64, psi_b: f64) -> Result<Self, ConfigError> {
        if c.is_nan() || c <= 0.0 {
            return Err(ConfigError::invalid("bc_c", c, "必须为正"));
        }
        if psi_b.is_nan() || psi_b >= 0.0 {
            return Err(ConfigError::invalid("bc_psi_b", psi_b, "进气值必须为负"));
        }
        let s_c = (1.0 + 1.0 / c).powf(-c);
        Ok(Self { c, psi_b, s_c })
    }

    /// c
    pub fn c(&self) -> f64 {
        self.c
    }

    /// ψ_b [m]
    pub fn psi_b(&self) -> f64 {
        self.psi_b
    }

    /// 临界饱和度
    pub fn critical_saturation(&self) -> f64 {
        self.s_c
    }

    /// 基质势 ψ(S) [m]
    pub fn matric_potential(&self, s: f64) -> f64 {
        self.psi_b * s.clamp(1e-8, 1.0).powf(-1.0 / self.c)
    }

    /// 相对导水率
    pub fn relative_conductivity(&self, s: f64) -> f64 {
        s.clamp(0.0, 1.0).powf(2.0 / self.c + 3.0)
    }
}

/// 土壤水分特征曲线
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RetentionCurve {
    /// van Genuchten
    VanGenuchten(VanGenuchten),
    /// Brooks-Corey
    BrooksCorey(BrooksCorey),
}

impl RetentionCurve {
    /// 临界饱和度
    #[inline]
    pub fn critical_saturation(&self) -> f64 {
        match self {
            Self::VanGenuchten(vg) => vg.critical_saturation(),
            Self::BrooksCorey(bc) => bc.critical_saturation(),
        }
    }

    /// 基质势 [m]
    #[inline]
    pub fn matric_potential(&self, s: f64) -> f64 {
        match self {
            Self::VanGenuchten(vg) => vg.matric_potential(s),
            Self::BrooksCorey(bc) => bc.matric_potential(s),
        }
    }

    /// 相对导水率
    #[inline]
    pub fn relative_conductivity(&self, s: f64) -> f64 {
        match self {
            Self::VanGenuchten(vg) => vg.relative_conductivity(s),
            Self::BrooksCorey(bc) => bc.relative_conductivity(s),
        }
    }
}

impl From<VanGenuchten> for RetentionCurve {
    fn from(vg: VanGenuchten) -> Self {
        Self::VanGenuchten(vg)
    }
}

impl From<BrooksCorey> for RetentionCurve {
    fn from(bc: BrooksCorey) -> Self {
        Self::BrooksCorey(bc)
    }
}

impl From<RetentionCurve> for FieldSource<RetentionCurve> {
    fn from(curve: RetentionCurve) -> Self {
        Self::Scalar(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_van_genuchten_derived_values() {
        let vg = VanGenuchten::new(2.0, 2.0).unwrap();
        assert_relative_eq!(vg.m(), 0.5);
        // (1 + 0.5^(-3))^(-0.5) = 9^(-0.5)
        assert_relative_eq!(vg.critical_saturation(), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_brooks_corey_derived_values() {
        let bc = BrooksCorey::new(1.0, -0.1).unwrap();
        assert_relative_eq!(bc.critical_saturation(), 0.5);
    }

    #[test]
    fn test_reproducible() {
        let a = VanGenuchten::new(2.6, 1.42).unwrap();
        let b = VanGenuchten::new(2.6, 1.42).unwrap();
        assert_eq!(a.critical_saturation().to_bits(), b.critical_saturation().to_bits());
    }

    #[test]
    fn test_invalid_shape() {
        assert!(VanGenuchten::new(2.0, 1.0).is_err());
        assert!(VanGenuchten::new(-1.0, 2.0).is_err());
        assert!(BrooksCorey::new(1.0, 0.1).is_err());
    }

    #[test]
    fn test_saturated_limits() {
        let vg = RetentionCurve::from(VanGenuchten::new(2.0, 1.5).unwrap());
        assert_relative_eq!(vg.matric_potential(1.0), 0.0);
        assert_relative_eq!(vg.relative_conductivity(1.0), 1.0);
        assert!(vg.matric_potential(0.5) < 0.0);
    }
}
