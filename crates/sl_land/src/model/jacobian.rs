// crates/sl_land/src/model/jacobian.rs

//! 隐式部分的 Jacobian 与线性求解
//!
//! 隐式倾向只在单列内耦合，因此 `W = I - Δtγ·J` 由以下块组成：
//! - `soil.ϑ_l`、`soil.ρe_int`：每列一个三对角块
//! - `canopy.energy.T`：对角
//! - 其他分量：单位阵
//!
//! 三对角块在 [`Jacobian::update`] 中做 Thomas 分解，求解时各列并行。

use rayon::prelude::*;

use super::cache::Cache;
use super::land::LandModel;
use super::physics::{canopy_energy_derivative, matric_potential_derivative};
use super::state::StateVector;
use crate::domain::SpatialField;
use crate::error::{LandError, LandResult};

/// 每列一个三对角块
#[derive(Debug, Clone, PartialEq)]
pub struct TridiagonalBlocks {
    n_layers: usize,
    lower: Vec<f64>,
    diag: Vec<f64>,
    upper: Vec<f64>,
    // Thomas 分解结果
    c_prime: Vec<f64>,
    inv_denom: Vec<f64>,
}

impl TridiagonalBlocks {
    /// 分配 `n_columns` 个 `n_layers × n_layers` 的块
    pub fn new(n_columns: usize, n_layers: usize) -> Self {
        let len = n_columns * n_layers;
        Self {
            n_layers,
            lower: vec![0.0; len],
            diag: vec![1.0; len],
            upper: vec![0.0; len],
            c_prime: vec![0.0; len],
            inv_denom: vec![1.0; len],
        }
    }

    /// 块大小
    pub fn n_layers(&self) -> usize {
        self.n_layers
    }

    /// 第 `i` 个点所在行的 (下, 主, 上) 对角元
    pub fn row(&self, i: usize) -> (f64, f64, f64) {
        (self.lower[i], self.diag[i], self.upper[i])
    }

    /// 各列独立做 Thomas 分解
    fn factorize(&mut self) -> LandResult<()> {
        let n = self.n_layers;
        let (lower, diag, upper) = (&self.lower, &self.diag, &self.upper);
        self.c_prime
            .par_chunks_mut(n)
            .zip(self.inv_denom.par_chunks_mut(n))
            .enumerate()
            .try_for_each(|(col, (cp, inv))| {
                let base = col * n;
                let mut prev_c = 0.0;
                for k in 0..n {
                    let i = base + k;
                    let a = if k == 0 { 0.0 } else { lower[i] };
                    let denom = diag[i] - a * prev_c;
                    if denom.abs() < f64::MIN_POSITIVE || !denom.is_finite() {
                        return Err(LandError::solver(format!("W 奇异: 第 {} 列第 {} 层", col, k)));
                    }
                    inv[k] = 1.0 / denom;
                    cp[k] = if k + 1 < n { upper[i] * inv[k] } else { 0.0 };
                    prev_c = cp[k];
                }
                Ok(())
            })
    }

    /// 求解 `W x = rhs`
    fn solve(&self, x: &mut SpatialField, rhs: &SpatialField) {
        let n = self.n_layers;
        x.data_mut()
            .par_chunks_mut(n)
            .zip(rhs.data().par_chunks(n))
            .enumerate()
            .for_each(|(col, (xc, rc))| {
                let base = col * n;
                // 前向消元
                for k in 0..n {
                    let i = base + k;
                    let prev = if k == 0 { 0.0 } else { self.lower[i] * xc[k - 1] };
                    xc[k] = (rc[k] - prev) * self.inv_denom[i];
                }
                // 回代
                for k in (0..n.saturating_sub(1)).rev() {
                    xc[k] -= self.c_prime[base + k] * xc[k + 1];
                }
            });
    }
}

/// `W = I - Δtγ·J`
#[derive(Debug, Clone, PartialEq)]
pub struct Jacobian {
    /// 土壤水块
    pub water: TridiagonalBlocks,
    /// 土壤能量块
    pub energy: TridiagonalBlocks,
    /// 冠层温度对角元
    pub canopy_energy: Vec<f64>,
    dtgamma: f64,
    factorized: bool,
}

impl Jacobian {
    /// 按模型形状分配原型（W = I）
    pub fn prototype(model: &LandModel) -> Self {
        let domain = model.domain();
        let (n_columns, n_layers) = (domain.n_columns(), domain.n_layers());
        Self {
            water: TridiagonalBlocks::new(n_columns, n_layers),
            energy: TridiagonalBlocks::new(n_columns, n_layers),
            canopy_energy: vec![1.0; n_columns],
            dtgamma: 0.0,
            factorized: false,
        }
    }

    /// 最近一次组装使用的 Δtγ
    pub fn dtgamma(&self) -> f64 {
        self.dtgamma
    }

    /// 是否已分解
    pub fn is_factorized(&self) -> bool {
        self.factorized
    }

    /// 在状态 `y` 处重新组装并分解 W；缓存中的土壤诊断量必须与 `y` 一致
    pub fn update(&mut self, model: &LandModel, y: &StateVector, p: &Cache, dtgamma: f64) -> LandResult<()> {
        let _span = tracing::debug_span!("jacobian").entered();
        let domain = model.domain();
        let n = domain.n_layers();
        let dz = domain.layer_thickness();
        let dzc = domain.center_spacing();
        let k = p.soil.hydraulic_conductivity.data();
        let sat = p.soil.effective_saturation.data();
        let kappa = p.soil.thermal_conductivity.data();
        let rho_c = p.soil.heat_capacity.data();

        for col in 0..domain.n_columns() {
            let base = col * n;
            for l in 0..n {
                let i = base + l;
                let dpsi = |j: usize| matric_potential_derivative(model, j, sat[j]);

                let (mut wl, mut wd, mut wu) = (0.0, 0.0, 0.0);
                let (mut el, mut ed, mut eu) = (0.0, 0.0, 0.0);
                if l > 0 {
                    let kf = 0.5 * (k[i - 1] + k[i]) / (dzc[l - 1] * dz[l]);
                    let hf = 0.5 * (kappa[i - 1] + kappa[i]) / (dzc[l - 1] * dz[l]);
                    wl = kf * dpsi(i - 1);
                    wd -= kf * dpsi(i);
                    el = hf / rho_c[i - 1];
                    ed -= hf / rho_c[i];
                }
                if l + 1 < n {
                    let kf = 0.5 * (k[i] + k[i + 1]) / (dzc[l] * dz[l]);
                    let hf = 0.5 * (kappa[i] + kappa[i + 1]) / (dzc[l] * dz[l]);
                    wu = kf * dpsi(i + 1);
                    wd -= kf * dpsi(i);
                    eu = hf / rho_c[i + 1];
                    ed -= hf / rho_c[i];
                }

                self.water.lower[i] = -dtgamma * wl;
                self.water.diag[i] = 1.0 - dtgamma * wd;
                self.water.upper[i] = -dtgamma * wu;
                self.energy.lower[i] = -dtgamma * el;
                self.energy.diag[i] = 1.0 - dtgamma * ed;
                self.energy.upper[i] = -dtgamma * eu;
            }
        }

        let t_c = y.canopy.energy_t.data();
        for (col, w) in self.canopy_energy.iter_mut().enumerate() {
            *w = 1.0 - dtgamma * canopy_energy_derivative(model, p, col, t_c[col]);
        }

        self.water.factorize()?;
        self.energy.factorize()?;
        self.dtgamma = dtgamma;
        self.factorized = true;
        Ok(())
    }

    /// 求解 `W x = rhs`
    pub fn solve(&self, x: &mut StateVector, rhs: &StateVector) -> LandResult<()> {
        if !self.factorized {
            return Err(LandError::solver("Jacobian 尚未分解"));
        }
        let _span = tracing::debug_span!("linsolve").entered();
        x.copy_from(rhs);
        self.water.solve(&mut x.soil.theta_l, &rhs.soil.theta_l);
        self.energy.solve(&mut x.soil.rho_e_int, &rhs.soil.rho_e_int);
        for ((xi, &ri), &w) in x
            .canopy
            .energy_t
            .data_mut()
            .iter_mut()
            .zip(rhs.canopy.energy_t.data())
            .zip(&self.canopy_energy)
        {
            *xi = ri / w;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Partition, Space};

    #[test]
    fn test_thomas_solves_tridiagonal() {
        // 两列，每列 3 层：[2 -1 0; -1 2 -1; 0 -1 2]
        let mut blocks = TridiagonalBlocks::new(2, 3);
        for i in 0..6 {
            blocks.diag[i] = 2.0;
            blocks.lower[i] = -1.0;
            blocks.upper[i] = -1.0;
        }
        blocks.factorize().unwrap();

        let space = Space::new(1, Partition::Subsurface, 2, 3);
        let x_true = SpatialField::from_vec(space, vec![1.0, 2.0, 3.0, -1.0, 0.5, 4.0]).unwrap();
        let rhs = SpatialField::from_fn(space, |c, l| {
            let x = x_true.column(c);
            let below = if l > 0 { x[l - 1] } else { 0.0 };
            let above = if l < 2 { x[l + 1] } else { 0.0 };
            2.0 * x[l] - below - above
        });
        let mut x = SpatialField::zeros(space);
        blocks.solve(&mut x, &rhs);
        for (a, b) in x.data().iter().zip(x_true.data()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_singular_block_is_error() {
        let mut blocks = TridiagonalBlocks::new(1, 2);
        blocks.diag[0] = 0.0;
        assert!(blocks.factorize().is_err());
    }
}
