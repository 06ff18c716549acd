// crates/sl_land/src/params/canopy.rs

//! 冠层参数
//!
//! 冠层由以下组件构成，全部定义在地表空间上：
//! - 自养呼吸（注册表默认值）
//! - 双流辐射传输（聚集指数 Ω、叶倾角、叶片反射/透射率）
//! - Medlyn 气孔导度（g1 图，g0 默认值）
//! - Farquhar 光合作用（Vcmax25、C3 标记图）
//! - 植物水力（单隔室：0 个茎隔室 + 1 个叶隔室）
//! - 冠层能量（面积热容）
//!
//! 冠层粗糙度长度由冠层高度导出：`z_0m = 0.13·h`，`z_0b = 0.1·z_0m`。

use sl_config::ParameterRegistry;

use super::{check_coords, read_map};
use crate::data::variables::*;
use crate::data::{DataSource, DatasetKey};
use crate::domain::{ColumnCoord, Space, SpatialField};
use crate::error::{ConfigError, LandResult};

/// 自养呼吸参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutotrophicRespirationParameters {
    /// Vcmax 氮因子
    pub ne: f64,
    /// 叶片氮分数
    pub sigma_l: f64,
    /// 茎氮比
    pub eta_sl: f64,
    /// 根氮比
    pub eta_rl: f64,
    /// 维持呼吸系数
    pub mu: f64,
    /// 生长呼吸分数
    pub rg: f64,
}

impl AutotrophicRespirationParameters {
    /// 从注册表读取
    pub fn from_registry(registry: &ParameterRegistry) -> Result<Self, ConfigError> {
        Ok(Self {
            ne: registry.get("N_factor_Vcmax")?,
            sigma_l: registry.get("leaf_nitrogen_fraction")?,
            eta_sl: registry.get("stem_nitrogen_ratio")?,
            eta_rl: registry.get("root_nitrogen_ratio")?,
            mu: registry.get("maintenance_respiration_factor")?,
            rg: registry.get("growth_respiration_fraction")?,
        })
    }
}

/// 双流辐射传输参数
#[derive(Debug, Clone, PartialEq)]
pub struct TwoStreamParameters {
    /// 聚集指数 Ω
    pub omega: f64,
    /// 叶倾角分布 χ_l
    pub chi_l: SpatialField,
    /// 叶片 PAR 反射率
    pub alpha_par_leaf: SpatialField,
    /// 叶片 NIR 反射率
    pub alpha_nir_leaf: SpatialField,
    /// 叶片 PAR 透射率
    pub tau_par_leaf: SpatialField,
    /// 叶片 NIR 透射率
    pub tau_nir_leaf: SpatialField,
}

/// Medlyn 气孔导度参数
#[derive(Debug, Clone, PartialEq)]
pub struct MedlynConductanceParameters {
    /// 斜率 g1 [Pa^0.5]
    pub g1: SpatialField,
    /// 最小导度 g0 [mol/m²/s]
    pub g0: f64,
}

/// Farquhar 光合作用参数
#[derive(Debug, Clone, PartialEq)]
pub struct FarquharParameters {
    /// 25°C 最大羧化速率 [mol/m²/s]
    pub vcmax25: SpatialField,
    /// C3 标记（1 为 C3，0 为 C4）
    pub is_c3: SpatialField,
}

/// 植物水力参数
#[derive(Debug, Clone, PartialEq)]
pub struct PlantHydraulicsParameters {
    /// 植物饱和导水率 [m/s]
    pub k_sat_plant: f64,
    /// Weibull 导水率曲线 ψ63 [m]
    pub psi63: f64,
    /// Weibull 形状参数
    pub weibull_c: f64,
    /// 线性持水曲线斜率 [1/m]
    pub retention_a: f64,
    /// 植物组织饱和体积含水量
    pub nu: f64,
    /// 植物储水系数 [1/m]
    pub s_s: f64,
    /// 根面积指数
    pub rai: f64,
    /// 茎面积指数
    pub sai: f64,
    /// 根冠比
    pub f_root_to_shoot: f64,
    /// 根系深度 [m]
    pub rooting_depth: SpatialField,
    /// 茎隔室数
    pub n_stem: usize,
    /// 叶隔室数
    pub n_leaf: usize,
    /// 茎隔室高度 [m]
    pub h_stem: f64,
    /// 叶隔室高度 [m]
    pub h_leaf: f64,
}

impl PlantHydraulicsParameters {
    /// 单叶隔室配置
    pub fn single_compartment(rooting_depth: SpatialField) -> Self {
        Self {
            // 标定值偏小，按字面值保留
            k_sat_plant: 7e-8,
            psi63: -4.0 / 0.0098,
            weibull_c: 4.0,
            retention_a: 0.2 * 0.0098,
            nu: 1.44e-4,
            s_s: 1e-2 * 0.0098,
            rai: 1.0,
            sai: 0.0,
            f_root_to_shoot: 3.5,
            rooting_depth,
            n_stem: 0,
            n_leaf: 1,
            h_stem: 0.0,
            h_leaf: 1.0,
        }
    }

    /// 隔室总数
    pub fn n_compartments(&self) -> usize {
        self.n_stem + self.n_leaf
    }

    /// 冠层高度 [m]
    pub fn canopy_height(&self) -> f64 {
        self.n_stem as f64 * self.h_stem + self.n_leaf as f64 * self.h_leaf
    }
}

/// 冠层能量参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanopyEnergyParameters {
    /// 冠层面积热容 [J/m²/K]
    pub ac_canopy: f64,
}

/// 冠层参数
#[derive(Debug, Clone, PartialEq)]
pub struct CanopyParameters {
    /// 自养呼吸
    pub autotrophic_respiration: AutotrophicRespirationParameters,
    /// 辐射传输
    pub radiative_transfer: TwoStreamParameters,
    /// 气孔导度
    pub conductance: MedlynConductanceParameters,
    /// 光合作用
    pub photosynthesis: FarquharParameters,
    /// 植物水力
    pub hydraulics: PlantHydraulicsParameters,
    /// 能量
    pub energy: CanopyEnergyParameters,
    /// 比辐射率
    pub emissivity: f64,
    z_0m: f64,
    z_0b: f64,
    surface: Space,
}

impl CanopyParameters {
    /// 动量粗糙度长度 [m]，0.13 倍冠层高度
    pub fn z_0m(&self) -> f64 {
        self.z_0m
    }

    /// 标量粗糙度长度 [m]，0.1 倍动量粗糙度
    pub fn z_0b(&self) -> f64 {
        self.z_0b
    }

    /// 地表空间
    pub fn surface_space(&self) -> Space {
        self.surface
    }
}

/// 冠层属性图（地表）
#[derive(Debug, Clone, PartialEq)]
pub struct CanopyMaps {
    /// g1
    pub g1: SpatialField,
    /// Vcmax25
    pub vcmax25: SpatialField,
    /// C3 标记
    pub is_c3: SpatialField,
    /// 根系深度
    pub rooting_depth: SpatialField,
    /// 叶倾角分布
    pub chi_l: SpatialField,
    /// 叶片 PAR 反射率
    pub alpha_par_leaf: SpatialField,
    /// 叶片 NIR 反射率
    pub alpha_nir_leaf: SpatialField,
    /// 叶片 PAR 透射率
    pub tau_par_leaf: SpatialField,
    /// 叶片 NIR 透射率
    pub tau_nir_leaf: SpatialField,
}

impl CanopyMaps {
    fn ensure_on(&self, surface: &Space) -> Result<(), ConfigError> {
        let fields = [
            (&self.g1, G1),
            (&self.vcmax25, VCMAX25),
            (&self.is_c3, IS_C3),
            (&self.rooting_depth, ROOTING_DEPTH),
            (&self.chi_l, CHI_L),
            (&self.alpha_par_leaf, ALPHA_PAR_LEAF),
            (&self.alpha_nir_leaf, ALPHA_NIR_LEAF),
            (&self.tau_par_leaf, TAU_PAR_LEAF),
            (&self.tau_nir_leaf, TAU_NIR_LEAF),
        ];
        for (field, name) in fields {
            field.ensure_on(surface, name)?;
        }
        Ok(())
    }
}

/// 冠层参数构建器
#[derive(Debug, Clone)]
pub struct CanopyParametersBuilder {
    maps: CanopyMaps,
    omega: Option<f64>,
    g0: Option<f64>,
    emissivity: Option<f64>,
    ac_canopy: Option<f64>,
    hydraulics: Option<PlantHydraulicsParameters>,
}

impl CanopyParametersBuilder {
    /// 以属性图创建构建器
    pub fn new(maps: CanopyMaps) -> Self {
        Self {
            maps,
            omega: None,
            g0: None,
            emissivity: None,
            ac_canopy: None,
            hydraulics: None,
        }
    }

    /// 覆盖聚集指数
    pub fn with_omega(mut self, value: f64) -> Self {
        self.omega = Some(value);
        self
    }

    /// 覆盖最小气孔导度
    pub fn with_g0(mut self, value: f64) -> Self {
        self.g0 = Some(value);
        self
    }

    /// 覆盖比辐射率
    pub fn with_emissivity(mut self, value: f64) -> Self {
        self.emissivity = Some(value);
        self
    }

    /// 覆盖冠层面积热容
    pub fn with_ac_canopy(mut self, value: f64) -> Self {
        self.ac_canopy = Some(value);
        self
    }

    /// 替换植物水力参数（默认为单叶隔室配置）
    pub fn with_hydraulics(mut self, hydraulics: PlantHydraulicsParameters) -> Self {
        self.hydraulics = Some(hydraulics);
        self
    }

    /// 构建冠层参数
    pub fn build(self, surface: Space, registry: &ParameterRegistry) -> Result<CanopyParameters, ConfigError> {
        self.maps.ensure_on(&surface)?;
        let maps = self.maps;

        let hydraulics = match self.hydraulics {
            Some(h) => h,
            None => PlantHydraulicsParameters::single_compartment(maps.rooting_depth.clone()),
        };
        hydraulics.rooting_depth.ensure_on(&surface, ROOTING_DEPTH)?;
        if hydraulics.n_leaf == 0 {
            return Err(ConfigError::invalid("n_leaf", 0, "至少需要一个叶隔室"));
        }

        let z_0m = 0.13 * hydraulics.canopy_height();
        let z_0b = 0.1 * z_0m;

        Ok(CanopyParameters {
            autotrophic_respiration: AutotrophicRespirationParameters::from_registry(registry)?,
            radiative_transfer: TwoStreamParameters {
                omega: registry.resolve(self.omega, "clumping_index")?,
                chi_l: maps.chi_l,
                alpha_par_leaf: maps.alpha_par_leaf,
                alpha_nir_leaf: maps.alpha_nir_leaf,
                tau_par_leaf: maps.tau_par_leaf,
                tau_nir_leaf: maps.tau_nir_leaf,
            },
            conductance: MedlynConductanceParameters {
                g1: maps.g1,
                g0: registry.resolve(self.g0, "stomatal_conductance_g0")?,
            },
            photosynthesis: FarquharParameters {
                vcmax25: maps.vcmax25,
                is_c3: maps.is_c3,
            },
            hydraulics,
            energy: CanopyEnergyParameters {
                ac_canopy: registry.resolve(self.ac_canopy, "canopy_heat_capacity")?,
            },
            emissivity: registry.resolve(self.emissivity, "canopy_emissivity")?,
            z_0m,
            z_0b,
            surface,
        })
    }
}

/// 从冠层属性数据集加载属性图
pub fn canopy_maps(surface: Space, coords: &[ColumnCoord], source: &dyn DataSource) -> LandResult<CanopyMaps> {
    check_coords(surface, coords)?;
    let location = source.resolve(&DatasetKey::CanopyProperties)?;
    let map = |variable: &str| read_map(source, &location, variable, surface, coords);
    Ok(CanopyMaps {
        g1: map(G1)?,
        vcmax25: map(VCMAX25)?,
        is_c3: map(IS_C3)?,
        rooting_depth: map(ROOTING_DEPTH)?,
        chi_l: map(CHI_L)?,
        alpha_par_leaf: map(ALPHA_PAR_LEAF)?,
        alpha_nir_leaf: map(ALPHA_NIR_LEAF)?,
        tau_par_leaf: map(TAU_PAR_LEAF)?,
        tau_nir_leaf: map(TAU_NIR_LEAF)?,
    })
}
