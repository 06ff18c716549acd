// crates/sl_land/src/model/cache.rs

//! 辅助缓存 p
//!
//! 保存当前时刻的驱动场以及由状态导出的诊断量。缓存只在
//! `set_initial_cache` 之后才可读；任何倾向计算前都会检查 `initialized`。

use crate::domain::{Space, SpatialField};
use crate::error::{LandError, LandResult};
use crate::forcing::Drivers;

/// 土壤诊断量（地下）
#[derive(Debug, Clone, PartialEq)]
pub struct SoilCache {
    /// 有效饱和度
    pub effective_saturation: SpatialField,
    /// 基质势 [m]
    pub matric_potential: SpatialField,
    /// 导水率 [m/s]
    pub hydraulic_conductivity: SpatialField,
    /// 体积热容 [J/m³/K]
    pub heat_capacity: SpatialField,
    /// 导热率 [W/m/K]
    pub thermal_conductivity: SpatialField,
    /// 温度 [K]
    pub temperature: SpatialField,
}

/// 地表诊断量
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceCache {
    /// 入渗 [m/s]，向下为正
    pub infiltration: SpatialField,
    /// 地表径流 [m/s]
    pub surface_runoff: SpatialField,
    /// 基流 [m/s]
    pub subsurface_runoff: SpatialField,
    /// 融雪 [m/s]
    pub snowmelt: SpatialField,
    /// 积雪液态水排出 [m/s]
    pub snow_drainage: SpatialField,
    /// 蒸腾 [m/s]
    pub transpiration: SpatialField,
    /// 进入土壤顶层的热通量 [W/m²]，向下为正
    pub ground_heat_flux: SpatialField,
}

/// 缓存
#[derive(Debug, Clone, PartialEq)]
pub struct Cache {
    initialized: bool,
    /// 驱动场
    pub drivers: Drivers,
    /// 土壤诊断量
    pub soil: SoilCache,
    /// 地表诊断量
    pub surface: SurfaceCache,
}

impl Cache {
    /// 分配未初始化的缓存
    pub fn allocate(subsurface: Space, surface: Space) -> Self {
        let sub = || SpatialField::zeros(subsurface);
        let sfc = || SpatialField::zeros(surface);
        Self {
            initialized: false,
            drivers: Drivers::zeros(surface),
            soil: SoilCache {
                effective_saturation: sub(),
                matric_potential: sub(),
                hydraulic_conductivity: sub(),
                heat_capacity: sub(),
                thermal_conductivity: sub(),
                temperature: sub(),
            },
            surface: SurfaceCache {
                infiltration: sfc(),
                surface_runoff: sfc(),
                subsurface_runoff: sfc(),
                snowmelt: sfc(),
                snow_drainage: sfc(),
                transpiration: sfc(),
                ground_heat_flux: sfc(),
            },
        }
    }

    /// 是否已初始化
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    /// 未初始化时返回错误
    pub fn ensure_initialized(&self) -> LandResult<()> {
        if !self.initialized {
            return Err(LandError::solver("缓存在 set_initial_cache 之前被读取"));
        }
        Ok(())
    }
}
