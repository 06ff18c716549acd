// crates/sl_land/src/data/mod.rs

//! 外部数据访问契约
//!
//! 所有外部数据集（再分析驱动、卫星 LAI、土壤/反照率/冠层属性图）都通过
//! "先解析路径，再读取变量"的两步契约访问：
//!
//! 1. [`DataSource::resolve`] 把 [`DatasetKey`] 解析为 [`DatasetLocation`]
//! 2. `read_static` / `time_axis` / `read_snapshot` 读取已重映射到列坐标上的数据
//!
//! 空间重映射由数据源负责，时间插值由 [`crate::forcing`] 负责。
//! 数据源返回的错误原样向上传播，不做重试。

pub mod json;
pub mod synthetic;

use std::path::PathBuf;

use crate::domain::ColumnCoord;
use crate::error::DataAccessError;

pub use json::JsonDataSource;
pub use synthetic::SyntheticDataSource;

/// 数据集标识
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DatasetKey {
    /// 再分析大气驱动，按年份和分辨率档位区分
    Era5Forcing {
        /// 年份
        year: i32,
        /// 分辨率档位，例如 "1.0x1.0"
        tier: String,
    },
    /// 卫星叶面积指数
    ModisLai {
        /// 年份
        year: i32,
    },
    /// 土壤质地与水力参数图
    SoilProperties,
    /// 土壤反照率图
    SoilAlbedo,
    /// 冠层属性图
    CanopyProperties,
    /// 土壤有机碳图
    SoilOrganicCarbon,
}

impl DatasetKey {
    /// 数据集文件名（不含扩展名）
    pub fn file_stem(&self) -> String {
        match self {
            Self::Era5Forcing { year, tier } => format!("era5_{}_{}", year, tier),
            Self::ModisLai { year } => format!("modis_lai_{}", year),
            Self::SoilProperties => "soil_properties".to_string(),
            Self::SoilAlbedo => "soil_albedo".to_string(),
            Self::CanopyProperties => "canopy_properties".to_string(),
            Self::SoilOrganicCarbon => "soil_organic_carbon".to_string(),
        }
    }

    /// 数据集的年份（静态图为 None）
    pub fn year(&self) -> Option<i32> {
        match self {
            Self::Era5Forcing { year, .. } | Self::ModisLai { year } => Some(*year),
            _ => None,
        }
    }
}

impl std::fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

/// 已解析的数据集位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLocation {
    /// 数据集标识
    pub key: DatasetKey,
    /// 解析得到的路径
    pub path: PathBuf,
}

/// 数据源契约
pub trait DataSource: Send + Sync + std::fmt::Debug {
    /// 数据源名称
    fn name(&self) -> &'static str;

    /// 解析数据集路径
    fn resolve(&self, key: &DatasetKey) -> Result<DatasetLocation, DataAccessError>;

    /// 读取静态二维变量，返回每列一个值
    fn read_static(
        &self,
        location: &DatasetLocation,
        variable: &str,
        coords: &[ColumnCoord],
    ) -> Result<Vec<f64>, DataAccessError>;

    /// 时变变量的原生时间轴 [s]，相对数据集年份 1 月 1 日 00:00，严格递增
    fn time_axis(&self, location: &DatasetLocation, variable: &str) -> Result<Vec<f64>, DataAccessError>;

    /// 读取时变变量第 `index` 个时刻的快照，返回每列一个值
    fn read_snapshot(
        &self,
        location: &DatasetLocation,
        variable: &str,
        index: usize,
        coords: &[ColumnCoord],
    ) -> Result<Vec<f64>, DataAccessError>;
}

/// 变量名
pub mod variables {
    /// 2 m 气温 [K]
    pub const AIR_TEMPERATURE: &str = "t2m";
    /// 比湿 [kg/kg]
    pub const SPECIFIC_HUMIDITY: &str = "q";
    /// 地面气压 [Pa]
    pub const SURFACE_PRESSURE: &str = "sp";
    /// 风速 [m/s]
    pub const WIND_SPEED: &str = "wind_speed";
    /// 降水总量 [m/s]
    pub const PRECIPITATION: &str = "tp";
    /// 向下短波辐射 [W/m²]
    pub const SHORTWAVE_DOWN: &str = "ssrd";
    /// 向下长波辐射 [W/m²]
    pub const LONGWAVE_DOWN: &str = "strd";
    /// 叶面积指数 [m²/m²]
    pub const LAI: &str = "lai";

    /// 孔隙度
    pub const POROSITY: &str = "porosity";
    /// 残余含水量
    pub const RESIDUAL_WATER: &str = "theta_r";
    /// 饱和导水率 [m/s]
    pub const SATURATED_CONDUCTIVITY: &str = "K_sat";
    /// 储水系数 [1/m]
    pub const SPECIFIC_STORAGE: &str = "S_s";
    /// van Genuchten α [1/m]
    pub const VG_ALPHA: &str = "vg_alpha";
    /// van Genuchten n
    pub const VG_N: &str = "vg_n";
    /// 有机质体积分数
    pub const ORGANIC_FRACTION: &str = "nu_ss_om";
    /// 石英体积分数
    pub const QUARTZ_FRACTION: &str = "nu_ss_quartz";
    /// 砾石体积分数
    pub const GRAVEL_FRACTION: &str = "nu_ss_gravel";
    /// TOPMODEL 最大饱和面积分数
    pub const F_MAX: &str = "f_max";

    /// 干土 PAR 反照率
    pub const PAR_ALBEDO_DRY: &str = "PAR_albedo_dry";
    /// 干土 NIR 反照率
    pub const NIR_ALBEDO_DRY: &str = "NIR_albedo_dry";
    /// 湿土 PAR 反照率
    pub const PAR_ALBEDO_WET: &str = "PAR_albedo_wet";
    /// 湿土 NIR 反照率
    pub const NIR_ALBEDO_WET: &str = "NIR_albedo_wet";

    /// Medlyn 气孔导度斜率 g1
    pub const G1: &str = "g1";
    /// 25°C 最大羧化速率 [mol/m²/s]
    pub const VCMAX25: &str = "Vcmax25";
    /// C3 植物标记（0 或 1）
    pub const IS_C3: &str = "is_c3";
    /// 根系深度 [m]
    pub const ROOTING_DEPTH: &str = "rooting_depth";
    /// 叶片 PAR 反射率
    pub const ALPHA_PAR_LEAF: &str = "alpha_PAR_leaf";
    /// 叶片 NIR 反射率
    pub const ALPHA_NIR_LEAF: &str = "alpha_NIR_leaf";
    /// 叶片 PAR 透射率
    pub const TAU_PAR_LEAF: &str = "tau_PAR_leaf";
    /// 叶片 NIR 透射率
    pub const TAU_NIR_LEAF: &str = "tau_NIR_leaf";
    /// 叶倾角分布参数
    pub const CHI_L: &str = "chi_l";

    /// 土壤有机碳 [kg C/m³]
    pub const SOIL_ORGANIC_CARBON: &str = "soc";
}
