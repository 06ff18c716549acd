// crates/sl_land/src/params/soil.rs

//! 土壤参数
//!
//! 水力参数、质地与热参数定义在地下空间上，反照率定义在地表空间上。
//! 比辐射率与粗糙度长度可被覆盖，未覆盖时取注册表默认值。

use sl_config::ParameterRegistry;

use super::retention::{RetentionCurve, VanGenuchten};
use super::source::FieldSource;
use super::{check_coords, read_map};
use crate::data::variables::*;
use crate::data::{DataSource, DatasetKey};
use crate::domain::{ColumnCoord, Space, SpatialField};
use crate::error::{ConfigError, LandResult};

/// 土壤反照率（地表）
#[derive(Debug, Clone, PartialEq)]
pub struct SoilAlbedoParameters {
    /// 干土 PAR 反照率
    pub par_albedo_dry: SpatialField,
    /// 干土 NIR 反照率
    pub nir_albedo_dry: SpatialField,
    /// 湿土 PAR 反照率
    pub par_albedo_wet: SpatialField,
    /// 湿土 NIR 反照率
    pub nir_albedo_wet: SpatialField,
}

impl SoilAlbedoParameters {
    /// 四个反照率场全部取同一常数
    pub fn uniform(surface: Space, par: f64, nir: f64) -> Self {
        Self {
            par_albedo_dry: SpatialField::filled(surface, par),
            nir_albedo_dry: SpatialField::filled(surface, nir),
            par_albedo_wet: SpatialField::filled(surface, par),
            nir_albedo_wet: SpatialField::filled(surface, nir),
        }
    }

    fn ensure_on(&self, surface: &Space) -> Result<(), ConfigError> {
        self.par_albedo_dry.ensure_on(surface, PAR_ALBEDO_DRY)?;
        self.nir_albedo_dry.ensure_on(surface, NIR_ALBEDO_DRY)?;
        self.par_albedo_wet.ensure_on(surface, PAR_ALBEDO_WET)?;
        self.nir_albedo_wet.ensure_on(surface, NIR_ALBEDO_WET)
    }
}

/// 土壤参数
#[derive(Debug, Clone, PartialEq)]
pub struct SoilParameters {
    /// 孔隙度 ν
    pub porosity: SpatialField,
    /// 残余含水量 θ_r
    pub residual_water: SpatialField,
    /// 饱和导水率 K_sat [m/s]
    pub saturated_conductivity: SpatialField,
    /// 储水系数 S_s [1/m]
    pub specific_storage: SpatialField,
    /// 水分特征曲线
    pub retention: SpatialField<RetentionCurve>,
    /// 有机质体积分数
    pub organic_fraction: SpatialField,
    /// 石英体积分数
    pub quartz_fraction: SpatialField,
    /// 砾石体积分数
    pub gravel_fraction: SpatialField,
    /// 干土导热率 [W/m/K]
    pub kappa_dry: f64,
    /// 饱和土导热率 [W/m/K]
    pub kappa_sat: f64,
    /// 反照率
    pub albedo: SoilAlbedoParameters,
    /// 比辐射率
    pub emissivity: f64,
    /// 动量粗糙度长度 [m]
    pub z_0m: f64,
    /// 标量粗糙度长度 [m]
    pub z_0b: f64,
    critical_saturation: SpatialField,
    dry_heat_capacity: SpatialField,
    subsurface: Space,
    surface: Space,
}

impl SoilParameters {
    /// 临界饱和度，由水分特征曲线导出
    pub fn critical_saturation(&self) -> &SpatialField {
        &self.critical_saturation
    }

    /// 干土体积热容 ρc_ds [J/m³/K]，由孔隙度与质地导出
    pub fn dry_heat_capacity(&self) -> &SpatialField {
        &self.dry_heat_capacity
    }

    /// 地下空间
    pub fn subsurface_space(&self) -> Space {
        self.subsurface
    }

    /// 地表空间
    pub fn surface_space(&self) -> Space {
        self.surface
    }
}

/// 土壤参数构建器
#[derive(Debug, Clone, Default)]
pub struct SoilParametersBuilder {
    porosity: Option<FieldSource>,
    residual_water: Option<FieldSource>,
    saturated_conductivity: Option<FieldSource>,
    specific_storage: Option<FieldSource>,
    retention: Option<FieldSource<RetentionCurve>>,
    organic_fraction: Option<FieldSource>,
    quartz_fraction: Option<FieldSource>,
    gravel_fraction: Option<FieldSource>,
    albedo: Option<SoilAlbedoParameters>,
    emissivity: Option<f64>,
    z_0m: Option<f64>,
    z_0b: Option<f64>,
}

impl SoilParametersBuilder {
    /// 创建空构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 孔隙度
    pub fn with_porosity(mut self, value: impl Into<FieldSource>) -> Self {
        self.porosity = Some(value.into());
        self
    }

    /// 残余含水量
    pub fn with_residual_water(mut self, value: impl Into<FieldSource>) -> Self {
        self.residual_water = Some(value.into());
        self
    }

    /// 饱和导水率
    pub fn with_saturated_conductivity(mut self, value: impl Into<FieldSource>) -> Self {
        self.saturated_conductivity = Some(value.into());
        self
    }

    /// 储水系数
    pub fn with_specific_storage(mut self, value: impl Into<FieldSource>) -> Self {
        self.specific_storage = Some(value.into());
        self
    }

    /// 水分特征曲线
    pub fn with_retention(mut self, value: impl Into<FieldSource<RetentionCurve>>) -> Self {
        self.retention = Some(value.into());
        self
    }

    /// 质地（有机质、石英、砾石体积分数），未设置时为 0
    pub fn with_texture(
        mut self,
        organic: impl Into<FieldSource>,
        quartz: impl Into<FieldSource>,
        gravel: impl Into<FieldSource>,
    ) -> Self {
        self.organic_fraction = Some(organic.into());
        self.quartz_fraction = Some(quartz.into());
        self.gravel_fraction = Some(gravel.into());
        self
    }

    /// 反照率
    pub fn with_albedo(mut self, albedo: SoilAlbedoParameters) -> Self {
        self.albedo = Some(albedo);
        self
    }

    /// 覆盖比辐射率
    pub fn with_emissivity(mut self, value: f64) -> Self {
        self.emissivity = Some(value);
        self
    }

    /// 覆盖动量粗糙度长度
    pub fn with_z_0m(mut self, value: f64) -> Self {
        self.z_0m = Some(value);
        self
    }

    /// 覆盖标量粗糙度长度
    pub fn with_z_0b(mut self, value: f64) -> Self {
        self.z_0b = Some(value);
        self
    }

    /// 构建土壤参数
    pub fn build(
        self,
        subsurface: Space,
        surface: Space,
        registry: &ParameterRegistry,
    ) -> Result<SoilParameters, ConfigError> {
        fn required<T: Copy>(
            source: Option<FieldSource<T>>,
            space: Space,
            name: &str,
        ) -> Result<SpatialField<T>, ConfigError> {
            source
                .ok_or_else(|| ConfigError::Missing(name.to_string()))?
                .resolve(space, name)
        }
        let optional = |source: Option<FieldSource>, name: &str| {
            source.unwrap_or(FieldSource::Scalar(0.0)).resolve(subsurface, name)
        };

        let porosity = required(self.porosity, subsurface, POROSITY)?;
        let residual_water = required(self.residual_water, subsurface, RESIDUAL_WATER)?;
        let saturated_conductivity = required(self.saturated_conductivity, subsurface, SATURATED_CONDUCTIVITY)?;
        let specific_storage = required(self.specific_storage, subsurface, SPECIFIC_STORAGE)?;
        let retention = required(self.retention, subsurface, "hydrology_cm")?;
        let organic_fraction = optional(self.organic_fraction, ORGANIC_FRACTION)?;
        let quartz_fraction = optional(self.quartz_fraction, QUARTZ_FRACTION)?;
        let gravel_fraction = optional(self.gravel_fraction, GRAVEL_FRACTION)?;

        let albedo = self
            .albedo
            .ok_or_else(|| ConfigError::Missing("soil albedo".to_string()))?;
        albedo.ensure_on(&surface)?;

        for i in 0..porosity.len() {
            let (nu, theta_r) = (porosity.data()[i], residual_water.data()[i]);
            if !(theta_r >= 0.0 && theta_r < nu && nu <= 1.0) {
                return Err(ConfigError::invalid(
                    POROSITY,
                    nu,
                    format!("需要 0 <= θ_r < ν <= 1 (θ_r = {})", theta_r),
                ));
            }
        }

        let rho_c_om = registry.get("volumetric_heat_capacity_organic")?;
        let rho_c_quartz = registry.get("volumetric_heat_capacity_quartz")?;
        let rho_c_gravel = registry.get("volumetric_heat_capacity_gravel")?;
        let rho_c_mineral = registry.get("volumetric_heat_capacity_mineral")?;
        let dry_heat_capacity = SpatialField::from_fn(subsurface, |c, l| {
            let om = organic_fraction.get(c, l);
            let q = quartz_fraction.get(c, l);
            let g = gravel_fraction.get(c, l);
            let solids = om * rho_c_om + q * rho_c_quartz + g * rho_c_gravel + (1.0 - om - q - g) * rho_c_mineral;
            (1.0 - porosity.get(c, l)) * solids
        });

        let critical_saturation = retention.map(|curve| curve.critical_saturation());

        Ok(SoilParameters {
            porosity,
            residual_water,
            saturated_conductivity,
            specific_storage,
            retention,
            organic_fraction,
            quartz_fraction,
            gravel_fraction,
            kappa_dry: registry.get("thermal_conductivity_dry_soil")?,
            kappa_sat: registry.get("thermal_conductivity_saturated_soil")?,
            albedo,
            emissivity: registry.resolve(self.emissivity, "emissivity_bare_soil")?,
            z_0m: registry.resolve(self.z_0m, "soil_momentum_roughness_length")?,
            z_0b: registry.resolve(self.z_0b, "soil_scalar_roughness_length")?,
            critical_saturation,
            dry_heat_capacity,
            subsurface,
            surface,
        })
    }
}

/// 从土壤属性数据集加载空间变化的土壤参数
///
/// 返回已填好水力与质地参数的构建器；反照率需另行通过
/// [`soil_albedo_parameters`] 加载。
pub fn soil_parameters(
    subsurface: Space,
    coords: &[ColumnCoord],
    source: &dyn DataSource,
) -> LandResult<SoilParametersBuilder> {
    check_coords(subsurface, coords)?;
    let location = source.resolve(&DatasetKey::SoilProperties)?;
    let map = |variable: &str| read_map(source, &location, variable, subsurface, coords);

    let alpha = map(VG_ALPHA)?;
    let shape = map(VG_N)?;
    let mut curves = Vec::with_capacity(alpha.len());
    for (&a, &n) in alpha.data().iter().zip(shape.data()) {
        curves.push(RetentionCurve::from(VanGenuchten::new(a, n)?));
    }
    let retention = SpatialField::from_vec(subsurface, curves)?;

    tracing::debug!("土壤参数图: {} 列 × {} 层", subsurface.n_columns(), subsurface.n_layers());
    Ok(SoilParametersBuilder::new()
        .with_porosity(map(POROSITY)?)
        .with_residual_water(map(RESIDUAL_WATER)?)
        .with_saturated_conductivity(map(SATURATED_CONDUCTIVITY)?)
        .with_specific_storage(map(SPECIFIC_STORAGE)?)
        .with_retention(retention)
        .with_texture(map(ORGANIC_FRACTION)?, map(QUARTZ_FRACTION)?, map(GRAVEL_FRACTION)?))
}

/// 从反照率数据集加载土壤反照率
pub fn soil_albedo_parameters(
    surface: Space,
    coords: &[ColumnCoord],
    source: &dyn DataSource,
) -> LandResult<SoilAlbedoParameters> {
    check_coords(surface, coords)?;
    let location = source.resolve(&DatasetKey::SoilAlbedo)?;
    let map = |variable: &str| read_map(source, &location, variable, surface, coords);
    Ok(SoilAlbedoParameters {
        par_albedo_dry: map(PAR_ALBEDO_DRY)?,
        nir_albedo_dry: map(NIR_ALBEDO_DRY)?,
        par_albedo_wet: map(PAR_ALBEDO_WET)?,
        nir_albedo_wet: map(NIR_ALBEDO_WET)?,
    })
}
