// crates/sl_land/src/params/mod.rs

//! 参数构建器
//!
//! 把标量常数和空间变化的数据图转换为各子模型的不可变参数包：
//!
//! | 参数包 | 空间 | 来源 |
//! |--------|------|------|
//! | [`SoilParameters`] | 地下（反照率在地表） | 土壤属性图、反照率图、注册表 |
//! | [`CanopyParameters`] | 地表 | 冠层属性图、注册表 |
//! | [`SnowParameters`] | 地表 | 注册表 |
//! | [`SoilCO2Parameters`] | 地下 | 注册表、土壤有机碳图 |
//! | [`RunoffParameters`] | 地表 | 土壤属性图 |
//!
//! 所有构建器都只读取传入的 [`ParameterRegistry`](sl_config::ParameterRegistry)。

pub mod canopy;
pub mod retention;
pub mod runoff;
pub mod snow;
pub mod soil;
pub mod soilco2;
pub mod source;

pub use canopy::{
    canopy_maps, AutotrophicRespirationParameters, CanopyEnergyParameters, CanopyMaps, CanopyParameters,
    CanopyParametersBuilder, FarquharParameters, MedlynConductanceParameters, PlantHydraulicsParameters,
    TwoStreamParameters,
};
pub use retention::{BrooksCorey, RetentionCurve, VanGenuchten};
pub use runoff::{topmodel_runoff, RunoffParameters};
pub use snow::{SnowParameters, SnowParametersBuilder};
pub use soil::{soil_albedo_parameters, soil_parameters, SoilAlbedoParameters, SoilParameters, SoilParametersBuilder};
pub use soilco2::{soil_organic_carbon, SoilCO2Parameters};
pub use source::FieldSource;

use crate::data::{DataSource, DatasetLocation};
use crate::domain::{ColumnCoord, Space, SpatialField};
use crate::error::{ConfigError, DataAccessError, LandResult};

/// 列坐标必须与空间的列数一致
pub(crate) fn check_coords(space: Space, coords: &[ColumnCoord]) -> Result<(), ConfigError> {
    if coords.len() != space.n_columns() {
        return Err(ConfigError::invalid(
            format!("coords@{}", space),
            coords.len(),
            format!("坐标数必须等于列数 {}", space.n_columns()),
        ));
    }
    Ok(())
}

/// 读取二维静态图并按列广播到空间的所有层
pub(crate) fn read_map(
    source: &dyn DataSource,
    location: &DatasetLocation,
    variable: &str,
    space: Space,
    coords: &[ColumnCoord],
) -> LandResult<SpatialField> {
    let values = source.read_static(location, variable, coords)?;
    if values.len() != coords.len() {
        return Err(DataAccessError::Malformed {
            path: location.path.clone(),
            message: format!("{} 返回 {} 个值, 需要 {}", variable, values.len(), coords.len()),
        }
        .into());
    }
    Ok(SpatialField::from_fn(space, |column, _| values[column]))
}
