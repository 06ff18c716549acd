// crates/sl_land/src/params/runoff.rs

//! TOPMODEL 产流参数

use super::{check_coords, read_map};
use crate::data::variables::F_MAX;
use crate::data::{DataSource, DatasetKey};
use crate::domain::{ColumnCoord, Space, SpatialField};
use crate::error::{ConfigError, LandResult};

/// 产流参数
#[derive(Debug, Clone, PartialEq)]
pub struct RunoffParameters {
    /// 地形衰减因子 [1/m]
    pub f_over: f64,
    /// 最大基流 [m/s]
    pub r_sb: f64,
    /// 最大饱和面积分数（地表）
    pub f_max: SpatialField,
}

impl RunoffParameters {
    /// 创建产流参数，`f_max` 必须在地表空间上
    pub fn new(surface: Space, f_over: f64, r_sb: f64, f_max: SpatialField) -> Result<Self, ConfigError> {
        f_max.ensure_on(&surface, F_MAX)?;
        if let Some(bad) = f_max.data().iter().find(|f| !(0.0..=1.0).contains(*f)) {
            return Err(ConfigError::invalid(F_MAX, bad, "必须位于 [0, 1]"));
        }
        Ok(Self { f_over, r_sb, f_max })
    }

    /// 地表空间
    pub fn surface_space(&self) -> Space {
        *self.f_max.space()
    }
}

/// 从土壤属性数据集加载 TOPMODEL 产流参数
pub fn topmodel_runoff(surface: Space, coords: &[ColumnCoord], source: &dyn DataSource) -> LandResult<RunoffParameters> {
    check_coords(surface, coords)?;
    let location = source.resolve(&DatasetKey::SoilProperties)?;
    let f_max = read_map(source, &location, F_MAX, surface, coords)?;
    Ok(RunoffParameters::new(surface, 3.28, 1.484e-4 / 1000.0, f_max)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticDataSource;
    use crate::domain::{Domain, Partition};
    use sl_config::DomainConfig;

    #[test]
    fn test_topmodel_constants() {
        let domain = Domain::spherical_shell(&DomainConfig::tiny()).unwrap();
        let surface = domain.surface_space();
        let runoff = topmodel_runoff(surface, domain.coords(), &SyntheticDataSource::new()).unwrap();
        assert_eq!(runoff.f_over, 3.28);
        assert_eq!(runoff.r_sb, 1.484e-4 / 1000.0);
        assert_eq!(runoff.surface_space(), surface);
    }

    #[test]
    fn test_f_max_out_of_range() {
        let surface = Space::new(4, Partition::Surface, 3, 1);
        let f_max = SpatialField::filled(surface, 1.5);
        assert!(RunoffParameters::new(surface, 3.28, 1e-7, f_max).is_err());
    }

    #[test]
    fn test_f_max_on_subsurface_rejected() {
        let surface = Space::new(4, Partition::Surface, 3, 1);
        let subsurface = Space::new(4, Partition::Subsurface, 3, 2);
        let f_max = SpatialField::filled(subsurface, 0.5);
        let err = RunoffParameters::new(surface, 3.28, 1e-7, f_max).unwrap_err();
        assert!(matches!(err, ConfigError::PartitionMismatch { .. }));
    }
}
