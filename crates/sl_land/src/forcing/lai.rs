// crates/sl_land/src/forcing/lai.rs

//! 卫星叶面积指数

use chrono::NaiveDateTime;
use std::sync::Arc;

use super::prescribed::PrescribedField;
use super::timeseries::TimeInterpolation;
use crate::data::variables::LAI;
use crate::data::{DataSource, DatasetKey};
use crate::domain::Domain;
use crate::error::LandResult;

/// 从卫星 LAI 数据集构建预设叶面积指数
pub fn prescribed_lai_modis(
    source: &Arc<dyn DataSource>,
    domain: &Arc<Domain>,
    year: i32,
    start_date: NaiveDateTime,
    interpolation: TimeInterpolation,
) -> LandResult<PrescribedField> {
    let key = DatasetKey::ModisLai { year };
    let location = source.resolve(&key)?;
    let field = PrescribedField::new(
        Arc::clone(source),
        location,
        LAI,
        Arc::clone(domain),
        start_date,
        interpolation,
    )?;
    tracing::info!("叶面积指数: {} ({})", key, source.name());
    Ok(field)
}
