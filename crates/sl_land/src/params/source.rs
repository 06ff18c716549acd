// crates/sl_land/src/params/source.rs

//! 参数来源：标量常数或空间场

use crate::domain::{Space, SpatialField};
use crate::error::ConfigError;

/// 参数来源
///
/// 标量会被广播到目标空间；空间场必须已经定义在目标空间上。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource<T = f64> {
    /// 常数
    Scalar(T),
    /// 空间场
    Field(SpatialField<T>),
}

impl<T: Copy> FieldSource<T> {
    /// 解析到目标空间
    pub fn resolve(self, target: Space, name: &str) -> Result<SpatialField<T>, ConfigError> {
        match self {
            Self::Scalar(value) => Ok(SpatialField::filled(target, value)),
            Self::Field(field) => {
                field.ensure_on(&target, name)?;
                Ok(field)
            }
        }
    }
}

impl From<f64> for FieldSource<f64> {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl<T> From<SpatialField<T>> for FieldSource<T> {
    fn from(field: SpatialField<T>) -> Self {
        Self::Field(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Partition;

    #[test]
    fn test_scalar_broadcast() {
        let space = Space::new(1, Partition::Subsurface, 4, 2);
        let f = FieldSource::from(0.4).resolve(space, "porosity").unwrap();
        assert_eq!(f.len(), 8);
        assert!(f.data().iter().all(|&v| v == 0.4));
        assert_eq!(*f.space(), space);
    }

    #[test]
    fn test_field_on_wrong_partition() {
        let surface = Space::new(1, Partition::Surface, 4, 2);
        let subsurface = Space::new(1, Partition::Subsurface, 4, 2);
        let source = FieldSource::from(SpatialField::zeros(surface));
        assert!(matches!(
            source.resolve(subsurface, "K_sat"),
            Err(ConfigError::PartitionMismatch { .. })
        ));
    }
}
