// crates/sl_land/src/data/json.rs

//! JSON 文件数据源
//!
//! 每个数据集对应 `{root}/{file_stem}.json`，内容为站点式的非结构化数据：
//!
//! ```json
//! {
//!   "lat": [0.0, 45.0],
//!   "lon": [0.0, 90.0],
//!   "times": [0.0, 10800.0],
//!   "static": { "porosity": [0.45, 0.5] },
//!   "series": { "t2m": [[280.0, 275.0], [281.0, 276.0]] }
//! }
//! ```
//!
//! 列上的值取大圆距离最近的站点（最近邻重映射）。
//! 解析后的数据集按路径缓存，整个进程内只读取一次。

use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{DataSource, DatasetKey, DatasetLocation};
use crate::domain::ColumnCoord;
use crate::error::DataAccessError;

#[derive(Debug, Deserialize)]
struct JsonDataset {
    lat: Vec<f64>,
    lon: Vec<f64>,
    #[serde(default)]
    times: Vec<f64>,
    #[serde(default, rename = "static")]
    static_vars: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    series: BTreeMap<String, Vec<Vec<f64>>>,
}

impl JsonDataset {
    fn validate(&self, path: &Path) -> Result<(), DataAccessError> {
        let malformed = |message: String| DataAccessError::Malformed {
            path: path.to_path_buf(),
            message,
        };
        let n = self.lat.len();
        if n == 0 || self.lon.len() != n {
            return Err(malformed(format!("lat/lon 长度不一致或为空: {} / {}", n, self.lon.len())));
        }
        for (name, values) in &self.static_vars {
            if values.len() != n {
                return Err(malformed(format!("静态变量 {} 长度 {} != {}", name, values.len(), n)));
            }
        }
        for (name, frames) in &self.series {
            if frames.len() != self.times.len() {
                return Err(malformed(format!(
                    "时变变量 {} 有 {} 个时刻, 时间轴有 {} 个",
                    name,
                    frames.len(),
                    self.times.len()
                )));
            }
            if frames.iter().any(|f| f.len() != n) {
                return Err(malformed(format!("时变变量 {} 的快照长度必须为 {}", name, n)));
            }
        }
        if self.times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(malformed("时间轴必须严格递增".to_string()));
        }
        Ok(())
    }

    /// 每列最近站点的索引
    fn nearest(&self, coords: &[ColumnCoord]) -> Vec<usize> {
        let stations: Vec<[f64; 3]> = self
            .lat
            .iter()
            .zip(self.lon.iter())
            .map(|(&lat, &lon)| unit_vector(lat, lon))
            .collect();
        coords
            .iter()
            .map(|c| {
                let p = unit_vector(c.lat, c.lon);
                let mut best = 0;
                let mut best_dot = f64::NEG_INFINITY;
                for (i, s) in stations.iter().enumerate() {
                    let dot = p[0] * s[0] + p[1] * s[1] + p[2] * s[2];
                    if dot > best_dot {
                        best_dot = dot;
                        best = i;
                    }
                }
                best
            })
            .collect()
    }
}

fn unit_vector(lat: f64, lon: f64) -> [f64; 3] {
    let (lat, lon) = (lat.to_radians(), lon.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

/// JSON 文件数据源
#[derive(Debug)]
pub struct JsonDataSource {
    root: PathBuf,
    cache: Mutex<HashMap<PathBuf, Arc<JsonDataset>>>,
}

impl JsonDataSource {
    /// 以目录为根创建数据源
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// 数据根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(&self, location: &DatasetLocation) -> Result<Arc<JsonDataset>, DataAccessError> {
        if let Some(dataset) = self.cache.lock().get(&location.path) {
            return Ok(Arc::clone(dataset));
        }

        let path = &location.path;
        let content = std::fs::read_to_string(path).map_err(|source| DataAccessError::Unreadable {
            path: path.clone(),
            source,
        })?;
        let dataset: JsonDataset = serde_json::from_str(&content).map_err(|e| DataAccessError::Malformed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        dataset.validate(path)?;
        tracing::debug!("加载数据集 {} ({} 个站点)", path.display(), dataset.lat.len());

        let dataset = Arc::new(dataset);
        self.cache.lock().insert(path.clone(), Arc::clone(&dataset));
        Ok(dataset)
    }

    fn missing(location: &DatasetLocation, variable: &str) -> DataAccessError {
        DataAccessError::MissingVariable {
            dataset: location.key.file_stem(),
            variable: variable.to_string(),
        }
    }
}

impl DataSource for JsonDataSource {
    fn name(&self) -> &'static str {
        "json"
    }

    fn resolve(&self, key: &DatasetKey) -> Result<DatasetLocation, DataAccessError> {
        let path = self.root.join(format!("{}.json", key.file_stem()));
        if !path.is_file() {
            return Err(DataAccessError::NotFound { path });
        }
        Ok(DatasetLocation {
            key: key.clone(),
            path,
        })
    }

    fn read_static(
        &self,
        location: &DatasetLocation,
        variable: &str,
        coords: &[ColumnCoord],
    ) -> Result<Vec<f64>, DataAccessError> {
        let dataset = self.load(location)?;
        let values = dataset
            .static_vars
            .get(variable)
            .ok_or_else(|| Self::missing(location, variable))?;
        Ok(dataset.nearest(coords).into_iter().map(|i| values[i]).collect())
    }

    fn time_axis(&self, location: &DatasetLocation, variable: &str) -> Result<Vec<f64>, DataAccessError> {
        let dataset = self.load(location)?;
        if !dataset.series.contains_key(variable) {
            return Err(Self::missing(location, variable));
        }
        Ok(dataset.times.clone())
    }

    fn read_snapshot(
        &self,
        location: &DatasetLocation,
        variable: &str,
        index: usize,
        coords: &[ColumnCoord],
    ) -> Result<Vec<f64>, DataAccessError> {
        let dataset = self.load(location)?;
        let frames = dataset
            .series
            .get(variable)
            .ok_or_else(|| Self::missing(location, variable))?;
        let frame = frames.get(index).ok_or_else(|| DataAccessError::Malformed {
            path: location.path.clone(),
            message: format!("快照索引 {} 越界 (共 {} 个)", index, frames.len()),
        })?;
        Ok(dataset.nearest(coords).into_iter().map(|i| frame[i]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_dataset(dir: &Path, stem: &str, body: &str) {
        std::fs::write(dir.join(format!("{stem}.json")), body).unwrap();
    }

    #[test]
    fn test_nearest_neighbour_static() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(
            dir.path(),
            "soil_properties",
            r#"{"lat": [0.0, 60.0], "lon": [0.0, 0.0], "static": {"porosity": [0.4, 0.5]}}"#,
        );
        let source = JsonDataSource::new(dir.path());
        let loc = source.resolve(&DatasetKey::SoilProperties).unwrap();
        let coords = [
            ColumnCoord { lat: 5.0, lon: 3.0 },
            ColumnCoord { lat: 70.0, lon: -10.0 },
        ];
        let values = source.read_static(&loc, "porosity", &coords).unwrap();
        assert_eq!(values, vec![0.4, 0.5]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonDataSource::new(dir.path());
        let err = source.resolve(&DatasetKey::ModisLai { year: 2008 }).unwrap_err();
        assert!(matches!(err, DataAccessError::NotFound { .. }));
    }

    #[test]
    fn test_malformed_series() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(
            dir.path(),
            "modis_lai_2008",
            r#"{"lat": [0.0], "lon": [0.0], "times": [0.0, 1.0], "series": {"lai": [[1.0]]}}"#,
        );
        let source = JsonDataSource::new(dir.path());
        let loc = source.resolve(&DatasetKey::ModisLai { year: 2008 }).unwrap();
        let err = source.time_axis(&loc, "lai").unwrap_err();
        assert!(matches!(err, DataAccessError::Malformed { .. }));
    }

    #[test]
    fn test_snapshot_read() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(
            dir.path(),
            "modis_lai_2008",
            r#"{"lat": [0.0], "lon": [0.0], "times": [0.0, 100.0], "series": {"lai": [[1.0], [2.0]]}}"#,
        );
        let source = JsonDataSource::new(dir.path());
        let loc = source.resolve(&DatasetKey::ModisLai { year: 2008 }).unwrap();
        assert_eq!(source.time_axis(&loc, "lai").unwrap(), vec![0.0, 100.0]);
        let coords = [ColumnCoord { lat: 10.0, lon: 10.0 }];
        assert_eq!(source.read_snapshot(&loc, "lai", 1, &coords).unwrap(), vec![2.0]);
        assert!(source.read_snapshot(&loc, "lai", 2, &coords).is_err());
    }
}
