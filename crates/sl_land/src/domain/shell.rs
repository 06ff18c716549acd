// crates/sl_land/src/domain/shell.rs

//! 球壳网格
//!
//! 水平方向为立方球面（6 个面，每面 `h × h` 个单元，每单元 `(p+1)²` 个节点），
//! 垂直方向为从 `-depth` 到 0 的拉伸分层。
//!
//! 单元边界上的节点在相邻单元中重复出现，DSS（直接刚度求和）把这些重复节点
//! 上的值取平均以保证跨单元连续。
//!
//! ```text
//!   face 4 (+z)
//!   ┌──┬──┐
//!   │  │  │   每个面上的节点用整数刻度 k ∈ [0, h·p] 表示，
//!   ├──┼──┤   映射到立方体表面坐标 2k - h·p ∈ [-h·p, h·p]，
//!   │  │  │   共享节点因此得到完全相同的整数键。
//!   └──┴──┘
//! ```

use sl_config::{ConfigError, DomainConfig};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::field::SpatialField;
use super::space::{Partition, Space};

static NEXT_DOMAIN_ID: AtomicU64 = AtomicU64::new(1);

/// 列坐标 [度]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnCoord {
    /// 纬度 [-90, 90]
    pub lat: f64,
    /// 经度 (-180, 180]
    pub lon: f64,
}

/// 球壳网格
#[derive(Debug)]
pub struct Domain {
    id: u64,
    config: DomainConfig,
    surface: Space,
    subsurface: Space,
    coords: Vec<ColumnCoord>,
    dz: Vec<f64>,
    z_centers: Vec<f64>,
    center_spacing: Vec<f64>,
    dss_groups: Vec<Vec<usize>>,
}

impl Domain {
    /// 构建球壳网格
    pub fn spherical_shell(config: &DomainConfig) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;

        let id = NEXT_DOMAIN_ID.fetch_add(1, Ordering::Relaxed);
        let (h, n_layers) = config.nelements;
        let p = config.npolynomial;
        let ticks = (h * p) as i64;

        let mut coords = Vec::with_capacity(6 * h * h * (p + 1) * (p + 1));
        let mut shared: BTreeMap<[i64; 3], Vec<usize>> = BTreeMap::new();

        for face in 0..6 {
            for ey in 0..h {
                for ex in 0..h {
                    for j in 0..=p {
                        for i in 0..=p {
                            let a = 2 * (ex * p + i) as i64 - ticks;
                            let b = 2 * (ey * p + j) as i64 - ticks;
                            let key = cube_point(face, a, b, ticks);
                            shared.entry(key).or_default().push(coords.len());
                            coords.push(to_lat_lon(key));
                        }
                    }
                }
            }
        }

        let dss_groups = shared.into_values().filter(|g| g.len() > 1).collect();
        let (dz, z_centers, center_spacing) = vertical_grid(config.depth, n_layers, config.dz_tuple);

        let n_columns = coords.len();
        let domain = Self {
            id,
            config: config.clone(),
            surface: Space::new(id, Partition::Surface, n_columns, n_layers),
            subsurface: Space::new(id, Partition::Subsurface, n_columns, n_layers),
            coords,
            dz,
            z_centers,
            center_spacing,
            dss_groups,
        };

        tracing::debug!(
            "球壳网格 #{}: {} 列, {} 层, {} 个共享节点组",
            domain.id,
            domain.n_columns(),
            domain.n_layers(),
            domain.dss_groups.len()
        );
        Ok(Arc::new(domain))
    }

    /// 网格 ID
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 网格配置
    pub fn config(&self) -> &DomainConfig {
        &self.config
    }

    /// 地表空间
    #[inline]
    pub fn surface_space(&self) -> Space {
        self.surface
    }

    /// 地下空间
    #[inline]
    pub fn subsurface_space(&self) -> Space {
        self.subsurface
    }

    /// 按分区取空间
    pub fn space(&self, partition: Partition) -> Space {
        match partition {
            Partition::Surface => self.surface,
            Partition::Subsurface => self.subsurface,
        }
    }

    /// 列数（含单元边界上的重复节点）
    #[inline]
    pub fn n_columns(&self) -> usize {
        self.coords.len()
    }

    /// 垂直层数
    #[inline]
    pub fn n_layers(&self) -> usize {
        self.dz.len()
    }

    /// 列坐标
    pub fn coords(&self) -> &[ColumnCoord] {
        &self.coords
    }

    /// 层厚 [m]，第 0 层为底层
    pub fn layer_thickness(&self) -> &[f64] {
        &self.dz
    }

    /// 层中心高度 [m]（负值）
    pub fn layer_centers(&self) -> &[f64] {
        &self.z_centers
    }

    /// 相邻层中心间距 [m]，长度为 `n_layers - 1`
    pub fn center_spacing(&self) -> &[f64] {
        &self.center_spacing
    }

    /// 共享节点组
    pub fn dss_groups(&self) -> &[Vec<usize>] {
        &self.dss_groups
    }

    /// 对场执行 DSS：共享节点取平均
    pub fn dss(&self, field: &mut SpatialField<f64>) {
        debug_assert_eq!(field.space().domain_id(), self.id);
        let n_layers = field.space().n_layers();
        let data = field.data_mut();
        for group in &self.dss_groups {
            let weight = 1.0 / group.len() as f64;
            for layer in 0..n_layers {
                let sum: f64 = group.iter().map(|&c| data[c * n_layers + layer]).sum();
                let mean = sum * weight;
                for &c in group {
                    data[c * n_layers + layer] = mean;
                }
            }
        }
    }
}

/// 立方体表面整数坐标
fn cube_point(face: usize, a: i64, b: i64, n: i64) -> [i64; 3] {
    match face {
        0 => [n, a, b],
        1 => [-n, a, b],
        2 => [a, n, b],
        3 => [a, -n, b],
        4 => [a, b, n],
        _ => [a, b, -n],
    }
}

/// 等距投影到球面，返回经纬度
fn to_lat_lon(key: [i64; 3]) -> ColumnCoord {
    let [x, y, z] = key.map(|v| v as f64);
    let r = (x * x + y * y + z * z).sqrt();
    ColumnCoord {
        lat: (z / r).asin().to_degrees(),
        lon: y.atan2(x).to_degrees(),
    }
}

/// 拉伸垂直网格：层厚在对数空间内从底层线性过渡到顶层，再缩放到总深度
fn vertical_grid(depth: f64, n_layers: usize, dz_tuple: (f64, f64)) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let (bottom, top) = dz_tuple;
    let raw: Vec<f64> = if n_layers == 1 {
        vec![depth]
    } else {
        let (lb, lt) = (bottom.ln(), top.ln());
        (0..n_layers)
            .map(|l| (lb + (lt - lb) * l as f64 / (n_layers - 1) as f64).exp())
            .collect()
    };
    let scale = depth / raw.iter().sum::<f64>();
    let dz: Vec<f64> = raw.iter().map(|d| d * scale).collect();

    let mut faces = Vec::with_capacity(n_layers + 1);
    faces.push(-depth);
    for d in &dz {
        let last = faces[faces.len() - 1];
        faces.push(last + d);
    }
    faces[n_layers] = 0.0;

    let centers: Vec<f64> = faces.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect();
    let spacing = centers.windows(2).map(|w| w[1] - w[0]).collect();
    (dz, centers, spacing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_column_count() {
        let domain = Domain::spherical_shell(&DomainConfig::tiny()).unwrap();
        // 6 面 × 2² 单元 × (1+1)² 节点
        assert_eq!(domain.n_columns(), 96);
        assert_eq!(domain.n_layers(), 3);
    }

    #[test]
    fn test_unique_points() {
        let domain = Domain::spherical_shell(&DomainConfig::tiny()).unwrap();
        let duplicates: usize = domain.dss_groups().iter().map(|g| g.len() - 1).sum();
        // n = h·p = 2，球面上的唯一点数为 6n² + 2
        assert_eq!(domain.n_columns() - duplicates, 6 * 4 + 2);
    }

    #[test]
    fn test_vertical_grid_sums_to_depth() {
        let domain = Domain::spherical_shell(&DomainConfig::default()).unwrap();
        let total: f64 = domain.layer_thickness().iter().sum();
        assert_relative_eq!(total, 50.0, epsilon = 1e-10);
        let dz = domain.layer_thickness();
        assert!(dz[0] > dz[dz.len() - 1]);
        assert_eq!(domain.center_spacing().len(), domain.n_layers() - 1);
    }

    #[test]
    fn test_distinct_domains_have_distinct_spaces() {
        let a = Domain::spherical_shell(&DomainConfig::tiny()).unwrap();
        let b = Domain::spherical_shell(&DomainConfig::tiny()).unwrap();
        assert_ne!(a.surface_space(), b.surface_space());
        assert_ne!(a.surface_space(), a.subsurface_space());
    }

    #[test]
    fn test_dss_makes_shared_nodes_equal() {
        let domain = Domain::spherical_shell(&DomainConfig::tiny()).unwrap();
        let mut f = SpatialField::from_fn(domain.subsurface_space(), |c, l| (c + l) as f64);
        domain.dss(&mut f);
        for group in domain.dss_groups() {
            for layer in 0..domain.n_layers() {
                let first = f.get(group[0], layer);
                assert!(group.iter().all(|&c| f.get(c, layer) == first));
            }
        }
    }

    #[test]
    fn test_shared_nodes_have_same_coords() {
        let domain = Domain::spherical_shell(&DomainConfig::tiny()).unwrap();
        for group in domain.dss_groups() {
            let c0 = domain.coords()[group[0]];
            for &c in group {
                assert_eq!(domain.coords()[c], c0);
            }
        }
    }
}
