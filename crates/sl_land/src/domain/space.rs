// crates/sl_land/src/domain/space.rs

//! 网格分区与空间句柄

use serde::{Deserialize, Serialize};

/// 网格分区
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// 地表（每列一个值）
    Surface,
    /// 地下（每列每层一个值）
    Subsurface,
}

impl Partition {
    /// 分区名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::Subsurface => "subsurface",
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 空间：某个网格的某个分区
///
/// 由 [`Domain`](super::Domain) 创建，`domain_id` 区分不同网格实例，
/// 因此两个网格即使尺寸相同也不会被视为同一空间。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Space {
    domain_id: u64,
    partition: Partition,
    n_columns: usize,
    n_layers: usize,
}

impl Space {
    pub(crate) fn new(domain_id: u64, partition: Partition, n_columns: usize, n_layers: usize) -> Self {
        let n_layers = match partition {
            Partition::Surface => 1,
            Partition::Subsurface => n_layers,
        };
        Self {
            domain_id,
            partition,
            n_columns,
            n_layers,
        }
    }

    /// 所属网格 ID
    #[inline]
    pub fn domain_id(&self) -> u64 {
        self.domain_id
    }

    /// 分区
    #[inline]
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// 列数
    #[inline]
    pub fn n_columns(&self) -> usize {
        self.n_columns
    }

    /// 每列层数（地表为 1）
    #[inline]
    pub fn n_layers(&self) -> usize {
        self.n_layers
    }

    /// 总点数
    #[inline]
    pub fn len(&self) -> usize {
        self.n_columns * self.n_layers
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@domain#{}", self.partition, self.domain_id)
    }
}
