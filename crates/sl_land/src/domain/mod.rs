// crates/sl_land/src/domain/mod.rs

//! 网格模块
//!
//! - [`Domain`]: 球壳网格，拥有地表和地下两个分区
//! - [`Space`] / [`Partition`]: 分区句柄
//! - [`SpatialField`]: 定义在分区上的场

pub mod field;
pub mod shell;
pub mod space;

pub use field::SpatialField;
pub use shell::{ColumnCoord, Domain};
pub use space::{Partition, Space};
