// crates/sl_land/src/model/mod.rs

//! 模型组装器
//!
//! - [`land`]: 耦合模型与构建器
//! - [`state`]: 预报状态向量 Y
//! - [`cache`]: 辅助缓存 p
//! - [`init`]: 初始状态与 `set_initial_cache`
//! - [`physics`]: 简化柱模型倾向
//! - [`jacobian`]: 隐式部分的 W 矩阵
//! - [`thermo`]: 热力学关系

pub mod cache;
pub mod init;
pub mod jacobian;
pub mod land;
pub mod physics;
pub mod state;
pub mod thermo;

pub use cache::{Cache, SoilCache, SurfaceCache};
pub use init::{initialize, set_initial_cache, Coordinates, INITIAL_SOIL_CO2, INITIAL_SOIL_TEMPERATURE};
pub use jacobian::{Jacobian, TridiagonalBlocks};
pub use land::{LandModel, LandModelBuilder};
pub use state::{CanopyState, SnowState, SoilCO2State, SoilState, StateVector};
pub use thermo::PhysicalConstants;
