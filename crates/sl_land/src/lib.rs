// crates/sl_land/src/lib.rs

//! SnowyLand Land Layer (Layer 2)
//!
//! 耦合土壤/冠层/积雪陆面模型的装配与积分接线，包括：
//! - 球壳网格与空间场 (domain)
//! - 外部数据访问契约 (data)
//! - 时变外部驱动 (forcing)
//! - 参数构建器 (params)
//! - 模型组装器 (model) - 状态、缓存、初始化、倾向、Jacobian
//! - 积分器接线 (timestepping) - IMEX 闭包、驱动更新回调、ARS111
//! - 完整模拟装配 (setup)
//!
//! # 层级架构
//!
//! ```text
//! Layer 3: sl_bench    ─> setup_simulation / Integrator
//! Layer 2: sl_land     ─> (本层)
//! Layer 1: sl_config   ─> SimulationConfig / ParameterRegistry
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod data;
pub mod domain;
pub mod error;
pub mod forcing;
pub mod model;
pub mod params;
pub mod setup;
pub mod timestepping;

/// 层级标识
pub const LAYER: u8 = 2;

// 重导出常用类型
pub use data::{DataSource, DatasetKey, DatasetLocation, JsonDataSource, SyntheticDataSource};
pub use domain::{ColumnCoord, Domain, Partition, Space, SpatialField};
pub use error::{ConfigError, DataAccessError, LandError, LandResult};
pub use forcing::{Drivers, ForcingInputs, TimeInterpolation};
pub use model::{initialize, set_initial_cache, Cache, Coordinates, LandModel, LandModelBuilder, StateVector};
pub use params::{
    CanopyParameters, FieldSource, RetentionCurve, RunoffParameters, SnowParameters, SoilCO2Parameters,
    SoilParameters, VanGenuchten,
};
pub use setup::{setup_model, setup_prob, setup_simulation, SimulationSetup};
pub use timestepping::{
    Callback, CallbackSet, DriverUpdateCallback, ImexAlgorithm, Integrator, NewtonsMethod, Problem, Solution,
    UpdateEvery,
};
