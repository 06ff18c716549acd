// crates/sl_config/src/lib.rs

//! SnowyLand Config Layer (Layer 1)
//!
//! 配置层，提供模拟配置、基准测试配置、参数注册表以及设备选择。
//! 本层不依赖任何物理或离散化代码。
//!
//! # 模块概览
//!
//! - [`simulation`]: SimulationConfig / DomainConfig 模拟配置
//! - [`benchmark`]: BenchmarkConfig 基准测试配置
//! - [`registry`]: ParameterRegistry 可注入的默认参数表
//! - [`device`]: DeviceKind / RuntimeConfig / Runtime 设备与运行时
//! - [`profiler`]: ProfilerMode 剖析模式
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 3: sl_bench    ─> uses BenchmarkConfig, ProfilerMode, Runtime
//! Layer 2: sl_land     ─> uses SimulationConfig, ParameterRegistry
//! Layer 1: sl_config   ─> (本层)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod benchmark;
pub mod device;
pub mod error;
pub mod profiler;
pub mod registry;
pub mod simulation;

/// 层级标识
pub const LAYER: u8 = 1;

// 重导出核心类型
pub use benchmark::BenchmarkConfig;
pub use device::{DeviceKind, Runtime, RuntimeConfig};
pub use error::{ConfigError, ConfigResult};
pub use profiler::ProfilerMode;
pub use registry::ParameterRegistry;
pub use simulation::{DomainConfig, SimulationConfig};
