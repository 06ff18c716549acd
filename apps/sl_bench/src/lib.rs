// apps/sl_bench/src/lib.rs

//! SnowyLand Benchmark Layer (Layer 3)
//!
//! 陆面模型基准驱动，包括：
//! - 基准驱动与模拟工厂 (driver)
//! - 计时统计 (stats)
//! - CI 性能回归门 (regression)
//! - span 剖析器、计数分配器、火焰图与设备剖析记录 (profiling)
//!
//! # 层级架构
//!
//! ```text
//! Layer 3: sl_bench    ─> (本层)
//! Layer 2: sl_land     ─> setup_simulation / Integrator
//! Layer 1: sl_config   ─> BenchmarkConfig / ProfilerMode / Runtime
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod driver;
pub mod error;
pub mod profiling;
pub mod regression;
pub mod stats;

/// 层级标识
pub const LAYER: u8 = 3;

// 重导出常用类型
pub use driver::{parse_mode, BenchReport, BenchmarkDriver, LandSimulationFactory, RunBanner, SimulationFactory};
pub use error::{BenchError, BenchResult};
pub use profiling::{CountingAllocator, FoldedStacks, Profile, SpanProfiler, SpanProfilerLayer};
pub use regression::{check_regression, RegressionOutcome};
pub use stats::{round_sig, TimingStats};
