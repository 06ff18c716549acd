// apps/sl_bench/tests/driver.rs

//! 基准驱动集成测试
//!
//! 使用极小网格与短时段，验证：
//! - CPU 上 flamegraph 模式写出两个 HTML 文件，零样本时不报错
//! - 非法模式不触发任何装配
//! - nsight 模式只执行固定步数
//! - 回归失败在剖析文件写出之后返回

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use sl_bench::{
    BenchError, BenchmarkDriver, CountingAllocator, LandSimulationFactory, RunBanner, SimulationFactory, SpanProfiler,
};
use sl_config::{BenchmarkConfig, ConfigError, DeviceKind, ProfilerMode, SimulationConfig};
use sl_land::{LandResult, SimulationSetup};
use tempfile::tempdir;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator::new();

/// 统计装配次数的工厂
struct CountingFactory {
    inner: LandSimulationFactory,
    builds: AtomicUsize,
}

impl CountingFactory {
    fn new() -> Self {
        let sim = SimulationConfig {
            tf: 2.0 * 3600.0,
            ..SimulationConfig::tiny()
        };
        Self {
            inner: LandSimulationFactory::synthetic(sim),
            builds: AtomicUsize::new(0),
        }
    }

    fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl SimulationFactory for CountingFactory {
    fn build(&self) -> LandResult<SimulationSetup> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.inner.build()
    }

    fn banner(&self) -> RunBanner {
        self.inner.banner()
    }
}

fn config(max_samples: usize, max_profiling_seconds: f64) -> BenchmarkConfig {
    BenchmarkConfig {
        max_samples,
        max_profiling_seconds,
        ..Default::default()
    }
}

fn driver(config: BenchmarkConfig, device: DeviceKind, dir: &Path, profiler: SpanProfiler) -> BenchmarkDriver<CountingFactory> {
    BenchmarkDriver::new(CountingFactory::new(), config, device, profiler).with_output_dir(dir)
}

// ============================================================
// flamegraph 模式
// ============================================================

#[test]
fn test_cpu_flamegraph_writes_two_html_artifacts() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("snowy_land_benchmark_cpu");
    let profiler = SpanProfiler::new();
    let driver = driver(config(2, 500.0), DeviceKind::Cpu, &out, profiler.clone());

    let subscriber = Registry::default().with(profiler.layer());
    let report = tracing::subscriber::with_default(subscriber, || driver.run(ProfilerMode::Flamegraph)).unwrap();

    let names: Vec<String> = report
        .artifacts
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["flame_cpu.html", "alloc_flame_cpu.html"]);

    let compute = std::fs::read_to_string(out.join("flame_cpu.html")).unwrap();
    assert!(compute.contains("<svg"));
    assert!(compute.contains("benchmark_cycle"));
    let alloc = std::fs::read_to_string(out.join("alloc_flame_cpu.html")).unwrap();
    assert!(alloc.contains("<svg"));

    let stats = report.stats.unwrap();
    assert_eq!(stats.n_samples, 2);
    assert!(stats.min <= stats.mean && stats.mean <= stats.max);
    // 预热 + 2 个样本 + 2 个剖析周期
    assert_eq!(driver.factory().builds(), 5);
}

#[test]
fn test_zero_samples_do_not_fail() {
    let dir = tempdir().unwrap();
    let driver = driver(config(100, 0.0), DeviceKind::Cpu, dir.path(), SpanProfiler::new());

    let report = driver.run(ProfilerMode::Flamegraph).unwrap();
    assert!(report.stats.is_none());
    assert!(dir.path().join("flame_cpu.html").exists());
    assert!(dir.path().join("alloc_flame_cpu.html").exists());
    assert_eq!(driver.factory().builds(), 3);
}

#[test]
fn test_gpu_writes_device_trace() {
    let dir = tempdir().unwrap();
    let profiler = SpanProfiler::new();
    let driver = driver(config(1, 500.0), DeviceKind::Gpu, dir.path(), profiler.clone());

    let subscriber = Registry::default().with(profiler.layer());
    let report = tracing::subscriber::with_default(subscriber, || driver.run(ProfilerMode::Flamegraph)).unwrap();

    assert_eq!(report.artifacts, vec![dir.path().join("profiling.txt")]);
    let trace = std::fs::read_to_string(dir.path().join("profiling.txt")).unwrap();
    assert!(trace.contains("benchmark_cycle;solve"));
    assert!(!dir.path().join("flame_gpu.html").exists());
}

#[test]
fn test_default_output_dir_named_by_device() {
    let cpu = BenchmarkDriver::new(CountingFactory::new(), BenchmarkConfig::default(), DeviceKind::Cpu, SpanProfiler::new());
    assert_eq!(cpu.output_dir(), Path::new("snowy_land_benchmark_cpu"));
    let gpu = BenchmarkDriver::new(CountingFactory::new(), BenchmarkConfig::default(), DeviceKind::Gpu, SpanProfiler::new());
    assert_eq!(gpu.output_dir(), Path::new("snowy_land_benchmark_gpu"));
}

// ============================================================
// 模式选择
// ============================================================

#[test]
fn test_invalid_mode_performs_no_setup() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    let driver = driver(config(2, 500.0), DeviceKind::Cpu, &out, SpanProfiler::new());

    let err = driver.run_with_arg("invalid_value").unwrap_err();
    assert!(matches!(
        err,
        BenchError::Config(ConfigError::InvalidChoice { ref value, .. }) if value == "invalid_value"
    ));
    assert_eq!(driver.factory().builds(), 0);
    assert!(!out.exists());
}

#[test]
fn test_nsight_runs_fixed_steps_only() {
    let dir = tempdir().unwrap();
    let driver = driver(config(100, 500.0), DeviceKind::Cpu, dir.path(), SpanProfiler::new());

    let report = driver.run_with_arg("nsight").unwrap();
    assert_eq!(report.profiled_steps, 4);
    assert!(report.stats.is_none());
    assert!(report.artifacts.is_empty());
    // 一次完整求解 + 一个新问题
    assert_eq!(driver.factory().builds(), 2);
    assert!(!dir.path().join("flame_cpu.html").exists());
}

// ============================================================
// 回归门
// ============================================================

#[test]
fn test_regression_failure_after_artifacts() {
    let dir = tempdir().unwrap();
    let config = BenchmarkConfig {
        previous_best_time: 1.0e6,
        ..config(2, 500.0)
    };
    let driver = driver(config, DeviceKind::Cpu, dir.path(), SpanProfiler::new()).with_regression_gate(true);

    let err = driver.run(ProfilerMode::Flamegraph).unwrap_err();
    assert!(matches!(err, BenchError::RegressionAssertion { baseline, .. } if baseline == 1.0e6));
    assert!(dir.path().join("flame_cpu.html").exists());
    assert!(dir.path().join("alloc_flame_cpu.html").exists());
}

#[test]
fn test_regression_gate_inactive_outside_ci() {
    let dir = tempdir().unwrap();
    let config = BenchmarkConfig {
        previous_best_time: 1.0e6,
        ..config(1, 500.0)
    };
    let driver = driver(config, DeviceKind::Cpu, dir.path(), SpanProfiler::new());

    let report = driver.run(ProfilerMode::Flamegraph).unwrap();
    assert!(report.regression.is_none());
}
