// apps/sl_bench/src/driver.rs

//! 基准驱动
//!
//! 反复运行相互独立的 (装配 → 求解) 周期：
//!
//! - `flamegraph`: 一次预热，然后在样本上限与时间预算内计时采样；
//!   CPU 上再各用一个剖析周期生成计算耗时与分配火焰图，GPU 上写设备剖析记录
//! - `nsight`: 一次完整求解，然后新建问题只执行固定步数，由外部剖析器控制
//!
//! 每个周期都向 [`SimulationFactory`] 重新申请全部对象，周期之间不共享可变状态。

use sl_config::{BenchmarkConfig, ConfigError, DeviceKind, ParameterRegistry, ProfilerMode, SimulationConfig};
use sl_land::data::{DataSource, SyntheticDataSource};
use sl_land::timestepping::{self, Integrator};
use sl_land::{LandResult, SimulationSetup};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::BenchResult;
use crate::profiling::device_trace::{write_device_trace, DEVICE_TRACE_FILE};
use crate::profiling::flame::{artifact_name, write_flamegraph, ALLOC_FLAME_PREFIX, COMPUTE_FLAME_PREFIX};
use crate::profiling::SpanProfiler;
use crate::regression::{check_stats, RegressionOutcome};
use crate::stats::{summarize, TimingStats};

/// 运行横幅信息
#[derive(Debug, Clone, PartialEq)]
pub struct RunBanner {
    /// 模型名称
    pub model: String,
    /// 水平/垂直单元数
    pub resolution: (usize, usize),
    /// 时间步长 [s]
    pub dt: f64,
    /// 模拟时长 [s]
    pub duration: f64,
}

impl RunBanner {
    /// 记录横幅
    pub fn log(&self, mode: ProfilerMode, device: DeviceKind) {
        info!("========================================");
        info!("SnowyLand 基准测试");
        info!("  模型: {}", self.model);
        info!("  分辨率: {:?}", self.resolution);
        info!("  时间步长: {} s", self.dt);
        info!("  模拟时长: {} 天", self.duration / 86_400.0);
        info!("  剖析模式: {}, 设备: {}", mode, device.name());
        info!("========================================");
    }
}

/// 模拟工厂：每次调用返回一套全新的模拟对象
pub trait SimulationFactory {
    /// 装配一次模拟
    fn build(&self) -> LandResult<SimulationSetup>;

    /// 运行横幅
    fn banner(&self) -> RunBanner;
}

/// 陆面模型工厂
pub struct LandSimulationFactory {
    sim: SimulationConfig,
    source: Arc<dyn DataSource>,
    registry: ParameterRegistry,
}

impl LandSimulationFactory {
    /// 使用给定数据源与参数表
    pub fn new(sim: SimulationConfig, source: Arc<dyn DataSource>, registry: ParameterRegistry) -> Self {
        Self { sim, source, registry }
    }

    /// 使用合成数据源与默认参数表
    pub fn synthetic(sim: SimulationConfig) -> Self {
        Self::new(sim, Arc::new(SyntheticDataSource::new()), ParameterRegistry::defaults())
    }

    /// 模拟配置
    pub fn simulation(&self) -> &SimulationConfig {
        &self.sim
    }
}

impl std::fmt::Debug for LandSimulationFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LandSimulationFactory")
            .field("sim", &self.sim)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl SimulationFactory for LandSimulationFactory {
    fn build(&self) -> LandResult<SimulationSetup> {
        sl_land::setup_simulation(&self.sim, &self.source, &self.registry)
    }

    fn banner(&self) -> RunBanner {
        RunBanner {
            model: "SoilCanopySnowModel".to_string(),
            resolution: self.sim.domain.nelements,
            dt: self.sim.dt,
            duration: self.sim.duration(),
        }
    }
}

/// 一次基准运行的结果
#[derive(Debug, Clone, Default)]
pub struct BenchReport {
    /// 计时统计，无样本时为 `None`
    pub stats: Option<TimingStats>,
    /// 写出的剖析文件
    pub artifacts: Vec<PathBuf>,
    /// 回归检查结论（未启用时为 `None`）
    pub regression: Option<RegressionOutcome>,
    /// nsight 模式执行的步数
    pub profiled_steps: usize,
}

/// 解析剖析模式参数
pub fn parse_mode(arg: &str) -> BenchResult<ProfilerMode> {
    Ok(arg.parse::<ProfilerMode>()?)
}

/// 基准驱动
#[derive(Debug)]
pub struct BenchmarkDriver<F> {
    factory: F,
    config: BenchmarkConfig,
    device: DeviceKind,
    output_dir: PathBuf,
    profiler: SpanProfiler,
    regression_gate: bool,
}

impl<F: SimulationFactory> BenchmarkDriver<F> {
    /// 创建驱动，输出目录按设备类型命名
    pub fn new(factory: F, config: BenchmarkConfig, device: DeviceKind, profiler: SpanProfiler) -> Self {
        let output_dir = device.output_dir(&config.output_prefix);
        Self {
            factory,
            config,
            device,
            output_dir,
            profiler,
            regression_gate: false,
        }
    }

    /// 设置输出目录
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// 启用或关闭回归断言
    pub fn with_regression_gate(mut self, active: bool) -> Self {
        self.regression_gate = active;
        self
    }

    /// 输出目录
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 工厂
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// 解析模式参数后运行；非法模式不触发任何装配
    pub fn run_with_arg(&self, arg: &str) -> BenchResult<BenchReport> {
        let mode = parse_mode(arg)?;
        self.run(mode)
    }

    /// 按模式运行
    pub fn run(&self, mode: ProfilerMode) -> BenchResult<BenchReport> {
        self.config.validate()?;
        self.factory.banner().log(mode, self.device);
        match mode {
            ProfilerMode::Flamegraph => self.run_flamegraph(),
            ProfilerMode::Nsight => self.run_nsight(),
        }
    }

    fn run_cycle(&self) -> BenchResult<()> {
        let _span = tracing::debug_span!("benchmark_cycle").entered();
        let (problem, alg, dt, callbacks) = self.factory.build()?.into_parts();
        timestepping::solve(problem, alg, dt, callbacks)?;
        Ok(())
    }

    fn profiled_cycle(&self) -> BenchResult<crate::profiling::Profile> {
        self.profiler.start();
        let result = self.run_cycle();
        let profile = self.profiler.stop();
        result.map(|_| profile)
    }

    /// 预热后在样本上限与时间预算内采样，预算只在两次采样之间检查
    fn collect_samples(&self) -> BenchResult<Vec<f64>> {
        info!("预热运行");
        self.run_cycle()?;

        let budget = Duration::try_from_secs_f64(self.config.max_profiling_seconds).map_err(|_| {
            ConfigError::invalid("max_profiling_seconds", self.config.max_profiling_seconds, "无法转换为时间预算")
        })?;
        let started = Instant::now();
        let mut samples = Vec::with_capacity(self.config.max_samples);
        while samples.len() < self.config.max_samples && started.elapsed() < budget {
            let t = Instant::now();
            self.run_cycle()?;
            samples.push(t.elapsed().as_secs_f64());
        }
        info!("采样完成: {} 个样本, 用时 {:.1} s", samples.len(), started.elapsed().as_secs_f64());
        Ok(samples)
    }

    fn run_flamegraph(&self) -> BenchResult<BenchReport> {
        fs::create_dir_all(&self.output_dir)?;
        let samples = self.collect_samples()?;
        let stats = summarize(&samples);

        let mut artifacts = Vec::new();
        if self.device.is_gpu() {
            let trace = self.profiled_cycle()?;
            let path = self.output_dir.join(DEVICE_TRACE_FILE);
            write_device_trace(&trace.time, &path)?;
            artifacts.push(path);
        } else {
            let device = self.device.name();

            let compute = self.profiled_cycle()?;
            let path = self.output_dir.join(artifact_name(COMPUTE_FLAME_PREFIX, device));
            write_flamegraph(&compute.time, "SnowyLand compute", "ns", &path)?;
            artifacts.push(path);

            let alloc = self.profiled_cycle()?;
            let path = self.output_dir.join(artifact_name(ALLOC_FLAME_PREFIX, device));
            write_flamegraph(&alloc.alloc, "SnowyLand allocations", "bytes", &path)?;
            artifacts.push(path);
        }

        let mut report = BenchReport {
            stats,
            artifacts,
            ..Default::default()
        };

        if self.regression_gate {
            match &report.stats {
                Some(stats) => {
                    report.regression = Some(check_stats(stats, self.config.previous_best_time)?);
                }
                None => warn!("没有计时样本，跳过回归检查"),
            }
        }
        Ok(report)
    }

    fn run_nsight(&self) -> BenchResult<BenchReport> {
        info!("完整求解一次");
        self.run_cycle()?;

        let steps = self.config.nsight_steps;
        info!("新建问题并执行 {} 步", steps);
        let (problem, alg, dt, callbacks) = self.factory.build()?.into_parts();
        let mut integrator = Integrator::init(problem, alg, dt, callbacks)?;
        let _span = tracing::debug_span!("nsight_steps").entered();
        for _ in 0..steps {
            integrator.step()?;
        }
        Ok(BenchReport {
            profiled_steps: steps,
            ..Default::default()
        })
    }
}

