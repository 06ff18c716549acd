// apps/sl_bench/src/main.rs

//! SnowyLand 基准测试命令行
//!
//! ```text
//! sl_bench --profiler flamegraph   # 计时统计 + 火焰图
//! sl_bench --profiler nsight       # 固定步数，交给外部剖析器
//! ```

use clap::Parser;
use sl_bench::{parse_mode, BenchmarkDriver, CountingAllocator, LandSimulationFactory, SpanProfiler};
use sl_config::{BenchmarkConfig, Runtime, RuntimeConfig, SimulationConfig};
use tracing::{error, info};
use tracing_subscriber::filter::{filter_fn, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator::new();

/// SnowyLand 陆面模型基准测试
#[derive(Parser)]
#[command(name = "sl_bench")]
#[command(author = "SnowyLand Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "SnowyLand land model benchmark driver", long_about = None)]
struct Cli {
    /// 剖析模式 (flamegraph, nsight)
    #[arg(long, default_value = "flamegraph")]
    profiler: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志，剖析层只接收 span
    let profiler = SpanProfiler::new();
    let subscriber = Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(LevelFilter::INFO),
        )
        .with(profiler.layer().with_filter(filter_fn(|meta| meta.is_span())));
    tracing::subscriber::set_global_default(subscriber)?;

    let mode = match parse_mode(&cli.profiler) {
        Ok(mode) => mode,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let runtime = Runtime::initialize(&RuntimeConfig::from_env()?);

    let config = BenchmarkConfig::default();
    let regression_gate = config.regression_gate_from_env();
    if regression_gate {
        info!("CI 流水线 {} 已启用回归断言", config.ci_pipeline_name);
    }

    let factory = LandSimulationFactory::synthetic(SimulationConfig::default());
    let driver = BenchmarkDriver::new(factory, config, runtime.device(), profiler)
        .with_regression_gate(regression_gate);
    let report = driver.run(mode)?;

    for path in &report.artifacts {
        info!("输出: {}", path.display());
    }
    info!("基准测试完成");
    Ok(())
}
