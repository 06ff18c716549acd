// apps/sl_bench/src/regression.rs

//! 性能回归门
//!
//! 平均耗时必须落在 `[基线 - 2σ, 基线 + 2σ]` 内；超出 `基线 + σ` 记录回归警告，
//! 低于 `基线 - σ` 记录改进提示，两者都不致命。

use tracing::{info, warn};

use crate::error::{BenchError, BenchResult};
use crate::stats::TimingStats;

/// 容差带宽（标准差倍数）
pub const TOLERANCE_SIGMAS: f64 = 2.0;

/// 非致命提示阈值（标准差倍数）
pub const NOTICE_SIGMAS: f64 = 1.0;

/// 回归检查结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegressionOutcome {
    /// 与基线一致
    Steady,
    /// 变慢但仍在容差内
    SlowerThanBaseline,
    /// 变快但仍在容差内
    FasterThanBaseline,
}

/// 对平均耗时执行回归检查
pub fn check_regression(mean: f64, stddev: f64, baseline: f64) -> BenchResult<RegressionOutcome> {
    let lower = baseline - TOLERANCE_SIGMAS * stddev;
    let upper = baseline + TOLERANCE_SIGMAS * stddev;

    let outcome = if mean > baseline + NOTICE_SIGMAS * stddev {
        warn!(
            "可能的性能回归: 平均 {} s 高于基线 {} s 超过 1σ ({} s)",
            mean, baseline, stddev
        );
        RegressionOutcome::SlowerThanBaseline
    } else if mean < baseline - NOTICE_SIGMAS * stddev {
        info!(
            "性能改进: 平均 {} s 低于基线 {} s 超过 1σ，请更新基线",
            mean, baseline
        );
        RegressionOutcome::FasterThanBaseline
    } else {
        RegressionOutcome::Steady
    };

    if !(lower..=upper).contains(&mean) {
        return Err(BenchError::RegressionAssertion {
            mean,
            baseline,
            stddev,
            lower,
            upper,
        });
    }
    Ok(outcome)
}

/// 对统计结果执行回归检查
pub fn check_stats(stats: &TimingStats, baseline: f64) -> BenchResult<RegressionOutcome> {
    check_regression(stats.mean, stats.stddev, baseline)
}
