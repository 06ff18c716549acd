// apps/sl_bench/src/stats.rs

//! 计时统计
//!
//! 统计量在记录与比较之前统一保留 3 位有效数字。

use tracing::info;

/// 有效数字位数
pub const SIGNIFICANT_DIGITS: i32 = 3;

/// 保留 `digits` 位有效数字
pub fn round_sig(x: f64, digits: i32) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let magnitude = x.abs().log10().floor() as i32;
    let shift = digits - 1 - magnitude;
    if shift >= 0 {
        let scale = 10f64.powi(shift);
        (x * scale).round() / scale
    } else {
        let scale = 10f64.powi(-shift);
        (x / scale).round() * scale
    }
}

/// 一组计时样本的统计量 [s]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingStats {
    /// 样本数
    pub n_samples: usize,
    /// 平均值
    pub mean: f64,
    /// 最大值
    pub max: f64,
    /// 最小值
    pub min: f64,
    /// 总体标准差
    pub stddev: f64,
}

impl TimingStats {
    /// 由样本计算统计量，无样本时返回 `None`
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);

        Some(Self {
            n_samples: samples.len(),
            mean: round_sig(mean, SIGNIFICANT_DIGITS),
            max: round_sig(max, SIGNIFICANT_DIGITS),
            min: round_sig(min, SIGNIFICANT_DIGITS),
            stddev: round_sig(variance.sqrt(), SIGNIFICANT_DIGITS),
        })
    }

    /// 记录统计摘要
    pub fn log(&self) {
        info!(
            "计时统计 ({} 个样本): 平均 {} s, 最大 {} s, 最小 {} s, 标准差 {} s",
            self.n_samples, self.mean, self.max, self.min, self.stddev
        );
    }
}

/// 汇总并记录样本统计，无样本时只记录提示
pub fn summarize(samples: &[f64]) -> Option<TimingStats> {
    match TimingStats::from_samples(samples) {
        Some(stats) => {
            stats.log();
            Some(stats)
        }
        None => {
            info!("计时预算内没有完成任何样本 (no samples)");
            None
        }
    }
}
