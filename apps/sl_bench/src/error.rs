// apps/sl_bench/src/error.rs

//! 基准驱动错误类型

use sl_config::ConfigError;
use sl_land::LandError;
use thiserror::Error;

/// 基准驱动错误
#[derive(Debug, Error)]
pub enum BenchError {
    /// 模型装配或积分失败
    #[error(transparent)]
    Land(#[from] LandError),

    /// 配置错误（包括非法剖析模式）
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 输出文件读写失败
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 火焰图或设备剖析记录生成失败
    #[error("剖析输出失败: {0}")]
    Profiling(String),

    /// 平均耗时超出基线容差带
    #[error("性能回归断言失败: 平均 {mean} s 不在 [{lower}, {upper}] 内 (基线 {baseline} s, 标准差 {stddev} s)")]
    RegressionAssertion {
        /// 平均耗时
        mean: f64,
        /// 基线
        baseline: f64,
        /// 标准差
        stddev: f64,
        /// 下界
        lower: f64,
        /// 上界
        upper: f64,
    },
}

/// 基准驱动结果类型
pub type BenchResult<T> = Result<T, BenchError>;

impl BenchError {
    /// 便捷构造：剖析失败
    pub fn profiling(message: impl Into<String>) -> Self {
        Self::Profiling(message.into())
    }
}
