// crates/sl_config/src/benchmark.rs

//! 基准测试配置

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 基准测试配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// 最大计时样本数
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    /// 计时采样总预算 [s]，在两次采样之间检查
    #[serde(default = "default_max_profiling_seconds")]
    pub max_profiling_seconds: f64,

    /// 输出目录前缀，实际目录为 `{prefix}_{cpu|gpu}`
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// 历史最佳平均耗时 [s]
    #[serde(default = "default_previous_best_time")]
    pub previous_best_time: f64,

    /// 标识 CI 流水线的环境变量名
    #[serde(default = "default_ci_pipeline_env")]
    pub ci_pipeline_env: String,

    /// 启用回归断言的流水线名
    #[serde(default = "default_ci_pipeline_name")]
    pub ci_pipeline_name: String,

    /// nsight 模式下执行的离散步数
    #[serde(default = "default_nsight_steps")]
    pub nsight_steps: usize,
}

fn default_max_samples() -> usize { 100 }
fn default_max_profiling_seconds() -> f64 { 500.0 }
fn default_output_prefix() -> String { "snowy_land_benchmark".to_string() }
fn default_previous_best_time() -> f64 { 0.67 }
fn default_ci_pipeline_env() -> String { "BUILDKITE_PIPELINE_SLUG".to_string() }
fn default_ci_pipeline_name() -> String { "snowyland-benchmark".to_string() }
fn default_nsight_steps() -> usize { 4 }

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            max_samples: default_max_samples(),
            max_profiling_seconds: default_max_profiling_seconds(),
            output_prefix: default_output_prefix(),
            previous_best_time: default_previous_best_time(),
            ci_pipeline_env: default_ci_pipeline_env(),
            ci_pipeline_name: default_ci_pipeline_name(),
            nsight_steps: default_nsight_steps(),
        }
    }
}

impl BenchmarkConfig {
    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_profiling_seconds < 0.0 {
            return Err(ConfigError::invalid(
                "max_profiling_seconds",
                self.max_profiling_seconds,
                "时间预算不能为负",
            ));
        }
        if self.previous_best_time <= 0.0 {
            return Err(ConfigError::invalid(
                "previous_best_time",
                self.previous_best_time,
                "基线耗时必须为正",
            ));
        }
        if self.output_prefix.is_empty() {
            return Err(ConfigError::Missing("output_prefix".to_string()));
        }
        Ok(())
    }

    /// 给定环境变量取值时，是否处于启用回归断言的 CI 流水线
    pub fn regression_gate_active(&self, pipeline: Option<&str>) -> bool {
        pipeline == Some(self.ci_pipeline_name.as_str())
    }

    /// 从当前进程环境判断回归断言是否启用
    pub fn regression_gate_from_env(&self) -> bool {
        let value = std::env::var(&self.ci_pipeline_env).ok();
        self.regression_gate_active(value.as_deref())
    }
}
