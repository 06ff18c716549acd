// crates/sl_config/src/device.rs

//! 计算设备与运行时初始化
//!
//! 设备类型在进程启动时解析一次，此后显式地传递给基准驱动的分支逻辑。
//! 内存池开关作为配置项传给运行时初始化器，而不是修改进程环境变量。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// 设备选择环境变量
pub const DEVICE_ENV: &str = "SNOWYLAND_DEVICE";

/// 计算设备类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// 单线程 CPU
    #[default]
    Cpu,
    /// GPU 类设备
    Gpu,
}

impl DeviceKind {
    /// 设备名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
        }
    }

    /// 是否为 GPU 类设备
    #[inline]
    pub fn is_gpu(&self) -> bool {
        matches!(self, Self::Gpu)
    }

    /// 按设备类型命名的输出目录，例如 `snowy_land_benchmark_cpu`
    pub fn output_dir(&self, prefix: &str) -> PathBuf {
        PathBuf::from(format!("{}_{}", prefix, self.name()))
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DeviceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" | "cuda" => Ok(Self::Gpu),
            other => Err(ConfigError::InvalidChoice {
                flag: DEVICE_ENV.to_string(),
                value: other.to_string(),
                choices: vec!["cpu", "gpu"],
            }),
        }
    }
}

/// 运行时启动配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// 关闭设备内存池
    #[serde(default = "default_true")]
    pub disable_memory_pool: bool,

    /// 请求的设备
    #[serde(default)]
    pub device: DeviceKind,
}

fn default_true() -> bool { true }

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            disable_memory_pool: default_true(),
            device: DeviceKind::default(),
        }
    }
}

impl RuntimeConfig {
    /// 从环境读取设备请求；未设置时使用 CPU
    ///
    /// 仅在进程启动时调用一次。
    pub fn from_env() -> Result<Self, ConfigError> {
        let device = match std::env::var(DEVICE_ENV) {
            Ok(value) => value.parse()?,
            Err(_) => DeviceKind::default(),
        };
        Ok(Self {
            device,
            ..Default::default()
        })
    }
}

/// 已初始化的运行时上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Runtime {
    device: DeviceKind,
    memory_pool: bool,
}

impl Runtime {
    /// 初始化运行时
    pub fn initialize(config: &RuntimeConfig) -> Self {
        let runtime = Self {
            device: config.device,
            memory_pool: !config.disable_memory_pool,
        };
        tracing::info!(
            "运行时初始化: 设备={}, 内存池={}",
            runtime.device,
            if runtime.memory_pool { "启用" } else { "关闭" }
        );
        runtime
    }

    /// 当前设备
    pub fn device(&self) -> DeviceKind {
        self.device
    }

    /// 是否启用内存池
    pub fn memory_pool_enabled(&self) -> bool {
        self.memory_pool
    }
}
