// crates/sl_config/src/profiler.rs

//! 剖析模式选择

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

/// 基准测试剖析模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfilerMode {
    /// 计时统计 + 火焰图（GPU 上为设备剖析记录）
    #[default]
    Flamegraph,
    /// 交给外部底层剖析器，只执行固定步数
    Nsight,
}

impl ProfilerMode {
    /// 所有合法取值
    pub const CHOICES: [&'static str; 2] = ["flamegraph", "nsight"];

    /// 模式名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Flamegraph => "flamegraph",
            Self::Nsight => "nsight",
        }
    }
}

impl std::fmt::Display for ProfilerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ProfilerMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flamegraph" => Ok(Self::Flamegraph),
            "nsight" => Ok(Self::Nsight),
            other => Err(ConfigError::InvalidChoice {
                flag: "--profiler".to_string(),
                value: other.to_string(),
                choices: Self::CHOICES.to_vec(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_flamegraph() {
        assert_eq!(ProfilerMode::default(), ProfilerMode::Flamegraph);
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!("nsight".parse::<ProfilerMode>().unwrap(), ProfilerMode::Nsight);
        assert_eq!("flamegraph".parse::<ProfilerMode>().unwrap(), ProfilerMode::Flamegraph);
    }

    #[test]
    fn test_invalid_mode() {
        let err = "invalid_value".parse::<ProfilerMode>().unwrap_err();
        match err {
            ConfigError::InvalidChoice { value, choices, .. } => {
                assert_eq!(value, "invalid_value");
                assert_eq!(choices, vec!["flamegraph", "nsight"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
