// crates/sl_config/src/error.rs

//! 配置层错误类型

/// 配置层结果类型
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 配置错误
///
/// 参数缺失、格式错误或定义在错误网格分区上时返回。
/// 构建阶段出现即中止，不重试。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },

    /// 缺失配置
    #[error("缺失配置: {0}")]
    Missing(String),

    /// 参数既没有覆盖值也没有注册默认值
    #[error("参数 '{0}' 既未显式提供，也没有注册默认值")]
    MissingParameter(String),

    /// 字段所在分区与目标分区不一致
    #[error("字段 '{field}' 分区不匹配: 期望 {expected}, 实际 {actual}")]
    PartitionMismatch {
        /// 字段名
        field: String,
        /// 期望的分区
        expected: String,
        /// 实际的分区
        actual: String,
    },

    /// 命令行/配置中的枚举取值非法
    #[error("无效选项 {flag}={value}，可选值: {choices:?}")]
    InvalidChoice {
        /// 参数名
        flag: String,
        /// 传入值
        value: String,
        /// 合法取值
        choices: Vec<&'static str>,
    },
}

impl ConfigError {
    /// 便捷构造：无效值
    pub fn invalid(key: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("dt", -1.0, "必须为正");
        assert!(err.to_string().contains("dt"));
    }

    #[test]
    fn test_partition_mismatch_display() {
        let err = ConfigError::PartitionMismatch {
            field: "ν".to_string(),
            expected: "subsurface".to_string(),
            actual: "surface".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ν"));
        assert!(msg.contains("subsurface"));
    }
}
