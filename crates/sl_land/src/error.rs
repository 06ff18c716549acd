// crates/sl_land/src/error.rs

//! 模型层错误类型
//!
//! - [`DataAccessError`]: 外部数据集路径无法解析或读取，原样向上传播
//! - [`LandError`]: 模型层统一错误，包含配置错误、数据访问错误和求解错误

use std::path::PathBuf;
use thiserror::Error;

pub use sl_config::ConfigError;

/// 模型层结果类型
pub type LandResult<T> = Result<T, LandError>;

/// 数据访问错误
#[derive(Debug, Error)]
pub enum DataAccessError {
    /// 数据集路径不存在
    #[error("数据集不存在: {path}")]
    NotFound {
        /// 解析得到的路径
        path: PathBuf,
    },

    /// 数据集无法读取
    #[error("数据集读取失败: {path}")]
    Unreadable {
        /// 数据集路径
        path: PathBuf,
        /// 底层 IO 错误
        #[source]
        source: std::io::Error,
    },

    /// 数据集内容格式错误
    #[error("数据集格式错误: {path}: {message}")]
    Malformed {
        /// 数据集路径
        path: PathBuf,
        /// 错误信息
        message: String,
    },

    /// 数据集中缺少变量
    #[error("数据集 '{dataset}' 缺少变量 '{variable}'")]
    MissingVariable {
        /// 数据集名称
        dataset: String,
        /// 变量名
        variable: String,
    },
}

/// 模型层错误
#[derive(Debug, Error)]
pub enum LandError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Configuration(#[from] ConfigError),

    /// 数据访问错误
    #[error("数据访问错误: {0}")]
    DataAccess(#[from] DataAccessError),

    /// 求解错误
    #[error("求解错误: {message}")]
    Solver {
        /// 错误信息
        message: String,
    },
}

impl LandError {
    /// 便捷构造：求解错误
    pub fn solver(message: impl Into<String>) -> Self {
        Self::Solver {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: LandError = ConfigError::Missing("soil".to_string()).into();
        assert!(matches!(err, LandError::Configuration(_)));
    }

    #[test]
    fn test_data_error_message() {
        let err = DataAccessError::MissingVariable {
            dataset: "era5".to_string(),
            variable: "t2m".to_string(),
        };
        let err: LandError = err.into();
        assert!(err.to_string().contains("t2m"));
    }
}
