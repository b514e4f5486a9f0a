//! 诊断错误类型
//!
//! 只有配置修补失败会中止整个诊断流程，其余错误都被
//! 记录为报告数据。

use thiserror::Error;

/// Result type alias for diagnostics operations
pub type DiagResult<T> = Result<T, DiagError>;

/// 配置错误
///
/// 表示配置本身不可用：URI 无法解析、端点片段畸形等。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid store URI \"{uri}\": {reason}")]
    InvalidUri { uri: String, reason: String },
    #[error("Malformed endpoint \"{endpoint}\": {reason}")]
    MalformedEndpoint { endpoint: String, reason: String },
    #[error("Invalid configuration key \"{key}\": {reason}")]
    InvalidKey { key: String, reason: String },
}

impl ConfigError {
    pub fn malformed_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// 诊断引擎的致命错误
///
/// 端点探测失败、冒烟测试阶段失败都不在这里：它们作为
/// 数据进入 [`crate::report::DiagnosticsReport`]。
#[derive(Debug, Error)]
pub enum DiagError {
    #[error("Configuration patching failed: {0}")]
    Configuration(#[from] ConfigError),
}
