//! 存储 URI
//!
//! 解析 `scheme://authority/path` 形式的存储地址，
//! scheme 决定诊断提供者的选择。

use std::fmt;

use serde::Serialize;

use crate::error::ConfigError;

/// 目标存储的 URI，解析后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreUri {
    scheme: String,
    authority: Option<String>,
    path: String,
}

impl StoreUri {
    /// 解析存储 URI
    ///
    /// 要求 `scheme://` 前缀；authority 可以为空（如
    /// `file:///tmp/data`），path 缺省为 `/`。
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidUri {
            uri: input.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| invalid("missing \"://\" separator"))?;
        if scheme.is_empty() {
            return Err(invalid("empty scheme"));
        }
        if !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        {
            return Err(invalid("scheme contains invalid characters"));
        }

        let (authority, path) = match rest.split_once('/') {
            Some((auth, p)) => (auth, format!("/{p}")),
            None => (rest, "/".to_string()),
        };
        let authority = if authority.is_empty() {
            None
        } else {
            Some(authority.to_string())
        };

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            authority,
            path,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// authority 部分，对象存储通常是 bucket 名
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for StoreUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}{}",
            self.scheme,
            self.authority.as_deref().unwrap_or(""),
            self.path
        )
    }
}
