//! 诊断提供者
//!
//! 每个存储 scheme 一个提供者：声明身份信息、关心的配置键、
//! 初始化前的配置修补和需要探测的网络端点。未注册的 scheme
//! 落到默认提供者，诊断从不因为存储类型不被识别而失败。

pub mod s3a;

use serde::Serialize;

use crate::config::Configuration;
use crate::error::ConfigError;
use crate::probe::EndpointSpec;
use crate::uri::StoreUri;

pub use s3a::S3aProvider;

/// 提供者身份信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderIdentity {
    /// 存储类型名称
    pub name: String,
    /// 补充描述，可为空
    pub description: String,
    /// 文档主页，可为空
    pub homepage: String,
}

/// 提供者声明的单个配置键
///
/// `sensitive` 为真的值在报告中会被脱敏。同一提供者的键
/// 互不重复，声明顺序即显示顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSpec {
    pub key: &'static str,
    pub sensitive: bool,
}

impl OptionSpec {
    pub const fn plain(key: &'static str) -> Self {
        Self {
            key,
            sensitive: false,
        }
    }

    pub const fn sensitive(key: &'static str) -> Self {
        Self {
            key,
            sensitive: true,
        }
    }
}

/// 按 scheme 特化的诊断逻辑
///
/// 实现必须无状态（构造后不再变化），修补和端点计算都是
/// 确定性的纯计算。
pub trait DiagnosticsProvider: Send + Sync {
    /// 静态身份信息
    fn identity(&self) -> ProviderIdentity;

    /// 该存储类型关心的配置键，按显示顺序
    fn option_specs(&self) -> &[OptionSpec] {
        &[]
    }

    /// 把原始配置修补成初始化时真正生效的视图
    ///
    /// 例如把按 bucket 的覆盖键落到全局键上。失败即
    /// [`ConfigError`]，是整个诊断中唯一的致命错误。
    fn patch_configuration(&self, conf: &Configuration) -> Result<Configuration, ConfigError> {
        Ok(conf.clone())
    }

    /// 需要做 DNS 解析（可选再做连接）的端点列表
    ///
    /// 以修补后的配置为输入；畸形的 URI 片段返回
    /// [`ConfigError::MalformedEndpoint`]。
    fn endpoints_to_probe(&self, conf: &Configuration) -> Result<Vec<EndpointSpec>, ConfigError> {
        let _ = conf;
        Ok(Vec::new())
    }
}

/// 未识别 scheme 的兜底提供者
///
/// 空的配置键列表、空端点、恒等修补。
pub struct DefaultProvider {
    scheme: String,
}

impl DefaultProvider {
    pub fn new(uri: &StoreUri) -> Self {
        Self {
            scheme: uri.scheme().to_string(),
        }
    }
}

impl DiagnosticsProvider for DefaultProvider {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity {
            name: format!("Store for scheme {}", self.scheme),
            description: String::new(),
            homepage: String::new(),
        }
    }
}

/// 提供者构造函数
pub type ProviderCtor = fn(&StoreUri) -> Box<dyn DiagnosticsProvider>;

/// scheme 到提供者的静态注册表
///
/// 精确匹配 scheme；未命中返回 [`DefaultProvider`]。
pub struct ProviderRegistry {
    entries: Vec<(&'static str, ProviderCtor)>,
}

impl ProviderRegistry {
    /// 空注册表
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// 内置注册表，当前只有 s3a 特化
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("s3a", |uri| Box::new(S3aProvider::new(uri)));
        registry
    }

    /// 注册或覆盖一个 scheme 的提供者
    pub fn register(&mut self, scheme: &'static str, ctor: ProviderCtor) {
        if let Some(entry) = self.entries.iter_mut().find(|(s, _)| *s == scheme) {
            entry.1 = ctor;
        } else {
            self.entries.push((scheme, ctor));
        }
    }

    /// 按 URI 的 scheme 选择提供者
    pub fn select(&self, uri: &StoreUri) -> Box<dyn DiagnosticsProvider> {
        self.entries
            .iter()
            .find(|(scheme, _)| *scheme == uri.scheme())
            .map(|(_, ctor)| ctor(uri))
            .unwrap_or_else(|| Box::new(DefaultProvider::new(uri)))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> StoreUri {
        StoreUri::parse(s).unwrap()
    }

    #[test]
    fn test_default_provider_is_total_noop() {
        let provider = DefaultProvider::new(&uri("unknown-scheme://host/p"));
        let conf = Configuration::new().with("some.key", "value");

        assert_eq!(
            provider.identity().name,
            "Store for scheme unknown-scheme"
        );
        assert!(provider.option_specs().is_empty());
        assert_eq!(provider.patch_configuration(&conf).unwrap(), conf);
        assert!(provider.endpoints_to_probe(&conf).unwrap().is_empty());
    }

    #[test]
    fn test_registry_selects_by_exact_scheme() {
        let registry = ProviderRegistry::builtin();
        let provider = registry.select(&uri("s3a://bucket/"));
        assert_eq!(provider.identity().name, "S3A filesystem connector");
    }

    #[test]
    fn test_registry_falls_back_to_default() {
        let registry = ProviderRegistry::builtin();
        let provider = registry.select(&uri("gs://bucket/"));
        assert_eq!(provider.identity().name, "Store for scheme gs");
    }

    #[test]
    fn test_register_overrides_existing_scheme() {
        let mut registry = ProviderRegistry::builtin();
        registry.register("s3a", |u| Box::new(DefaultProvider::new(u)));
        let provider = registry.select(&uri("s3a://bucket/"));
        assert_eq!(provider.identity().name, "Store for scheme s3a");
    }

    #[test]
    fn test_option_spec_uniqueness_in_builtin_providers() {
        let registry = ProviderRegistry::builtin();
        let provider = registry.select(&uri("s3a://bucket/"));
        let specs = provider.option_specs();
        let mut keys: Vec<_> = specs.iter().map(|s| s.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), specs.len());
    }
}
