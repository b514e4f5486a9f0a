//! 诊断引擎
//!
//! 编排整个诊断流程：选提供者 → 修补配置 → 脱敏配置表 →
//! 端点探测 → 冒烟测试 → 组装报告。除配置修补外的每一步
//! 都各自容错，失败以数据形式进入报告。

use tracing::{debug, info};

use crate::config::Configuration;
use crate::error::DiagResult;
use crate::fs::StoreFs;
use crate::probe::{probe_all, Resolver};
use crate::providers::ProviderRegistry;
use crate::report::{DiagnosticsReport, EnvEntry, OptionReport};
use crate::sanitize::redact;
use crate::smoke::SmokeTestRunner;
use crate::uri::StoreUri;

/// 诊断引擎
pub struct DiagnosticsEngine {
    registry: ProviderRegistry,
}

impl DiagnosticsEngine {
    /// 使用内置提供者注册表
    pub fn new() -> Self {
        Self {
            registry: ProviderRegistry::builtin(),
        }
    }

    /// 使用自定义注册表
    pub fn with_registry(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    /// 对一个存储执行一次完整诊断
    ///
    /// 唯一的致命错误是提供者修补配置失败
    /// （[`crate::error::DiagError::Configuration`]）：后续步骤
    /// 都依赖一致的配置视图。端点探测失败和冒烟测试阶段失败
    /// 只记录进报告；`success` 只反映冒烟测试阶段 1-6。
    pub async fn diagnose(
        &self,
        uri: &StoreUri,
        conf: &Configuration,
        store: &dyn StoreFs,
        resolver: &dyn Resolver,
    ) -> DiagResult<DiagnosticsReport> {
        info!(uri = %uri, "starting store diagnostics");

        let provider = self.registry.select(uri);
        let identity = provider.identity();
        debug!(provider = %identity.name, "provider selected");

        // 唯一会中止整个运行的步骤
        let patched = provider.patch_configuration(conf)?;

        let options = provider
            .option_specs()
            .iter()
            .map(|spec| OptionReport {
                key: spec.key.to_string(),
                value: redact(patched.get(spec.key), spec.sensitive),
                sensitive: spec.sensitive,
            })
            .collect();

        // 端点列表畸形同属配置错误；探测本身的失败不升级
        let endpoints = provider.endpoints_to_probe(&patched)?;
        debug!(count = endpoints.len(), "probing endpoints");
        let probes = probe_all(resolver, &endpoints).await;

        // 冒烟测试失败不升级
        let smoke = SmokeTestRunner::run(store);
        let success = smoke.passed;
        info!(success, "store diagnostics finished");

        Ok(DiagnosticsReport {
            timestamp: chrono::Utc::now().timestamp(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            store_uri: uri.to_string(),
            environment: collect_environment(),
            provider: identity,
            options,
            probes,
            smoke,
            success,
        })
    }
}

impl Default for DiagnosticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 采集进程环境变量，按名字排序
///
/// 名字像凭证的变量在采集时就脱敏，报告的 JSON 输出里
/// 也不会出现明文。
fn collect_environment() -> Vec<EnvEntry> {
    let mut entries: Vec<EnvEntry> = std::env::vars()
        .map(|(name, value)| {
            let sensitive = looks_sensitive(&name);
            EnvEntry {
                value: redact(Some(&value), sensitive),
                name,
            }
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

fn looks_sensitive(name: &str) -> bool {
    const MARKERS: &[&str] = &["KEY", "SECRET", "TOKEN", "PASSWORD", "CREDENTIAL"];
    let upper = name.to_ascii_uppercase();
    MARKERS.iter().any(|marker| upper.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_is_sorted_by_name() {
        let entries = collect_environment();
        assert!(entries.windows(2).all(|w| w[0].name <= w[1].name));
    }

    #[test]
    fn test_credential_like_variables_are_redacted() {
        std::env::set_var("STOREDIAG_TEST_SECRET", "abcdef");
        let entries = collect_environment();
        let entry = entries
            .iter()
            .find(|e| e.name == "STOREDIAG_TEST_SECRET")
            .unwrap();
        assert_eq!(entry.value, "a****f");
        std::env::remove_var("STOREDIAG_TEST_SECRET");
    }

    #[test]
    fn test_plain_variables_kept_verbatim() {
        std::env::set_var("STOREDIAG_TEST_REGION", "eu-west-1");
        let entries = collect_environment();
        let entry = entries
            .iter()
            .find(|e| e.name == "STOREDIAG_TEST_REGION")
            .unwrap();
        assert_eq!(entry.value, "eu-west-1");
        std::env::remove_var("STOREDIAG_TEST_REGION");
    }
}
