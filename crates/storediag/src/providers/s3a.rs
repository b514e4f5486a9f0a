//! S3A 存储的诊断提供者
//!
//! 覆盖两个 S3A 特有行为：按 bucket 的配置覆盖
//! （`fs.s3a.bucket.<bucket>.<option>` 落到 `fs.s3a.<option>`），
//! 以及从端点/区域配置推导要探测的服务主机名。

use url::Url;

use crate::config::Configuration;
use crate::error::ConfigError;
use crate::probe::EndpointSpec;
use crate::providers::{DiagnosticsProvider, OptionSpec, ProviderIdentity};
use crate::uri::StoreUri;

pub const ACCESS_KEY: &str = "fs.s3a.access.key";
pub const SECRET_KEY: &str = "fs.s3a.secret.key";
pub const SESSION_TOKEN: &str = "fs.s3a.session.token";
pub const SSE_KEY: &str = "fs.s3a.server-side-encryption.key";
pub const ENDPOINT: &str = "fs.s3a.endpoint";
pub const REGION: &str = "fs.s3a.endpoint.region";
pub const PATH_STYLE_ACCESS: &str = "fs.s3a.path.style.access";
pub const SSL_ENABLED: &str = "fs.s3a.connection.ssl.enabled";
pub const PROXY_HOST: &str = "fs.s3a.proxy.host";
pub const PROXY_PORT: &str = "fs.s3a.proxy.port";
pub const MULTIPART_SIZE: &str = "fs.s3a.multipart.size";
pub const CREDENTIALS_PROVIDER: &str = "fs.s3a.aws.credentials.provider";

/// 按 bucket 覆盖键的公共前缀
const BUCKET_PREFIX: &str = "fs.s3a.bucket.";

/// 全局 S3 服务端点
const DEFAULT_ENDPOINT: &str = "https://s3.amazonaws.com";

/// 显示顺序固定的配置键列表
const OPTIONS: &[OptionSpec] = &[
    OptionSpec::sensitive(ACCESS_KEY),
    OptionSpec::sensitive(SECRET_KEY),
    OptionSpec::sensitive(SESSION_TOKEN),
    OptionSpec::sensitive(SSE_KEY),
    OptionSpec::plain(ENDPOINT),
    OptionSpec::plain(REGION),
    OptionSpec::plain(PATH_STYLE_ACCESS),
    OptionSpec::plain(SSL_ENABLED),
    OptionSpec::plain(PROXY_HOST),
    OptionSpec::plain(PROXY_PORT),
    OptionSpec::plain(MULTIPART_SIZE),
    OptionSpec::plain(CREDENTIALS_PROVIDER),
];

/// S3A 诊断提供者
pub struct S3aProvider {
    bucket: Option<String>,
}

impl S3aProvider {
    pub fn new(uri: &StoreUri) -> Self {
        Self {
            bucket: uri.authority().map(str::to_string),
        }
    }

    /// 服务端点 URL
    ///
    /// 优先显式 `fs.s3a.endpoint`（无 scheme 时按
    /// `fs.s3a.connection.ssl.enabled` 补全），其次区域端点，
    /// 最后是全局端点。
    fn service_endpoint(conf: &Configuration) -> Result<Url, ConfigError> {
        let https = conf
            .get(SSL_ENABLED)
            .map(|v| !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        let endpoint = match conf.get(ENDPOINT) {
            Some(raw) if !raw.is_empty() => {
                if raw.contains("://") {
                    raw.to_string()
                } else {
                    let scheme = if https { "https" } else { "http" };
                    format!("{scheme}://{raw}")
                }
            }
            _ => match conf.get(REGION) {
                Some(region) if !region.is_empty() => {
                    format!("https://s3.{region}.amazonaws.com")
                }
                _ => DEFAULT_ENDPOINT.to_string(),
            },
        };

        let url = Url::parse(&endpoint)
            .map_err(|e| ConfigError::malformed_endpoint(&endpoint, e.to_string()))?;
        if url.host_str().is_none() {
            return Err(ConfigError::malformed_endpoint(&endpoint, "no host"));
        }
        Ok(url)
    }

    /// 代理端点，只解析不连接
    fn proxy_endpoint(conf: &Configuration) -> Result<Option<Url>, ConfigError> {
        let Some(host) = conf.get(PROXY_HOST).filter(|h| !h.is_empty()) else {
            return Ok(None);
        };
        let port = match conf.get(PROXY_PORT) {
            Some(p) => format!(":{p}"),
            None => String::new(),
        };
        let endpoint = format!("http://{host}{port}");
        let url = Url::parse(&endpoint)
            .map_err(|e| ConfigError::malformed_endpoint(&endpoint, e.to_string()))?;
        Ok(Some(url))
    }
}

impl DiagnosticsProvider for S3aProvider {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity {
            name: "S3A filesystem connector".to_string(),
            description: "ASF Filesystem Connector to Amazon S3 Storage and compatible stores"
                .to_string(),
            homepage: "https://hadoop.apache.org/docs/current/hadoop-aws/tools/hadoop-aws/"
                .to_string(),
        }
    }

    fn option_specs(&self) -> &[OptionSpec] {
        OPTIONS
    }

    /// 把本 bucket 的按 bucket 覆盖键落到全局键上
    ///
    /// 初始化时运行库就是这样看配置的：
    /// `fs.s3a.bucket.b.endpoint` 对 bucket `b` 覆盖
    /// `fs.s3a.endpoint`。覆盖键本身保留在视图里。
    fn patch_configuration(&self, conf: &Configuration) -> Result<Configuration, ConfigError> {
        let Some(bucket) = self.bucket.as_deref() else {
            return Ok(conf.clone());
        };
        let prefix = format!("{BUCKET_PREFIX}{bucket}.");

        let mut overrides = Vec::new();
        for (key, value) in conf.iter() {
            let Some(suffix) = key.strip_prefix(prefix.as_str()) else {
                continue;
            };
            if suffix.is_empty() {
                return Err(ConfigError::invalid_key(key, "empty per-bucket option"));
            }
            // 禁止按 bucket 覆盖键的自引用
            if suffix.starts_with("bucket.") {
                return Err(ConfigError::invalid_key(
                    key,
                    "per-bucket option must not name another bucket",
                ));
            }
            overrides.push((format!("fs.s3a.{suffix}"), value.to_string()));
        }

        Ok(conf.apply_overrides(overrides))
    }

    fn endpoints_to_probe(&self, conf: &Configuration) -> Result<Vec<EndpointSpec>, ConfigError> {
        let mut endpoints = vec![EndpointSpec::with_connect(Self::service_endpoint(conf)?)];
        if let Some(proxy) = Self::proxy_endpoint(conf)? {
            endpoints.push(EndpointSpec::resolve_only(proxy));
        }
        Ok(endpoints)
    }
}
