//! 端点探测
//!
//! 对提供者声明的每个端点做 DNS 解析，必要时再做一次有界的
//! TCP 连接。所有失败都折叠进 [`ProbeResult`]，探测本身从不
//! 返回错误。

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tokio::net::{lookup_host, TcpStream};
use tracing::debug;
use url::Url;

/// 单个待探测端点
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    /// 端点 URI，主机名必须存在
    pub url: Url,
    /// 解析成功后是否再尝试 TCP 连接
    pub connect: bool,
}

impl EndpointSpec {
    pub fn resolve_only(url: Url) -> Self {
        Self {
            url,
            connect: false,
        }
    }

    pub fn with_connect(url: Url) -> Self {
        Self { url, connect: true }
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// 显式端口或 scheme 的默认端口
    pub fn port(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }
}

/// 探测结局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeOutcome {
    Success,
    ResolutionFailure,
    ConnectFailure,
}

/// 单个端点的探测结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    /// 被探测的端点
    pub endpoint: String,
    /// 规范主机名（即解析所用的主机名）
    pub canonical_host: String,
    /// 解析出的地址，按解析器返回顺序
    pub addresses: Vec<IpAddr>,
    pub outcome: ProbeOutcome,
    pub elapsed: Duration,
    /// 失败时的错误细节
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        self.outcome == ProbeOutcome::Success
    }
}

/// DNS 解析与连接能力
///
/// 探测逻辑只通过这个接口接触网络，测试用注入失败的替身。
/// 超时由实现方保证有界，探测逻辑不再包一层。
#[async_trait]
pub trait Resolver: Send + Sync {
    /// 解析主机名，失败即解析失败
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>>;

    /// 尝试建立一次 TCP 连接
    async fn connect(&self, addr: SocketAddr) -> io::Result<()>;
}

/// 基于 tokio 的系统解析器
pub struct SystemResolver {
    /// 连接尝试的超时上限
    pub connect_timeout: Duration,
}

impl SystemResolver {
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>> {
        let addrs = lookup_host((host, port)).await?;
        let mut ips = Vec::new();
        for addr in addrs {
            // 保序去重
            if !ips.contains(&addr.ip()) {
                ips.push(addr.ip());
            }
        }
        if ips.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses found for {host}"),
            ));
        }
        Ok(ips)
    }

    async fn connect(&self, addr: SocketAddr) -> io::Result<()> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {addr} timed out"),
                )
            })??;
        drop(stream);
        Ok(())
    }
}

/// 探测单个端点
///
/// 解析失败短路为 `resolution-failure`；解析成功且要求连接时，
/// 对第一个地址做一次连接，失败记为 `connect-failure`。
pub async fn probe(resolver: &dyn Resolver, spec: &EndpointSpec) -> ProbeResult {
    let started = Instant::now();
    let endpoint = spec.url.to_string();
    let host = spec.host().unwrap_or_default().to_string();
    let port = spec.port().unwrap_or(0);

    debug!(endpoint = %endpoint, "probing endpoint");

    // 空地址列表等同解析失败，不让自定义解析器报出空洞的成功
    let addresses = match resolver.resolve(&host, port).await {
        Ok(addrs) if !addrs.is_empty() => addrs,
        Ok(_) => {
            return ProbeResult {
                endpoint,
                canonical_host: host.clone(),
                addresses: Vec::new(),
                outcome: ProbeOutcome::ResolutionFailure,
                elapsed: started.elapsed(),
                error: Some(format!("no addresses found for {host}")),
            };
        }
        Err(e) => {
            return ProbeResult {
                endpoint,
                canonical_host: host,
                addresses: Vec::new(),
                outcome: ProbeOutcome::ResolutionFailure,
                elapsed: started.elapsed(),
                error: Some(e.to_string()),
            };
        }
    };

    let mut outcome = ProbeOutcome::Success;
    let mut error = None;
    if spec.connect {
        if let Some(ip) = addresses.first() {
            if let Err(e) = resolver.connect(SocketAddr::new(*ip, port)).await {
                outcome = ProbeOutcome::ConnectFailure;
                error = Some(e.to_string());
            }
        }
    }

    ProbeResult {
        endpoint,
        canonical_host: host,
        addresses,
        outcome,
        elapsed: started.elapsed(),
        error,
    }
}

/// 并发探测全部端点，结果按声明顺序合并
pub async fn probe_all(resolver: &dyn Resolver, specs: &[EndpointSpec]) -> Vec<ProbeResult> {
    join_all(specs.iter().map(|spec| probe(resolver, spec))).await
}
