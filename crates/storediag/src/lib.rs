//! StoreDiag - 对象/文件存储诊断引擎
//!
//! 在向存储提交大型作业之前，先报告它的配置、依赖的网络
//! 端点，并验证基本的读写/列目录/删除操作是否可用，把昂贵
//! 的配置错误提前暴露出来。

pub mod config;
pub mod engine;
pub mod error;
pub mod fs;
pub mod listing;
pub mod probe;
pub mod providers;
pub mod report;
pub mod sanitize;
pub mod smoke;
pub mod uri;

pub use config::Configuration;
pub use engine::DiagnosticsEngine;
pub use error::{ConfigError, DiagError, DiagResult};
pub use fs::{LocalStore, MemoryStore, StoreEntry, StoreFs};
pub use listing::{list_files, ListedFile, ListingStats};
pub use probe::{EndpointSpec, ProbeOutcome, ProbeResult, Resolver, SystemResolver};
pub use providers::{
    DefaultProvider, DiagnosticsProvider, OptionSpec, ProviderIdentity, ProviderRegistry,
};
pub use report::{
    format_diagnostics_report, DiagnosticsReport, EnvEntry, OptionReport, ReportOptions,
};
pub use sanitize::{redact, UNSET_MARKER};
pub use smoke::{SmokeTestReport, SmokeTestRunner, Stage, StageOutcome, StageResult};
pub use uri::StoreUri;
