//! StoreDiag 命令行入口
//!
//! 薄胶水层：解析参数、装配配置、选择文件系统实现，把
//! 诊断结果映射成进程退出码。诊断逻辑全部在 `storediag` 库里。

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use tracing::debug;

use storediag::{
    format_diagnostics_report, list_files, Configuration, DiagnosticsEngine, LocalStore,
    MemoryStore, ReportOptions, StoreFs, StoreUri, SystemResolver,
};

// 退出码：0 完全成功；1 报告中有失败；2 配置错误；42 用法错误
const E_FAIL: u8 = 1;
const E_CONFIG: u8 = 2;
const E_USAGE: u8 = 42;

/// 对象/文件存储诊断工具
#[derive(Debug, Parser)]
#[command(name = "storediag", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 对存储运行一次完整诊断
    Diag(DiagArgs),
    /// 递归列出存储中的文件并输出统计
    Listfiles(ListfilesArgs),
}

#[derive(Debug, Args)]
struct DiagArgs {
    /// 目标存储 URI，如 file:///tmp/data
    uri: String,

    /// 追加配置项，可重复：-D key=value
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    define: Vec<String>,

    /// 从 YAML 文件加载扁平的键值配置
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 输出 JSON 报告
    #[arg(long)]
    json: bool,

    /// 详细输出
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ListfilesArgs {
    /// 目标存储 URI，如 file:///tmp/data
    uri: String,

    /// 详细输出
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Command::Diag(args) => args.verbose,
        Command::Listfiles(args) => args.verbose,
    };
    init_tracing(verbose);

    let result = match cli.command {
        Command::Diag(args) => run_diag(args).await,
        Command::Listfiles(args) => run_listfiles(args),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("storediag: {e:#}");
            ExitCode::from(E_USAGE)
        }
    }
}

async fn run_diag(args: DiagArgs) -> Result<ExitCode> {
    let uri = StoreUri::parse(&args.uri).with_context(|| format!("cannot parse {}", args.uri))?;

    let mut conf = match &args.config {
        Some(path) => load_config_file(path)?,
        None => Configuration::new(),
    };
    for define in &args.define {
        let (key, value) = parse_define(define)?;
        conf.set(key, value);
    }
    debug!(entries = conf.len(), "configuration assembled");

    let store = select_store(&uri)?;
    let engine = DiagnosticsEngine::new();
    let resolver = SystemResolver::new();

    let report = match engine.diagnose(&uri, &conf, store.as_ref(), &resolver).await {
        Ok(report) => report,
        Err(e) => {
            // 配置错误中止整个运行，没有部分报告
            eprintln!("storediag: {e}");
            return Ok(ExitCode::from(E_CONFIG));
        }
    };

    let options = ReportOptions {
        verbose: args.verbose,
        json: args.json,
    };
    println!("{}", format_diagnostics_report(&report, &options));

    Ok(if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(E_FAIL)
    })
}

fn run_listfiles(args: ListfilesArgs) -> Result<ExitCode> {
    let uri = StoreUri::parse(&args.uri).with_context(|| format!("cannot parse {}", args.uri))?;
    let store = select_store(&uri)?;

    println!("列出 {uri} 下的文件");
    let stats = match list_files(store.as_ref(), "/", |n, file| {
        println!("[{n}]\t{}\t{}", file.path, file.size);
    }) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("storediag: listing failed: {e}");
            return Ok(ExitCode::from(E_FAIL));
        }
    };

    if let Some(first) = stats.first_file {
        println!("首个文件耗时 {}ms", first.as_millis());
    }
    println!(
        "找到 {} 个文件（{} 个目录），平均每个 {:.0} 毫秒",
        stats.files,
        stats.directories,
        stats.millis_per_file()
    );
    println!(
        "数据量 {} 字节，平均每个文件 {} 字节",
        stats.total_bytes,
        stats.bytes_per_file()
    );
    Ok(ExitCode::SUCCESS)
}

/// 为 URI 挑选文件系统实现
///
/// 对象存储的真实连接器是外部协作者，这个二进制只内置
/// 本地磁盘和内存两种。
fn select_store(uri: &StoreUri) -> Result<Box<dyn StoreFs>> {
    match uri.scheme() {
        "file" => {
            let store = LocalStore::create_rooted(uri.path())
                .with_context(|| format!("cannot open store root {}", uri.path()))?;
            Ok(Box::new(store))
        }
        "memory" => Ok(Box::new(MemoryStore::new())),
        other => bail!(
            "no filesystem implementation for scheme \"{other}\" (supported: file, memory)"
        ),
    }
}

fn parse_define(define: &str) -> Result<(&str, &str)> {
    let Some((key, value)) = define.split_once('=') else {
        bail!("invalid -D option \"{define}\", expected key=value");
    };
    if key.is_empty() {
        bail!("invalid -D option \"{define}\", empty key");
    }
    Ok((key, value))
}

/// 读取扁平的 YAML 键值文件
fn load_config_file(path: &Path) -> Result<Configuration> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let raw: IndexMap<String, serde_yaml::Value> =
        serde_yaml::from_str(&text).with_context(|| format!("cannot parse {}", path.display()))?;

    let mut conf = Configuration::new();
    for (key, value) in raw {
        let value = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Null => String::new(),
            other => bail!(
                "configuration key \"{key}\" in {} has a non-scalar value: {other:?}",
                path.display()
            ),
        };
        conf.set(key, value);
    }
    Ok(conf)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "storediag=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_define() {
        assert_eq!(parse_define("a.key=value").unwrap(), ("a.key", "value"));
        assert_eq!(parse_define("k=a=b").unwrap(), ("k", "a=b"));
        assert_eq!(parse_define("k=").unwrap(), ("k", ""));
        assert!(parse_define("no-equals").is_err());
        assert!(parse_define("=v").is_err());
    }

    #[test]
    fn test_load_config_file_keeps_order_and_scalars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.yaml");
        std::fs::write(
            &path,
            "fs.s3a.endpoint: s3.example.org\nfs.s3a.multipart.size: 104857600\nfs.s3a.path.style.access: true\n",
        )
        .unwrap();

        let conf = load_config_file(&path).unwrap();
        let keys: Vec<_> = conf.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "fs.s3a.endpoint",
                "fs.s3a.multipart.size",
                "fs.s3a.path.style.access"
            ]
        );
        assert_eq!(conf.get("fs.s3a.multipart.size"), Some("104857600"));
        assert_eq!(conf.get("fs.s3a.path.style.access"), Some("true"));
    }

    #[test]
    fn test_load_config_file_rejects_nested_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.yaml");
        std::fs::write(&path, "nested:\n  key: value\n").unwrap();
        assert!(load_config_file(&path).is_err());
    }

    #[test]
    fn test_select_store_unknown_scheme_is_an_error() {
        let uri = StoreUri::parse("s3a://bucket/").unwrap();
        assert!(select_store(&uri).is_err());
    }

    #[test]
    fn test_cli_parses_both_subcommands() {
        let cli = Cli::try_parse_from(["storediag", "diag", "file:///tmp/x", "-D", "k=v"]).unwrap();
        assert!(matches!(cli.command, Command::Diag(_)));

        let cli = Cli::try_parse_from(["storediag", "listfiles", "file:///tmp/x"]).unwrap();
        assert!(matches!(cli.command, Command::Listfiles(_)));
    }
}
