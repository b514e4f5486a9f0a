//! 诊断报告
//!
//! 聚合提供者身份、脱敏后的配置表、端点探测和冒烟测试结果，
//! 组装后不可变。渲染成分节的人类可读文本或 JSON。

use std::time::Duration;

use serde::Serialize;

use crate::probe::ProbeResult;
use crate::providers::ProviderIdentity;
use crate::smoke::SmokeTestReport;

/// 渲染选项
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// 详细模式：显示错误细节和地址列表
    pub verbose: bool,
    /// JSON 输出
    pub json: bool,
}

/// 配置表中的一行
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionReport {
    pub key: String,
    /// 已脱敏的显示值
    pub value: String,
    pub sensitive: bool,
}

/// 环境变量表中的一行
///
/// 值在采集时已按变量名脱敏。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvEntry {
    pub name: String,
    pub value: String,
}

/// 一次诊断运行的完整报告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsReport {
    /// 生成时刻（Unix 秒）
    pub timestamp: i64,
    /// 本工具版本
    pub version: String,
    /// 运行平台
    pub platform: String,
    /// 诊断目标
    pub store_uri: String,
    /// 进程环境变量，按名字排序，敏感值已脱敏
    pub environment: Vec<EnvEntry>,
    /// 提供者身份
    pub provider: ProviderIdentity,
    /// 脱敏后的配置表，按提供者声明顺序
    pub options: Vec<OptionReport>,
    /// 端点探测结果，按声明顺序
    pub probes: Vec<ProbeResult>,
    /// 冒烟测试结果
    pub smoke: SmokeTestReport,
    /// 整体结论：只看冒烟测试阶段 1-6
    pub success: bool,
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{}ms", elapsed.as_millis())
}

/// 格式化诊断报告
pub fn format_diagnostics_report(report: &DiagnosticsReport, options: &ReportOptions) -> String {
    if options.json {
        return serde_json::to_string_pretty(report).unwrap_or_default();
    }

    let mut lines = Vec::new();

    lines.push("╭─────────────────────────────────────────────╮".to_string());
    lines.push("│            存储诊断报告                     │".to_string());
    lines.push("╰─────────────────────────────────────────────╯".to_string());
    lines.push(String::new());
    lines.push(format!("  版本:   {}", report.version));
    lines.push(format!("  平台:   {}", report.platform));
    lines.push(format!("  目标:   {}", report.store_uri));

    if options.verbose && !report.environment.is_empty() {
        lines.push(String::new());
        lines.push("  环境变量:".to_string());
        for entry in &report.environment {
            lines.push(format!("    {} = {}", entry.name, entry.value));
        }
    }

    lines.push(String::new());
    lines.push(format!("  {}", report.provider.name));
    if !report.provider.description.is_empty() {
        lines.push(format!("  {}", report.provider.description));
    }
    if !report.provider.homepage.is_empty() {
        lines.push(format!("  {}", report.provider.homepage));
    }

    if !report.options.is_empty() {
        lines.push(String::new());
        lines.push("  配置选项:".to_string());
        for option in &report.options {
            lines.push(format!("    {} = {}", option.key, option.value));
        }
    }

    if !report.probes.is_empty() {
        lines.push(String::new());
        lines.push("  端点:".to_string());
        for probe in &report.probes {
            let icon = if probe.is_success() { "✓" } else { "✗" };
            let addresses = probe
                .addresses
                .iter()
                .map(|ip| ip.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!(
                "    {} {} ({}) [{}] ({})",
                icon,
                probe.endpoint,
                probe.canonical_host,
                addresses,
                format_elapsed(probe.elapsed)
            ));
            if options.verbose {
                if let Some(ref error) = probe.error {
                    lines.push(format!("      └─ {error}"));
                }
            }
        }
    }

    lines.push(String::new());
    lines.push("  冒烟测试:".to_string());
    for stage in &report.smoke.stages {
        let icon = if stage.is_success() { "✓" } else { "✗" };
        lines.push(format!(
            "    {} {} ({})",
            icon,
            stage.stage.name(),
            format_elapsed(stage.elapsed)
        ));
        if let Some(ref error) = stage.error {
            lines.push(format!("      └─ {error}"));
        }
    }
    if let Some(count) = report.smoke.root_entry_count {
        lines.push(format!("    根目录项数: {count}"));
    }

    lines.push(String::new());
    lines.push("─────────────────────────────────────────────".to_string());
    lines.push(format!(
        "  结论: {}",
        if report.success { "通过" } else { "失败" }
    ));
    lines.push(String::new());

    lines.join("\n")
}
