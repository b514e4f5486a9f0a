//! 文件系统冒烟测试
//!
//! 固定顺序执行 list/create/write/read/delete，验证目标存储的
//! 基本操作在真实路径上可用。所有写入发生在一次性的临时目录
//! 里，最后一个阶段无条件递归删除它，保证不在被测存储上留下
//! 痕迹。

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::fs::StoreFs;

/// 写入并回读校验的标记内容
pub const MARKER_PAYLOAD: &[u8] = b"Hello";

/// 临时目录内测试文件的名字
const SMOKE_FILE: &str = "file";

/// 冒烟测试阶段，顺序固定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    ListRoot,
    CreateDirectory,
    CreateFile,
    ListDirectory,
    ReadFileAndVerify,
    DeleteFile,
    DeleteDirectory,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::ListRoot => "list-root",
            Stage::CreateDirectory => "create-directory",
            Stage::CreateFile => "create-file",
            Stage::ListDirectory => "list-directory",
            Stage::ReadFileAndVerify => "read-file-and-verify",
            Stage::DeleteFile => "delete-file",
            Stage::DeleteDirectory => "delete-directory",
        }
    }

    /// 清理阶段不计入整体结果
    pub fn is_cleanup(&self) -> bool {
        matches!(self, Stage::DeleteDirectory)
    }
}

/// 阶段结局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageOutcome {
    Success,
    Failure,
}

/// 单个阶段的结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResult {
    pub stage: Stage,
    pub outcome: StageOutcome,
    pub elapsed: Duration,
    /// 失败时的错误细节
    pub error: Option<String>,
}

impl StageResult {
    pub fn is_success(&self) -> bool {
        self.outcome == StageOutcome::Success
    }
}

/// 冒烟测试报告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmokeTestReport {
    /// 实际执行过的阶段，按执行顺序
    pub stages: Vec<StageResult>,
    /// 阶段 1 记录的根目录项数
    pub root_entry_count: Option<usize>,
    /// 本次运行使用的临时目录名
    pub scratch_dir: String,
    /// 阶段 1-6 是否全部成功（清理阶段不计入）
    pub passed: bool,
}

impl SmokeTestReport {
    pub fn stage(&self, stage: Stage) -> Option<&StageResult> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

/// 冒烟测试执行器
pub struct SmokeTestRunner;

impl SmokeTestRunner {
    /// 执行完整的冒烟测试序列
    ///
    /// 阶段 1-6 中第一个失败的阶段终止后续非清理阶段；
    /// 阶段 7（递归删除临时目录）在任何退出路径上都恰好
    /// 尝试一次，它的失败只记录、不升级。
    pub fn run(fs: &dyn StoreFs) -> SmokeTestReport {
        let scratch_dir = format!("dir-{}", Uuid::new_v4());
        let mut stages = Vec::new();
        let mut root_entry_count = None;

        Self::run_main_stages(fs, &scratch_dir, &mut stages, &mut root_entry_count);

        // 清理阶段必须执行，即使前面失败
        let cleanup =
            Self::run_stage(&mut stages, Stage::DeleteDirectory, || {
                fs.delete(&scratch_dir, true)
            });
        if cleanup.is_none() {
            warn!(scratch_dir = %scratch_dir, "failed to delete scratch directory");
        }

        let passed = stages
            .iter()
            .filter(|s| !s.stage.is_cleanup())
            .all(StageResult::is_success);

        SmokeTestReport {
            stages,
            root_entry_count,
            scratch_dir,
            passed,
        }
    }

    /// 阶段 1-6，任何失败直接返回
    fn run_main_stages(
        fs: &dyn StoreFs,
        scratch_dir: &str,
        stages: &mut Vec<StageResult>,
        root_entry_count: &mut Option<usize>,
    ) {
        let file_path = format!("{scratch_dir}/{SMOKE_FILE}");

        let Some(count) = Self::run_stage(stages, Stage::ListRoot, || {
            fs.list("/").map(|entries| entries.len())
        }) else {
            return;
        };
        *root_entry_count = Some(count);

        if Self::run_stage(stages, Stage::CreateDirectory, || fs.mkdirs(scratch_dir)).is_none() {
            return;
        }

        if Self::run_stage(stages, Stage::CreateFile, || {
            let mut out = fs.create(&file_path, true)?;
            out.write_all(MARKER_PAYLOAD)?;
            out.flush()
        })
        .is_none()
        {
            return;
        }

        if Self::run_stage(stages, Stage::ListDirectory, || fs.list(scratch_dir)).is_none() {
            return;
        }

        if Self::run_stage(stages, Stage::ReadFileAndVerify, || {
            Self::read_and_verify(fs, &file_path)
        })
        .is_none()
        {
            return;
        }

        Self::run_stage(stages, Stage::DeleteFile, || fs.delete(&file_path, true));
    }

    /// 回读标记文件并逐字节比对
    fn read_and_verify(fs: &dyn StoreFs, path: &str) -> io::Result<()> {
        let mut input = fs.open(path)?;
        let mut actual = Vec::new();
        input.read_to_end(&mut actual)?;
        if actual != MARKER_PAYLOAD {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "expected {path} to contain {:?} but it has {:?}",
                    String::from_utf8_lossy(MARKER_PAYLOAD),
                    String::from_utf8_lossy(&actual)
                ),
            ));
        }
        Ok(())
    }

    /// 计时执行一个阶段并记录结果
    fn run_stage<T>(
        stages: &mut Vec<StageResult>,
        stage: Stage,
        op: impl FnOnce() -> io::Result<T>,
    ) -> Option<T> {
        let started = Instant::now();
        let result = op();
        let elapsed = started.elapsed();
        match result {
            Ok(value) => {
                info!(stage = stage.name(), ?elapsed, "stage completed");
                stages.push(StageResult {
                    stage,
                    outcome: StageOutcome::Success,
                    elapsed,
                    error: None,
                });
                Some(value)
            }
            Err(e) => {
                info!(stage = stage.name(), ?elapsed, error = %e, "stage failed");
                stages.push(StageResult {
                    stage,
                    outcome: StageOutcome::Failure,
                    elapsed,
                    error: Some(e.to_string()),
                });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryStore;

    #[test]
    fn test_happy_path_runs_all_stages_in_order() {
        let store = MemoryStore::new();
        let report = SmokeTestRunner::run(&store);

        assert!(report.passed);
        assert_eq!(report.root_entry_count, Some(0));
        let order: Vec<_> = report.stages.iter().map(|s| s.stage).collect();
        assert_eq!(
            order,
            vec![
                Stage::ListRoot,
                Stage::CreateDirectory,
                Stage::CreateFile,
                Stage::ListDirectory,
                Stage::ReadFileAndVerify,
                Stage::DeleteFile,
                Stage::DeleteDirectory,
            ]
        );
        assert!(report.stages.iter().all(StageResult::is_success));
    }

    #[test]
    fn test_no_scratch_left_behind() {
        let store = MemoryStore::new();
        let report = SmokeTestRunner::run(&store);
        assert!(report.passed);
        assert!(store.list("/").unwrap().is_empty());
    }

    #[test]
    fn test_root_entry_count_sees_existing_entries() {
        let store = MemoryStore::new();
        store.mkdirs("existing").unwrap();
        let report = SmokeTestRunner::run(&store);
        assert_eq!(report.root_entry_count, Some(1));
        // 已有数据不受影响
        assert_eq!(store.list("/").unwrap().len(), 1);
    }

    #[test]
    fn test_stage_names_are_kebab_case() {
        assert_eq!(Stage::ListRoot.name(), "list-root");
        assert_eq!(Stage::ReadFileAndVerify.name(), "read-file-and-verify");
        assert_eq!(Stage::DeleteDirectory.name(), "delete-directory");
    }
}
