//! 存储文件系统能力
//!
//! 冒烟测试只通过这个窄接口接触存储：list、mkdirs、create、
//! open、delete。真正的对象存储实现是外部协作者，这里自带
//! 本地磁盘和内存两个实现，供 CLI 和测试使用。

pub mod local;
pub mod memory;

use std::io::{Read, Write};

use serde::Serialize;

pub use local::LocalStore;
pub use memory::MemoryStore;

/// 目录项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

impl StoreEntry {
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: 0,
        }
    }

    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size,
        }
    }
}

/// 面向存储根的文件系统能力
///
/// 路径为 `/` 分隔、相对存储根的字符串，`"/"` 表示根。
/// 所有传输/权限问题以 `io::Error` 返回。
pub trait StoreFs: Send + Sync {
    /// 列出目录项
    fn list(&self, path: &str) -> std::io::Result<Vec<StoreEntry>>;

    /// 递归创建目录
    fn mkdirs(&self, path: &str) -> std::io::Result<()>;

    /// 创建文件并返回可写流
    fn create(&self, path: &str, overwrite: bool) -> std::io::Result<Box<dyn Write + Send>>;

    /// 打开文件返回可读流
    fn open(&self, path: &str) -> std::io::Result<Box<dyn Read + Send>>;

    /// 删除文件或目录，目标不存在时返回 `Ok(false)`
    fn delete(&self, path: &str, recursive: bool) -> std::io::Result<bool>;
}

/// 把存储路径拆成规范化的段
///
/// 拒绝 `..`，忽略空段和 `.`。
pub(crate) fn split_path(path: &str) -> std::io::Result<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("path {path} escapes the store root"),
                ));
            }
            s => segments.push(s),
        }
    }
    Ok(segments)
}
