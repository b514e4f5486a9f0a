//! 深度列表
//!
//! 递归遍历存储中的一个路径，对每个文件回调一次，并把计数、
//! 字节数折叠成统计。目录列表被当作惰性产生的有限序列消费，
//! 统计在遍历状态里累积，不需要任何共享计数器。

use std::io;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::fs::StoreFs;

/// 深度列表里的一个文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedFile {
    /// 相对存储根的路径
    pub path: String,
    pub size: u64,
}

/// 一次遍历的统计结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingStats {
    pub files: usize,
    pub directories: usize,
    pub total_bytes: u64,
    /// 第一个文件出现时的耗时
    pub first_file: Option<Duration>,
    pub elapsed: Duration,
}

impl ListingStats {
    /// 平均每个文件的耗时（毫秒）
    pub fn millis_per_file(&self) -> f64 {
        if self.files == 0 {
            0.0
        } else {
            self.elapsed.as_millis() as f64 / self.files as f64
        }
    }

    /// 平均每个文件的字节数
    pub fn bytes_per_file(&self) -> u64 {
        if self.files == 0 {
            0
        } else {
            self.total_bytes / self.files as u64
        }
    }
}

struct WalkState {
    started: Instant,
    files: usize,
    directories: usize,
    total_bytes: u64,
    first_file: Option<Duration>,
}

/// 递归遍历 `path` 下的全部文件
///
/// 深度优先、目录项按存储返回的顺序；每发现一个文件就以
/// 从 1 开始的序号调用一次 `visit`。遍历中的 I/O 错误直接
/// 向上传播。
pub fn list_files<F>(fs: &dyn StoreFs, path: &str, mut visit: F) -> io::Result<ListingStats>
where
    F: FnMut(usize, &ListedFile),
{
    let mut state = WalkState {
        started: Instant::now(),
        files: 0,
        directories: 0,
        total_bytes: 0,
        first_file: None,
    };
    walk(fs, path.trim_end_matches('/'), &mut state, &mut visit)?;
    Ok(ListingStats {
        files: state.files,
        directories: state.directories,
        total_bytes: state.total_bytes,
        first_file: state.first_file,
        elapsed: state.started.elapsed(),
    })
}

fn walk<F>(fs: &dyn StoreFs, dir: &str, state: &mut WalkState, visit: &mut F) -> io::Result<()>
where
    F: FnMut(usize, &ListedFile),
{
    for entry in fs.list(if dir.is_empty() { "/" } else { dir })? {
        let child = if dir.is_empty() {
            entry.name.clone()
        } else {
            format!("{dir}/{}", entry.name)
        };
        if entry.is_dir {
            state.directories += 1;
            walk(fs, &child, state, visit)?;
        } else {
            state.files += 1;
            state.total_bytes += entry.size;
            if state.first_file.is_none() {
                state.first_file = Some(state.started.elapsed());
            }
            let file = ListedFile {
                path: child,
                size: entry.size,
            };
            visit(state.files, &file);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryStore;
    use std::io::Write;

    fn put(store: &MemoryStore, path: &str, bytes: &[u8]) {
        let mut w = store.create(path, true).unwrap();
        w.write_all(bytes).unwrap();
        w.flush().unwrap();
    }

    fn sample_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.mkdirs("a/nested").unwrap();
        store.mkdirs("b").unwrap();
        put(&store, "a/one", b"12345");
        put(&store, "a/nested/two", b"1234567890");
        put(&store, "b/three", b"1");
        store
    }

    #[test]
    fn test_fold_accumulates_count_and_size() {
        let store = sample_store();
        let stats = list_files(&store, "/", |_, _| {}).unwrap();
        assert_eq!(stats.files, 3);
        assert_eq!(stats.directories, 3);
        assert_eq!(stats.total_bytes, 16);
        assert!(stats.first_file.is_some());
        assert_eq!(stats.bytes_per_file(), 5);
    }

    #[test]
    fn test_visit_order_is_depth_first_with_one_based_index() {
        let store = sample_store();
        let mut seen = Vec::new();
        list_files(&store, "/", |n, file| seen.push((n, file.path.clone()))).unwrap();
        assert_eq!(
            seen,
            vec![
                (1, "a/nested/two".to_string()),
                (2, "a/one".to_string()),
                (3, "b/three".to_string()),
            ]
        );
    }

    #[test]
    fn test_subtree_listing() {
        let store = sample_store();
        let stats = list_files(&store, "a/nested", |_, _| {}).unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.total_bytes, 10);
        assert_eq!(stats.directories, 0);
    }

    #[test]
    fn test_empty_store_has_no_first_file() {
        let store = MemoryStore::new();
        let stats = list_files(&store, "/", |_, _| {}).unwrap();
        assert_eq!(stats.files, 0);
        assert_eq!(stats.first_file, None);
        assert_eq!(stats.millis_per_file(), 0.0);
        assert_eq!(stats.bytes_per_file(), 0);
    }

    #[test]
    fn test_missing_path_propagates_error() {
        let store = MemoryStore::new();
        assert!(list_files(&store, "missing", |_, _| {}).is_err());
    }
}
