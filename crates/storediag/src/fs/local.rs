//! 本地磁盘存储
//!
//! 以一个目录为存储根的 [`StoreFs`] 实现，CLI 对 `file` URI
//! 使用它，集成测试配合 `tempfile` 使用。

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use super::{split_path, StoreEntry, StoreFs};

/// 根在某个本地目录下的存储
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// 打开已有目录作为存储根
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 打开存储根，不存在则创建
    pub fn create_rooted(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let mut full = self.root.clone();
        for segment in split_path(path)? {
            full.push(segment);
        }
        Ok(full)
    }
}

impl StoreFs for LocalStore {
    fn list(&self, path: &str) -> io::Result<Vec<StoreEntry>> {
        let dir = self.resolve(path)?;
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(if meta.is_dir() {
                StoreEntry::dir(name)
            } else {
                StoreEntry::file(name, meta.len())
            });
        }
        // read_dir 的顺序平台相关，排序保证输出可复现
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn mkdirs(&self, path: &str) -> io::Result<()> {
        fs::create_dir_all(self.resolve(path)?)
    }

    fn create(&self, path: &str, overwrite: bool) -> io::Result<Box<dyn Write + Send>> {
        let full = self.resolve(path)?;
        if !overwrite && full.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{path} already exists"),
            ));
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(full)?;
        Ok(Box::new(file))
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        let file = File::open(self.resolve(path)?)?;
        Ok(Box::new(file))
    }

    fn delete(&self, path: &str, recursive: bool) -> io::Result<bool> {
        let full = self.resolve(path)?;
        let meta = match fs::symlink_metadata(&full) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if meta.is_dir() {
            if recursive {
                fs::remove_dir_all(&full)?;
            } else {
                fs::remove_dir(&full)?;
            }
        } else {
            fs::remove_file(&full)?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_create_write_read_round_trip() {
        let (_dir, store) = store();
        store.mkdirs("d").unwrap();
        let mut w = store.create("d/f", true).unwrap();
        w.write_all(b"payload").unwrap();
        w.flush().unwrap();
        drop(w);

        let mut r = store.open("d/f").unwrap();
        let mut buf = Vec::new();
        r.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"payload");
    }

    #[test]
    fn test_create_without_overwrite_refuses_existing() {
        let (_dir, store) = store();
        drop(store.create("f", true).unwrap());
        assert!(store.create("f", false).is_err());
    }

    #[test]
    fn test_list_sorted_with_entry_kinds() {
        let (_dir, store) = store();
        store.mkdirs("zdir").unwrap();
        let mut w = store.create("afile", true).unwrap();
        w.write_all(b"abc").unwrap();
        drop(w);

        let entries = store.list("/").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], StoreEntry::file("afile", 3));
        assert_eq!(entries[1], StoreEntry::dir("zdir"));
    }

    #[test]
    fn test_delete_missing_returns_false() {
        let (_dir, store) = store();
        assert!(!store.delete("missing", true).unwrap());
    }

    #[test]
    fn test_recursive_delete_removes_tree() {
        let (_dir, store) = store();
        store.mkdirs("d/nested").unwrap();
        drop(store.create("d/nested/f", true).unwrap());
        assert!(store.delete("d", true).unwrap());
        assert!(store.list("/").unwrap().is_empty());
    }

    #[test]
    fn test_non_recursive_delete_of_populated_dir_fails() {
        let (_dir, store) = store();
        store.mkdirs("d").unwrap();
        drop(store.create("d/f", true).unwrap());
        assert!(store.delete("d", false).is_err());
    }

    #[test]
    fn test_path_escape_rejected() {
        let (_dir, store) = store();
        assert!(store.list("/../outside").is_err());
    }
}
