//! 内存存储
//!
//! 纯内存的 [`StoreFs`]，用于 scheme 无关的测试夹具和
//! 故障注入包装的底座。

use std::collections::BTreeMap;
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{split_path, StoreEntry, StoreFs};

#[derive(Debug, Clone)]
enum Node {
    Dir(BTreeMap<String, Node>),
    File(Vec<u8>),
}

impl Node {
    fn empty_dir() -> Self {
        Node::Dir(BTreeMap::new())
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{path} not found"))
}

fn not_a_dir(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, format!("{path} is not a directory"))
}

/// 共享树结构的内存存储
#[derive(Clone)]
pub struct MemoryStore {
    root: Arc<RwLock<Node>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            root: Arc::new(RwLock::new(Node::empty_dir())),
        }
    }

    /// 定位路径父目录并对其子表执行 `f`
    fn with_parent<T>(
        &self,
        path: &str,
        f: impl FnOnce(&mut BTreeMap<String, Node>, &str) -> io::Result<T>,
    ) -> io::Result<T> {
        let segments = split_path(path)?;
        let Some((name, parents)) = segments.split_last() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "operation not valid on the store root",
            ));
        };
        let mut guard = self.root.write();
        let mut node = &mut *guard;
        for seg in parents {
            match node {
                Node::Dir(children) => {
                    node = children.get_mut(*seg).ok_or_else(|| not_found(path))?;
                }
                Node::File(_) => return Err(not_a_dir(path)),
            }
        }
        match node {
            Node::Dir(children) => f(children, name),
            Node::File(_) => Err(not_a_dir(path)),
        }
    }
}

impl StoreFs for MemoryStore {
    fn list(&self, path: &str) -> io::Result<Vec<StoreEntry>> {
        let segments = split_path(path)?;
        let guard = self.root.read();
        let mut node = &*guard;
        for seg in &segments {
            match node {
                Node::Dir(children) => {
                    node = children.get(*seg).ok_or_else(|| not_found(path))?;
                }
                Node::File(_) => return Err(not_a_dir(path)),
            }
        }
        match node {
            Node::Dir(children) => Ok(children
                .iter()
                .map(|(name, child)| match child {
                    Node::Dir(_) => StoreEntry::dir(name),
                    Node::File(data) => StoreEntry::file(name, data.len() as u64),
                })
                .collect()),
            Node::File(_) => Err(not_a_dir(path)),
        }
    }

    fn mkdirs(&self, path: &str) -> io::Result<()> {
        let segments = split_path(path)?;
        let mut guard = self.root.write();
        let mut node = &mut *guard;
        for seg in segments {
            match node {
                Node::Dir(children) => {
                    node = children.entry(seg.to_string()).or_insert_with(Node::empty_dir);
                }
                Node::File(_) => return Err(not_a_dir(path)),
            }
        }
        match node {
            Node::Dir(_) => Ok(()),
            Node::File(_) => Err(not_a_dir(path)),
        }
    }

    fn create(&self, path: &str, overwrite: bool) -> io::Result<Box<dyn Write + Send>> {
        self.with_parent(path, |children, name| {
            match children.get(name) {
                Some(Node::Dir(_)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{path} is a directory"),
                    ));
                }
                Some(Node::File(_)) if !overwrite => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{path} already exists"),
                    ));
                }
                _ => {}
            }
            Ok(())
        })?;
        Ok(Box::new(MemWriter {
            store: self.clone(),
            path: path.to_string(),
            buf: Vec::new(),
            committed: false,
        }))
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        let segments = split_path(path)?;
        let guard = self.root.read();
        let mut node = &*guard;
        for seg in &segments {
            match node {
                Node::Dir(children) => {
                    node = children.get(*seg).ok_or_else(|| not_found(path))?;
                }
                Node::File(_) => return Err(not_a_dir(path)),
            }
        }
        match node {
            Node::File(data) => Ok(Box::new(Cursor::new(data.clone()))),
            Node::Dir(_) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{path} is a directory"),
            )),
        }
    }

    fn delete(&self, path: &str, recursive: bool) -> io::Result<bool> {
        self.with_parent(path, |children, name| match children.get(name) {
            None => Ok(false),
            Some(Node::Dir(grandchildren)) if !grandchildren.is_empty() && !recursive => {
                Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{path} is not empty"),
                ))
            }
            Some(_) => {
                children.remove(name);
                Ok(true)
            }
        })
    }
}

/// 写入器：flush 时提交到共享树
struct MemWriter {
    store: MemoryStore,
    path: String,
    buf: Vec<u8>,
    committed: bool,
}

impl MemWriter {
    fn commit(&mut self) -> io::Result<()> {
        let buf = self.buf.clone();
        let path = self.path.clone();
        self.store.with_parent(&path, |children, name| {
            children.insert(name.to_string(), Node::File(buf));
            Ok(())
        })?;
        self.committed = true;
        Ok(())
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        self.committed = false;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit()
    }
}

impl Drop for MemWriter {
    fn drop(&mut self) {
        if !self.committed {
            let _ = self.commit();
        }
    }
}
