//! The in-memory member source.

use std::collections::BTreeMap;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::{Arc, RwLock};

use crate::{ArchiveFileSystem, FsError, Result, VirtualFile};

/// An in-memory tree of members, used by tests and synthetic sources.
///
/// Cloning is cheap; clones share the same tree.
#[derive(Debug, Default, Clone)]
pub struct MemFileSystem {
    inner: Arc<RwLock<BTreeMap<String, Arc<[u8]>>>>,
}

impl MemFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file member, replacing any existing member of the same name.
    pub fn insert(&self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        let name = name.into().trim_start_matches('/').to_string();
        if let Ok(mut tree) = self.inner.write() {
            tree.insert(name, Arc::from(data.into()));
        }
    }

    /// Insert a directory marker. Directory member names carry a trailing `/`.
    pub fn insert_directory(&self, name: impl Into<String>) {
        let mut name = name.into().trim_start_matches('/').to_string();
        if !name.ends_with('/') {
            name.push('/');
        }
        if let Ok(mut tree) = self.inner.write() {
            tree.insert(name, Arc::from(Vec::new()));
        }
    }
}

impl ArchiveFileSystem for MemFileSystem {
    fn list_members(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|tree| tree.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn has_member(&self, rel: &str) -> bool {
        let rel = rel.trim_start_matches('/');
        if rel.is_empty() || rel.ends_with('/') {
            return false;
        }
        self.inner
            .read()
            .map(|tree| tree.contains_key(rel))
            .unwrap_or(false)
    }

    fn open_member(&self, rel: &str) -> Result<Box<dyn VirtualFile>> {
        let rel = rel.trim_start_matches('/');
        if rel.ends_with('/') {
            return Err(FsError::NotAFile);
        }
        let tree = self.inner.read().map_err(|_| FsError::Lock)?;
        let data = tree.get(rel).ok_or(FsError::EntryNotFound)?.clone();
        Ok(Box::new(MemFile {
            size: data.len() as u64,
            data: Cursor::new(data),
        }))
    }
}

#[derive(Debug)]
struct MemFile {
    data: Cursor<Arc<[u8]>>,
    size: u64,
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl Seek for MemFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.data.seek(pos)
    }
}

impl VirtualFile for MemFile {
    fn size(&self) -> u64 {
        self.size
    }
}
