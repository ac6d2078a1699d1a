//! Plain directory trees served through the archive capability.

use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::{ArchiveFileSystem, FsError, MAX_MOUNT_DEPTH, Result, VirtualFile};

/// A directory tree opened as a read-only member source.
///
/// Enumeration is bounded: members nested deeper than the configured level
/// count are not listed and do not resolve.
#[derive(Debug, Clone)]
pub struct DirFileSystem {
    root: PathBuf,
    max_depth: usize,
}

impl DirFileSystem {
    /// Open `root` with the default enumeration depth.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_max_depth(root, MAX_MOUNT_DEPTH)
    }

    pub fn with_max_depth(root: impl Into<PathBuf>, max_depth: usize) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(FsError::EntryNotFound);
        }
        Ok(Self { root, max_depth })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a member name onto the backing tree. Names containing traversal
    /// segments or nested beyond the depth bound do not map.
    fn member_path(&self, rel: &str) -> Option<PathBuf> {
        let rel = rel.trim_start_matches('/').trim_end_matches('/');
        if rel.is_empty() {
            return None;
        }
        let segments: Vec<&str> = rel.split('/').collect();
        if segments.len() > self.max_depth {
            return None;
        }
        if segments
            .iter()
            .any(|segment| segment.is_empty() || *segment == "." || *segment == "..")
        {
            return None;
        }
        let mut path = self.root.clone();
        path.extend(segments);
        Some(path)
    }
}

impl ArchiveFileSystem for DirFileSystem {
    fn list_members(&self) -> Vec<String> {
        let mut members = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(self.max_depth)
            .sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(%err, "skipping unreadable directory entry");
                    continue;
                }
            };
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let mut name = rel
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if entry.file_type().is_dir() {
                name.push('/');
            }
            members.push(name);
        }
        members
    }

    fn has_member(&self, rel: &str) -> bool {
        self.member_path(rel).is_some_and(|path| path.is_file())
    }

    fn open_member(&self, rel: &str) -> Result<Box<dyn VirtualFile>> {
        let path = self.member_path(rel).ok_or(FsError::EntryNotFound)?;
        if path.is_dir() {
            return Err(FsError::NotAFile);
        }
        Ok(Box::new(HostFile::open(path)?))
    }
}

/// A host file opened for reading.
#[derive(Debug)]
pub struct HostFile {
    inner: fs::File,
    size: u64,
}

impl HostFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = fs::File::open(path.as_ref())?;
        let size = inner.metadata()?.len();
        Ok(Self { inner, size })
    }
}

impl Read for HostFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for HostFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl VirtualFile for HostFile {
    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_path_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let fs = DirFileSystem::open(dir.path()).unwrap();

        assert!(fs.member_path("../escape.txt").is_none());
        assert!(fs.member_path("sub/../../escape.txt").is_none());
        assert!(fs.member_path("./a.txt").is_none());
        assert!(fs.member_path("").is_none());
    }

    #[test]
    fn member_path_respects_depth_bound() {
        let dir = tempfile::tempdir().unwrap();
        let fs = DirFileSystem::with_max_depth(dir.path(), 2).unwrap();

        assert!(fs.member_path("a/b.txt").is_some());
        assert!(fs.member_path("a/b/c.txt").is_none());
    }

    #[test]
    fn open_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        assert_eq!(DirFileSystem::open(missing).unwrap_err(), FsError::EntryNotFound);
    }
}
