//! Read-only filesystem capabilities over heterogeneous asset sources.
//!
//! Every source that can be mounted into the logical namespace (a zip
//! container, a plain directory tree, an in-memory tree) implements
//! [`ArchiveFileSystem`] and hands out [`VirtualFile`] streams for its
//! members. Member names are relative to the source root, use `/` as the
//! separator and carry a trailing `/` when they name a directory.

use std::fmt;
use std::io::{self, Read, Seek};

use thiserror::Error;
use tracing::debug;

mod host_dir;
mod mem_fs;
mod zip_fs;

pub use host_dir::{DirFileSystem, HostFile};
pub use mem_fs::MemFileSystem;
pub use zip_fs::ZipFileSystem;

pub type Result<T> = std::result::Result<T, FsError>;

/// How many directory levels a directory-backed source enumerates. Members
/// nested deeper than this are invisible to membership and search.
pub const MAX_MOUNT_DEPTH: usize = 6;

/// A lazy, seekable read handle over a single member.
///
/// Handles are owned by the caller; the source keeps no reference to them
/// and cannot invalidate one once issued.
pub trait VirtualFile: fmt::Debug + Read + Seek + Send {
    /// The size of the member in bytes, as reported by the source.
    fn size(&self) -> u64;
}

/// A read-only source of named members.
pub trait ArchiveFileSystem: fmt::Debug + Send + Sync {
    /// All member names, directories carrying a trailing `/`.
    fn list_members(&self) -> Vec<String>;

    /// Whether `rel` names a file member. Directories do not count.
    fn has_member(&self, rel: &str) -> bool;

    /// Open a read stream over the member at `rel`.
    fn open_member(&self, rel: &str) -> Result<Box<dyn VirtualFile>>;

    /// All member names matching a glob pattern. An unparseable pattern
    /// matches nothing.
    fn list_matching(&self, pattern: &str) -> Vec<String> {
        match glob::Pattern::new(pattern) {
            Ok(pattern) => self
                .list_members()
                .into_iter()
                .filter(|name| pattern.matches(name))
                .collect(),
            Err(err) => {
                debug!(pattern, %err, "invalid member pattern");
                Vec::new()
            }
        }
    }
}

/// Error type for external users
#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum FsError {
    /// The requested member could not be found
    #[error("entity not found")]
    EntryNotFound,
    /// Expected a file but found not a file
    #[error("not a file")]
    NotAFile,
    /// Invalid internal data, if the argument data is invalid, use `InvalidInput`
    #[error("invalid internal data")]
    InvalidData,
    /// The provided data is invalid
    #[error("invalid input")]
    InvalidInput,
    /// Caller was not allowed to perform this operation
    #[error("permission denied")]
    PermissionDenied,
    /// Found EOF when EOF was not expected
    #[error("unexpected eof")]
    UnexpectedEof,
    /// Something failed when doing IO. These errors can generally not be handled.
    /// It may work if tried again.
    #[error("io error")]
    IOError,
    /// A lock over the source state was poisoned
    #[error("lock poisoned")]
    Lock,
    /// Some other unhandled error. If you see this, it's probably a bug.
    #[error("unknown error found")]
    UnknownError,
}

impl From<io::Error> for FsError {
    fn from(io_error: io::Error) -> Self {
        match io_error.kind() {
            io::ErrorKind::NotFound => FsError::EntryNotFound,
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied,
            io::ErrorKind::InvalidData => FsError::InvalidData,
            io::ErrorKind::InvalidInput => FsError::InvalidInput,
            io::ErrorKind::UnexpectedEof => FsError::UnexpectedEof,
            io::ErrorKind::Other => FsError::IOError,
            _ => FsError::UnknownError,
        }
    }
}
