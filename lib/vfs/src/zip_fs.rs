//! Zip containers served through the archive capability.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::{ArchiveFileSystem, FsError, Result, VirtualFile};

/// A zip container opened as a read-only member source.
///
/// The central directory is scanned once at open time. Member data is
/// decompressed on demand into an owned buffer and served through a
/// cursor, so a stream stays valid for however long its caller holds it.
pub struct ZipFileSystem {
    source: PathBuf,
    archive: Mutex<ZipArchive<BufReader<File>>>,
    members: Vec<String>,
}

impl ZipFileSystem {
    /// Open a container file and scan its central directory.
    pub fn open(source: impl AsRef<Path>) -> Result<Self> {
        let source = source.as_ref().to_path_buf();
        let file = File::open(&source)?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(zip_error)?;
        let mut members: Vec<String> = archive.file_names().map(str::to_owned).collect();
        members.sort();
        debug!(source = %source.display(), members = members.len(), "opened zip container");
        Ok(Self {
            source,
            archive: Mutex::new(archive),
            members,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl fmt::Debug for ZipFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipFileSystem")
            .field("source", &self.source)
            .field("members", &self.members.len())
            .finish()
    }
}

impl ArchiveFileSystem for ZipFileSystem {
    fn list_members(&self) -> Vec<String> {
        self.members.clone()
    }

    fn has_member(&self, rel: &str) -> bool {
        let rel = rel.trim_start_matches('/');
        if rel.is_empty() || rel.ends_with('/') {
            return false;
        }
        self.members
            .binary_search_by(|member| member.as_str().cmp(rel))
            .is_ok()
    }

    fn open_member(&self, rel: &str) -> Result<Box<dyn VirtualFile>> {
        let rel = rel.trim_start_matches('/');
        let mut archive = self.archive.lock().map_err(|_| FsError::Lock)?;
        let mut entry = archive.by_name(rel).map_err(zip_error)?;
        if entry.is_dir() {
            return Err(FsError::NotAFile);
        }
        let size = entry.size();
        let mut data = Vec::with_capacity(size as usize);
        entry.read_to_end(&mut data)?;
        Ok(Box::new(ZipMemberFile {
            size,
            data: Cursor::new(data),
        }))
    }
}

fn zip_error(err: ZipError) -> FsError {
    match err {
        ZipError::Io(err) => err.into(),
        ZipError::FileNotFound => FsError::EntryNotFound,
        ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_) => FsError::InvalidData,
        _ => FsError::UnknownError,
    }
}

#[derive(Debug)]
struct ZipMemberFile {
    data: Cursor<Vec<u8>>,
    size: u64,
}

impl Read for ZipMemberFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl Seek for ZipMemberFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.data.seek(pos)
    }
}

impl VirtualFile for ZipMemberFile {
    fn size(&self) -> u64 {
        self.size
    }
}
