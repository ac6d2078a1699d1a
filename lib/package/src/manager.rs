//! Mounting, resolution and reads over the ordered mount table.

use std::collections::VecDeque;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use assetpack_vfs::{ArchiveFileSystem, DirFileSystem, VirtualFile, ZipFileSystem};
use bitflags::bitflags;
use tracing::{error, info, trace, warn};

use crate::path::{PATH_SEPARATOR, normalize_path, path_filename};
use crate::save::{SAVEGAME_SUFFIX, SaveFileProvider};

/// Eager reads larger than this are logged as an anti-pattern. The read
/// itself still succeeds; content of that size should be streamed instead.
pub const BIG_FILE_WARN_BYTES: u64 = 204_800;

/// What a logical path points at, as far as callers can tell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
}

bitflags! {
    /// Member kinds a search accepts.
    pub struct FileTypeMask: u32 {
        const FILE = 0b01;
        const DIRECTORY = 0b10;
    }
}

struct MountEntry {
    archive: Box<dyn ArchiveFileSystem>,
    mount_path: String,
}

/// A member resolved to the mount that owns it.
pub struct ArchiveMember<'a> {
    archive: &'a dyn ArchiveFileSystem,
    rel_path: String,
}

impl ArchiveMember<'_> {
    /// The member's path relative to its source root.
    pub fn rel_path(&self) -> &str {
        &self.rel_path
    }

    /// Open a lazy read stream over the member. The stream is owned by the
    /// caller and stays valid independently of the manager.
    pub fn create_read_stream(&self) -> assetpack_vfs::Result<Box<dyn VirtualFile>> {
        self.archive.open_member(&self.rel_path)
    }
}

/// One logical path namespace over an ordered stack of mounted sources.
///
/// Mounts are searched in table order and the first mount whose path
/// prefixes the request *and* whose source contains the member wins.
/// Directory mounts are inserted at the head of the table and container
/// mounts at the tail, so a directory always outranks a container; among
/// directories the most recently mounted wins, among containers the
/// earliest. Precedence is strictly mount order, never prefix length.
///
/// Mounts live as long as the manager; there is no unmount.
pub struct PackageManager {
    mounts: VecDeque<MountEntry>,
    current_directory: String,
    root_folder: PathBuf,
    save_provider: Box<dyn SaveFileProvider>,
}

impl fmt::Debug for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageManager")
            .field(
                "mounts",
                &self
                    .mounts
                    .iter()
                    .map(|entry| entry.mount_path.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("current_directory", &self.current_directory)
            .field("root_folder", &self.root_folder)
            .finish()
    }
}

impl PackageManager {
    /// Create an empty manager. `root_folder` is the host location that
    /// anchors relative mount sources; it comes from host configuration
    /// and is fixed for the manager's lifetime.
    pub fn new(root_folder: impl Into<PathBuf>, save_provider: Box<dyn SaveFileProvider>) -> Self {
        Self {
            mounts: VecDeque::new(),
            current_directory: PATH_SEPARATOR.to_string(),
            root_folder: root_folder.into(),
            save_provider,
        }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    fn source_path(&self, source: &Path) -> PathBuf {
        if source.is_absolute() {
            source.to_path_buf()
        } else {
            self.root_folder.join(source)
        }
    }

    fn mount_path(mount_point: &str) -> String {
        normalize_path(mount_point, "/")
    }

    /// Mount a zip container file at `mount_point`. Returns `false` and
    /// leaves the table untouched when the container cannot be opened.
    pub fn mount_package(&mut self, source: impl AsRef<Path>, mount_point: &str) -> bool {
        let source = self.source_path(source.as_ref());
        match ZipFileSystem::open(&source) {
            Ok(archive) => {
                let members = archive.list_members();
                info!(
                    source = %source.display(),
                    mount = mount_point,
                    members = members.len(),
                    "package mounted"
                );
                for name in &members {
                    trace!(member = %name);
                }
                self.mount_package_source(Box::new(archive), mount_point);
                true
            }
            Err(err) => {
                error!(
                    source = %source.display(),
                    mount = mount_point,
                    %err,
                    "unable to mount package"
                );
                false
            }
        }
    }

    /// Mount a host directory at `mount_point`. Returns `false` and leaves
    /// the table untouched when the path is not an existing directory.
    pub fn mount_directory(&mut self, source: impl AsRef<Path>, mount_point: &str) -> bool {
        let source = self.source_path(source.as_ref());
        match DirFileSystem::open(&source) {
            Ok(archive) => {
                let members = archive.list_members();
                info!(
                    source = %source.display(),
                    mount = mount_point,
                    members = members.len(),
                    "directory mounted"
                );
                for name in &members {
                    trace!(member = %name);
                }
                self.mount_directory_source(Box::new(archive), mount_point);
                true
            }
            Err(err) => {
                error!(
                    source = %source.display(),
                    mount = mount_point,
                    %err,
                    "unable to mount directory"
                );
                false
            }
        }
    }

    /// Mount an already-opened container source at `mount_point`. Container
    /// mounts go to the tail of the table: they are searched after every
    /// directory mount, and among themselves in mount order.
    pub fn mount_package_source(
        &mut self,
        archive: Box<dyn ArchiveFileSystem>,
        mount_point: &str,
    ) {
        let mount_path = Self::mount_path(mount_point);
        self.mounts.push_back(MountEntry {
            archive,
            mount_path,
        });
    }

    /// Mount an already-opened directory source at `mount_point`. Directory
    /// mounts go to the head of the table: the most recent one is searched
    /// first and all of them outrank container mounts.
    pub fn mount_directory_source(
        &mut self,
        archive: Box<dyn ArchiveFileSystem>,
        mount_point: &str,
    ) {
        let mount_path = Self::mount_path(mount_point);
        self.mounts.push_front(MountEntry {
            archive,
            mount_path,
        });
    }

    /// Scan the mount table for the first mount that actually contains the
    /// file named by `path`. A mount whose path prefixes the request but
    /// whose source lacks the member does not stop the scan.
    pub fn resolve_member(&self, path: &str) -> Option<ArchiveMember<'_>> {
        let normalized = normalize_path(path, &self.current_directory);
        for entry in &self.mounts {
            let Some(rest) = normalized.strip_prefix(entry.mount_path.as_str()) else {
                // The mount path is in a different subtree.
                continue;
            };
            let rel_path = rest.trim_start_matches(PATH_SEPARATOR);
            if entry.archive.has_member(rel_path) {
                return Some(ArchiveMember {
                    archive: entry.archive.as_ref(),
                    rel_path: rel_path.to_string(),
                });
            }
        }
        None
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.resolve_member(path).is_some()
    }

    /// Read a file into a freshly allocated buffer.
    ///
    /// A path carrying [`SAVEGAME_SUFFIX`] bypasses the mount table and is
    /// loaded from the save provider instead, keyed by its bare filename,
    /// even when an identically named member exists in some mount. A read
    /// that produces zero bytes reports absence rather than handing back an
    /// empty buffer.
    pub fn read_whole(&self, path: &str) -> Option<Vec<u8>> {
        if path.ends_with(SAVEGAME_SUFFIX) {
            return self.read_save(path);
        }

        let member = self.resolve_member(path)?;
        let mut stream = member.create_read_stream().ok()?;

        let size = stream.size();
        if size > BIG_FILE_WARN_BYTES {
            warn!(path, size, "buffering an oversized file into memory; prefer open_stream");
        }

        let mut buffer = Vec::with_capacity(size as usize);
        if stream.read_to_end(&mut buffer).is_err() || buffer.is_empty() {
            return None;
        }
        Some(buffer)
    }

    fn read_save(&self, path: &str) -> Option<Vec<u8>> {
        let name = path_filename(path);
        let mut stream = match self.save_provider.open_for_loading(name) {
            Ok(stream) => stream,
            Err(err) => {
                error!(path, %err, "could not load savegame");
                return None;
            }
        };
        let mut buffer = Vec::with_capacity(stream.size() as usize);
        stream.read_to_end(&mut buffer).ok()?;
        Some(buffer)
    }

    /// Open a lazy, seekable stream over a file. Save data is not reachable
    /// through this entry point; only [`Self::read_whole`] consults the
    /// save provider.
    pub fn open_stream(&self, path: &str) -> Option<Box<dyn VirtualFile>> {
        let member = self.resolve_member(path)?;
        member.create_read_stream().ok()
    }

    /// The size of a file in bytes, or `0` on any failure. An empty file
    /// and a missing one are indistinguishable through this call.
    pub fn file_size(&self, path: &str) -> u64 {
        let Some(member) = self.resolve_member(path) else {
            return 0;
        };
        match member.create_read_stream() {
            Ok(stream) => stream.size(),
            Err(_) => 0,
        }
    }

    // TODO: derive the answer from the resolved member's trailing-separator
    // convention instead of hardcoding it.
    pub fn file_type(&self, path: &str) -> FileType {
        warn!(path, "file type detection is not implemented, reporting a file");
        FileType::File
    }

    pub fn current_directory(&self) -> &str {
        &self.current_directory
    }

    /// Move the virtual current directory. Purely syntactic: the target is
    /// normalized and stored without any existence check, so it may point
    /// nowhere; later relative requests will simply fail to resolve.
    pub fn change_directory(&mut self, path: &str) -> bool {
        self.current_directory = normalize_path(path, &self.current_directory);
        true
    }

    /// Resolve `path` against the virtual current directory.
    pub fn absolute_path(&self, path: &str) -> String {
        normalize_path(path, &self.current_directory)
    }

    /// Collect members matching a glob filter across *every* qualifying
    /// mount. Unlike single-file resolution, search does not stop at the
    /// first mount. Names with a trailing separator pass the directory bit
    /// of `type_mask`, all others the file bit.
    pub fn search(&self, filter: &str, path: &str, type_mask: FileTypeMask) -> Vec<String> {
        let normalized = normalize_path(filter, &self.current_directory);

        if !path.is_empty() {
            warn!(filter, path, "search scope parameter is reserved and ignored");
        }

        let mut matches = Vec::new();
        for entry in &self.mounts {
            let Some(rest) = normalized.strip_prefix(entry.mount_path.as_str()) else {
                continue;
            };
            let rel_filter = rest.trim_start_matches(PATH_SEPARATOR);
            for name in entry.archive.list_matching(rel_filter) {
                let is_directory = name.ends_with(PATH_SEPARATOR);
                if (type_mask.contains(FileTypeMask::DIRECTORY) && is_directory)
                    || (type_mask.contains(FileTypeMask::FILE) && !is_directory)
                {
                    matches.push(name);
                }
            }
        }
        matches
    }
}
