//! The package manager: a single logical path namespace over an ordered
//! stack of mounted asset sources.
//!
//! Sources are mounted at logical path prefixes and searched in mount
//! order; directory mounts always outrank container mounts. Relative
//! requests resolve against a virtual current directory that exists only
//! inside this namespace.

mod manager;
mod path;
mod save;

pub use manager::{
    ArchiveMember, BIG_FILE_WARN_BYTES, FileType, FileTypeMask, PackageManager,
};
pub use path::{PATH_SEPARATOR, normalize_path, path_filename};
pub use save::{DirectorySaveProvider, SAVEGAME_SUFFIX, SaveFileProvider};
