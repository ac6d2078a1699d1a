//! Meta crate re-exporting the assetpack workspace members. The interesting
//! code lives in `lib/vfs` and `lib/package`; the workspace-level `tests/`
//! directory exercises the two together through this crate.

pub use assetpack_package as package;
pub use assetpack_vfs as vfs;
