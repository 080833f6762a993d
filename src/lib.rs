//! # anypath
//!
//! One path abstraction over many hierarchical stores.
//!
//! A path value names a location in a backing store: the local disk, a zip
//! archive, an ISO 9660 disc image, an in-memory tree, or a version-control
//! working tree. Tools written against the capability traits (a directory
//! lister, a config loader, an installer) work unchanged over all of them.
//!
//! ---
//!
//! ## Quick Start
//!
//! Most callers only need [`FilePath`] and [`PathExt`]:
//!
//! ```rust
//! use anypath::{FilePath, PathError, PathExt};
//!
//! // Works for DiskPath, ZipPath, IsoPath, MemoryPath, ...
//! fn total_size<P: FilePath>(root: &P) -> Result<u64, PathError> {
//!     let mut total = 0;
//!     for node in root.walk() {
//!         let node = node?;
//!         if node.is_file()? {
//!             total += node.getsize()?;
//!         }
//!     }
//!     Ok(total)
//! }
//! ```
//!
//! ---
//!
//! ## Backends
//!
//! | Type | Store | Mutation |
//! |------|-------|----------|
//! | [`DiskPath`] | Local filesystem, with subtree containment | Full, atomic `set_content` |
//! | [`ZipPath`] | Zip archive ([`ZipArchive`]) | Add new entries only |
//! | [`IsoPath`] | ISO 9660 image ([`IsoImage`]) | None |
//! | [`MemoryPath`] | In-memory tree ([`MemoryFs`]) | Full |
//! | [`ReadOnlyPath`] | Wraps any other path | None |
//! | [`VcsPath`] | Git or Mercurial working tree | None; listings show tracked files |
//!
//! ---
//!
//! ## Trait Hierarchy
//!
//! ```text
//! PathNav ─┬─ PathList
//!          ├─ PathContent
//!          ├─ PathStat        ──▶  FilePath (blanket)  ──▶  PathExt (blanket)
//!          └─ PathLink
//! ```
//!
//! Backends implement the component traits. [`FilePath`], [`PathExt`] and
//! [`LayerExt`] come for free, and the compositional algorithms live in
//! [`generic`].
//!
//! ---
//!
//! ## Error Handling
//!
//! All operations return `Result<T, PathError>`. Errors include context:
//!
//! ```rust
//! use anypath::PathError;
//! use std::path::PathBuf;
//!
//! let err = PathError::InsecurePath {
//!     path: PathBuf::from("../etc"),
//!     reason: "contains directory separators".into(),
//! };
//! assert_eq!(
//!     err.to_string(),
//!     "insecure path: ../etc (contains directory separators)"
//! );
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! All path types are `Send + Sync` and methods take `&self`. Shared stores
//! (archives, images, memory trees) use interior locking.
//!
//! ---
//!
//! ## Logging
//!
//! Backends emit [`tracing`] events: `debug` for filesystem mutations and
//! external commands, `warn` when a failed write leaves a temporary file
//! behind. No subscriber is installed by this crate.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`OpenMode`], [`Permissions`], [`Rwx`] and [`FileKind`], plus `PathExtJson` |

// Private modules
mod archive;
mod disk;
mod error;
mod ext;
mod handle;
mod iso;
mod layer;
mod memory;
mod readonly;
mod traits;
mod types;
mod vcs;

pub mod generic;

// Public re-exports - error types
pub use error::PathError;

// Public re-exports - core types
pub use handle::{BufferHandle, PathHandle};
pub use types::{DEFAULT_TEMP_EXT, FileKind, OpenMode, Permissions, Rwx};

// Public re-exports - capability traits
pub use traits::{FilePath, PathContent, PathLink, PathList, PathNav, PathStat};

// Public re-exports - backends
pub use archive::{ZipArchive, ZipPath};
pub use disk::DiskPath;
pub use iso::{IsoImage, IsoPath, IsoRecord};
pub use memory::{MemoryFs, MemoryPath};
pub use readonly::{ReadOnlyLayer, ReadOnlyPath};
pub use vcs::{Git, Mercurial, TrackedListing, VcsPath};

// Public re-exports - infrastructure
pub use ext::PathExt;
pub use layer::{Layer, LayerExt};

// Conditional re-exports
#[cfg(feature = "serde")]
pub use ext::PathExtJson;
