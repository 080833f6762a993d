//! # Capability Traits
//!
//! The contract every path type implements.
//!
//! ## Trait Layout
//!
//! The contract is split into component traits, each covering one concern.
//! [`FilePath`] combines them and is implemented automatically:
//!
//! ```text
//! PathNav ─┬─ PathList
//!          ├─ PathContent
//!          ├─ PathStat        ──▶  FilePath (blanket)
//!          └─ PathLink
//! ```
//!
//! ## Quick Reference
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`PathNav`] | `sep`, `path`, `parent`, `child`, `basename`, `sibling`, `descendant` |
//! | [`PathList`] | `listdir`, `children` |
//! | [`PathContent`] | `open`, `create_directory`, `get_content`, `set_content` |
//! | [`PathStat`] | `changed`, `getsize`, timestamps, `exists`, `is_dir`, `is_file`, `is_link` |
//! | [`PathLink`] | `realpath` |
//!
//! Backends implement only the navigation primitives, listing, content I/O
//! and metadata. Everything compositional (`walk`, `parents`,
//! `segments_from`) lives in [`generic`](crate::generic) and works on any
//! [`FilePath`].
//!
//! ## Unsupported Operations
//!
//! A backend that cannot perform an operation still implements it and fails
//! with [`PathError::NotSupported`](crate::PathError::NotSupported) or
//! [`PathError::ReadOnly`](crate::PathError::ReadOnly). Operations are never
//! silently skipped.

mod path_content;
mod path_link;
mod path_list;
mod path_nav;
mod path_stat;

pub use path_content::PathContent;
pub use path_link::PathLink;
pub use path_list::PathList;
pub use path_nav::PathNav;
pub use path_stat::PathStat;

/// A complete path type.
///
/// # Blanket Implementation
///
/// Automatically implemented for any type implementing all five component
/// traits. Generic code should bound on `FilePath`:
///
/// ```rust
/// use anypath::{FilePath, PathError, PathExt};
///
/// fn count_files<P: FilePath>(root: &P) -> Result<usize, PathError> {
///     let mut files = 0;
///     for node in root.walk() {
///         if node?.is_file()? {
///             files += 1;
///         }
///     }
///     Ok(files)
/// }
/// ```
pub trait FilePath: PathNav + PathList + PathContent + PathStat + PathLink {}

impl<T: PathNav + PathList + PathContent + PathStat + PathLink> FilePath for T {}
