//! Metadata queries.

use std::time::SystemTime;

use crate::{PathError, PathNav};

/// Existence, type, size and timestamp queries.
///
/// Backends that cache metadata populate the cache on first use and keep it
/// until [`changed`](Self::changed) is called; they never refresh it in the
/// middle of another query.
pub trait PathStat: PathNav {
    /// Discard any cached metadata.
    fn changed(&self);

    /// Size of the content in bytes.
    fn getsize(&self) -> Result<u64, PathError>;

    /// Time of last modification.
    fn modification_time(&self) -> Result<SystemTime, PathError>;

    /// Time of last status change.
    fn status_change_time(&self) -> Result<SystemTime, PathError>;

    /// Time of last access.
    fn access_time(&self) -> Result<SystemTime, PathError>;

    /// Whether anything exists at this path.
    ///
    /// Returns `Ok(false)` for a missing path; `Err` only for real failures.
    fn exists(&self) -> Result<bool, PathError>;

    /// Whether this path is a directory.
    fn is_dir(&self) -> Result<bool, PathError>;

    /// Whether this path is a regular file.
    fn is_file(&self) -> Result<bool, PathError>;

    /// Whether this path is a symbolic link.
    fn is_link(&self) -> Result<bool, PathError>;
}
