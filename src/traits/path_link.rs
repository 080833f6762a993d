//! Link resolution.

use crate::{PathError, PathNav};

/// Alias-free resolution.
///
/// Backends without links return `self`.
pub trait PathLink: PathNav {
    /// A link-free path that addresses the same data as this one.
    ///
    /// # Errors
    ///
    /// - [`PathError::LinkCycle`] if resolution loops.
    fn realpath(&self) -> Result<Self, PathError>;
}
