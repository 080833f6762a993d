//! # Extension Traits
//!
//! Compositional operations available on every path type.
//!
//! ## Overview
//!
//! [`PathExt`] exposes the [`generic`](crate::generic) algorithms as methods.
//! It has a blanket implementation, so backends never implement it and can
//! never diverge from the shared behaviour.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`parents`](PathExt::parents) | Ancestors, nearest first |
//! | [`walk`](PathExt::walk) | Pre-order traversal with cycle detection |
//! | [`walk_with`](PathExt::walk_with) | Traversal with a descend predicate |
//! | [`segments_from`](PathExt::segments_from) | Relative segments from an ancestor |
//!
//! ## JSON Support (Feature-Gated)
//!
//! With the `serde` feature enabled, [`PathExtJson`] adds `read_json` and
//! `write_json` to every [`PathContent`] implementation.

use crate::generic::{self, Parents, Walk};
use crate::{PathError, PathLink, PathList, PathNav, PathStat};

/// Extension methods for any path type.
///
/// # Example
///
/// ```rust
/// use anypath::{MemoryFs, PathContent, PathExt, PathNav};
///
/// let root = MemoryFs::new().root();
/// root.create_directory().unwrap();
/// let docs = root.child("docs").unwrap();
/// docs.create_directory().unwrap();
/// let readme = docs.child("README").unwrap();
///
/// assert_eq!(readme.segments_from(&root).unwrap(), vec!["docs", "README"]);
/// assert_eq!(readme.parents().count(), 2);
/// ```
pub trait PathExt: PathNav {
    /// Ancestors of this path, from the parent up to the root.
    fn parents(&self) -> Parents<Self> {
        generic::parents(self)
    }

    /// Segments leading from `ancestor` down to this path.
    ///
    /// # Errors
    ///
    /// - [`PathError::NotAnAncestor`] if `ancestor` is not an ancestor.
    fn segments_from(&self, ancestor: &Self) -> Result<Vec<String>, PathError> {
        generic::segments_from(self, ancestor)
    }

    /// This path, then everything below it, depth-first in listing order.
    ///
    /// Fails with [`PathError::LinkCycle`] if a descendant resolves to one
    /// of the directories it was reached through.
    fn walk(&self) -> Walk<'static, Self>
    where
        Self: PathList + PathStat + PathLink,
    {
        generic::walk(self)
    }

    /// Like [`walk`](Self::walk), entering only directories `descend`
    /// approves.
    fn walk_with<'a, F>(&self, descend: F) -> Walk<'a, Self>
    where
        Self: PathList + PathStat + PathLink,
        F: FnMut(&Self) -> bool + 'a,
    {
        generic::walk_with(self, descend)
    }
}

// Blanket implementation - every path type gets PathExt for free
impl<P: PathNav> PathExt for P {}

// =============================================================================
// JSON Support (Feature-Gated)
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use crate::PathContent;
    use serde::{Serialize, de::DeserializeOwned};

    /// JSON serialization extension methods.
    ///
    /// Available when the `serde` feature is enabled.
    pub trait PathExtJson: PathContent {
        /// Read the content and deserialize it as JSON.
        ///
        /// # Errors
        ///
        /// - `PathError::Deserialization` if parsing fails
        /// - Any error from [`get_content`](PathContent::get_content)
        fn read_json<T: DeserializeOwned>(&self) -> Result<T, PathError> {
            let data = self.get_content()?;
            serde_json::from_slice(&data).map_err(|e| PathError::Deserialization(e.to_string()))
        }

        /// Serialize `value` as pretty JSON and replace the content with it.
        fn write_json<T: Serialize>(&self, value: &T) -> Result<(), PathError> {
            let json = serde_json::to_vec_pretty(value)
                .map_err(|e| PathError::Serialization(e.to_string()))?;
            self.set_content(&json)
        }
    }

    impl<P: PathContent> PathExtJson for P {}
}

#[cfg(feature = "serde")]
pub use json::PathExtJson;
