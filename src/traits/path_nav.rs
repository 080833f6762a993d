//! Navigation over a path hierarchy.

use std::fmt;
use std::hash::Hash;

use crate::{PathError, generic};

/// Navigation primitives every path type provides.
///
/// A path value is an ordered chain of segments rooted in some backing store.
/// Two values are equal exactly when they share a backing store and have the
/// same segments, so `Eq` and `Hash` are part of the contract.
///
/// # Invariants
///
/// - The root is its own parent. [`parents`](crate::PathExt::parents) relies
///   on this fixed point to terminate.
/// - For a valid name without separators, `p.child(name)?.parent() == p`.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods take `&self`.
pub trait PathNav: Clone + Eq + Hash + fmt::Debug + Send + Sync + Sized {
    /// Separator used in [`path`](Self::path) renderings.
    fn sep(&self) -> char;

    /// String rendering of the full path.
    fn path(&self) -> String;

    /// The directory containing this path. The root returns itself.
    fn parent(&self) -> Self;

    /// A direct child of this path. The child does not need to exist.
    ///
    /// # Errors
    ///
    /// - [`PathError::InsecurePath`] if `name` would not be a direct child.
    ///   Only backends rooted in a shared namespace (the disk) enforce this;
    ///   elsewhere names have no meaning outside their own store.
    fn child(&self, name: &str) -> Result<Self, PathError>;

    /// Final segment of the path, or `""` for the root.
    fn basename(&self) -> String;

    /// `self.parent().child(name)`.
    fn sibling(&self, name: &str) -> Result<Self, PathError> {
        generic::sibling(self, name)
    }

    /// Apply [`child`](Self::child) for each segment, left to right.
    fn descendant<S: AsRef<str>>(&self, segments: &[S]) -> Result<Self, PathError> {
        generic::descendant(self, segments)
    }
}
