//! Directory listing.

use crate::{PathError, PathNav, generic};

/// Listing of immediate children.
///
/// # Errors
///
/// Backends report a missing path or a non-directory as
/// [`PathError::NotListable`]. Other failures (permissions, exhausted
/// descriptors) propagate unchanged as [`PathError::Io`].
pub trait PathList: PathNav {
    /// Names of the immediate children, in the order the backend discovers
    /// them. The order is not sorted.
    fn listdir(&self) -> Result<Vec<String>, PathError>;

    /// [`listdir`](Self::listdir) mapped through [`child`](PathNav::child).
    fn children(&self) -> Result<Vec<Self>, PathError> {
        generic::children(self)
    }
}
