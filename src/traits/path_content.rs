//! Content access.

use crate::types::DEFAULT_TEMP_EXT;
use crate::{OpenMode, PathError, PathHandle, PathNav, generic};

/// Reading and writing the bytes stored at a path.
///
/// Backends without mutation support (disc images, read-only views, VCS
/// trees) must fail every writing call with an unsupported-operation error
/// ([`PathError::is_unsupported`]); they never ignore a write.
pub trait PathContent: PathNav {
    /// Open the path.
    ///
    /// Every handle must be released with [`PathHandle::close`].
    fn open(&self, mode: OpenMode) -> Result<Box<dyn PathHandle>, PathError>;

    /// Create this path as a directory.
    fn create_directory(&self) -> Result<(), PathError>;

    /// The full content of the path.
    fn get_content(&self) -> Result<Vec<u8>, PathError> {
        generic::get_content(self)
    }

    /// Replace the content, staging it under a temporary name ending in
    /// `ext` where the backend supports it.
    fn set_content_ext(&self, content: &[u8], ext: &str) -> Result<(), PathError>;

    /// Replace the content using the default `.new` staging extension.
    fn set_content(&self, content: &[u8]) -> Result<(), PathError> {
        self.set_content_ext(content, DEFAULT_TEMP_EXT)
    }
}
