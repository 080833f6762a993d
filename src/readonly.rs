//! Read-only view over any path type.

use std::path::PathBuf;
use std::time::SystemTime;

use crate::{
    FilePath, Layer, OpenMode, PathContent, PathError, PathHandle, PathLink, PathList, PathNav,
    PathStat,
};

/// Wraps a path and rejects every mutation with [`PathError::ReadOnly`].
///
/// Paths reached from it by navigation or [`realpath`](PathLink::realpath)
/// are wrapped too, so the view cannot be escaped. Mutations are rejected
/// even when the wrapped path would allow them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadOnlyPath<P> {
    inner: P,
}

impl<P: FilePath> ReadOnlyPath<P> {
    /// Wrap `inner`.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    /// The wrapped path.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Unwrap, regaining write access.
    pub fn into_inner(self) -> P {
        self.inner
    }

    fn rejected(&self, operation: &'static str) -> PathError {
        PathError::ReadOnly {
            operation,
            path: PathBuf::from(self.inner.path()),
        }
    }
}

/// [`Layer`] producing [`ReadOnlyPath`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnlyLayer;

impl<P: FilePath> Layer<P> for ReadOnlyLayer {
    type Path = ReadOnlyPath<P>;

    fn layer(self, path: P) -> Self::Path {
        ReadOnlyPath::new(path)
    }
}

impl<P: FilePath> PathNav for ReadOnlyPath<P> {
    fn sep(&self) -> char {
        self.inner.sep()
    }

    fn path(&self) -> String {
        self.inner.path()
    }

    fn parent(&self) -> Self {
        Self::new(self.inner.parent())
    }

    fn child(&self, name: &str) -> Result<Self, PathError> {
        self.inner.child(name).map(Self::new)
    }

    fn basename(&self) -> String {
        self.inner.basename()
    }
}

impl<P: FilePath> PathList for ReadOnlyPath<P> {
    fn listdir(&self) -> Result<Vec<String>, PathError> {
        self.inner.listdir()
    }
}

impl<P: FilePath> PathContent for ReadOnlyPath<P> {
    fn open(&self, mode: OpenMode) -> Result<Box<dyn PathHandle>, PathError> {
        if mode.is_writing() {
            return Err(self.rejected("open"));
        }
        self.inner.open(mode)
    }

    fn create_directory(&self) -> Result<(), PathError> {
        Err(self.rejected("create_directory"))
    }

    fn get_content(&self) -> Result<Vec<u8>, PathError> {
        self.inner.get_content()
    }

    fn set_content_ext(&self, _content: &[u8], _ext: &str) -> Result<(), PathError> {
        Err(self.rejected("set_content"))
    }
}

impl<P: FilePath> PathStat for ReadOnlyPath<P> {
    fn changed(&self) {
        self.inner.changed();
    }

    fn getsize(&self) -> Result<u64, PathError> {
        self.inner.getsize()
    }

    fn modification_time(&self) -> Result<SystemTime, PathError> {
        self.inner.modification_time()
    }

    fn status_change_time(&self) -> Result<SystemTime, PathError> {
        self.inner.status_change_time()
    }

    fn access_time(&self) -> Result<SystemTime, PathError> {
        self.inner.access_time()
    }

    fn exists(&self) -> Result<bool, PathError> {
        self.inner.exists()
    }

    fn is_dir(&self) -> Result<bool, PathError> {
        self.inner.is_dir()
    }

    fn is_file(&self) -> Result<bool, PathError> {
        self.inner.is_file()
    }

    fn is_link(&self) -> Result<bool, PathError> {
        self.inner.is_link()
    }
}

impl<P: FilePath> PathLink for ReadOnlyPath<P> {
    fn realpath(&self) -> Result<Self, PathError> {
        self.inner.realpath().map(Self::new)
    }
}
