//! Error types for the anypath path abstraction.

use std::path::PathBuf;

/// Path error type with contextual variants.
///
/// Every backend reports failures through this one type, so callers such as
/// a directory-listing CLI only ever match on these variants and never on a
/// backend's internal representation.
///
/// # Examples
///
/// ```rust
/// use anypath::PathError;
/// use std::path::PathBuf;
///
/// let err = PathError::NotFound { path: PathBuf::from("/missing") };
/// assert!(err.to_string().contains("/missing"));
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    // Containment / navigation
    /// A requested child would escape the owning subtree.
    ///
    /// Raised by [`DiskPath::child`](crate::DiskPath) for names containing a
    /// separator, a drive marker, or a `.`/`..` traversal.
    #[error("insecure path: {path} ({reason})")]
    InsecurePath {
        /// The rejected path or name.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// `segments_from` was given something that is not an ancestor.
    #[error("{ancestor} is not an ancestor of {path}")]
    NotAnAncestor {
        /// The path whose segments were requested.
        path: PathBuf,
        /// The supposed ancestor.
        ancestor: PathBuf,
    },

    // Listing / lookup
    /// The path cannot be listed because it is missing or not a directory.
    #[error("not listable: {path} ({reason})")]
    NotListable {
        /// The path that could not be listed.
        path: PathBuf,
        /// Why the listing failed.
        reason: String,
    },

    /// Path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Expected a file but found something else.
    #[error("not a file: {path}")]
    NotAFile {
        /// The path that is not a file.
        path: PathBuf,
    },

    /// A symbolic-link cycle was detected.
    #[error("link cycle detected at {path}")]
    LinkCycle {
        /// The path at which the cycle was found.
        path: PathBuf,
    },

    // Capability errors
    /// The backend or platform cannot perform this operation.
    #[error("{operation}: operation not supported: {path}")]
    NotSupported {
        /// The unsupported operation.
        operation: &'static str,
        /// The path it was attempted on.
        path: PathBuf,
    },

    /// The path is a read-only view.
    #[error("{operation}: read-only path: {path}")]
    ReadOnly {
        /// The operation that was attempted.
        operation: &'static str,
        /// The path it was attempted on.
        path: PathBuf,
    },

    // Data errors
    /// Malformed data in a backing store (image descriptors, names).
    #[error("invalid data: {path} ({details})")]
    InvalidData {
        /// The path with invalid data.
        path: PathBuf,
        /// Details about the invalid data.
        details: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    // Backend errors
    /// The zip library rejected an operation.
    #[error("archive error for {path}: {source}")]
    Archive {
        /// The archive or entry involved.
        path: PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A version-control tool exited unsuccessfully.
    #[error("`{command}` failed ({status}): {stderr}")]
    Vcs {
        /// The command line that was run.
        command: String,
        /// Exit status as reported by the OS.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// I/O error with context.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl PathError {
    /// Wrap an I/O error with the operation and path it came from.
    ///
    /// `NotFound` errors become [`PathError::NotFound`] so callers can match
    /// on a missing path without inspecting the I/O error kind.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => PathError::NotFound { path },
            _ => PathError::Io {
                operation,
                path,
                source,
            },
        }
    }

    /// Returns `true` for errors raised because mutation is not available
    /// ([`NotSupported`](Self::NotSupported) and [`ReadOnly`](Self::ReadOnly)).
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            PathError::NotSupported { .. } | PathError::ReadOnly { .. }
        )
    }
}

impl From<std::io::Error> for PathError {
    fn from(error: std::io::Error) -> Self {
        PathError::io("io", PathBuf::new(), error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = PathError::NotFound {
            path: PathBuf::from("/missing"),
        };
        assert_eq!(err.to_string(), "not found: /missing");
    }

    #[test]
    fn insecure_path_display() {
        let err = PathError::InsecurePath {
            path: PathBuf::from("../x"),
            reason: "contains directory separators".into(),
        };
        assert_eq!(
            err.to_string(),
            "insecure path: ../x (contains directory separators)"
        );
    }

    #[test]
    fn read_only_display() {
        let err = PathError::ReadOnly {
            operation: "set_content",
            path: PathBuf::from("/a"),
        };
        assert_eq!(err.to_string(), "set_content: read-only path: /a");
    }

    #[test]
    fn unsupported_groups_read_only_and_not_supported() {
        let ro = PathError::ReadOnly {
            operation: "open",
            path: PathBuf::new(),
        };
        let ns = PathError::NotSupported {
            operation: "inode",
            path: PathBuf::new(),
        };
        let nf = PathError::NotFound {
            path: PathBuf::new(),
        };
        assert!(ro.is_unsupported());
        assert!(ns.is_unsupported());
        assert!(!nf.is_unsupported());
    }

    #[test]
    fn from_io_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err = PathError::from(io_err);
        assert!(matches!(err, PathError::NotFound { .. }));
    }

    #[test]
    fn from_io_other_passes_through() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err = PathError::io("listdir", "/x", io_err);
        match err {
            PathError::Io {
                operation, source, ..
            } => {
                assert_eq!(operation, "listdir");
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
