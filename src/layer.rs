//! # Layer Trait
//!
//! Tower-style wrapping of path types.
//!
//! ## Overview
//!
//! A [`Layer`] turns one path type into another that adds or restricts
//! behaviour while forwarding everything else, for example
//! [`ReadOnlyLayer`](crate::ReadOnlyLayer), which rejects every mutation.
//!
//! ```text
//! Path ──▶ Layer::layer() ──▶ Wrapped Path
//! ```
//!
//! Each wrapper provides:
//! 1. A wrapper struct that implements the capability traits
//! 2. A `Layer` implementation that creates the wrapper
//!
//! ## Fluent Composition
//!
//! ```rust
//! use anypath::{LayerExt, MemoryFs, PathContent, PathNav, ReadOnlyLayer};
//!
//! let root = MemoryFs::new().root();
//! root.child("notes").unwrap().set_content(b"keep").unwrap();
//!
//! let frozen = root.layer(ReadOnlyLayer);
//! let notes = frozen.child("notes").unwrap();
//! assert_eq!(notes.get_content().unwrap(), b"keep");
//! assert!(notes.set_content(b"lost").unwrap_err().is_unsupported());
//! ```

use crate::FilePath;

/// A layer that wraps a path to change its behaviour.
///
/// # Type Parameters
///
/// - `P`: The path type being wrapped
///
/// # Design Notes
///
/// - `layer(self, path)` consumes both the layer and the path
/// - Paths derived from the wrapper (children, parents) stay wrapped
pub trait Layer<P> {
    /// The resulting path type after applying this layer.
    type Path;

    /// Wrap `path` with this layer's behaviour.
    fn layer(self, path: P) -> Self::Path;
}

/// Extension trait for fluent layer composition.
///
/// Provides `.layer()` on every [`FilePath`].
pub trait LayerExt: FilePath {
    /// Apply a layer to this path.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Path {
        layer.layer(self)
    }
}

// Blanket implementation - every path type gets LayerExt for free
impl<P: FilePath> LayerExt for P {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryFs, MemoryPath, PathNav};

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Tagged<P> {
        inner: P,
        tag: &'static str,
    }

    struct TagLayer(&'static str);

    impl<P> Layer<P> for TagLayer {
        type Path = Tagged<P>;

        fn layer(self, path: P) -> Self::Path {
            Tagged {
                inner: path,
                tag: self.0,
            }
        }
    }

    #[test]
    fn layer_ext_is_auto_implemented() {
        fn _check<P: FilePath + LayerExt>() {}
        _check::<MemoryPath>();
    }

    #[test]
    fn layer_composes_types() {
        let root = MemoryFs::new().root();
        let child = root.child("a").unwrap();
        let tagged = child.clone().layer(TagLayer("t"));
        assert_eq!(tagged.inner, child);
        assert_eq!(tagged.tag, "t");
    }
}
