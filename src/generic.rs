//! # Generic Algorithms
//!
//! Tree algorithms written purely against the capability traits, so the same
//! code runs over every backend. Backends call into these from trait default
//! methods; callers usually reach them through [`PathExt`](crate::PathExt).
//!
//! | Function | Result |
//! |----------|--------|
//! | [`parents`] | Lazy iterator of ancestors up to the root |
//! | [`children`] | Child paths of a directory |
//! | [`walk`] / [`walk_with`] | Pre-order traversal with link-cycle detection |
//! | [`descendant`] | Repeated `child` |
//! | [`segments_from`] | Segments leading from an ancestor down to a path |
//! | [`sibling`] | `parent().child(name)` |
//! | [`get_content`] | Open, read fully, close |

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use crate::{OpenMode, PathContent, PathError, PathLink, PathList, PathNav, PathStat};

/// Iterator over the ancestors of a path, nearest first.
///
/// Stops before the point where `parent()` returns the path itself (the
/// root fixed point). Created by [`parents`].
#[derive(Debug, Clone)]
pub struct Parents<P> {
    current: Option<P>,
}

impl<P: PathNav> Iterator for Parents<P> {
    type Item = P;

    fn next(&mut self) -> Option<P> {
        let current = self.current.take()?;
        let parent = current.parent();
        if parent == current {
            return None;
        }
        self.current = Some(parent.clone());
        Some(parent)
    }
}

/// Ancestors of `path`, from its parent up to and including the root.
///
/// The root itself has no ancestors.
pub fn parents<P: PathNav>(path: &P) -> Parents<P> {
    Parents {
        current: Some(path.clone()),
    }
}

/// `path.parent().child(name)`.
pub fn sibling<P: PathNav>(path: &P, name: &str) -> Result<P, PathError> {
    path.parent().child(name)
}

/// Apply `child` for each segment in order.
pub fn descendant<P: PathNav, S: AsRef<str>>(path: &P, segments: &[S]) -> Result<P, PathError> {
    segments
        .iter()
        .try_fold(path.clone(), |p, name| p.child(name.as_ref()))
}

/// Child paths of every name in `path.listdir()`.
pub fn children<P: PathList>(path: &P) -> Result<Vec<P>, PathError> {
    path.listdir()?
        .iter()
        .map(|name| path.child(name))
        .collect()
}

/// Segments leading from `ancestor` down to `path`, root-to-leaf.
///
/// Returns an empty list when `path == ancestor`.
///
/// # Errors
///
/// - [`PathError::NotAnAncestor`] if the root is reached without meeting
///   `ancestor`.
pub fn segments_from<P: PathNav>(path: &P, ancestor: &P) -> Result<Vec<String>, PathError> {
    let mut segments = Vec::new();
    let mut current = path.clone();
    loop {
        if &current == ancestor {
            segments.reverse();
            return Ok(segments);
        }
        let parent = current.parent();
        if parent == current {
            return Err(PathError::NotAnAncestor {
                path: PathBuf::from(path.path()),
                ancestor: PathBuf::from(ancestor.path()),
            });
        }
        segments.push(current.basename());
        current = parent;
    }
}

/// Read the whole content through a scoped read handle.
///
/// The handle is closed on every path out of this function.
pub fn get_content<P: PathContent>(path: &P) -> Result<Vec<u8>, PathError> {
    let mut handle = path.open(OpenMode::Read)?;
    let mut data = Vec::new();
    let read = handle.read_to_end(&mut data);
    let closed = handle.close();
    read.map_err(|e| PathError::io("read", path.path(), e))?;
    closed?;
    Ok(data)
}

type Descend<'a, P> = Box<dyn FnMut(&P) -> bool + 'a>;

struct Frame<P> {
    /// Canonical form of the directory and all of its canonical ancestors.
    guard: HashSet<P>,
    children: std::vec::IntoIter<P>,
}

/// Pre-order traversal created by [`walk`] or [`walk_with`].
///
/// Yields the starting path, then each child in listing order, descending
/// into directories depth-first. Yields nothing after the first error.
pub struct Walk<'a, P> {
    start: Option<P>,
    pending: Option<P>,
    stack: Vec<Frame<P>>,
    descend: Option<Descend<'a, P>>,
    done: bool,
}

impl<P: fmt::Debug> fmt::Debug for Walk<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Walk")
            .field("start", &self.start)
            .field("pending", &self.pending)
            .field("depth", &self.stack.len())
            .field("done", &self.done)
            .finish()
    }
}

impl<P> Walk<'_, P>
where
    P: PathList + PathStat + PathLink,
{
    fn expand(&mut self, node: P) -> Result<(), PathError> {
        if !node.is_dir()? {
            return Ok(());
        }
        let children = node.children()?;
        let canonical = node.realpath()?;
        let mut guard: HashSet<P> = parents(&canonical).collect();
        guard.insert(canonical);
        self.stack.push(Frame {
            guard,
            children: children.into_iter(),
        });
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<P>, PathError> {
        if let Some(node) = self.pending.take() {
            self.expand(node)?;
        }
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            let Some(child) = frame.children.next() else {
                self.stack.pop();
                continue;
            };

            let recurse = match self.descend.as_mut() {
                None => true,
                Some(descend) => child.is_dir()? && descend(&child),
            };

            // A child that is not descended into was not produced by a
            // recursive walk at its parent's level, so only the levels above
            // check it.
            let levels = if recurse {
                self.stack.len()
            } else {
                self.stack.len() - 1
            };
            if levels == 0 && child.is_link()? {
                // A link that cannot be resolved is a cycle wherever it sits.
                child.realpath()?;
            } else if levels > 0 {
                let real = child.realpath()?;
                if self.stack[..levels]
                    .iter()
                    .any(|frame| frame.guard.contains(&real))
                {
                    return Err(PathError::LinkCycle {
                        path: PathBuf::from(child.path()),
                    });
                }
            }

            if recurse {
                self.pending = Some(child.clone());
            }
            return Ok(Some(child));
        }
    }
}

impl<P> Iterator for Walk<'_, P>
where
    P: PathList + PathStat + PathLink,
{
    type Item = Result<P, PathError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(start) = self.start.take() {
            self.pending = Some(start.clone());
            return Some(Ok(start));
        }
        match self.advance() {
            Ok(Some(node)) => Some(Ok(node)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Walk `path` and every directory below it.
pub fn walk<P>(path: &P) -> Walk<'static, P>
where
    P: PathList + PathStat + PathLink,
{
    Walk {
        start: Some(path.clone()),
        pending: None,
        stack: Vec::new(),
        descend: None,
        done: false,
    }
}

/// Walk `path`, descending only into directories `descend` approves.
///
/// `descend` is called for each child that is a directory. Declined
/// directories are still yielded; their contents are not.
pub fn walk_with<'a, P, F>(path: &P, descend: F) -> Walk<'a, P>
where
    P: PathList + PathStat + PathLink,
    F: FnMut(&P) -> bool + 'a,
{
    Walk {
        start: Some(path.clone()),
        pending: None,
        stack: Vec::new(),
        descend: Some(Box::new(descend)),
        done: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryFs, MemoryPath};

    fn tree() -> MemoryPath {
        let root = MemoryFs::new().root();
        root.create_directory().unwrap();
        let a = root.child("a").unwrap();
        a.create_directory().unwrap();
        a.child("x").unwrap().set_content(b"x").unwrap();
        let b = a.child("b").unwrap();
        b.create_directory().unwrap();
        b.child("y").unwrap().set_content(b"y").unwrap();
        root.child("z").unwrap().set_content(b"z").unwrap();
        root
    }

    #[test]
    fn parents_stop_at_root() {
        let root = tree();
        let deep = root.descendant(&["a", "b", "y"]).unwrap();
        let ps: Vec<_> = parents(&deep).map(|p| p.path()).collect();
        assert_eq!(ps, vec!["/mem/a/b", "/mem/a", "/mem"]);
        assert_eq!(parents(&root).count(), 0);
    }

    #[test]
    fn segments_from_round_trips_through_descendant() {
        let root = tree();
        let deep = root.descendant(&["a", "b", "y"]).unwrap();
        let segs = segments_from(&deep, &root).unwrap();
        assert_eq!(segs, vec!["a", "b", "y"]);
        assert_eq!(descendant(&root, &segs).unwrap(), deep);
    }

    #[test]
    fn segments_from_self_is_empty() {
        let root = tree();
        assert!(segments_from(&root, &root).unwrap().is_empty());
    }

    #[test]
    fn segments_from_rejects_non_ancestor() {
        let root = tree();
        let x = root.descendant(&["a", "x"]).unwrap();
        let z = root.child("z").unwrap();
        let err = segments_from(&x, &z).unwrap_err();
        assert!(matches!(err, PathError::NotAnAncestor { .. }));
    }

    #[test]
    fn walk_is_preorder_and_complete() {
        let root = tree();
        let seen: Vec<_> = walk(&root).map(|p| p.unwrap()).collect();
        let names: HashSet<_> = seen.iter().map(|p| p.path()).collect();
        assert_eq!(seen.len(), names.len());
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], root);
        for (i, node) in seen.iter().enumerate() {
            for ancestor in parents(node) {
                let pos = seen.iter().position(|p| *p == ancestor).unwrap();
                assert!(pos < i, "{} visited before {}", node.path(), ancestor.path());
            }
        }
    }

    #[test]
    fn walk_with_declined_directory_is_yielded_but_not_entered() {
        let root = tree();
        let seen: Vec<_> = walk_with(&root, |p: &MemoryPath| p.basename() != "b")
            .map(|p| p.unwrap().path())
            .collect();
        assert!(seen.contains(&"/mem/a/b".to_string()));
        assert!(!seen.contains(&"/mem/a/b/y".to_string()));
        assert!(seen.contains(&"/mem/a/x".to_string()));
    }

    #[test]
    fn walk_of_file_yields_only_itself() {
        let root = tree();
        let z = root.child("z").unwrap();
        let seen: Vec<_> = walk(&z).map(|p| p.unwrap()).collect();
        assert_eq!(seen, vec![z]);
    }

    #[test]
    fn get_content_reads_everything() {
        let root = tree();
        let x = root.descendant(&["a", "x"]).unwrap();
        assert_eq!(get_content(&x).unwrap(), b"x");
    }

    #[test]
    fn sibling_shares_parent() {
        let root = tree();
        let x = root.descendant(&["a", "x"]).unwrap();
        let b = sibling(&x, "b").unwrap();
        assert_eq!(b, root.descendant(&["a", "b"]).unwrap());
    }
}
