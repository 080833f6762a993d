//! In-memory backend for hermetic tests and scratch trees.
//!
//! One [`MemoryFs`] store is shared by every [`MemoryPath`] derived from it.
//! The store maps segment lists to bytes, plus a set of segment lists marked
//! as directories. Nothing ties the two together: a file may be written below
//! a path that was never created as a directory.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use crate::handle::BufferHandle;
use crate::{
    OpenMode, PathContent, PathError, PathHandle, PathLink, PathList, PathNav, PathStat,
};

type Key = Vec<String>;

/// Shared in-memory store.
///
/// # Example
///
/// ```rust
/// use anypath::{MemoryFs, PathContent, PathList, PathNav};
///
/// let root = MemoryFs::new().root();
/// root.create_directory().unwrap();
/// root.child("hello.txt").unwrap().set_content(b"hi").unwrap();
/// assert_eq!(root.listdir().unwrap(), vec!["hello.txt"]);
/// ```
#[derive(Default)]
pub struct MemoryFs {
    store: RwLock<BTreeMap<Key, Vec<u8>>>,
    dirs: RwLock<BTreeSet<Key>>,
}

impl MemoryFs {
    /// Create an empty store.
    ///
    /// Not even the root is a directory until
    /// [`create_directory`](PathContent::create_directory) is called on it.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The root path of this store.
    pub fn root(self: &Arc<Self>) -> MemoryPath {
        MemoryPath {
            fs: Arc::clone(self),
            segments: Vec::new(),
        }
    }

    fn is_dir(&self, key: &[String]) -> bool {
        self.dirs.read().unwrap_or_else(PoisonError::into_inner).contains(key)
    }

    fn read(&self, key: &[String]) -> Option<Vec<u8>> {
        self.store.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn write(&self, key: Key, data: Vec<u8>) {
        self.store.write().unwrap_or_else(PoisonError::into_inner).insert(key, data);
    }
}

impl fmt::Debug for MemoryFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFs")
            .field("files", &self.store.read().unwrap_or_else(PoisonError::into_inner).len())
            .field("dirs", &self.dirs.read().unwrap_or_else(PoisonError::into_inner).len())
            .finish()
    }
}

/// A path into a [`MemoryFs`].
///
/// Names are plain map keys: `".."` or `"a/b"` are ordinary single segments
/// here and carry no meaning outside this store.
#[derive(Clone)]
pub struct MemoryPath {
    fs: Arc<MemoryFs>,
    segments: Vec<String>,
}

impl MemoryPath {
    /// The segments of this path.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The store this path belongs to.
    pub fn store(&self) -> &Arc<MemoryFs> {
        &self.fs
    }

    fn display(&self) -> PathBuf {
        PathBuf::from(self.path())
    }
}

impl PartialEq for MemoryPath {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.fs, &other.fs) && self.segments == other.segments
    }
}

impl Eq for MemoryPath {}

impl Hash for MemoryPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.fs).hash(state);
        self.segments.hash(state);
    }
}

impl fmt::Debug for MemoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryPath({:?})", self.path())
    }
}

impl PathNav for MemoryPath {
    fn sep(&self) -> char {
        '/'
    }

    fn path(&self) -> String {
        let mut s = String::from("/mem");
        for segment in &self.segments {
            s.push('/');
            s.push_str(segment);
        }
        s
    }

    fn parent(&self) -> Self {
        match self.segments.split_last() {
            Some((_, rest)) => MemoryPath {
                fs: Arc::clone(&self.fs),
                segments: rest.to_vec(),
            },
            None => self.clone(),
        }
    }

    fn child(&self, name: &str) -> Result<Self, PathError> {
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        Ok(MemoryPath {
            fs: Arc::clone(&self.fs),
            segments,
        })
    }

    fn basename(&self) -> String {
        self.segments.last().cloned().unwrap_or_default()
    }

    fn descendant<S: AsRef<str>>(&self, segments: &[S]) -> Result<Self, PathError> {
        let mut all = self.segments.clone();
        all.extend(segments.iter().map(|s| s.as_ref().to_owned()));
        Ok(MemoryPath {
            fs: Arc::clone(&self.fs),
            segments: all,
        })
    }
}

impl PathList for MemoryPath {
    /// Directories first, then files, each in key order.
    ///
    /// Scans every key in the store, so the cost grows with the store size.
    fn listdir(&self) -> Result<Vec<String>, PathError> {
        if !self.fs.is_dir(&self.segments) {
            return Err(PathError::NotListable {
                path: self.display(),
                reason: "not a directory".into(),
            });
        }
        let depth = self.segments.len() + 1;
        let is_child = |key: &&Key| key.len() == depth && key.starts_with(&self.segments);

        let dirs = self.fs.dirs.read().unwrap_or_else(PoisonError::into_inner);
        let store = self.fs.store.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = Vec::new();
        for key in dirs.iter().filter(is_child).chain(store.keys().filter(is_child)) {
            let name = &key[depth - 1];
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        Ok(names)
    }
}

impl PathContent for MemoryPath {
    fn open(&self, mode: OpenMode) -> Result<Box<dyn PathHandle>, PathError> {
        if self.fs.is_dir(&self.segments) {
            return Err(PathError::NotAFile {
                path: self.display(),
            });
        }
        let existing = self.fs.read(&self.segments);
        let (initial, position) = match mode {
            OpenMode::Read => {
                let data = existing.ok_or_else(|| PathError::NotFound {
                    path: self.display(),
                })?;
                return Ok(Box::new(BufferHandle::reader(data)));
            }
            OpenMode::Write => (Vec::new(), 0),
            OpenMode::Append => {
                let data = existing.unwrap_or_default();
                let len = data.len() as u64;
                (data, len)
            }
            OpenMode::ReadWrite => {
                let data = existing.ok_or_else(|| PathError::NotFound {
                    path: self.display(),
                })?;
                (data, 0)
            }
        };
        let fs = Arc::clone(&self.fs);
        let key = self.segments.clone();
        Ok(Box::new(BufferHandle::writer(initial, position, move |data| {
            fs.write(key, data);
            Ok(())
        })))
    }

    fn create_directory(&self) -> Result<(), PathError> {
        self.fs.dirs.write().unwrap_or_else(PoisonError::into_inner).insert(self.segments.clone());
        Ok(())
    }

    fn get_content(&self) -> Result<Vec<u8>, PathError> {
        self.fs
            .read(&self.segments)
            .ok_or_else(|| PathError::NotFound {
                path: self.display(),
            })
    }

    /// Stores `content` directly; a map insert is already all-or-nothing.
    fn set_content_ext(&self, content: &[u8], _ext: &str) -> Result<(), PathError> {
        self.fs.write(self.segments.clone(), content.to_vec());
        Ok(())
    }
}

impl PathStat for MemoryPath {
    fn changed(&self) {}

    fn getsize(&self) -> Result<u64, PathError> {
        match self.fs.read(&self.segments) {
            Some(data) => Ok(data.len() as u64),
            None if self.fs.is_dir(&self.segments) => Err(PathError::NotAFile {
                path: self.display(),
            }),
            None => Err(PathError::NotFound {
                path: self.display(),
            }),
        }
    }

    // The store keeps no clock.
    fn modification_time(&self) -> Result<SystemTime, PathError> {
        Ok(SystemTime::UNIX_EPOCH)
    }

    fn status_change_time(&self) -> Result<SystemTime, PathError> {
        Ok(SystemTime::UNIX_EPOCH)
    }

    fn access_time(&self) -> Result<SystemTime, PathError> {
        Ok(SystemTime::UNIX_EPOCH)
    }

    fn exists(&self) -> Result<bool, PathError> {
        Ok(self.is_dir()? || self.is_file()?)
    }

    fn is_dir(&self) -> Result<bool, PathError> {
        Ok(self.fs.is_dir(&self.segments))
    }

    fn is_file(&self) -> Result<bool, PathError> {
        Ok(self.fs.store.read().unwrap_or_else(PoisonError::into_inner).contains_key(&self.segments))
    }

    fn is_link(&self) -> Result<bool, PathError> {
        Ok(false)
    }
}

impl PathLink for MemoryPath {
    fn realpath(&self) -> Result<Self, PathError> {
        Ok(self.clone())
    }
}
