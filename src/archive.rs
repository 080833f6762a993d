//! # Zip Backend
//!
//! [`ZipPath`] addresses entries of a zip archive held by a shared
//! [`ZipArchive`].
//!
//! Opening an archive scans every entry name once and builds a directory
//! index mapping each directory prefix to its immediate children. After that
//! [`listdir`](PathList::listdir) and [`is_dir`](PathStat::is_dir) are map
//! lookups. Directories need no entry of their own: `a/b.txt` alone makes
//! `a` a directory.
//!
//! Entry names always use `/`, whatever the host separator. Names passed to
//! [`child`](PathNav::child) are used verbatim and have no meaning outside
//! the archive, so no containment check is made.
//!
//! ## Writing
//!
//! Archives from [`ZipArchive::create`] and [`ZipArchive::open_append`] accept
//! new entries. Each name can be written once per session. The central
//! directory is written by [`ZipArchive::finish`], or on drop without error
//! reporting. A writable archive serializes writes behind one lock, so
//! concurrent writers from several paths are safe but unordered.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::SystemTime;

use chrono::{Datelike, NaiveDate, Timelike, Utc};
use tracing::debug;
use zip::read::ZipArchive as ZipReader;
use zip::write::SimpleFileOptions;
use zip::{DateTime, ZipWriter};

use crate::handle::BufferHandle;
use crate::{
    OpenMode, PathContent, PathError, PathHandle, PathLink, PathList, PathNav, PathStat,
};

/// Zip timestamps carry no zone; they are read as UTC.
fn zip_time(stamp: impl Into<Option<DateTime>>) -> Option<SystemTime> {
    let stamp = stamp.into()?;
    let naive = NaiveDate::from_ymd_opt(
        stamp.year().into(),
        stamp.month().into(),
        stamp.day().into(),
    )?
    .and_hms_opt(
        stamp.hour().into(),
        stamp.minute().into(),
        stamp.second().into(),
    )?;
    Some(SystemTime::from(naive.and_utc()))
}

fn zip_now() -> Option<DateTime> {
    let now = Utc::now();
    DateTime::from_date_and_time(
        u16::try_from(now.year()).ok()?,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
    )
    .ok()
}

#[derive(Debug, Clone)]
struct Entry {
    /// Name as stored in the archive.
    name: String,
    size: u64,
    modified: Option<SystemTime>,
}

/// Directory prefixes and file entries, keyed by `/`-joined segments.
#[derive(Debug)]
struct Index {
    entries: HashMap<String, Entry>,
    dirs: HashMap<String, Vec<String>>,
}

impl Index {
    fn new() -> Self {
        let mut dirs = HashMap::new();
        dirs.insert(String::new(), Vec::new());
        Self {
            entries: HashMap::new(),
            dirs,
        }
    }

    /// Register `name` and every directory prefix above it.
    fn insert(&mut self, name: &str, is_dir: bool, entry: Option<Entry>) {
        let segments: Vec<&str> = name.split('/').filter(|s| !s.is_empty()).collect();
        let mut key = String::new();
        for (i, segment) in segments.iter().enumerate() {
            let children = self.dirs.entry(key.clone()).or_default();
            if !children.iter().any(|c| c == segment) {
                children.push((*segment).to_owned());
            }
            if !key.is_empty() {
                key.push('/');
            }
            key.push_str(segment);
            if i + 1 < segments.len() || is_dir {
                self.dirs.entry(key.clone()).or_default();
            }
        }
        if is_dir || segments.is_empty() {
            return;
        }
        if let Some(entry) = entry {
            self.entries.insert(key, entry);
        }
    }
}

struct State {
    reader: Option<ZipReader<File>>,
    writer: Option<ZipWriter<File>>,
    /// Entries written this session, readable until `finish` reopens the file.
    written: HashMap<String, Vec<u8>>,
}

/// A zip archive shared by every [`ZipPath`] derived from it.
///
/// # Example
///
/// ```rust,no_run
/// use anypath::{PathContent, PathNav, PathStat, ZipArchive};
///
/// let archive = ZipArchive::create("bundle.zip")?;
/// archive.root().descendant(&["a", "b.txt"])?.set_content(b"hi")?;
/// archive.finish()?;
///
/// let archive = ZipArchive::open("bundle.zip")?;
/// let a = archive.root().child("a")?;
/// assert!(a.is_dir()?);
/// assert_eq!(a.child("b.txt")?.get_content()?, b"hi");
/// # Ok::<(), anypath::PathError>(())
/// ```
pub struct ZipArchive {
    file_path: PathBuf,
    state: Mutex<State>,
    index: RwLock<Index>,
}

impl ZipArchive {
    fn archive_error(path: &Path, source: zip::result::ZipError) -> PathError {
        PathError::Archive {
            path: path.to_path_buf(),
            source,
        }
    }

    fn build_index(path: &Path, reader: &mut ZipReader<File>) -> Result<Index, PathError> {
        let mut index = Index::new();
        for i in 0..reader.len() {
            let file = reader
                .by_index_raw(i)
                .map_err(|e| Self::archive_error(path, e))?;
            let entry = Entry {
                name: file.name().to_owned(),
                size: file.size(),
                modified: zip_time(file.last_modified()),
            };
            index.insert(file.name(), file.is_dir(), Some(entry));
        }
        debug!(
            archive = %path.display(),
            entries = reader.len(),
            dirs = index.dirs.len(),
            "indexed zip archive"
        );
        Ok(index)
    }

    fn read_existing(path: &Path) -> Result<(ZipReader<File>, Index), PathError> {
        let file = File::open(path).map_err(|e| PathError::io("open", path, e))?;
        let mut reader = ZipReader::new(file).map_err(|e| Self::archive_error(path, e))?;
        let index = Self::build_index(path, &mut reader)?;
        Ok((reader, index))
    }

    fn with_state(path: &Path, state: State, index: Index) -> Arc<Self> {
        Arc::new(Self {
            file_path: path.to_path_buf(),
            state: Mutex::new(state),
            index: RwLock::new(index),
        })
    }

    /// Open an existing archive read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Arc<Self>, PathError> {
        let path = path.as_ref();
        let (reader, index) = Self::read_existing(path)?;
        let state = State {
            reader: Some(reader),
            writer: None,
            written: HashMap::new(),
        };
        Ok(Self::with_state(path, state, index))
    }

    /// Create a new, empty, writable archive, replacing any existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Arc<Self>, PathError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| PathError::io("create", path, e))?;
        debug!(archive = %path.display(), "created zip archive");
        let state = State {
            reader: None,
            writer: Some(ZipWriter::new(file)),
            written: HashMap::new(),
        };
        Ok(Self::with_state(path, state, Index::new()))
    }

    /// Open an existing archive for reading and for adding entries.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Arc<Self>, PathError> {
        let path = path.as_ref();
        let (reader, index) = Self::read_existing(path)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| PathError::io("open", path, e))?;
        let writer = ZipWriter::new_append(file).map_err(|e| Self::archive_error(path, e))?;
        let state = State {
            reader: Some(reader),
            writer: Some(writer),
            written: HashMap::new(),
        };
        Ok(Self::with_state(path, state, index))
    }

    /// The root of the archive.
    pub fn root(self: &Arc<Self>) -> ZipPath {
        ZipPath {
            archive: Arc::clone(self),
            segments: Vec::new(),
        }
    }

    /// Location of the archive file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Whether entries can still be added.
    pub fn is_writable(&self) -> bool {
        self.lock_state().writer.is_some()
    }

    /// Write the central directory and stop accepting entries.
    ///
    /// The finished file is reopened for reading, so entries written this
    /// session stay readable without being held in memory. Does nothing on
    /// a read-only archive.
    pub fn finish(&self) -> Result<(), PathError> {
        let Some(writer) = self.lock_state().writer.take() else {
            return Ok(());
        };
        writer
            .finish()
            .map_err(|e| Self::archive_error(&self.file_path, e))?;
        let file =
            File::open(&self.file_path).map_err(|e| PathError::io("open", &self.file_path, e))?;
        let reader = ZipReader::new(file).map_err(|e| Self::archive_error(&self.file_path, e))?;
        {
            let mut state = self.lock_state();
            state.reader = Some(reader);
            state.written = HashMap::new();
        }
        debug!(archive = %self.file_path.display(), "finished zip archive");
        Ok(())
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_index(&self) -> std::sync::RwLockReadGuard<'_, Index> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_entry(&self, key: &str, display: &Path) -> Result<Vec<u8>, PathError> {
        let name = {
            let index = self.read_index();
            match index.entries.get(key) {
                Some(entry) => entry.name.clone(),
                None if index.dirs.contains_key(key) => {
                    return Err(PathError::NotAFile {
                        path: display.to_path_buf(),
                    });
                }
                None => {
                    return Err(PathError::NotFound {
                        path: display.to_path_buf(),
                    });
                }
            }
        };
        let mut state = self.lock_state();
        if let Some(data) = state.written.get(key) {
            return Ok(data.clone());
        }
        let reader = state.reader.as_mut().ok_or_else(|| PathError::NotFound {
            path: display.to_path_buf(),
        })?;
        let mut file = reader
            .by_name(&name)
            .map_err(|e| Self::archive_error(display, e))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| PathError::io("read", display, e))?;
        Ok(data)
    }

    fn write_entry(&self, key: &str, data: &[u8], display: &Path) -> Result<(), PathError> {
        let exists = self.read_index().entries.contains_key(key);
        let stamp = zip_now();
        {
            let mut state = self.lock_state();
            let State {
                writer, written, ..
            } = &mut *state;
            let writer = writer.as_mut().ok_or_else(|| PathError::NotSupported {
                operation: "set_content",
                path: display.to_path_buf(),
            })?;
            if exists || written.contains_key(key) {
                return Err(PathError::InvalidData {
                    path: display.to_path_buf(),
                    details: "zip entries can only be written once".into(),
                });
            }
            let mut options = SimpleFileOptions::default();
            if let Some(stamp) = stamp {
                options = options.last_modified_time(stamp);
            }
            writer
                .start_file(key, options)
                .map_err(|e| Self::archive_error(display, e))?;
            writer
                .write_all(data)
                .map_err(|e| PathError::io("write", display, e))?;
            written.insert(key.to_owned(), data.to_vec());
        }
        debug!(archive = %self.file_path.display(), entry = key, bytes = data.len(), "wrote zip entry");
        let entry = Entry {
            name: key.to_owned(),
            size: data.len() as u64,
            modified: stamp.and_then(|stamp| zip_time(stamp)),
        };
        self.index
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, false, Some(entry));
        Ok(())
    }

    fn add_directory(&self, key: &str, display: &Path) -> Result<(), PathError> {
        if self.read_index().dirs.contains_key(key) {
            return Ok(());
        }
        {
            let mut state = self.lock_state();
            let writer = state.writer.as_mut().ok_or_else(|| PathError::NotSupported {
                operation: "create_directory",
                path: display.to_path_buf(),
            })?;
            writer
                .add_directory(format!("{key}/"), SimpleFileOptions::default())
                .map_err(|e| Self::archive_error(display, e))?;
        }
        self.index
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, true, None);
        Ok(())
    }

    fn file_times(&self) -> Result<fs::Metadata, PathError> {
        fs::metadata(&self.file_path).map_err(|e| PathError::io("stat", &self.file_path, e))
    }
}

impl fmt::Debug for ZipArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipArchive")
            .field("file_path", &self.file_path)
            .field("entries", &self.read_index().entries.len())
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// A path inside a [`ZipArchive`].
#[derive(Clone)]
pub struct ZipPath {
    archive: Arc<ZipArchive>,
    segments: Vec<String>,
}

impl ZipPath {
    /// The archive this path belongs to.
    pub fn archive(&self) -> &Arc<ZipArchive> {
        &self.archive
    }

    /// The `/`-joined name inside the archive; empty for the root.
    pub fn path_in_archive(&self) -> String {
        self.segments.join("/")
    }

    fn display(&self) -> PathBuf {
        PathBuf::from(self.path())
    }

    fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    fn entry(&self) -> Option<Entry> {
        self.archive
            .read_index()
            .entries
            .get(&self.path_in_archive())
            .cloned()
    }

    fn time(&self, pick: fn(&fs::Metadata) -> std::io::Result<SystemTime>) -> Result<SystemTime, PathError> {
        if let Some(entry) = self.entry() {
            if let Some(modified) = entry.modified {
                return Ok(modified);
            }
        } else if !self.is_dir()? {
            return Err(PathError::NotFound {
                path: self.display(),
            });
        }
        let meta = self.archive.file_times()?;
        pick(&meta).map_err(|e| PathError::io("stat", &self.archive.file_path, e))
    }
}

impl PartialEq for ZipPath {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.archive, &other.archive) && self.segments == other.segments
    }
}

impl Eq for ZipPath {}

impl Hash for ZipPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.archive).hash(state);
        self.segments.hash(state);
    }
}

impl fmt::Debug for ZipPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZipPath({:?})", self.path())
    }
}

impl PathNav for ZipPath {
    fn sep(&self) -> char {
        '/'
    }

    /// The archive file's path followed by the entry name.
    fn path(&self) -> String {
        let mut s = self.archive.file_path.to_string_lossy().into_owned();
        for segment in &self.segments {
            s.push('/');
            s.push_str(segment);
        }
        s
    }

    fn parent(&self) -> Self {
        match self.segments.split_last() {
            Some((_, rest)) => ZipPath {
                archive: Arc::clone(&self.archive),
                segments: rest.to_vec(),
            },
            None => self.clone(),
        }
    }

    fn child(&self, name: &str) -> Result<Self, PathError> {
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        Ok(ZipPath {
            archive: Arc::clone(&self.archive),
            segments,
        })
    }

    fn basename(&self) -> String {
        self.segments.last().cloned().unwrap_or_default()
    }
}

impl PathList for ZipPath {
    fn listdir(&self) -> Result<Vec<String>, PathError> {
        let key = self.path_in_archive();
        let index = self.archive.read_index();
        if let Some(children) = index.dirs.get(&key) {
            return Ok(children.clone());
        }
        let reason = if index.entries.contains_key(&key) {
            "not a directory"
        } else {
            "no such entry"
        };
        Err(PathError::NotListable {
            path: self.display(),
            reason: reason.into(),
        })
    }
}

impl PathContent for ZipPath {
    /// Reading loads the whole entry. [`OpenMode::Write`] buffers until
    /// close; appending to or updating an entry is not supported.
    fn open(&self, mode: OpenMode) -> Result<Box<dyn PathHandle>, PathError> {
        match mode {
            OpenMode::Read => {
                let data = self.archive.read_entry(&self.path_in_archive(), &self.display())?;
                Ok(Box::new(BufferHandle::reader(data)))
            }
            OpenMode::Write => {
                if !self.archive.is_writable() {
                    return Err(PathError::NotSupported {
                        operation: "open",
                        path: self.display(),
                    });
                }
                let target = self.clone();
                Ok(Box::new(BufferHandle::writer(Vec::new(), 0, move |data| {
                    target.set_content(&data)
                })))
            }
            OpenMode::Append | OpenMode::ReadWrite => Err(PathError::NotSupported {
                operation: "open",
                path: self.display(),
            }),
        }
    }

    fn create_directory(&self) -> Result<(), PathError> {
        self.archive
            .add_directory(&self.path_in_archive(), &self.display())
    }

    fn get_content(&self) -> Result<Vec<u8>, PathError> {
        self.archive.read_entry(&self.path_in_archive(), &self.display())
    }

    /// Entries are written in place; `_ext` is unused.
    fn set_content_ext(&self, content: &[u8], _ext: &str) -> Result<(), PathError> {
        if self.is_root() {
            return Err(PathError::NotAFile {
                path: self.display(),
            });
        }
        self.archive
            .write_entry(&self.path_in_archive(), content, &self.display())
    }
}

impl PathStat for ZipPath {
    fn changed(&self) {}

    fn getsize(&self) -> Result<u64, PathError> {
        match self.entry() {
            Some(entry) => Ok(entry.size),
            None if self.is_dir()? => Err(PathError::NotAFile {
                path: self.display(),
            }),
            None => Err(PathError::NotFound {
                path: self.display(),
            }),
        }
    }

    fn modification_time(&self) -> Result<SystemTime, PathError> {
        self.time(fs::Metadata::modified)
    }

    /// Zip entries record one timestamp, reported for all three times.
    fn status_change_time(&self) -> Result<SystemTime, PathError> {
        self.time(fs::Metadata::modified)
    }

    fn access_time(&self) -> Result<SystemTime, PathError> {
        self.time(fs::Metadata::accessed)
    }

    fn exists(&self) -> Result<bool, PathError> {
        Ok(self.is_dir()? || self.is_file()?)
    }

    fn is_dir(&self) -> Result<bool, PathError> {
        Ok(self
            .archive
            .read_index()
            .dirs
            .contains_key(&self.path_in_archive()))
    }

    fn is_file(&self) -> Result<bool, PathError> {
        Ok(self.entry().is_some())
    }

    fn is_link(&self) -> Result<bool, PathError> {
        Ok(false)
    }
}

impl PathLink for ZipPath {
    fn realpath(&self) -> Result<Self, PathError> {
        Ok(self.clone())
    }
}
