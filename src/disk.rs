//! # Disk Backend
//!
//! [`DiskPath`] addresses the local filesystem.
//!
//! ## Containment
//!
//! [`child`](PathNav::child) is the security boundary of this crate: a name
//! is accepted only if it lands directly inside the receiving directory.
//! Separators, drive markers (on Windows), `.`, `..` and the empty name are
//! rejected with [`PathError::InsecurePath`]. Callers that already trust a
//! multi-segment fragment use [`DiskPath::preauth_child`], which still
//! refuses to leave the subtree.
//!
//! ## Metadata Cache
//!
//! Metadata is read on first use and cached until
//! [`changed`](PathStat::changed). Operations on this value that mutate the
//! filesystem invalidate it themselves; changes made through other values or
//! other processes are not noticed until `changed` is called.
//!
//! ## Atomic Replacement
//!
//! [`set_content_ext`](PathContent::set_content_ext) writes the new bytes to
//! a fresh sibling named `<16 random chars><basename><ext>`, syncs it, then
//! renames it over the target. A reader sees either the old or the new
//! content. If a step fails the sibling stays on disk and a `warn` event
//! names it.

use std::fmt;
use std::fs::{self, File, FileTimes, Metadata, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use path_absolutize::Absolutize;
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::{debug, warn};

use crate::{
    FileKind, OpenMode, PathContent, PathError, PathHandle, PathLink, PathList, PathNav,
    PathStat, Permissions,
};

const TOKEN_LEN: usize = 16;

/// Random name prefix for temporary siblings.
fn secure_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// A path on the local filesystem.
///
/// The path is made absolute once, at construction, by resolving `.` and
/// `..` lexically against the current directory. Symbolic links are not
/// resolved; use [`realpath`](PathLink::realpath) for that.
///
/// Equality and hashing use the absolute path only.
///
/// # Example
///
/// ```rust,no_run
/// use anypath::{DiskPath, PathContent, PathNav};
///
/// let base = DiskPath::new("/srv/data")?;
/// let config = base.child("config.json")?;
/// config.set_content(b"{}")?;
///
/// assert!(base.child("../etc").is_err());
/// # Ok::<(), anypath::PathError>(())
/// ```
pub struct DiskPath {
    path: PathBuf,
    always_create: bool,
    stat: RwLock<Option<Metadata>>,
}

impl DiskPath {
    /// Create a path, making it absolute.
    ///
    /// # Errors
    ///
    /// - [`PathError::Io`] if the current directory is needed and cannot be
    ///   read.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, PathError> {
        let path = path.as_ref();
        let absolute = path
            .absolutize()
            .map_err(|e| PathError::io("absolutize", path, e))?;
        Ok(Self::from_absolute(absolute.into_owned()))
    }

    fn from_absolute(path: PathBuf) -> Self {
        Self {
            path,
            always_create: false,
            stat: RwLock::new(None),
        }
    }

    fn join_absolute(&self, fragment: &str) -> Result<PathBuf, PathError> {
        let joined = self.path.join(fragment);
        let absolute = joined
            .absolutize()
            .map_err(|e| PathError::io("absolutize", &joined, e))?;
        Ok(absolute.into_owned())
    }

    fn insecure(&self, name: &str, reason: &str) -> PathError {
        PathError::InsecurePath {
            path: self.path.join(name),
            reason: reason.into(),
        }
    }

    /// The absolute path.
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Whether opening this path must create it exclusively.
    pub fn always_create(&self) -> bool {
        self.always_create
    }

    /// Require (or stop requiring) that [`open`](PathContent::open) in a
    /// writing mode creates the file, failing if it already exists.
    pub fn require_create(mut self, always: bool) -> Self {
        self.always_create = always;
        self
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// A descendant given by a trusted, possibly multi-segment fragment.
    ///
    /// Separators are allowed, but the result must still be this path or lie
    /// below it.
    ///
    /// # Errors
    ///
    /// - [`PathError::InsecurePath`] if the fragment leaves this subtree.
    pub fn preauth_child(&self, fragment: &str) -> Result<Self, PathError> {
        let joined = self.join_absolute(fragment)?;
        if !joined.starts_with(&self.path) {
            return Err(self.insecure(fragment, "escapes the parent directory"));
        }
        Ok(Self::from_absolute(joined))
    }

    /// The first of the trusted `fragments` that exists below this path.
    pub fn child_search_preauth<S: AsRef<str>>(
        &self,
        fragments: &[S],
    ) -> Result<Option<Self>, PathError> {
        for fragment in fragments {
            let candidate = self.preauth_child(fragment.as_ref())?;
            if candidate.exists()? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// This path with `ext` appended to its final component.
    ///
    /// Include the dot yourself: `sibling_extension(".bak")`.
    pub fn sibling_extension(&self, ext: &str) -> Self {
        let mut raw = self.path.clone().into_os_string();
        raw.push(ext);
        Self::from_absolute(PathBuf::from(raw))
    }

    /// The first existing path among this path with each of `exts` appended.
    ///
    /// `""` matches this path itself if it exists. `"*"` matches any sibling
    /// whose name starts with `<basename>.`.
    pub fn sibling_extension_search<S: AsRef<str>>(
        &self,
        exts: &[S],
    ) -> Result<Option<Self>, PathError> {
        for ext in exts {
            let ext = ext.as_ref();
            if ext == "*" {
                let prefix = format!("{}.", self.basename());
                let parent = self.parent();
                if let Some(name) = parent
                    .listdir()?
                    .into_iter()
                    .find(|name| name.starts_with(&prefix))
                {
                    return Ok(Some(Self::from_absolute(parent.path.join(name))));
                }
                continue;
            }
            let candidate = self.sibling_extension(ext);
            if candidate.exists()? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// An unpredictable, not yet existing sibling named
    /// `<16 random chars><basename><ext>`.
    ///
    /// The result requires exclusive creation.
    pub fn temporary_sibling(&self, ext: &str) -> Result<Self, PathError> {
        let name = format!("{}{}{}", secure_token(), self.basename(), ext);
        Ok(self.sibling(&name)?.require_create(true))
    }

    /// The containing directory as a string.
    pub fn dirname(&self) -> String {
        self.path
            .parent()
            .unwrap_or(&self.path)
            .to_string_lossy()
            .into_owned()
    }

    /// Split the path into everything before the extension and the extension
    /// with its dot. Leading dots of the final component do not start an
    /// extension.
    pub fn splitext(&self) -> (String, String) {
        let full = self.path();
        let base = self.basename();
        let leading = base.len() - base.trim_start_matches('.').len();
        match base[leading..].rfind('.') {
            Some(dot) => {
                let ext_len = base.len() - (leading + dot);
                let split = full.len() - ext_len;
                (full[..split].to_owned(), full[split..].to_owned())
            }
            None => (full, String::new()),
        }
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    fn metadata(&self) -> Result<Metadata, PathError> {
        if let Some(meta) = self
            .stat
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(meta.clone());
        }
        let meta = fs::metadata(&self.path).map_err(|e| PathError::io("stat", &self.path, e))?;
        *self.stat.write().unwrap_or_else(PoisonError::into_inner) = Some(meta.clone());
        Ok(meta)
    }

    /// Metadata, or `None` when nothing is there.
    fn try_metadata(&self) -> Result<Option<Metadata>, PathError> {
        match self.metadata() {
            Ok(meta) => Ok(Some(meta)),
            Err(PathError::NotFound { .. }) => Ok(None),
            Err(PathError::Io { source, .. })
                if source.kind() == io::ErrorKind::NotADirectory || is_link_loop(&source) =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// What kind of entry this is, without following a final symlink.
    pub fn kind(&self) -> Result<FileKind, PathError> {
        let meta = fs::symlink_metadata(&self.path)
            .map_err(|e| PathError::io("lstat", &self.path, e))?;
        let ft = meta.file_type();
        Ok(if ft.is_symlink() {
            FileKind::Symlink
        } else if ft.is_dir() {
            FileKind::Directory
        } else if ft.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        })
    }

    /// Permission bits.
    ///
    /// Without POSIX modes, a read-only file reports `r-xr-xr-x` and
    /// anything else `rwxrwxrwx`.
    pub fn permissions(&self) -> Result<Permissions, PathError> {
        let meta = self.metadata()?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            Ok(Permissions::from_mode(meta.permissions().mode()))
        }
        #[cfg(not(unix))]
        {
            let mode = if meta.permissions().readonly() { 0o555 } else { 0o777 };
            Ok(Permissions::from_mode(mode))
        }
    }

    /// Inode number. POSIX only.
    pub fn inode(&self) -> Result<u64, PathError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            Ok(self.metadata()?.ino())
        }
        #[cfg(not(unix))]
        {
            Err(self.not_posix("inode"))
        }
    }

    /// Device the file lives on. POSIX only.
    pub fn device(&self) -> Result<u64, PathError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            Ok(self.metadata()?.dev())
        }
        #[cfg(not(unix))]
        {
            Err(self.not_posix("device"))
        }
    }

    /// Number of hard links. POSIX only.
    pub fn hard_link_count(&self) -> Result<u64, PathError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            Ok(self.metadata()?.nlink())
        }
        #[cfg(not(unix))]
        {
            Err(self.not_posix("hard_link_count"))
        }
    }

    /// Owner's user id. POSIX only.
    pub fn user_id(&self) -> Result<u32, PathError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            Ok(self.metadata()?.uid())
        }
        #[cfg(not(unix))]
        {
            Err(self.not_posix("user_id"))
        }
    }

    /// Owner's group id. POSIX only.
    pub fn group_id(&self) -> Result<u32, PathError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            Ok(self.metadata()?.gid())
        }
        #[cfg(not(unix))]
        {
            Err(self.not_posix("group_id"))
        }
    }

    #[cfg(not(unix))]
    fn not_posix(&self, operation: &'static str) -> PathError {
        PathError::NotSupported {
            operation,
            path: self.path.clone(),
        }
    }

    /// Whether this is a block device. Always `false` off POSIX.
    pub fn is_block_device(&self) -> Result<bool, PathError> {
        let Some(_meta) = self.try_metadata()? else {
            return Ok(false);
        };
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            Ok(_meta.file_type().is_block_device())
        }
        #[cfg(not(unix))]
        {
            Ok(false)
        }
    }

    /// Whether this is a Unix domain socket. Always `false` off POSIX.
    pub fn is_socket(&self) -> Result<bool, PathError> {
        let Some(_meta) = self.try_metadata()? else {
            return Ok(false);
        };
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            Ok(_meta.file_type().is_socket())
        }
        #[cfg(not(unix))]
        {
            Ok(false)
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Create the file exclusively and open it for reading and writing.
    ///
    /// # Errors
    ///
    /// - [`PathError::Io`] with `AlreadyExists` if the file exists.
    pub fn create(&self) -> Result<Box<dyn PathHandle>, PathError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(|e| PathError::io("create", &self.path, e))?;
        self.changed();
        Ok(Box::new(file))
    }

    /// Create the file if needed and set its access and modification times
    /// to now.
    pub fn touch(&self) -> Result<(), PathError> {
        let file = match OpenOptions::new().append(true).create(true).open(&self.path) {
            Ok(file) => file,
            // Directories can't be opened for appending.
            Err(_) => File::open(&self.path).map_err(|e| PathError::io("touch", &self.path, e))?,
        };
        let now = SystemTime::now();
        file.set_times(FileTimes::new().set_accessed(now).set_modified(now))
            .map_err(|e| PathError::io("touch", &self.path, e))?;
        self.changed();
        Ok(())
    }

    /// Set the permission bits.
    ///
    /// Off POSIX only the owner-write bit is honoured, as the read-only flag.
    pub fn chmod(&self, mode: u32) -> Result<(), PathError> {
        #[cfg(unix)]
        let perms = {
            use std::os::unix::fs::PermissionsExt;
            fs::Permissions::from_mode(mode)
        };
        #[cfg(not(unix))]
        let perms = {
            let mut perms = self.metadata()?.permissions();
            perms.set_readonly(mode & 0o200 == 0);
            perms
        };
        fs::set_permissions(&self.path, perms).map_err(|e| PathError::io("chmod", &self.path, e))?;
        self.changed();
        Ok(())
    }

    /// Create this directory and any missing ancestors.
    pub fn makedirs(&self) -> Result<(), PathError> {
        fs::create_dir_all(&self.path).map_err(|e| PathError::io("makedirs", &self.path, e))?;
        self.changed();
        Ok(())
    }

    /// Copy this file or tree to `destination`.
    ///
    /// A directory's children (not the directory itself) are copied into
    /// `destination`, which is created if missing. A file overwrites
    /// `destination`. With `follow_links` false, a symlink is recreated as a
    /// symlink with the same target. Permissions and ownership are not
    /// copied.
    ///
    /// # Errors
    ///
    /// - [`PathError::NotFound`] if nothing exists here.
    /// - [`PathError::NotSupported`] for devices, sockets and fifos.
    pub fn copy_to(&self, destination: &DiskPath, follow_links: bool) -> Result<(), PathError> {
        if !follow_links && self.is_link()? {
            let target =
                fs::read_link(&self.path).map_err(|e| PathError::io("readlink", &self.path, e))?;
            symlink(&target, &destination.path)?;
        } else if self.is_dir()? {
            if !destination.exists()? {
                destination.create_directory()?;
            }
            for child in self.children()? {
                child.copy_to(&destination.child(&child.basename())?, follow_links)?;
            }
        } else if self.is_file()? {
            let mut reader =
                File::open(&self.path).map_err(|e| PathError::io("open", &self.path, e))?;
            let mut writer = destination.open(OpenMode::Write)?;
            let copied = io::copy(&mut reader, &mut writer);
            let closed = writer.close();
            copied.map_err(|e| PathError::io("copy", &destination.path, e))?;
            closed?;
        } else if !self.exists()? {
            return Err(PathError::NotFound {
                path: self.path.clone(),
            });
        } else {
            return Err(PathError::NotSupported {
                operation: "copy_to",
                path: self.path.clone(),
            });
        }
        destination.changed();
        Ok(())
    }

    /// Rename this path to `destination`.
    ///
    /// Across devices the tree is copied to a temporary sibling of
    /// `destination`, renamed into place, and only then is the source moved
    /// aside and removed. `destination` is valid at every point, but the
    /// removal of the source is not atomic.
    pub fn move_to(&self, destination: &DiskPath, follow_links: bool) -> Result<(), PathError> {
        match fs::rename(&self.path, &destination.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                debug!(
                    from = %self.path.display(),
                    to = %destination.path.display(),
                    "rename crosses devices, copying"
                );
                let staged = destination.temporary_sibling("")?;
                self.copy_to(&staged, follow_links)?;
                staged.move_to(destination, follow_links)?;

                let doomed = self.temporary_sibling("")?;
                self.move_to(&doomed, follow_links)?;
                doomed.remove()?;
            }
            Err(e) => return Err(PathError::io("rename", &self.path, e)),
        }
        self.changed();
        destination.changed();
        Ok(())
    }

    /// Remove this file, or this directory and everything in it.
    ///
    /// A symlink to a directory is removed as a link; its target is left
    /// alone.
    pub fn remove(&self) -> Result<(), PathError> {
        if self.is_dir()? && !self.is_link()? {
            for child in self.children()? {
                child.remove()?;
            }
            fs::remove_dir(&self.path).map_err(|e| PathError::io("rmdir", &self.path, e))?;
        } else {
            fs::remove_file(&self.path).map_err(|e| PathError::io("remove", &self.path, e))?;
        }
        self.changed();
        Ok(())
    }

    /// Create a symlink at `link` pointing to this path.
    pub fn link_to(&self, link: &DiskPath) -> Result<(), PathError> {
        symlink(&self.path, &link.path)?;
        link.changed();
        Ok(())
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> Result<(), PathError> {
    std::os::unix::fs::symlink(target, link).map_err(|e| PathError::io("symlink", link, e))
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> Result<(), PathError> {
    let made = if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    };
    made.map_err(|e| PathError::io("symlink", link, e))
}

#[cfg(not(any(unix, windows)))]
fn symlink(_target: &Path, link: &Path) -> Result<(), PathError> {
    Err(PathError::NotSupported {
        operation: "symlink",
        path: link.to_path_buf(),
    })
}

#[cfg(unix)]
fn is_link_loop(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::ELOOP)
}

#[cfg(not(unix))]
fn is_link_loop(_e: &io::Error) -> bool {
    false
}

/// Write, sync and rename a staged file over `target`.
fn commit_staged(mut staged: File, content: &[u8], from: &Path, target: &Path) -> Result<(), PathError> {
    staged
        .write_all(content)
        .and_then(|()| staged.sync_all())
        .map_err(|e| PathError::io("write", from, e))?;
    drop(staged);
    fs::rename(from, target).map_err(|e| PathError::io("rename", from, e))
}

impl Clone for DiskPath {
    /// Clones start with an empty metadata cache.
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            always_create: self.always_create,
            stat: RwLock::new(None),
        }
    }
}

impl PartialEq for DiskPath {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for DiskPath {}

impl Hash for DiskPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Debug for DiskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DiskPath({:?})", self.path)
    }
}

impl fmt::Display for DiskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.path.display(), f)
    }
}

// =============================================================================
// Capability traits
// =============================================================================

impl PathNav for DiskPath {
    fn sep(&self) -> char {
        std::path::MAIN_SEPARATOR
    }

    fn path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    fn parent(&self) -> Self {
        match self.path.parent() {
            Some(parent) => Self::from_absolute(parent.to_path_buf()),
            None => self.clone(),
        }
    }

    fn child(&self, name: &str) -> Result<Self, PathError> {
        if cfg!(windows) && name.contains(':') {
            return Err(self.insecure(name, "contains a drive marker"));
        }
        if name.chars().any(std::path::is_separator) {
            return Err(self.insecure(name, "contains directory separators"));
        }
        let joined = self.join_absolute(name)?;
        if joined == self.path || joined.parent() != Some(self.path.as_path()) {
            return Err(self.insecure(name, "not a direct child"));
        }
        Ok(Self::from_absolute(joined))
    }

    fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl PathList for DiskPath {
    fn listdir(&self) -> Result<Vec<String>, PathError> {
        let entries = fs::read_dir(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => PathError::NotListable {
                path: self.path.clone(),
                reason: e.to_string(),
            },
            _ => PathError::io("listdir", &self.path, e),
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PathError::io("listdir", &self.path, e))?;
            let name = entry
                .file_name()
                .into_string()
                .map_err(|raw| PathError::InvalidData {
                    path: self.path.join(&raw),
                    details: "file name is not valid UTF-8".into(),
                })?;
            names.push(name);
        }
        Ok(names)
    }
}

impl PathContent for DiskPath {
    fn open(&self, mode: OpenMode) -> Result<Box<dyn PathHandle>, PathError> {
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Read => options.read(true),
            OpenMode::Write => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true).create(true),
            OpenMode::ReadWrite => options.read(true).write(true),
        };
        if self.always_create && mode.is_writing() {
            options.create_new(true);
        }
        let file = options
            .open(&self.path)
            .map_err(|e| PathError::io("open", &self.path, e))?;
        if mode.is_writing() {
            self.changed();
        }
        Ok(Box::new(file))
    }

    fn create_directory(&self) -> Result<(), PathError> {
        fs::create_dir(&self.path).map_err(|e| PathError::io("mkdir", &self.path, e))?;
        self.changed();
        Ok(())
    }

    fn set_content_ext(&self, content: &[u8], ext: &str) -> Result<(), PathError> {
        let staging = self.temporary_sibling(ext)?;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&staging.path)
            .map_err(|e| PathError::io("create", &staging.path, e))?;
        debug!(
            path = %self.path.display(),
            staging = %staging.path.display(),
            bytes = content.len(),
            "replacing content"
        );
        let result = commit_staged(file, content, &staging.path, &self.path);
        if let Err(e) = &result {
            warn!(
                path = %self.path.display(),
                orphan = %staging.path.display(),
                error = %e,
                "content replacement failed, temporary file left behind"
            );
        }
        self.changed();
        result
    }
}

impl PathStat for DiskPath {
    fn changed(&self) {
        *self.stat.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn getsize(&self) -> Result<u64, PathError> {
        Ok(self.metadata()?.len())
    }

    fn modification_time(&self) -> Result<SystemTime, PathError> {
        self.metadata()?
            .modified()
            .map_err(|e| PathError::io("mtime", &self.path, e))
    }

    #[cfg(unix)]
    fn status_change_time(&self) -> Result<SystemTime, PathError> {
        use std::os::unix::fs::MetadataExt;
        use std::time::Duration;

        let meta = self.metadata()?;
        let secs = meta.ctime();
        let nanos = meta.ctime_nsec() as u32;
        let time = if secs >= 0 {
            SystemTime::UNIX_EPOCH + Duration::new(secs as u64, nanos)
        } else {
            SystemTime::UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
                + Duration::from_nanos(nanos.into())
        };
        Ok(time)
    }

    #[cfg(not(unix))]
    fn status_change_time(&self) -> Result<SystemTime, PathError> {
        self.metadata()?
            .created()
            .map_err(|e| PathError::io("ctime", &self.path, e))
    }

    fn access_time(&self) -> Result<SystemTime, PathError> {
        self.metadata()?
            .accessed()
            .map_err(|e| PathError::io("atime", &self.path, e))
    }

    fn exists(&self) -> Result<bool, PathError> {
        Ok(self.try_metadata()?.is_some())
    }

    fn is_dir(&self) -> Result<bool, PathError> {
        Ok(self.try_metadata()?.is_some_and(|m| m.is_dir()))
    }

    fn is_file(&self) -> Result<bool, PathError> {
        Ok(self.try_metadata()?.is_some_and(|m| m.is_file()))
    }

    /// Always reads fresh link metadata; the cache holds the link target's.
    fn is_link(&self) -> Result<bool, PathError> {
        match fs::symlink_metadata(&self.path) {
            Ok(meta) => Ok(meta.file_type().is_symlink()),
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                Ok(false)
            }
            Err(e) => Err(PathError::io("lstat", &self.path, e)),
        }
    }
}

impl PathLink for DiskPath {
    fn realpath(&self) -> Result<Self, PathError> {
        match fs::canonicalize(&self.path) {
            Ok(resolved) if resolved == self.path => {
                if self.is_link()? {
                    Err(PathError::LinkCycle {
                        path: self.path.clone(),
                    })
                } else {
                    Ok(self.clone())
                }
            }
            Ok(resolved) => Ok(Self::from_absolute(resolved)),
            Err(e) if is_link_loop(&e) => Err(PathError::LinkCycle {
                path: self.path.clone(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let parent = self.parent();
                if parent == *self {
                    return Ok(self.clone());
                }
                Ok(Self::from_absolute(parent.realpath()?.path.join(self.basename())))
            }
            Err(e) => Err(PathError::io("realpath", &self.path, e)),
        }
    }
}
