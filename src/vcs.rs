//! # Version-Control Backend
//!
//! [`VcsPath`] is a disk path whose listings show only the files tracked by
//! a git or Mercurial repository. Content and metadata come straight from
//! the disk; only [`listdir`](PathList::listdir) consults the repository,
//! through a [`TrackedListing`].
//!
//! The repository root is the fixed point of [`parent`](PathNav::parent).
//! A `VcsPath` is a read view of the working tree: every mutation fails with
//! [`PathError::NotSupported`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::debug;

use crate::{
    DiskPath, OpenMode, PathContent, PathError, PathExt, PathHandle, PathLink, PathList, PathNav,
    PathStat,
};

/// Lists the tracked entries of a working-tree directory.
///
/// This is the only place a [`VcsPath`] touches the version-control system,
/// so tests and other tools can substitute their own listing.
pub trait TrackedListing: fmt::Debug + Send + Sync {
    /// Names of tracked files and directories directly inside `dir`, which
    /// lies in the working tree rooted at `root`.
    fn list_tracked(&self, dir: &DiskPath, root: &DiskPath) -> Result<Vec<String>, PathError>;
}

/// Run `command` and split its stdout on NUL bytes.
fn run(mut command: Command) -> Result<Vec<String>, PathError> {
    let shown = format!("{command:?}");
    debug!(command = %shown, "running version-control tool");
    let program = PathBuf::from(command.get_program());
    let output = command
        .output()
        .map_err(|e| PathError::io("spawn", program, e))?;
    if !output.status.success() {
        return Err(PathError::Vcs {
            command: shown,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .split('\0')
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

/// `dir` relative to `root`, joined with `/`.
fn relative(dir: &DiskPath, root: &DiskPath) -> Result<String, PathError> {
    let segments = dir.segments_from(root)?;
    Ok(segments.join("/"))
}

/// Git listing via `git ls-tree` on `HEAD`.
#[derive(Debug, Clone, Default)]
pub struct Git {
    git_dir: Option<PathBuf>,
}

impl Git {
    /// List using the repository found from the working tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// List using an explicit repository directory (the `.git` directory).
    pub fn with_git_dir(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: Some(git_dir.into()),
        }
    }
}

impl TrackedListing for Git {
    fn list_tracked(&self, dir: &DiskPath, root: &DiskPath) -> Result<Vec<String>, PathError> {
        let mut command = Command::new("git");
        command.arg("-C").arg(root.as_path());
        if let Some(git_dir) = &self.git_dir {
            command.arg("--git-dir").arg(git_dir);
        }
        command.args(["ls-tree", "-z", "--name-only", "HEAD"]);
        let rel = relative(dir, root)?;
        if !rel.is_empty() {
            command.arg("--").arg(format!("{rel}/"));
        }
        Ok(run(command)?
            .into_iter()
            .map(|entry| match entry.rsplit_once('/') {
                Some((_, name)) => name.to_owned(),
                None => entry,
            })
            .collect())
    }
}

/// Mercurial listing via `hg files`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mercurial;

impl TrackedListing for Mercurial {
    fn list_tracked(&self, dir: &DiskPath, root: &DiskPath) -> Result<Vec<String>, PathError> {
        let mut command = Command::new("hg");
        command.arg("--cwd").arg(root.as_path());
        command.args(["files", "-0"]);
        let rel = relative(dir, root)?;
        if !rel.is_empty() {
            command.arg("-I").arg(format!("path:{rel}"));
        }
        let prefix = if rel.is_empty() { rel } else { format!("{rel}/") };

        // `hg files` lists files only; directories are the first component
        // of deeper paths.
        let mut names: Vec<String> = Vec::new();
        for file in run(command)? {
            let Some(below) = file.strip_prefix(&prefix) else {
                continue;
            };
            let name = below.split('/').next().unwrap_or(below);
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_owned());
            }
        }
        Ok(names)
    }
}

/// A disk path inside a version-controlled working tree.
#[derive(Debug, Clone)]
pub struct VcsPath {
    path: DiskPath,
    root: DiskPath,
    lister: Arc<dyn TrackedListing>,
}

impl VcsPath {
    /// The working-tree root `root`, listed by `lister`.
    pub fn with_lister(root: DiskPath, lister: Arc<dyn TrackedListing>) -> Self {
        Self {
            path: root.clone(),
            root,
            lister,
        }
    }

    /// Detect the repository `path` belongs to.
    ///
    /// In order: a `.git` directory in `path` (which becomes the root), a
    /// git work tree containing `path`, a `.hg` directory in `path`.
    /// Returns `None` for a directory under no version control.
    pub fn discover(path: &DiskPath) -> Result<Option<Self>, PathError> {
        let git_dir = path.child(".git")?;
        if git_dir.is_dir()? {
            let lister = Git::with_git_dir(git_dir.as_path());
            return Ok(Some(Self::with_lister(path.clone(), Arc::new(lister))));
        }
        if let Some(top) = git_toplevel(path.as_path()) {
            let root = Self::ancestor_matching(path, &DiskPath::new(top)?)?;
            return Ok(Some(Self {
                path: path.clone(),
                root,
                lister: Arc::new(Git::new()),
            }));
        }
        if path.child(".hg")?.is_dir()? {
            return Ok(Some(Self::with_lister(path.clone(), Arc::new(Mercurial))));
        }
        Ok(None)
    }

    /// The ancestor of `path` (or `path` itself) that resolves to the same
    /// place as `top`, so the root is spelled the way `path` is.
    fn ancestor_matching(path: &DiskPath, top: &DiskPath) -> Result<DiskPath, PathError> {
        let target = top.realpath()?;
        for candidate in std::iter::once(path.clone()).chain(path.parents()) {
            if candidate.realpath()? == target {
                return Ok(candidate);
            }
        }
        Ok(top.clone())
    }

    /// The underlying disk path.
    pub fn disk(&self) -> &DiskPath {
        &self.path
    }

    /// The working-tree root.
    pub fn root(&self) -> &DiskPath {
        &self.root
    }

    fn wrap(&self, path: DiskPath) -> Self {
        Self {
            path,
            root: self.root.clone(),
            lister: Arc::clone(&self.lister),
        }
    }

    fn unsupported(&self, operation: &'static str) -> PathError {
        PathError::NotSupported {
            operation,
            path: self.path.as_path().to_path_buf(),
        }
    }
}

/// `git rev-parse` from `dir`: the work-tree top if `dir` is inside one.
fn git_toplevel(dir: &Path) -> Option<PathBuf> {
    let mut command = Command::new("git");
    command
        .arg("-C")
        .arg(dir)
        .args(["rev-parse", "--is-inside-work-tree", "--show-toplevel"]);
    debug!(command = ?command, "probing for git work tree");
    let output = command.output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8(output.stdout).ok()?;
    let mut lines = stdout.lines();
    if lines.next()? != "true" {
        return None;
    }
    lines.next().map(PathBuf::from)
}

impl PartialEq for VcsPath {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.path == other.path
    }
}

impl Eq for VcsPath {}

impl Hash for VcsPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root.hash(state);
        self.path.hash(state);
    }
}

impl PathNav for VcsPath {
    fn sep(&self) -> char {
        self.path.sep()
    }

    fn path(&self) -> String {
        self.path.path()
    }

    fn parent(&self) -> Self {
        if self.path == self.root {
            return self.clone();
        }
        self.wrap(self.path.parent())
    }

    fn child(&self, name: &str) -> Result<Self, PathError> {
        Ok(self.wrap(self.path.child(name)?))
    }

    fn basename(&self) -> String {
        self.path.basename()
    }
}

impl PathList for VcsPath {
    fn listdir(&self) -> Result<Vec<String>, PathError> {
        if !self.path.is_dir()? {
            return Err(PathError::NotListable {
                path: self.path.as_path().to_path_buf(),
                reason: "not a directory".into(),
            });
        }
        self.lister.list_tracked(&self.path, &self.root)
    }
}

impl PathContent for VcsPath {
    fn open(&self, mode: OpenMode) -> Result<Box<dyn PathHandle>, PathError> {
        if mode.is_writing() {
            return Err(self.unsupported("open"));
        }
        self.path.open(mode)
    }

    fn create_directory(&self) -> Result<(), PathError> {
        Err(self.unsupported("create_directory"))
    }

    fn get_content(&self) -> Result<Vec<u8>, PathError> {
        self.path.get_content()
    }

    fn set_content_ext(&self, _content: &[u8], _ext: &str) -> Result<(), PathError> {
        Err(self.unsupported("set_content"))
    }
}

impl PathStat for VcsPath {
    fn changed(&self) {
        self.path.changed();
    }

    fn getsize(&self) -> Result<u64, PathError> {
        self.path.getsize()
    }

    fn modification_time(&self) -> Result<SystemTime, PathError> {
        self.path.modification_time()
    }

    fn status_change_time(&self) -> Result<SystemTime, PathError> {
        self.path.status_change_time()
    }

    fn access_time(&self) -> Result<SystemTime, PathError> {
        self.path.access_time()
    }

    fn exists(&self) -> Result<bool, PathError> {
        self.path.exists()
    }

    fn is_dir(&self) -> Result<bool, PathError> {
        self.path.is_dir()
    }

    fn is_file(&self) -> Result<bool, PathError> {
        self.path.is_file()
    }

    fn is_link(&self) -> Result<bool, PathError> {
        self.path.is_link()
    }
}

impl PathLink for VcsPath {
    fn realpath(&self) -> Result<Self, PathError> {
        Ok(self.wrap(self.path.realpath()?))
    }
}
