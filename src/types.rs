//! Core types shared by every backend.

use std::fmt;
use std::str::FromStr;

use crate::PathError;

/// Extension used for the temporary sibling written by
/// [`PathContent::set_content`](crate::PathContent::set_content).
pub const DEFAULT_TEMP_EXT: &str = ".new";

/// Mode a path is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpenMode {
    /// Read-only access.
    #[default]
    Read,
    /// Write access, creating the file and truncating it.
    Write,
    /// Write access at the end of the file, creating it if needed.
    Append,
    /// Read and write access to an existing file.
    ReadWrite,
}

impl OpenMode {
    /// Returns `true` if this mode may modify the target.
    #[inline]
    pub const fn is_writing(&self) -> bool {
        !matches!(self, OpenMode::Read)
    }
}

impl FromStr for OpenMode {
    type Err = PathError;

    /// Parse a classic mode string such as `"rb"`, `"w"` or `"a+"`.
    ///
    /// The binary flag `b` is accepted and ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let plus = s.contains('+');
        let mode = match s.chars().find(|c| matches!(c, 'r' | 'w' | 'a')) {
            Some('r') if plus => OpenMode::ReadWrite,
            Some('r') => OpenMode::Read,
            Some('w') => OpenMode::Write,
            Some('a') => OpenMode::Append,
            _ => {
                return Err(PathError::InvalidData {
                    path: Default::default(),
                    details: format!("invalid open mode {s:?}"),
                });
            }
        };
        if s.chars().any(|c| !matches!(c, 'r' | 'w' | 'a' | 'b' | '+' | 't')) {
            return Err(PathError::InvalidData {
                path: Default::default(),
                details: format!("invalid open mode {s:?}"),
            });
        }
        Ok(mode)
    }
}

/// Kind of entry a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Anything else (device, socket, fifo).
    Other,
}

/// Read/write/execute bits for one user category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rwx {
    /// Permission to read.
    pub read: bool,
    /// Permission to write.
    pub write: bool,
    /// Permission to execute.
    pub execute: bool,
}

impl Rwx {
    const fn from_bits(bits: u32) -> Self {
        Self {
            read: bits & 0o4 != 0,
            write: bits & 0o2 != 0,
            execute: bits & 0o1 != 0,
        }
    }

    /// Short `ls -l` style form, e.g. `"r-x"`.
    pub fn shorthand(&self) -> String {
        let mut s = String::with_capacity(3);
        s.push(if self.read { 'r' } else { '-' });
        s.push(if self.write { 'w' } else { '-' });
        s.push(if self.execute { 'x' } else { '-' });
        s
    }
}

/// Permission bits decoded from a Unix mode.
///
/// Only reports bits; nothing in this crate enforces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permissions {
    /// Owner permissions.
    pub user: Rwx,
    /// Group permissions.
    pub group: Rwx,
    /// Everyone else.
    pub other: Rwx,
}

impl Permissions {
    /// Decode the permission bits of a mode (file-type bits are ignored).
    pub const fn from_mode(mode: u32) -> Self {
        Self {
            user: Rwx::from_bits(mode >> 6 & 0o7),
            group: Rwx::from_bits(mode >> 3 & 0o7),
            other: Rwx::from_bits(mode & 0o7),
        }
    }

    /// Encode back to the low nine mode bits.
    pub const fn mode(&self) -> u32 {
        const fn bits(r: Rwx) -> u32 {
            (r.read as u32) << 2 | (r.write as u32) << 1 | r.execute as u32
        }
        bits(self.user) << 6 | bits(self.group) << 3 | bits(self.other)
    }

    /// `ls -l` style form, e.g. `"rwxr-xr--"`.
    pub fn shorthand(&self) -> String {
        [self.user, self.group, self.other]
            .iter()
            .map(Rwx::shorthand)
            .collect()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.shorthand())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_mode_is_writing() {
        assert!(!OpenMode::Read.is_writing());
        assert!(OpenMode::Write.is_writing());
        assert!(OpenMode::Append.is_writing());
        assert!(OpenMode::ReadWrite.is_writing());
    }

    #[test]
    fn open_mode_parses_classic_strings() {
        assert_eq!("r".parse::<OpenMode>().unwrap(), OpenMode::Read);
        assert_eq!("rb".parse::<OpenMode>().unwrap(), OpenMode::Read);
        assert_eq!("wb".parse::<OpenMode>().unwrap(), OpenMode::Write);
        assert_eq!("a".parse::<OpenMode>().unwrap(), OpenMode::Append);
        assert_eq!("r+".parse::<OpenMode>().unwrap(), OpenMode::ReadWrite);
        assert_eq!("w+".parse::<OpenMode>().unwrap(), OpenMode::Write);
        assert!("x".parse::<OpenMode>().is_err());
        assert!("rq".parse::<OpenMode>().is_err());
    }

    #[test]
    fn permissions_from_mode() {
        let p = Permissions::from_mode(0o754);
        assert!(p.user.read && p.user.write && p.user.execute);
        assert!(p.group.read && !p.group.write && p.group.execute);
        assert!(p.other.read && !p.other.write && !p.other.execute);
        assert_eq!(p.mode(), 0o754);
    }

    #[test]
    fn permissions_ignore_file_type_bits() {
        let p = Permissions::from_mode(0o100644);
        assert_eq!(p.mode(), 0o644);
    }

    #[test]
    fn permissions_shorthand() {
        assert_eq!(Permissions::from_mode(0o751).shorthand(), "rwxr-x--x");
        assert_eq!(Permissions::from_mode(0).to_string(), "---------");
    }

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OpenMode>();
        assert_send_sync::<FileKind>();
        assert_send_sync::<Permissions>();
    }
}
