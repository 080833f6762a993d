//! # ISO 9660 Backend
//!
//! Read-only access to ISO 9660 disc images.
//!
//! ## Layout
//!
//! | Structure | Location |
//! |-----------|----------|
//! | Sector | 2048 bytes |
//! | Volume descriptors | From sector 16 until a `0xFF` terminator |
//! | Descriptor payload | After the 7-byte header (type, `CD001`, version) |
//! | Primary descriptor fields | Identifier `+33` (32), root record `+149` (34), creator `+439` (128), created `+806` (17), modified `+823` (17) |
//!
//! Integers are read little-endian. Directory records are read only up to
//! the directory's recorded length; a zero length byte, or a record that
//! would cross a sector boundary, moves reading to the next sector.
//!
//! ## Names
//!
//! Identifiers are lowercased, then a trailing `;<digits>` version is
//! removed, then one trailing `.`: `FOO.TXT;1` reads as `foo.txt` and
//! `BAR.;1` as `bar`.
//!
//! ## Directory Cache
//!
//! Directory extents are discovered lazily as directories are read and kept
//! for the life of the [`IsoImage`]. The cache only grows.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use chrono::NaiveDate;
use tracing::debug;

use crate::handle::BufferHandle;
use crate::{
    FilePath, OpenMode, PathContent, PathError, PathHandle, PathLink, PathList, PathNav,
    PathStat,
};

const SECTOR: u64 = 2048;
const FIRST_DESCRIPTOR: u64 = 16;
const DESCRIPTOR_HEADER: usize = 7;

const PRIMARY_VD: u8 = 0x01;
const TERMINATOR_VD: u8 = 0xFF;
const DIR_FLAG: u8 = 0x02;

const RECORD_HEADER: usize = 33;

/// Location and length of a data region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extent {
    sector: u32,
    size: u32,
}

/// One decoded directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoRecord {
    /// First sector of the data.
    pub extent: u32,
    /// Length of the data in bytes.
    pub size: u32,
    /// Recording time, if one is set.
    pub recorded: Option<SystemTime>,
    /// Whether the record is a directory.
    pub is_dir: bool,
    /// Identifier after lowercasing and version removal.
    pub name: String,
}

impl IsoRecord {
    fn parse(data: &[u8], image: &str) -> Result<Self, PathError> {
        let invalid = |details: &str| PathError::InvalidData {
            path: PathBuf::from(image),
            details: details.into(),
        };
        let len = *data.first().ok_or_else(|| invalid("empty directory record"))? as usize;
        if len < RECORD_HEADER + 1 || len > data.len() {
            return Err(invalid("directory record length out of range"));
        }
        let name_len = data[32] as usize;
        if RECORD_HEADER + name_len > len {
            return Err(invalid("file identifier overruns its record"));
        }
        let raw = String::from_utf8_lossy(&data[RECORD_HEADER..RECORD_HEADER + name_len]);
        Ok(Self {
            extent: le_u32(&data[2..6]),
            size: le_u32(&data[10..14]),
            recorded: record_date(&data[18..24]),
            is_dir: data[25] & DIR_FLAG != 0,
            name: raw.to_lowercase(),
        })
    }

    fn extent(&self) -> Extent {
        Extent {
            sector: self.extent,
            size: self.size,
        }
    }

    /// The `.` and `..` entries, stored as single `0x00` and `0x01` bytes.
    fn is_self_or_parent(&self) -> bool {
        self.is_dir && (self.name == "\u{0}" || self.name == "\u{1}")
    }
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

/// Six raw bytes: years since 1900, month, day, hour, minute, second.
/// Zone offset ignored.
fn record_date(bytes: &[u8]) -> Option<SystemTime> {
    let naive = NaiveDate::from_ymd_opt(
        1900 + i32::from(bytes[0]),
        bytes[1].into(),
        bytes[2].into(),
    )?
    .and_hms_opt(bytes[3].into(), bytes[4].into(), bytes[5].into())?;
    Some(SystemTime::from(naive.and_utc()))
}

/// `YYYYMMDDHHMMSScc` digits plus a zone byte. Zeroes mean "not recorded".
fn primary_date(bytes: &[u8]) -> Option<SystemTime> {
    let text = std::str::from_utf8(&bytes[..16]).ok()?;
    if !text.bytes().all(|b| b.is_ascii_digit()) || text.bytes().all(|b| b == b'0') {
        return None;
    }
    let field = |range: std::ops::Range<usize>| text[range].parse::<u32>().ok();
    let naive = NaiveDate::from_ymd_opt(field(0..4)? as i32, field(4..6)?, field(6..8)?)?
        .and_hms_milli_opt(field(8..10)?, field(10..12)?, field(12..14)?, field(14..16)? * 10)?;
    Some(SystemTime::from(naive.and_utc()))
}

fn trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c == ' ' || c == '\0')
        .to_owned()
}

/// Drop a `;<digits>` version, then one trailing dot.
fn fix_name(name: &str) -> String {
    let base = match name.rsplit_once(';') {
        Some((base, version)) if version.bytes().all(|b| b.is_ascii_digit()) => base,
        _ => name,
    };
    base.strip_suffix('.').unwrap_or(base).to_owned()
}

#[derive(Debug, Clone)]
struct Primary {
    identifier: String,
    creator: String,
    created: Option<SystemTime>,
    modified: Option<SystemTime>,
    root: IsoRecord,
}

impl Primary {
    fn parse(payload: &[u8], image: &str) -> Result<Self, PathError> {
        Ok(Self {
            identifier: trimmed(&payload[33..33 + 32]),
            root: IsoRecord::parse(&payload[149..149 + 34], image)?,
            creator: trimmed(&payload[439..439 + 128]),
            created: primary_date(&payload[806..806 + 17]),
            modified: primary_date(&payload[823..823 + 17]),
        })
    }
}

/// An ISO 9660 image opened from any [`FilePath`].
///
/// The image is reopened through `P` for each read, so an image stored in a
/// zip archive or in memory works the same as one on disk.
///
/// # Example
///
/// ```rust,no_run
/// use anypath::{DiskPath, IsoImage, PathContent, PathList, PathNav};
///
/// let image = IsoImage::open(DiskPath::new("install.iso")?)?;
/// println!("volume {}", image.identifier());
/// for name in image.root().listdir()? {
///     println!("{name}");
/// }
/// let _readme = image.root().child("readme.txt")?.get_content()?;
/// # Ok::<(), anypath::PathError>(())
/// ```
pub struct IsoImage<P> {
    image: P,
    primary: Primary,
    dirs: Mutex<HashMap<Vec<String>, Extent>>,
}

impl<P: FilePath> IsoImage<P> {
    /// Read the volume descriptors of `image`.
    ///
    /// # Errors
    ///
    /// - [`PathError::InvalidData`] if the image ends before a terminator or
    ///   holds no primary volume descriptor.
    pub fn open(image: P) -> Result<Arc<Self>, PathError> {
        let shown = image.path();
        let mut handle = image.open(OpenMode::Read)?;
        let scanned = Self::scan_descriptors(&mut *handle, &shown);
        handle.close()?;
        let primary = scanned?.ok_or_else(|| PathError::InvalidData {
            path: PathBuf::from(&shown),
            details: "no primary volume descriptor".into(),
        })?;
        debug!(
            image = %shown,
            identifier = %primary.identifier,
            root_extent = primary.root.extent,
            "opened iso image"
        );
        let mut dirs = HashMap::new();
        dirs.insert(Vec::new(), primary.root.extent());
        Ok(Arc::new(Self {
            image,
            primary,
            dirs: Mutex::new(dirs),
        }))
    }

    fn scan_descriptors(
        handle: &mut dyn PathHandle,
        display: &str,
    ) -> Result<Option<Primary>, PathError> {
        handle
            .seek(SeekFrom::Start(FIRST_DESCRIPTOR * SECTOR))
            .map_err(|e| PathError::io("seek", display, e))?;
        let mut sector = vec![0u8; SECTOR as usize];
        let mut primary = None;
        loop {
            handle.read_exact(&mut sector).map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => PathError::InvalidData {
                    path: PathBuf::from(display),
                    details: "volume descriptors are not terminated".into(),
                },
                _ => PathError::io("read", display, e),
            })?;
            match sector[0] {
                TERMINATOR_VD => return Ok(primary),
                PRIMARY_VD if primary.is_none() => {
                    primary = Some(Primary::parse(&sector[DESCRIPTOR_HEADER..], display)?);
                }
                _ => {}
            }
        }
    }

    /// The path the image is read from.
    pub fn image(&self) -> &P {
        &self.image
    }

    /// Volume identifier.
    pub fn identifier(&self) -> &str {
        &self.primary.identifier
    }

    /// Data preparer / creator identifier.
    pub fn creator(&self) -> &str {
        &self.primary.creator
    }

    /// Volume creation time, if recorded.
    pub fn created(&self) -> Option<SystemTime> {
        self.primary.created
    }

    /// Volume modification time, if recorded.
    pub fn modified(&self) -> Option<SystemTime> {
        self.primary.modified
    }

    /// First sector of the root directory.
    pub fn root_extent(&self) -> u32 {
        self.primary.root.extent
    }

    /// The root directory.
    pub fn root(self: &Arc<Self>) -> IsoPath<P> {
        IsoPath {
            image: Arc::clone(self),
            segments: Vec::new(),
        }
    }

    fn cached(&self, segments: &[String]) -> Option<Extent> {
        self.dirs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(segments)
            .copied()
    }

    fn read_extent(&self, extent: Extent) -> Result<Vec<u8>, PathError> {
        let display = self.image.path();
        let mut handle = self.image.open(OpenMode::Read)?;
        let mut data = Vec::with_capacity(extent.size as usize);
        let read = handle
            .seek(SeekFrom::Start(u64::from(extent.sector) * SECTOR))
            .and_then(|_| (&mut handle).take(u64::from(extent.size)).read_to_end(&mut data));
        let closed = handle.close();
        read.map_err(|e| PathError::io("read", &display, e))?;
        closed?;
        if data.len() < extent.size as usize {
            return Err(PathError::InvalidData {
                path: PathBuf::from(display),
                details: format!("extent at sector {} runs past the image end", extent.sector),
            });
        }
        Ok(data)
    }

    /// All records of the directory at `extent` except `.` and `..`.
    ///
    /// Subdirectory extents are added to the cache under `segments`.
    fn read_records(&self, extent: Extent, segments: &[String]) -> Result<Vec<IsoRecord>, PathError> {
        let data = self.read_extent(extent)?;
        let display = self.image.path();
        let sector = SECTOR as usize;
        let mut records = Vec::new();
        let mut found_dirs = Vec::new();
        let mut offset = 0;
        while offset < data.len() {
            let len = data[offset] as usize;
            let sector_end = (offset / sector + 1) * sector;
            if len == 0 || offset + len > sector_end.min(data.len()) {
                offset = sector_end;
                continue;
            }
            let mut record = IsoRecord::parse(&data[offset..offset + len], &display)?;
            offset += len;
            if record.is_self_or_parent() {
                continue;
            }
            record.name = fix_name(&record.name);
            if record.is_dir {
                let mut path = segments.to_vec();
                path.push(record.name.clone());
                found_dirs.push((path, record.extent()));
            }
            records.push(record);
        }
        self.dirs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(found_dirs);
        Ok(records)
    }

    /// Extent of the directory at `segments`, or `None` if there is none.
    ///
    /// Starts from the deepest cached ancestor and reads each directory on
    /// the way down.
    fn find_dir(&self, segments: &[String]) -> Result<Option<Extent>, PathError> {
        let mut known = segments.len();
        let mut extent = loop {
            if let Some(extent) = self.cached(&segments[..known]) {
                break extent;
            }
            // The root is always cached, so this stops at zero.
            known -= 1;
        };
        for depth in known..segments.len() {
            self.read_records(extent, &segments[..depth])?;
            match self.cached(&segments[..=depth]) {
                Some(next) => extent = next,
                None => return Ok(None),
            }
        }
        Ok(Some(extent))
    }

    /// The record for `segments`, found by a linear scan of its parent.
    fn find_record(&self, segments: &[String]) -> Result<Option<IsoRecord>, PathError> {
        let Some((name, parent)) = segments.split_last() else {
            return Ok(Some(self.primary.root.clone()));
        };
        let Some(extent) = self.find_dir(parent)? else {
            return Ok(None);
        };
        Ok(self
            .read_records(extent, parent)?
            .into_iter()
            .find(|record| &record.name == name))
    }
}

impl<P: fmt::Debug> fmt::Debug for IsoImage<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsoImage")
            .field("image", &self.image)
            .field("identifier", &self.primary.identifier)
            .finish()
    }
}

/// A path inside an [`IsoImage`].
pub struct IsoPath<P> {
    image: Arc<IsoImage<P>>,
    segments: Vec<String>,
}

impl<P: FilePath> IsoPath<P> {
    /// The image this path belongs to.
    pub fn image(&self) -> &Arc<IsoImage<P>> {
        &self.image
    }

    /// The directory record for this path, if it exists.
    pub fn record(&self) -> Result<Option<IsoRecord>, PathError> {
        self.image.find_record(&self.segments)
    }

    fn display(&self) -> PathBuf {
        PathBuf::from(self.path())
    }

    fn existing_record(&self) -> Result<IsoRecord, PathError> {
        self.record()?.ok_or_else(|| PathError::NotFound {
            path: self.display(),
        })
    }

    fn read_only(&self, operation: &'static str) -> PathError {
        PathError::NotSupported {
            operation,
            path: self.display(),
        }
    }

    fn recorded(&self) -> Result<SystemTime, PathError> {
        self.existing_record()?
            .recorded
            .ok_or_else(|| PathError::InvalidData {
                path: self.display(),
                details: "no recording time".into(),
            })
    }
}

impl<P> Clone for IsoPath<P> {
    fn clone(&self) -> Self {
        Self {
            image: Arc::clone(&self.image),
            segments: self.segments.clone(),
        }
    }
}

impl<P> PartialEq for IsoPath<P> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image) && self.segments == other.segments
    }
}

impl<P> Eq for IsoPath<P> {}

impl<P> Hash for IsoPath<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.image).hash(state);
        self.segments.hash(state);
    }
}

impl<P: FilePath> fmt::Debug for IsoPath<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IsoPath({:?})", self.path())
    }
}

impl<P: FilePath> PathNav for IsoPath<P> {
    fn sep(&self) -> char {
        '/'
    }

    /// The image's path followed by the segments inside it.
    fn path(&self) -> String {
        let mut s = self.image.image.path();
        for segment in &self.segments {
            s.push('/');
            s.push_str(segment);
        }
        s
    }

    fn parent(&self) -> Self {
        match self.segments.split_last() {
            Some((_, rest)) => Self {
                image: Arc::clone(&self.image),
                segments: rest.to_vec(),
            },
            None => self.clone(),
        }
    }

    /// Names are matched against decoded identifiers and have no meaning
    /// outside the image.
    fn child(&self, name: &str) -> Result<Self, PathError> {
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        Ok(Self {
            image: Arc::clone(&self.image),
            segments,
        })
    }

    fn basename(&self) -> String {
        self.segments.last().cloned().unwrap_or_default()
    }
}

impl<P: FilePath> PathList for IsoPath<P> {
    fn listdir(&self) -> Result<Vec<String>, PathError> {
        let extent = self
            .image
            .find_dir(&self.segments)?
            .ok_or_else(|| PathError::NotListable {
                path: self.display(),
                reason: "not a directory in the image".into(),
            })?;
        Ok(self
            .image
            .read_records(extent, &self.segments)?
            .into_iter()
            .map(|record| record.name)
            .collect())
    }
}

impl<P: FilePath> PathContent for IsoPath<P> {
    fn open(&self, mode: OpenMode) -> Result<Box<dyn PathHandle>, PathError> {
        if mode.is_writing() {
            return Err(self.read_only("open"));
        }
        Ok(Box::new(BufferHandle::reader(self.get_content()?)))
    }

    fn create_directory(&self) -> Result<(), PathError> {
        Err(self.read_only("create_directory"))
    }

    fn get_content(&self) -> Result<Vec<u8>, PathError> {
        let record = self.existing_record()?;
        if record.is_dir {
            return Err(PathError::NotAFile {
                path: self.display(),
            });
        }
        self.image.read_extent(record.extent())
    }

    fn set_content_ext(&self, _content: &[u8], _ext: &str) -> Result<(), PathError> {
        Err(self.read_only("set_content"))
    }
}

impl<P: FilePath> PathStat for IsoPath<P> {
    fn changed(&self) {}

    fn getsize(&self) -> Result<u64, PathError> {
        Ok(u64::from(self.existing_record()?.size))
    }

    fn modification_time(&self) -> Result<SystemTime, PathError> {
        self.recorded()
    }

    /// Records hold a single time, reported for all three.
    fn status_change_time(&self) -> Result<SystemTime, PathError> {
        self.recorded()
    }

    fn access_time(&self) -> Result<SystemTime, PathError> {
        self.recorded()
    }

    fn exists(&self) -> Result<bool, PathError> {
        Ok(self.is_dir()? || self.is_file()?)
    }

    fn is_dir(&self) -> Result<bool, PathError> {
        Ok(self.image.find_dir(&self.segments)?.is_some())
    }

    fn is_file(&self) -> Result<bool, PathError> {
        Ok(self.record()?.is_some_and(|record| !record.is_dir))
    }

    fn is_link(&self) -> Result<bool, PathError> {
        Ok(false)
    }
}

impl<P: FilePath> PathLink for IsoPath<P> {
    fn realpath(&self) -> Result<Self, PathError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryFs, MemoryPath, PathExt};

    const S: usize = SECTOR as usize;
    const STAMP: [u8; 6] = [114, 5, 17, 12, 30, 0];

    fn record(name: &[u8], extent: u32, size: u32, is_dir: bool) -> Vec<u8> {
        let mut len = RECORD_HEADER + name.len();
        if len % 2 == 1 {
            len += 1;
        }
        let mut r = vec![0u8; len];
        r[0] = len as u8;
        r[2..6].copy_from_slice(&extent.to_le_bytes());
        r[6..10].copy_from_slice(&extent.to_be_bytes());
        r[10..14].copy_from_slice(&size.to_le_bytes());
        r[14..18].copy_from_slice(&size.to_be_bytes());
        r[18..24].copy_from_slice(&STAMP);
        r[25] = if is_dir { DIR_FLAG } else { 0 };
        r[32] = name.len() as u8;
        r[RECORD_HEADER..RECORD_HEADER + name.len()].copy_from_slice(name);
        r
    }

    fn put(img: &mut [u8], at: usize, bytes: &[u8]) {
        img[at..at + bytes.len()].copy_from_slice(bytes);
    }

    fn put_records(img: &mut [u8], sector: usize, records: &[Vec<u8>]) {
        let mut at = sector * S;
        for r in records {
            put(img, at, r);
            at += r.len();
        }
    }

    /// Sectors: 16 PVD, 17 terminator, 18 root, 19 `DIR`, 20 `FOO.TXT;1`,
    /// 21 `BAR.;1`.
    fn build_image() -> Vec<u8> {
        let mut img = vec![0u8; 22 * S];
        let pvd = 16 * S;
        put(&mut img, pvd, &[PRIMARY_VD]);
        put(&mut img, pvd + 1, b"CD001\x01");
        let payload = pvd + DESCRIPTOR_HEADER;
        put(&mut img, payload + 33, format!("{:<32}", "TESTVOL").as_bytes());
        put(&mut img, payload + 149, &record(b"\0", 18, S as u32, true));
        put(&mut img, payload + 439, format!("{:<128}", "ANYPATH").as_bytes());
        put(&mut img, payload + 806, b"2014051712300000\0");
        put(&mut img, payload + 823, b"0000000000000000\0");
        put(&mut img, 17 * S, &[TERMINATOR_VD]);

        put_records(
            &mut img,
            18,
            &[
                record(b"\0", 18, S as u32, true),
                record(b"\x01", 18, S as u32, true),
                record(b"DIR", 19, S as u32, true),
                record(b"FOO.TXT;1", 20, 5, false),
                record(b"BAR.;1", 21, 3, false),
            ],
        );
        put_records(
            &mut img,
            19,
            &[
                record(b"\0", 19, S as u32, true),
                record(b"\x01", 18, S as u32, true),
                record(b"INNER.TXT;1", 20, 5, false),
            ],
        );
        put(&mut img, 20 * S, b"hello");
        put(&mut img, 21 * S, b"bar");
        img
    }

    fn open(img: Vec<u8>) -> Arc<IsoImage<MemoryPath>> {
        let file = MemoryFs::new().root().child("disc.iso").unwrap();
        file.set_content(&img).unwrap();
        IsoImage::open(file).unwrap()
    }

    #[test]
    fn primary_descriptor_fields() {
        let image = open(build_image());
        assert_eq!(image.identifier(), "TESTVOL");
        assert_eq!(image.creator(), "ANYPATH");
        assert_eq!(image.root_extent(), 18);
        assert!(image.created().is_some());
        assert_eq!(image.modified(), None);
    }

    #[test]
    fn names_are_rewritten() {
        let image = open(build_image());
        assert_eq!(image.root().listdir().unwrap(), vec!["dir", "foo.txt", "bar"]);
    }

    #[test]
    fn fix_name_cases() {
        assert_eq!(fix_name("foo.txt;1"), "foo.txt");
        assert_eq!(fix_name("bar.;1"), "bar");
        assert_eq!(fix_name("plain"), "plain");
        assert_eq!(fix_name("two.."), "two.");
        assert_eq!(fix_name("odd;v2"), "odd;v2");
    }

    #[test]
    fn content_and_nested_directories() {
        let image = open(build_image());
        let root = image.root();
        assert_eq!(root.child("foo.txt").unwrap().get_content().unwrap(), b"hello");
        assert_eq!(root.child("bar").unwrap().get_content().unwrap(), b"bar");

        let inner = root.descendant(&["dir", "inner.txt"]).unwrap();
        assert!(inner.is_file().unwrap());
        assert_eq!(inner.getsize().unwrap(), 5);
        assert_eq!(inner.get_content().unwrap(), b"hello");
        assert!(root.child("dir").unwrap().is_dir().unwrap());
    }

    #[test]
    fn missing_paths() {
        let image = open(build_image());
        let root = image.root();
        let ghost = root.descendant(&["nope", "deeper"]).unwrap();
        assert!(!ghost.exists().unwrap());
        assert!(matches!(ghost.listdir(), Err(PathError::NotListable { .. })));
        assert!(matches!(ghost.get_content(), Err(PathError::NotFound { .. })));
        let file = root.child("foo.txt").unwrap();
        assert!(matches!(file.listdir(), Err(PathError::NotListable { .. })));
    }

    #[test]
    fn writes_are_not_supported() {
        let image = open(build_image());
        let f = image.root().child("foo.txt").unwrap();
        assert!(matches!(
            f.set_content(b"x"),
            Err(PathError::NotSupported { .. })
        ));
        assert!(f.open(OpenMode::Write).unwrap_err().is_unsupported());
        assert!(image.root().child("new").unwrap().create_directory().unwrap_err().is_unsupported());
    }

    #[test]
    fn record_times_are_decoded() {
        let image = open(build_image());
        let expected = SystemTime::from(
            NaiveDate::from_ymd_opt(2014, 5, 17)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap()
                .and_utc(),
        );
        let f = image.root().child("foo.txt").unwrap();
        assert_eq!(f.modification_time().unwrap(), expected);
        assert_eq!(f.access_time().unwrap(), expected);
        assert_eq!(image.root().modification_time().unwrap(), expected);
    }

    #[test]
    fn walk_covers_whole_image() {
        let image = open(build_image());
        let names: Vec<_> = image
            .root()
            .walk()
            .map(|p| p.unwrap().basename())
            .collect();
        assert_eq!(names, vec!["", "dir", "inner.txt", "foo.txt", "bar"]);
    }

    #[test]
    fn straddling_record_moves_to_next_sector() {
        let mut img = build_image();
        // Root directory spans sectors 18 and 19. Fillers end 20 bytes short
        // of sector 19, where a record claims 60 bytes.
        let size = 2 * S as u32;
        put(&mut img, 16 * S + DESCRIPTOR_HEADER + 149, &record(b"\0", 18, size, true));
        img[18 * S..20 * S].fill(0);
        let mut records = vec![record(b"\0", 18, size, true), record(b"\x01", 18, size, true)];
        for i in 0..8 {
            let mut filler = record(format!("F{i}.;1").as_bytes(), 20, 5, false);
            filler.resize(245, 0);
            filler[0] = 245;
            records.push(filler);
        }
        put_records(&mut img, 18, &records);
        let mut straddler = record(b"LOST.TXT;1", 21, 3, false);
        straddler[0] = 60;
        put(&mut img, 19 * S - 20, &straddler[..20]);
        put_records(&mut img, 19, &[record(b"FOUND.TXT;1", 20, 5, false)]);

        let image = open(img);
        let names = image.root().listdir().unwrap();
        assert_eq!(names.len(), 9);
        assert_eq!(names[0], "f0");
        assert_eq!(names[8], "found.txt");
        assert!(!names.contains(&"lost.txt".to_string()));
    }

    #[test]
    fn unterminated_descriptors_are_invalid() {
        let mut img = build_image();
        img[17 * S] = 0;
        img.truncate(20 * S);
        let file = MemoryFs::new().root().child("bad.iso").unwrap();
        file.set_content(&img).unwrap();
        assert!(matches!(
            IsoImage::open(file),
            Err(PathError::InvalidData { .. })
        ));
    }
}
