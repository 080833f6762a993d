//! Open handles returned by [`PathContent::open`](crate::PathContent::open).

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use crate::PathError;

/// An open handle on a path's content.
///
/// Handles are released by [`close`](PathHandle::close), which also reports
/// any error from committing buffered content. Dropping a handle without
/// closing it releases the resource but gives no chance to observe errors, and
/// buffered backends discard uncommitted writes.
pub trait PathHandle: Read + Write + Seek + Send + fmt::Debug {
    /// Flush and release the handle.
    fn close(self: Box<Self>) -> Result<(), PathError>;
}

impl PathHandle for File {
    fn close(mut self: Box<Self>) -> Result<(), PathError> {
        self.flush()?;
        Ok(())
    }
}

type Commit = Box<dyn FnOnce(Vec<u8>) -> Result<(), PathError> + Send>;

/// In-memory handle used by backends that cannot stream.
///
/// Reads are served from a buffer loaded at open time. A writable buffer keeps
/// every write private until [`close`](PathHandle::close), which hands the
/// complete buffer to the backend's commit function in one step.
pub struct BufferHandle {
    buf: Cursor<Vec<u8>>,
    commit: Option<Commit>,
}

impl BufferHandle {
    /// A handle that only allows reading `data`.
    pub fn reader(data: Vec<u8>) -> Self {
        Self {
            buf: Cursor::new(data),
            commit: None,
        }
    }

    /// A writable handle starting from `initial`, positioned at `position`.
    pub fn writer<F>(initial: Vec<u8>, position: u64, commit: F) -> Self
    where
        F: FnOnce(Vec<u8>) -> Result<(), PathError> + Send + 'static,
    {
        let mut buf = Cursor::new(initial);
        buf.set_position(position);
        Self {
            buf,
            commit: Some(Box::new(commit)),
        }
    }

    /// Returns `true` if writes are accepted.
    pub fn is_writable(&self) -> bool {
        self.commit.is_some()
    }
}

impl fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferHandle")
            .field("len", &self.buf.get_ref().len())
            .field("position", &self.buf.position())
            .field("writable", &self.is_writable())
            .finish()
    }
}

impl Read for BufferHandle {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        self.buf.read(out)
    }
}

impl Write for BufferHandle {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.commit.is_none() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "handle was opened for reading",
            ));
        }
        self.buf.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for BufferHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.buf.seek(pos)
    }
}

impl PathHandle for BufferHandle {
    fn close(self: Box<Self>) -> Result<(), PathError> {
        let BufferHandle { buf, commit } = *self;
        match commit {
            Some(commit) => commit(buf.into_inner()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn reader_rejects_writes() {
        let mut h = BufferHandle::reader(b"abc".to_vec());
        let err = h.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        let mut s = String::new();
        h.read_to_string(&mut s).unwrap();
        assert_eq!(s, "abc");
    }

    #[test]
    fn writer_commits_only_on_close() {
        let sink = Arc::new(Mutex::new(None));
        let target = Arc::clone(&sink);
        let mut h = Box::new(BufferHandle::writer(Vec::new(), 0, move |data| {
            *target.lock().unwrap() = Some(data);
            Ok(())
        }));
        h.write_all(b"hello").unwrap();
        assert!(sink.lock().unwrap().is_none());
        h.close().unwrap();
        assert_eq!(sink.lock().unwrap().as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn writer_respects_start_position() {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let target = Arc::clone(&sink);
        let mut h = Box::new(BufferHandle::writer(b"ab".to_vec(), 2, move |data| {
            *target.lock().unwrap() = data;
            Ok(())
        }));
        h.write_all(b"cd").unwrap();
        h.close().unwrap();
        assert_eq!(&*sink.lock().unwrap(), b"abcd");
    }

    #[test]
    fn handles_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<BufferHandle>();
        assert_send::<Box<dyn PathHandle>>();
    }

    #[test]
    fn boxed_handles_are_debug() {
        let h: Box<dyn PathHandle> = Box::new(BufferHandle::reader(b"abc".to_vec()));
        assert!(format!("{h:?}").contains("BufferHandle"));
        let opened: Result<Box<dyn PathHandle>, PathError> = Ok(h);
        assert!(opened.unwrap().close().is_ok());
    }
}
