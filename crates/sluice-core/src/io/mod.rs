//! Transport backends.
//!
//! The backend set is closed: in-memory buffer, local file, and fan-out to
//! a set of destinations. Each backend moves whole chunks only. A short
//! read or write is an error, never a partial count.

mod buffer;
mod fdset;
mod file;

pub use buffer::BufferBackend;
pub use fdset::{DestinationState, FdsetBackend};
pub use file::FileBackend;

use crate::error::TransportError;

/// Raw chunk I/O implemented by every backend.
pub(crate) trait RawIo {
    /// Fill `buf` completely or fail.
    fn read(&mut self, buf: &mut [u8]) -> Result<(), TransportError>;
    /// Accept all of `chunk` or fail.
    fn write(&mut self, chunk: &[u8]) -> Result<(), TransportError>;
    /// Logical position, or `None` if the backend has none.
    fn tell(&self) -> Option<u64>;
    fn flush(&mut self) -> Result<(), TransportError>;
}

/// The backend a transport is bound to.
#[derive(Debug)]
pub enum Backend {
    Buffer(BufferBackend),
    File(FileBackend),
    Fdset(FdsetBackend),
}

impl Backend {
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Buffer(_) => "buffer",
            Backend::File(_) => "file",
            Backend::Fdset(_) => "fdset",
        }
    }

    fn raw(&mut self) -> &mut dyn RawIo {
        match self {
            Backend::Buffer(b) => b,
            Backend::File(f) => f,
            Backend::Fdset(s) => s,
        }
    }

    pub(crate) fn read(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        self.raw().read(buf)
    }

    pub(crate) fn write(&mut self, chunk: &[u8]) -> Result<(), TransportError> {
        self.raw().write(chunk)
    }

    pub(crate) fn tell(&self) -> Option<u64> {
        match self {
            Backend::Buffer(b) => b.tell(),
            Backend::File(f) => f.tell(),
            Backend::Fdset(s) => s.tell(),
        }
    }

    pub(crate) fn flush(&mut self) -> Result<(), TransportError> {
        self.raw().flush()
    }
}

impl From<BufferBackend> for Backend {
    fn from(b: BufferBackend) -> Self {
        Backend::Buffer(b)
    }
}

impl From<FileBackend> for Backend {
    fn from(f: FileBackend) -> Self {
        Backend::File(f)
    }
}

impl From<FdsetBackend> for Backend {
    fn from(s: FdsetBackend) -> Self {
        Backend::Fdset(s)
    }
}
