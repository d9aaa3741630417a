//! Transport core — the one contract every serializer talks to.
//!
//! A `Transport` binds exactly one backend and moves bytes through it in
//! chunks of at most `max_chunk` bytes (0 = one chunk per call). Every
//! chunk is folded into the running checksum: before the backend write
//! when writing, after the backend read when reading. That way a writer
//! and a reader of the same stream compute the same value.
//!
//! Calls are not atomic across chunks. If chunk k fails, chunks 0..k stay
//! counted in `processed_bytes` and the checksum.

use crate::checksum::{self, ChecksumFn};
use crate::config::SluiceConfig;
use crate::error::TransportError;
use crate::io::{Backend, BufferBackend, DestinationState, FdsetBackend, FileBackend};

#[derive(Debug)]
pub struct Transport {
    backend: Backend,
    update_checksum: Option<ChecksumFn>,
    checksum: u64,
    processed_bytes: u64,
    max_chunk: usize,
}

impl Transport {
    /// Bind `backend` with no checksum and unbounded chunks.
    pub fn new(backend: impl Into<Backend>) -> Self {
        let backend = backend.into();
        tracing::debug!(backend = backend.kind(), "transport created");
        Self {
            backend,
            update_checksum: None,
            checksum: 0,
            processed_bytes: 0,
            max_chunk: 0,
        }
    }

    /// Bind `backend` and apply the chunking and checksum settings, plus
    /// autosync for a file or coalescing for a fan-out set.
    pub fn from_config(backend: impl Into<Backend>, config: &SluiceConfig) -> Self {
        let mut t = Self::new(backend);
        t.max_chunk = config.transport.max_chunk;
        if config.transport.checksum {
            t.update_checksum = Some(checksum::crc64_update);
        }
        match &mut t.backend {
            Backend::File(f) => f.set_autosync(config.transport.autosync_bytes),
            Backend::Fdset(s) => s.set_coalesce(config.fdset.coalesce_bytes),
            Backend::Buffer(_) => {}
        }
        t
    }

    /// Empty in-memory transport.
    pub fn buffer() -> Self {
        Self::new(BufferBackend::new())
    }

    pub fn with_checksum(mut self, f: ChecksumFn) -> Self {
        self.update_checksum = Some(f);
        self
    }

    pub fn with_max_chunk(mut self, bytes: usize) -> Self {
        self.max_chunk = bytes;
        self
    }

    pub fn set_checksum(&mut self, f: Option<ChecksumFn>) {
        self.update_checksum = f;
    }

    pub fn set_max_chunk(&mut self, bytes: usize) {
        self.max_chunk = bytes;
    }

    /// Configure autosync. Only the file backend has one.
    pub fn set_autosync(&mut self, bytes: u64) -> Result<(), TransportError> {
        match &mut self.backend {
            Backend::File(f) => {
                f.set_autosync(bytes);
                Ok(())
            }
            _ => Err(TransportError::Unsupported("autosync needs a file backend")),
        }
    }

    fn chunk_len(&self, remaining: usize) -> usize {
        if self.max_chunk > 0 && self.max_chunk < remaining {
            self.max_chunk
        } else {
            remaining
        }
    }

    /// Write all of `data` or fail.
    pub fn write(&mut self, mut data: &[u8]) -> Result<(), TransportError> {
        while !data.is_empty() {
            let (chunk, rest) = data.split_at(self.chunk_len(data.len()));
            if let Some(update) = self.update_checksum {
                self.checksum = update(self.checksum, chunk);
            }
            self.backend.write(chunk)?;
            tracing::trace!(len = chunk.len(), "chunk written");
            self.processed_bytes += chunk.len() as u64;
            data = rest;
        }
        Ok(())
    }

    /// Fill `buf` completely or fail.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let mut off = 0;
        while off < buf.len() {
            let len = self.chunk_len(buf.len() - off);
            let chunk = &mut buf[off..off + len];
            self.backend.read(chunk)?;
            if let Some(update) = self.update_checksum {
                self.checksum = update(self.checksum, chunk);
            }
            tracing::trace!(len, "chunk read");
            self.processed_bytes += len as u64;
            off += len;
        }
        Ok(())
    }

    /// Backend position. `None` when the backend has no notion of one.
    pub fn tell(&self) -> Option<u64> {
        self.backend.tell()
    }

    pub fn flush(&mut self) -> Result<(), TransportError> {
        self.backend.flush()
    }

    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    pub fn processed_bytes(&self) -> u64 {
        self.processed_bytes
    }

    pub fn max_chunk(&self) -> usize {
        self.max_chunk
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn into_backend(self) -> Backend {
        self.backend
    }

    /// Per-destination status for a fan-out transport.
    pub fn destination_states(&self) -> Option<&[DestinationState]> {
        match &self.backend {
            Backend::Fdset(s) => Some(s.states()),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileBackend> {
        match &self.backend {
            Backend::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_fdset(&self) -> Option<&FdsetBackend> {
        match &self.backend {
            Backend::Fdset(s) => Some(s),
            _ => None,
        }
    }

    /// Contents of a buffer transport.
    pub fn buffer_contents(&self) -> Option<&[u8]> {
        match &self.backend {
            Backend::Buffer(b) => Some(b.as_slice()),
            _ => None,
        }
    }
}
