use bytes::Bytes;

use super::RawIo;
use crate::error::TransportError;

/// In-memory backend: an owned byte buffer plus a cursor.
///
/// Writes always append at the end and leave the cursor there. Reads
/// consume from the cursor.
#[derive(Debug, Default)]
pub struct BufferBackend {
    buf: Vec<u8>,
    pos: usize,
}

impl BufferBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing contents, cursor at the start.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            buf: data.into(),
            pos: 0,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes left between the cursor and the end.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.buf)
    }
}

impl RawIo for BufferBackend {
    fn read(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let available = self.remaining();
        if buf.len() > available {
            return Err(TransportError::ShortRead {
                requested: buf.len(),
                available,
            });
        }
        buf.copy_from_slice(&self.buf[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(())
    }

    fn write(&mut self, chunk: &[u8]) -> Result<(), TransportError> {
        self.buf.try_reserve(chunk.len())?;
        self.buf.extend_from_slice(chunk);
        self.pos = self.buf.len();
        Ok(())
    }

    fn tell(&self) -> Option<u64> {
        Some(self.pos as u64)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
