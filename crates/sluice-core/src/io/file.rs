use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use super::RawIo;
use crate::error::TransportError;

#[derive(Debug)]
enum FileStream {
    Reader(BufReader<File>),
    Writer(BufWriter<File>),
}

/// Local file backend with optional autosync.
///
/// When `autosync` is non-zero, a write that pushes the unsynced byte count
/// past the threshold forces the data to stable storage before returning.
#[derive(Debug)]
pub struct FileBackend {
    stream: FileStream,
    pos: u64,
    unsynced: u64,
    autosync: u64,
    syncs: u64,
}

impl FileBackend {
    /// Create (or truncate) `path` for writing.
    pub fn create(path: impl AsRef<Path>, write_buffer: usize) -> io::Result<Self> {
        let file = File::create(path.as_ref())?;
        Self::from_writer(file, write_buffer)
    }

    /// Open `path` for reading.
    pub fn open(path: impl AsRef<Path>, read_buffer: usize) -> io::Result<Self> {
        let file = fs::File::open(path.as_ref())?;
        Self::from_reader(file, read_buffer)
    }

    /// Write at the file's current position.
    pub fn from_writer(mut file: File, capacity: usize) -> io::Result<Self> {
        let pos = file.stream_position()?;
        Ok(Self::with_stream(
            FileStream::Writer(BufWriter::with_capacity(capacity.max(1), file)),
            pos,
        ))
    }

    /// Read from the file's current position.
    pub fn from_reader(mut file: File, capacity: usize) -> io::Result<Self> {
        let pos = file.stream_position()?;
        Ok(Self::with_stream(
            FileStream::Reader(BufReader::with_capacity(capacity.max(1), file)),
            pos,
        ))
    }

    fn with_stream(stream: FileStream, pos: u64) -> Self {
        Self {
            stream,
            pos,
            unsynced: 0,
            autosync: 0,
            syncs: 0,
        }
    }

    /// Sync after every `bytes` written. 0 disables autosync.
    pub fn set_autosync(&mut self, bytes: u64) {
        self.autosync = bytes;
    }

    pub fn autosync(&self) -> u64 {
        self.autosync
    }

    /// Bytes written since the last sync.
    pub fn unsynced(&self) -> u64 {
        self.unsynced
    }

    /// Number of syncs performed, forced or explicit.
    pub fn sync_count(&self) -> u64 {
        self.syncs
    }

    fn sync(&mut self) -> io::Result<()> {
        // Reset up front: a failing disk must not re-trigger on every byte.
        self.unsynced = 0;
        match &mut self.stream {
            FileStream::Writer(w) => {
                self.syncs += 1;
                w.flush()?;
                w.get_ref().sync_data()
            }
            FileStream::Reader(_) => Ok(()),
        }
    }
}

impl RawIo for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let FileStream::Reader(r) = &mut self.stream else {
            return Err(TransportError::Unsupported("read on a file opened for writing"));
        };
        let mut filled = 0;
        while filled < buf.len() {
            match r.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(TransportError::ShortRead {
                        requested: buf.len(),
                        available: filled,
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.pos += buf.len() as u64;
        Ok(())
    }

    fn write(&mut self, chunk: &[u8]) -> Result<(), TransportError> {
        let FileStream::Writer(w) = &mut self.stream else {
            return Err(TransportError::Unsupported("write on a file opened for reading"));
        };
        w.write_all(chunk)?;
        self.pos += chunk.len() as u64;
        self.unsynced += chunk.len() as u64;

        if self.autosync > 0 && self.unsynced > self.autosync {
            tracing::trace!(unsynced = self.unsynced, autosync = self.autosync, "autosync");
            self.sync().map_err(|e| {
                tracing::warn!(error = %e, "autosync failed");
                TransportError::Sync(e)
            })?;
        }
        Ok(())
    }

    fn tell(&self) -> Option<u64> {
        Some(self.pos)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        tracing::debug!(unsynced = self.unsynced, "file flush");
        self.sync().map_err(TransportError::Sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autosync_fires_once_past_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = FileBackend::create(dir.path().join("a.dat"), 4096).unwrap();
        f.set_autosync(8);

        f.write(&[1u8; 8]).unwrap();
        assert_eq!(f.sync_count(), 0);
        assert_eq!(f.unsynced(), 8);

        f.write(&[2u8; 1]).unwrap();
        assert_eq!(f.sync_count(), 1);
        assert_eq!(f.unsynced(), 0);
    }

    #[test]
    fn below_threshold_never_syncs() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = FileBackend::create(dir.path().join("b.dat"), 4096).unwrap();
        f.set_autosync(16);
        for _ in 0..15 {
            f.write(&[0u8]).unwrap();
        }
        assert_eq!(f.sync_count(), 0);
        assert_eq!(f.unsynced(), 15);
    }

    #[test]
    fn zero_autosync_disables() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = FileBackend::create(dir.path().join("c.dat"), 4096).unwrap();
        f.write(&[0u8; 1 << 16]).unwrap();
        assert_eq!(f.sync_count(), 0);
    }

    #[test]
    fn written_bytes_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.dat");
        {
            let mut w = FileBackend::create(&path, 4).unwrap();
            w.write(b"hello, file").unwrap();
            assert_eq!(w.tell(), Some(11));
            w.flush().unwrap();
        }
        let mut r = FileBackend::open(&path, 4).unwrap();
        let mut out = [0u8; 11];
        r.read(&mut out).unwrap();
        assert_eq!(&out, b"hello, file");
        assert_eq!(r.tell(), Some(11));

        let mut more = [0u8; 1];
        assert!(matches!(
            r.read(&mut more),
            Err(TransportError::ShortRead { requested: 1, available: 0 })
        ));
    }

    #[test]
    fn wrong_direction_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e.dat");
        let mut w = FileBackend::create(&path, 64).unwrap();
        let mut buf = [0u8; 1];
        assert!(matches!(w.read(&mut buf), Err(TransportError::Unsupported(_))));

        let mut r = FileBackend::open(&path, 64).unwrap();
        assert!(matches!(r.write(b"x"), Err(TransportError::Unsupported(_))));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_sync_reports_and_resets_counter() {
        // Writes to /dev/full are accepted into the buffer, and every
        // flush to the device fails with ENOSPC.
        let full = fs::OpenOptions::new().write(true).open("/dev/full").unwrap();
        let mut f = FileBackend::from_writer(full, 4096).unwrap();
        f.set_autosync(1);

        assert!(matches!(f.write(b"ab"), Err(TransportError::Sync(_))));
        assert_eq!(f.unsynced(), 0);

        // Below the threshold again, so no forced sync this time.
        f.write(b"c").unwrap();
        assert_eq!(f.unsynced(), 1);

        assert!(matches!(f.flush(), Err(TransportError::Sync(_))));
        assert_eq!(f.unsynced(), 0);
    }
}
