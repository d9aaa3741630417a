use std::fmt;
use std::io::{self, Write};

use super::RawIo;
use crate::error::TransportError;

/// Per-destination health slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationState {
    Healthy,
    /// The last attempt failed. The destination is skipped from now on.
    Failed {
        kind: io::ErrorKind,
        os_error: Option<i32>,
    },
}

impl DestinationState {
    pub fn is_healthy(&self) -> bool {
        matches!(self, DestinationState::Healthy)
    }
}

/// Fan-out backend: the same bytes go to every healthy destination.
///
/// A destination that fails is marked and excluded, and the stream keeps
/// serving the others. Only when every destination has failed does a
/// write fail.
///
/// With `coalesce` > 0, small writes are held back until the pending
/// buffer reaches that size or the transport is flushed.
pub struct FdsetBackend {
    dests: Vec<Box<dyn Write + Send>>,
    states: Vec<DestinationState>,
    pos: u64,
    pending: Vec<u8>,
    coalesce: usize,
}

impl FdsetBackend {
    pub fn new(dests: Vec<Box<dyn Write + Send>>) -> Self {
        let states = vec![DestinationState::Healthy; dests.len()];
        tracing::debug!(destinations = dests.len(), "fdset created");
        Self {
            dests,
            states,
            pos: 0,
            pending: Vec::new(),
            coalesce: 0,
        }
    }

    /// Convenience for any homogeneous set of writers (sockets, pipes).
    pub fn from_writers<W, I>(writers: I) -> Self
    where
        W: Write + Send + 'static,
        I: IntoIterator<Item = W>,
    {
        Self::new(
            writers
                .into_iter()
                .map(|w| Box::new(w) as Box<dyn Write + Send>)
                .collect(),
        )
    }

    /// Hold writes back until `bytes` are pending. 0 writes through.
    pub fn set_coalesce(&mut self, bytes: usize) {
        self.coalesce = bytes;
    }

    pub fn states(&self) -> &[DestinationState] {
        &self.states
    }

    pub fn healthy_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_healthy()).count()
    }

    /// Bytes accepted for fan-out so far, including pending ones.
    pub fn fanned_out(&self) -> u64 {
        self.pos
    }

    /// Bytes held in the coalescing buffer.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Give the destinations back. Pending bytes are discarded.
    pub fn into_destinations(self) -> Vec<Box<dyn Write + Send>> {
        self.dests
    }

    fn check_alive(&self) -> Result<(), TransportError> {
        if self.healthy_count() == 0 {
            return Err(TransportError::AllDestinationsFailed {
                destinations: self.dests.len(),
            });
        }
        Ok(())
    }

    fn mark_failed(&mut self, i: usize, e: &io::Error) {
        tracing::warn!(destination = i, error = %e, "fan-out destination failed");
        self.states[i] = DestinationState::Failed {
            kind: e.kind(),
            os_error: e.raw_os_error(),
        };
    }

    /// Send `data` to every healthy destination in order.
    fn fan_out(&mut self, data: &[u8]) -> Result<(), TransportError> {
        for i in 0..self.dests.len() {
            if !self.states[i].is_healthy() {
                continue;
            }
            if let Err(e) = self.dests[i].write_all(data) {
                self.mark_failed(i, &e);
            }
        }
        self.check_alive()
    }

    fn drain_pending(&mut self) -> Result<(), TransportError> {
        if self.pending.is_empty() {
            return self.check_alive();
        }
        let pending = std::mem::take(&mut self.pending);
        let res = self.fan_out(&pending);
        // Keep the allocation for the next round.
        self.pending = pending;
        self.pending.clear();
        res
    }
}

impl RawIo for FdsetBackend {
    fn read(&mut self, _buf: &mut [u8]) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("fdset backend is write-only"))
    }

    fn write(&mut self, chunk: &[u8]) -> Result<(), TransportError> {
        self.check_alive()?;
        if self.coalesce == 0 {
            self.fan_out(chunk)?;
        } else {
            self.pending.extend_from_slice(chunk);
            if self.pending.len() >= self.coalesce {
                self.drain_pending()?;
            }
        }
        self.pos += chunk.len() as u64;
        Ok(())
    }

    fn tell(&self) -> Option<u64> {
        None
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.drain_pending()?;
        for i in 0..self.dests.len() {
            if !self.states[i].is_healthy() {
                continue;
            }
            if let Err(e) = self.dests[i].flush() {
                self.mark_failed(i, &e);
            }
        }
        self.check_alive()
    }
}

impl fmt::Debug for FdsetBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FdsetBackend")
            .field("states", &self.states)
            .field("pos", &self.pos)
            .field("pending", &self.pending.len())
            .field("coalesce", &self.coalesce)
            .finish()
    }
}
