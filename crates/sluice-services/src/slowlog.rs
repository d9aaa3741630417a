//! Slow log — the latest N operations that took longer than a threshold.
//!
//! Entries are kept newest-first in a [`List`]. Each one keeps a capped
//! copy of the operation's arguments: at most [`MAX_ARGC`] arguments, each
//! at most [`MAX_ARG_BYTES`] long, with a marker saying how much was cut.
//!
//! The log is an explicit value. Whoever records or reports slow operations
//! gets a `&mut SlowLog`; there is no process-wide instance.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use sluice_core::bulk::MULTI_BULK_TAG;
use sluice_core::config::SlowLogSettings;
use sluice_core::{Transport, TransportError};

use crate::list::List;

/// Arguments kept per entry. The last slot becomes a marker when cut.
pub const MAX_ARGC: usize = 32;

/// Bytes kept per argument before truncation.
pub const MAX_ARG_BYTES: usize = 128;

/// Entries returned by [`SlowLog::get`] when no count is given.
pub const DEFAULT_GET_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlowLogEntry {
    /// Strictly increasing across the life of the log, reset included.
    pub id: u64,
    /// Unix time in seconds when the entry was recorded.
    pub time: u64,
    pub duration_us: i64,
    pub args: Vec<Bytes>,
}

#[derive(Debug)]
pub struct SlowLog {
    entries: List<SlowLogEntry>,
    next_id: u64,
    settings: SlowLogSettings,
}

impl SlowLog {
    pub fn new(settings: SlowLogSettings) -> Self {
        Self {
            entries: List::new(),
            next_id: 0,
            settings,
        }
    }

    pub fn settings(&self) -> &SlowLogSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record the operation if it was slow enough, then trim.
    ///
    /// Returns the new entry's id when one was recorded.
    pub fn push_if_needed(&mut self, args: &[Bytes], duration_us: i64) -> Option<u64> {
        let threshold = self.settings.log_slower_than_us;
        if threshold < 0 {
            return None;
        }
        let mut logged = None;
        if duration_us >= threshold {
            let id = self.next_id;
            self.next_id += 1;
            self.entries.push_front(SlowLogEntry {
                id,
                time: unix_now(),
                duration_us,
                args: capture_args(args),
            });
            tracing::debug!(id, duration_us, argc = args.len(), "slow operation logged");
            logged = Some(id);
        }
        self.trim();
        logged
    }

    /// Change the threshold. Negative disables, 0 logs everything.
    pub fn set_log_slower_than(&mut self, us: i64) {
        self.settings.log_slower_than_us = us;
    }

    /// Change the capacity and evict the oldest entries beyond it.
    pub fn set_max_len(&mut self, max_len: usize) {
        self.settings.max_len = max_len;
        self.trim();
    }

    /// Drop every entry. Ids keep increasing afterwards.
    pub fn reset(&mut self) {
        tracing::debug!(evicted = self.entries.len(), "slow log reset");
        self.entries.clear();
    }

    /// Up to `count` entries (default [`DEFAULT_GET_COUNT`]), newest first.
    pub fn get(&self, count: Option<usize>) -> Vec<&SlowLogEntry> {
        self.entries
            .iter()
            .take(count.unwrap_or(DEFAULT_GET_COUNT))
            .collect()
    }

    /// Encode up to `count` entries as a multi-bulk reply.
    ///
    /// Layout: `*<n>`, then per entry `*4`, id, time, duration, and
    /// `*<argc>` followed by one bulk string per argument. Returns the
    /// bytes written.
    pub fn write_reply(
        &self,
        out: &mut Transport,
        count: Option<usize>,
    ) -> Result<usize, TransportError> {
        let entries = self.get(count);
        let mut written = out.write_bulk_count(MULTI_BULK_TAG, entries.len() as u64)?;
        for entry in entries {
            written += out.write_bulk_count(MULTI_BULK_TAG, 4)?;
            written += out.write_bulk_i64(entry.id as i64)?;
            written += out.write_bulk_i64(entry.time as i64)?;
            written += out.write_bulk_i64(entry.duration_us)?;
            written += out.write_bulk_count(MULTI_BULK_TAG, entry.args.len() as u64)?;
            for arg in &entry.args {
                written += out.write_bulk_string(arg)?;
            }
        }
        Ok(written)
    }

    fn trim(&mut self) {
        while self.entries.len() > self.settings.max_len {
            self.entries.pop_back();
        }
    }
}

fn capture_args(args: &[Bytes]) -> Vec<Bytes> {
    let argc = args.len();
    let kept = argc.min(MAX_ARGC);
    args.iter()
        .take(kept)
        .enumerate()
        .map(|(j, arg)| {
            if kept != argc && j == kept - 1 {
                Bytes::from(format!("... ({} more arguments)", argc - kept + 1))
            } else if arg.len() > MAX_ARG_BYTES {
                let mut cut = Vec::with_capacity(MAX_ARG_BYTES + 32);
                cut.extend_from_slice(&arg[..MAX_ARG_BYTES]);
                cut.extend_from_slice(
                    format!("... ({} more bytes)", arg.len() - MAX_ARG_BYTES).as_bytes(),
                );
                Bytes::from(cut)
            } else {
                arg.clone()
            }
        })
        .collect()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
