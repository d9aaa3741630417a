//! Sluice integration test harness.
//!
//! These tests drive transports over real backends: files in a temp
//! directory and connected Unix socket pairs standing in for replica
//! connections. They need no special environment.
//!
//!   cargo test --test integration

use std::io::Read;
use std::os::unix::net::UnixStream;

use anyhow::{Context, Result};
use sluice_core::bulk::MULTI_BULK_TAG;
use sluice_core::Transport;

mod fanout;
mod slowlog;
mod snapshot;

// ── Harness ───────────────────────────────────────────────────────────────────

/// A small dataset of mixed values, written the way a snapshot writer would.
pub fn write_dataset(t: &mut Transport) -> Result<usize> {
    let mut n = t.write_bulk_count(MULTI_BULK_TAG, 4)?;
    n += t.write_bulk_string(b"user:1000")?;
    n += t.write_bulk_i64(-9_000_000_000)?;
    n += t.write_bulk_f64(0.1)?;
    n += t.write_bulk_string(&[0u8; 300])?;
    Ok(n)
}

/// Read back what `write_dataset` produced and check every value.
pub fn verify_dataset(t: &mut Transport) -> Result<()> {
    assert_eq!(t.read_bulk_count(MULTI_BULK_TAG)?, 4);
    assert_eq!(t.read_bulk_string()?, b"user:1000");
    assert_eq!(t.read_bulk_i64()?, -9_000_000_000);
    assert_eq!(t.read_bulk_f64()?, 0.1);
    assert_eq!(t.read_bulk_string()?, vec![0u8; 300]);
    Ok(())
}

/// `n` connected socket pairs: (writer ends, reader ends).
pub fn socket_pairs(n: usize) -> Result<(Vec<UnixStream>, Vec<UnixStream>)> {
    let mut writers = Vec::with_capacity(n);
    let mut readers = Vec::with_capacity(n);
    for _ in 0..n {
        let (w, r) = UnixStream::pair().context("failed to create socket pair")?;
        writers.push(w);
        readers.push(r);
    }
    Ok((writers, readers))
}

/// Drain a reader end until the writer side is closed.
pub fn read_to_close(mut r: UnixStream) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    r.read_to_end(&mut out).context("failed to drain socket")?;
    Ok(out)
}
