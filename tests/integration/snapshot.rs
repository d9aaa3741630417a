use sluice_core::config::{SluiceConfig, TransportConfig};
use sluice_core::{FileBackend, Transport, TransportError};

use crate::*;

fn config(max_chunk: usize, autosync_bytes: u64) -> SluiceConfig {
    SluiceConfig {
        transport: TransportConfig {
            max_chunk,
            autosync_bytes,
            read_buffer: 256,
            write_buffer: 256,
            ..TransportConfig::default()
        },
        ..SluiceConfig::default()
    }
}

#[test]
fn test_file_snapshot_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("dump.sl");
    let cfg = config(64, 128);

    let mut out = Transport::from_config(FileBackend::create(&path, cfg.transport.write_buffer)?, &cfg);
    let written = write_dataset(&mut out)?;
    out.flush()?;
    assert_eq!(out.processed_bytes(), written as u64);
    assert_eq!(out.tell(), Some(written as u64));
    // Autosync fired along the way: more than 128 bytes went out.
    assert!(out.as_file().map(|f| f.sync_count()).unwrap_or(0) >= 2);
    assert_eq!(out.as_file().map(|f| f.unsynced()), Some(0));

    let mut input = Transport::from_config(FileBackend::open(&path, cfg.transport.read_buffer)?, &cfg);
    verify_dataset(&mut input)?;
    assert_eq!(input.processed_bytes(), written as u64);
    assert_eq!(input.checksum(), out.checksum());
    Ok(())
}

#[test]
fn test_checksum_independent_of_chunking() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut sums = Vec::new();
    for max_chunk in [0, 1, 7, 4096] {
        let path = dir.path().join(format!("chunk-{max_chunk}.sl"));
        let cfg = config(max_chunk, 0);
        let mut out = Transport::from_config(FileBackend::create(&path, cfg.transport.write_buffer)?, &cfg);
        write_dataset(&mut out)?;
        out.flush()?;
        sums.push((out.checksum(), out.processed_bytes(), std::fs::read(&path)?));
    }
    assert!(sums.windows(2).all(|w| w[0] == w[1]));
    Ok(())
}

#[test]
fn test_truncated_snapshot_is_short_read() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("cut.sl");
    let cfg = config(0, 0);

    let mut out = Transport::from_config(FileBackend::create(&path, cfg.transport.write_buffer)?, &cfg);
    write_dataset(&mut out)?;
    out.flush()?;
    drop(out);

    let full = std::fs::read(&path)?;
    std::fs::write(&path, &full[..full.len() - 10])?;

    let mut input = Transport::from_config(FileBackend::open(&path, cfg.transport.read_buffer)?, &cfg);
    let err = verify_dataset(&mut input).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TransportError>(),
        Some(TransportError::ShortRead { .. })
    ));
    Ok(())
}

#[test]
fn test_autosync_counts_exactly() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sync.sl");
    let mut t = Transport::new(FileBackend::create(&path, 4096)?);
    t.set_autosync(100)?;

    t.write(&[1u8; 99])?;
    assert_eq!(t.as_file().map(|f| f.sync_count()), Some(0));
    t.write(&[1u8; 2])?;
    assert_eq!(t.as_file().map(|f| f.sync_count()), Some(1));
    assert_eq!(t.as_file().map(|f| f.unsynced()), Some(0));
    Ok(())
}
