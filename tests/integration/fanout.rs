use std::io::Read;

use sluice_core::config::SluiceConfig;
use sluice_core::{Backend, DestinationState, FdsetBackend, Transport, TransportError};

use crate::*;

#[test]
fn test_fanout_reaches_every_replica() -> Result<()> {
    let (writers, readers) = socket_pairs(3)?;
    let mut t = Transport::new(FdsetBackend::from_writers(writers))
        .with_checksum(sluice_core::checksum::crc32_update)
        .with_max_chunk(16);

    let n = write_dataset(&mut t)?;
    t.flush()?;
    assert_eq!(t.processed_bytes(), n as u64);
    assert_eq!(t.tell(), None);

    let Backend::Fdset(set) = t.into_backend() else {
        panic!("expected fdset backend");
    };
    drop(set.into_destinations());

    for r in readers {
        let bytes = read_to_close(r)?;
        assert_eq!(bytes.len(), n);
        let mut replica = Transport::new(sluice_core::BufferBackend::from_bytes(bytes));
        verify_dataset(&mut replica)?;
    }
    Ok(())
}

#[test]
fn test_disconnected_replica_is_dropped_not_fatal() -> Result<()> {
    let (writers, mut readers) = socket_pairs(3)?;
    let mut t = Transport::new(FdsetBackend::from_writers(writers));

    t.write(b"before")?;
    let mut gone = readers.remove(1);
    let mut seen = [0u8; 6];
    gone.read_exact(&mut seen)?;
    assert_eq!(&seen, b"before");
    drop(gone);
    t.write(b"after")?;
    t.write(b"again")?;

    let states = t.destination_states().context("fdset has states")?;
    assert!(states[0].is_healthy());
    assert!(matches!(
        states[1],
        DestinationState::Failed { kind: std::io::ErrorKind::BrokenPipe, .. }
    ));
    assert!(states[2].is_healthy());

    drop(t);
    for r in readers {
        assert_eq!(read_to_close(r)?, b"beforeafteragain");
    }
    Ok(())
}

#[test]
fn test_losing_every_replica_fails() -> Result<()> {
    let (writers, readers) = socket_pairs(2)?;
    let mut t = Transport::new(FdsetBackend::from_writers(writers));
    drop(readers);

    let err = t.write(b"nobody listening").unwrap_err();
    assert!(matches!(err, TransportError::AllDestinationsFailed { destinations: 2 }));
    assert_eq!(t.processed_bytes(), 0);
    Ok(())
}

#[test]
fn test_coalesced_fanout_flushes_on_demand() -> Result<()> {
    let (writers, readers) = socket_pairs(2)?;
    let mut set = FdsetBackend::from_writers(writers);
    set.set_coalesce(1024);
    let mut t = Transport::new(set);

    t.write_bulk_string(b"small")?;
    assert_eq!(t.as_fdset().map(|s| s.pending()), Some(11));
    t.flush()?;
    assert_eq!(t.as_fdset().map(|s| s.pending()), Some(0));

    drop(t);
    for r in readers {
        assert_eq!(read_to_close(r)?, b"$5\r\nsmall\r\n");
    }
    Ok(())
}

#[test]
fn test_configured_coalescing_batches_replica_writes() -> Result<()> {
    let (writers, readers) = socket_pairs(2)?;
    let mut config = SluiceConfig::default();
    config.fdset.coalesce_bytes = 64;
    let mut t = Transport::from_config(FdsetBackend::from_writers(writers), &config);

    t.write_bulk_i64(7)?;
    assert_eq!(t.as_fdset().map(|s| s.pending()), Some(7));
    t.write_bulk_string(&[b'x'; 60])?;
    // The payload crossed the threshold; only the trailing CRLF is held.
    assert_eq!(t.as_fdset().map(|s| s.pending()), Some(2));
    assert_eq!(t.as_fdset().map(|s| s.fanned_out()), Some(t.processed_bytes()));
    t.flush()?;
    assert_eq!(t.as_fdset().map(|s| s.pending()), Some(0));

    drop(t);
    for r in readers {
        let bytes = read_to_close(r)?;
        let mut replica = Transport::new(sluice_core::BufferBackend::from_bytes(bytes));
        assert_eq!(replica.read_bulk_i64()?, 7);
        assert_eq!(replica.read_bulk_string()?, vec![b'x'; 60]);
    }
    Ok(())
}
