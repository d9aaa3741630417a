use bytes::Bytes;
use sluice_core::config::SlowLogSettings;
use sluice_core::{BufferBackend, FileBackend};
use sluice_services::SlowLog;

use crate::*;

fn command(parts: &[&str]) -> Vec<Bytes> {
    parts.iter().map(|p| Bytes::copy_from_slice(p.as_bytes())).collect()
}

#[test]
fn test_slowlog_reply_through_file() -> Result<()> {
    let mut slow = SlowLog::new(SlowLogSettings {
        log_slower_than_us: 1000,
        max_len: 3,
    });
    for (i, name) in ["GET", "SET", "HGETALL", "KEYS", "SORT"].iter().enumerate() {
        slow.push_if_needed(&command(&[*name, "k"]), 1000 + i as i64);
    }
    slow.push_if_needed(&command(&["PING"]), 5);
    assert_eq!(slow.len(), 3);

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("slowlog.reply");
    let mut out = Transport::new(FileBackend::create(&path, 512)?);
    let n = slow.write_reply(&mut out, None)?;
    out.flush()?;
    assert_eq!(std::fs::metadata(&path)?.len(), n as u64);

    let mut r = Transport::new(BufferBackend::from_bytes(std::fs::read(&path)?));
    assert_eq!(r.read_bulk_count(MULTI_BULK_TAG)?, 3);
    let mut names = Vec::new();
    let mut ids = Vec::new();
    for _ in 0..3 {
        assert_eq!(r.read_bulk_count(MULTI_BULK_TAG)?, 4);
        ids.push(r.read_bulk_i64()?);
        r.read_bulk_i64()?;
        r.read_bulk_i64()?;
        assert_eq!(r.read_bulk_count(MULTI_BULK_TAG)?, 2);
        names.push(r.read_bulk_string()?);
        assert_eq!(r.read_bulk_string()?, b"k");
    }
    assert_eq!(names, vec![b"SORT".to_vec(), b"KEYS".to_vec(), b"HGETALL".to_vec()]);
    assert_eq!(ids, vec![4, 3, 2]);
    Ok(())
}
