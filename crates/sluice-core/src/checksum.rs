//! Checksum accumulator.
//!
//! A checksum function folds a byte slice into the running value and must
//! give the same result however the stream is split into chunks. The
//! transport calls it once per chunk.

use crc::{Crc, CRC_64_REDIS};

/// Fold `data` into `current` and return the new checksum.
pub type ChecksumFn = fn(current: u64, data: &[u8]) -> u64;

static CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_REDIS);

/// CRC-64 (Jones polynomial, reflected) fold, the snapshot checksum of
/// Redis-compatible dumps. This is the default for configured transports.
pub fn crc64_update(current: u64, data: &[u8]) -> u64 {
    // The algorithm is reflected with no final xor, so the published value
    // is the register itself; `digest_with_initial` expects it unreflected.
    let mut digest = CRC64.digest_with_initial(current.reverse_bits());
    digest.update(data);
    digest.finalize()
}

/// CRC-32 (IEEE) fold. The CRC state lives in the low 32 bits.
pub fn crc32_update(current: u64, data: &[u8]) -> u64 {
    let mut hasher = crc32fast::Hasher::new_with_initial(current as u32);
    hasher.update(data);
    u64::from(hasher.finalize())
}
