use std::collections::TryReserveError;
use std::io;

/// Failure of a transport operation, whatever the backend.
///
/// A failed `write` or `read` may still have moved earlier chunks of the
/// same call; see `Transport::processed_bytes`.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    /// A forced sync to stable storage failed.
    #[error("sync: {0}")]
    Sync(#[source] io::Error),

    /// Fewer bytes were available than requested. Nothing was delivered.
    #[error("short read: requested {requested} bytes, {available} available")]
    ShortRead { requested: usize, available: usize },

    #[error("allocation failed: {0}")]
    Alloc(#[from] TryReserveError),

    /// Every fan-out destination is in error state.
    #[error("all {destinations} destinations failed")]
    AllDestinationsFailed { destinations: usize },

    /// Operation not meaningful for this backend or mode.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// Bulk wire format violated while decoding.
    #[error("malformed: {0}")]
    Malformed(&'static str),
}
