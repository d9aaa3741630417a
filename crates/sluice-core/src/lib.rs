//! sluice-core — checksummed, chunked stream transport and bulk wire codec.
//! Everything that serializes a stream in Sluice goes through `Transport`.

pub mod bulk;
pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod transport;

pub use checksum::ChecksumFn;
pub use error::TransportError;
pub use io::{Backend, BufferBackend, DestinationState, FdsetBackend, FileBackend};
pub use transport::Transport;
