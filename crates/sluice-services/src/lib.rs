//! sluice-services — in-process collaborators built on sluice-core.

pub mod list;
pub mod slowlog;

pub use list::{Cursor, Direction, List, NodeId};
pub use slowlog::{SlowLog, SlowLogEntry};
