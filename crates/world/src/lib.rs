//! World access for the auditor: the block oracle boundary, chunk snapshots
//! with an LRU chunk cache, an in-memory world for tests and fixtures, and
//! comparator signal arithmetic.

mod chunk_cache;
mod memory;
mod oracle;
mod signal;
mod snapshot;

pub use chunk_cache::*;
pub use memory::*;
pub use oracle::*;
pub use signal::*;
pub use snapshot::*;
