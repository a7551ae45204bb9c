//! The block query boundary.

use cloudaudit_core::{BlockDescriptor, WorldPos};
use std::path::PathBuf;

/// Failure to answer a block query.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The region containing the coordinate has not been generated or exported.
    #[error("no block data for {pos} (chunk {chunk} not available)")]
    NotFound {
        /// Queried coordinate.
        pos: WorldPos,
        /// Chunk key of the missing snapshot.
        chunk: String,
    },
    /// Reading a chunk snapshot failed.
    #[error("failed to read chunk snapshot {path:?}")]
    Io {
        /// Snapshot file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A chunk snapshot was not valid JSON in the chunk-info format.
    #[error("failed to parse chunk snapshot {path:?}")]
    Parse {
        /// Snapshot file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// A chunk snapshot parsed but has the wrong shape.
    #[error("chunk snapshot {chunk} is malformed: {reason}")]
    Malformed {
        /// Chunk key.
        chunk: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Answers "which block is at this coordinate".
///
/// Implementations are read-only from the caller's point of view; interior
/// caching is allowed.
pub trait BlockOracle {
    /// Query a single block.
    fn block_at(&self, pos: WorldPos) -> Result<BlockDescriptor, OracleError>;
}

impl<T: BlockOracle + ?Sized> BlockOracle for &T {
    fn block_at(&self, pos: WorldPos) -> Result<BlockDescriptor, OracleError> {
        (**self).block_at(pos)
    }
}

impl<T: BlockOracle + ?Sized> BlockOracle for Box<T> {
    fn block_at(&self, pos: WorldPos) -> Result<BlockDescriptor, OracleError> {
        (**self).block_at(pos)
    }
}
