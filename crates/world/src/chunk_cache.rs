use std::cell::{Cell, RefCell};
use std::num::NonZeroUsize;
use std::rc::Rc;

use lru::LruCache;
use tracing::trace;

use cloudaudit_core::{BlockDescriptor, WorldPos};

use crate::oracle::{BlockOracle, OracleError};
use crate::snapshot::{ChunkKey, ChunkSnapshot, ChunkSource};

/// Default number of resident chunk snapshots.
pub const DEFAULT_CHUNK_CAPACITY: usize = 256;

/// Block oracle over a [`ChunkSource`] that keeps recently used chunks in an
/// LRU arena, so one audit pass loads each chunk at most once while it stays
/// resident.
pub struct ChunkCache<S> {
    source: S,
    chunks: RefCell<LruCache<ChunkKey, Rc<ChunkSnapshot>>>,
    loads: Cell<usize>,
}

impl<S: ChunkSource> ChunkCache<S> {
    /// Cache with the desired maximum chunk count (at least 1).
    pub fn new(source: S, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            source,
            chunks: RefCell::new(LruCache::new(cap)),
            loads: Cell::new(0),
        }
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.borrow().len()
    }

    /// Returns true when no chunks are resident.
    pub fn is_empty(&self) -> bool {
        self.chunks.borrow().is_empty()
    }

    /// Number of chunk loads issued to the source so far.
    pub fn loads(&self) -> usize {
        self.loads.get()
    }

    /// Underlying chunk source.
    pub fn source(&self) -> &S {
        &self.source
    }

    fn chunk(&self, key: ChunkKey) -> Result<Rc<ChunkSnapshot>, OracleError> {
        if let Some(chunk) = self.chunks.borrow_mut().get(&key) {
            return Ok(Rc::clone(chunk));
        }
        self.loads.set(self.loads.get() + 1);
        let chunk = Rc::new(self.source.load_chunk(key)?);
        trace!(chunk = %key, "chunk cache miss");
        self.chunks.borrow_mut().put(key, Rc::clone(&chunk));
        Ok(chunk)
    }
}

impl<S: ChunkSource> BlockOracle for ChunkCache<S> {
    fn block_at(&self, pos: WorldPos) -> Result<BlockDescriptor, OracleError> {
        let key = ChunkKey::containing(pos);
        let chunk = self.chunk(key).map_err(|err| match err {
            OracleError::NotFound { chunk, .. } => OracleError::NotFound { pos, chunk },
            other => other,
        })?;
        chunk
            .block(pos)
            .cloned()
            .ok_or_else(|| OracleError::NotFound {
                pos,
                chunk: key.to_string(),
            })
    }
}
