//! Chunk snapshots exported from the world API.
//!
//! A snapshot covers a 16x16x16 cube and is stored as nested arrays indexed
//! `[y][z][x]`, each entry a block descriptor. Files are named
//! `chunk.<cx>.<cy>.<cz>.json` after the chunk's cube coordinates.

use crate::oracle::OracleError;
use cloudaudit_core::{BlockDescriptor, WorldPos};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Edge length of a chunk snapshot.
pub const CHUNK_EDGE: i32 = 16;

/// Cube coordinates of a chunk snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkKey {
    /// Chunk containing a world coordinate.
    pub const fn containing(pos: WorldPos) -> Self {
        Self {
            x: pos.x.div_euclid(CHUNK_EDGE),
            y: pos.y.div_euclid(CHUNK_EDGE),
            z: pos.z.div_euclid(CHUNK_EDGE),
        }
    }

    /// Snapshot file name for this chunk.
    pub fn file_name(self) -> String {
        format!("chunk.{}.{}.{}.json", self.x, self.y, self.z)
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A validated 16x16x16 block cube.
#[derive(Debug, Clone)]
pub struct ChunkSnapshot {
    key: ChunkKey,
    blocks: Vec<Vec<Vec<BlockDescriptor>>>,
}

impl ChunkSnapshot {
    /// Wrap `[y][z][x]` block data, checking its dimensions.
    pub fn new(key: ChunkKey, blocks: Vec<Vec<Vec<BlockDescriptor>>>) -> Result<Self, OracleError> {
        let edge = CHUNK_EDGE as usize;
        let malformed = |reason: String| OracleError::Malformed {
            chunk: key.to_string(),
            reason,
        };
        if blocks.len() != edge {
            return Err(malformed(format!("expected {edge} layers, found {}", blocks.len())));
        }
        for (y, layer) in blocks.iter().enumerate() {
            if layer.len() != edge {
                return Err(malformed(format!("layer {y} has {} rows", layer.len())));
            }
            if let Some((z, row)) = layer.iter().enumerate().find(|(_, row)| row.len() != edge) {
                return Err(malformed(format!("row {z} of layer {y} has {} blocks", row.len())));
            }
        }
        Ok(Self { key, blocks })
    }

    /// Parse a snapshot from its JSON text.
    pub fn from_json(key: ChunkKey, path: &Path, text: &str) -> Result<Self, OracleError> {
        let blocks = serde_json::from_str(text).map_err(|source| OracleError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(key, blocks)
    }

    /// Chunk this snapshot covers.
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    /// Block at a world coordinate inside this chunk.
    pub fn block(&self, pos: WorldPos) -> Option<&BlockDescriptor> {
        if ChunkKey::containing(pos) != self.key {
            return None;
        }
        let x = pos.x.rem_euclid(CHUNK_EDGE) as usize;
        let y = pos.y.rem_euclid(CHUNK_EDGE) as usize;
        let z = pos.z.rem_euclid(CHUNK_EDGE) as usize;
        self.blocks.get(y)?.get(z)?.get(x)
    }
}

/// Supplies chunk snapshots on demand.
pub trait ChunkSource {
    /// Load one chunk. Missing chunks are reported as [`OracleError::NotFound`].
    fn load_chunk(&self, key: ChunkKey) -> Result<ChunkSnapshot, OracleError>;
}

/// Reads `chunk.<cx>.<cy>.<cz>.json` files from a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Snapshot directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ChunkSource for DirectorySource {
    fn load_chunk(&self, key: ChunkKey) -> Result<ChunkSnapshot, OracleError> {
        let path = self.root.join(key.file_name());
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(OracleError::NotFound {
                    pos: WorldPos::new(key.x * CHUNK_EDGE, key.y * CHUNK_EDGE, key.z * CHUNK_EDGE),
                    chunk: key.to_string(),
                });
            }
            Err(source) => return Err(OracleError::Io { path, source }),
        };
        debug!(chunk = %key, path = %path.display(), "loaded chunk snapshot");
        ChunkSnapshot::from_json(key, &path, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn uniform_chunk(id: &str) -> Vec<Vec<Vec<BlockDescriptor>>> {
        vec![vec![vec![BlockDescriptor::new(id, 0); 16]; 16]; 16]
    }

    #[test]
    fn chunk_key_uses_floor_division() {
        assert_eq!(
            ChunkKey::containing(WorldPos::new(-1, 15, 16)),
            ChunkKey { x: -1, y: 0, z: 1 }
        );
        assert_eq!(
            ChunkKey { x: -3, y: 4, z: 2 }.file_name(),
            "chunk.-3.4.2.json"
        );
    }

    #[test]
    fn snapshot_indexes_y_z_x() {
        let key = ChunkKey { x: 0, y: 0, z: 0 };
        let mut blocks = uniform_chunk("minecraft:stone");
        blocks[2][3][4] = BlockDescriptor::new("minecraft:hopper", 2);
        let snapshot = ChunkSnapshot::new(key, blocks).unwrap();
        assert_eq!(
            snapshot.block(WorldPos::new(4, 2, 3)).unwrap().id,
            "minecraft:hopper"
        );
        assert!(snapshot.block(WorldPos::new(16, 0, 0)).is_none());
    }

    #[test]
    fn snapshot_rejects_wrong_shape() {
        let key = ChunkKey { x: 0, y: 0, z: 0 };
        let mut blocks = uniform_chunk("minecraft:stone");
        blocks[5].pop();
        assert!(matches!(
            ChunkSnapshot::new(key, blocks),
            Err(OracleError::Malformed { .. })
        ));
    }

    #[test]
    fn directory_source_reports_missing_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());
        let err = source.load_chunk(ChunkKey { x: 1, y: 2, z: 3 }).unwrap_err();
        assert!(matches!(err, OracleError::NotFound { .. }));
    }

    #[test]
    fn directory_source_reads_snapshot_files() {
        let dir = tempfile::tempdir().unwrap();
        let key = ChunkKey { x: -1, y: 4, z: 2 };
        let text = serde_json::to_string(&uniform_chunk("minecraft:glowstone")).unwrap();
        fs::write(dir.path().join(key.file_name()), text).unwrap();

        let snapshot = DirectorySource::new(dir.path()).load_chunk(key).unwrap();
        let block = snapshot.block(WorldPos::new(-5, 70, 40)).unwrap();
        assert_eq!(block.id, "minecraft:glowstone");
    }

    #[test]
    fn directory_source_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let key = ChunkKey { x: 0, y: 0, z: 0 };
        fs::write(dir.path().join(key.file_name()), "{not json").unwrap();
        let err = DirectorySource::new(dir.path()).load_chunk(key).unwrap_err();
        assert!(matches!(err, OracleError::Parse { .. }));
    }
}
