#![warn(missing_docs)]
//! Static inputs of an audit: item catalog, installation layout and the
//! SmartChest schematic.

mod catalog;
mod layout;
mod loader;
mod schematic;

pub use catalog::{CatalogError, ItemCatalog, ItemInfo, JsonItemCatalog, DEFAULT_STACK_SIZE};
pub use layout::{Layout, LayoutEntry, LayoutError, UnitAssignment};
pub use loader::{catalog_from_file, layout_from_file, schematic_from_file};
pub use schematic::{Schematic, SchematicCell, SchematicError, SMART_CHEST_SCHEMATIC};

use thiserror::Error;

/// Errors emitted while loading asset files.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The file is not valid JSON for its schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File path.
        path: String,
        /// Underlying parse error.
        source: serde_json::Error,
    },
    /// The schematic text is malformed.
    #[error("invalid schematic {path}: {source}")]
    Schematic {
        /// File path.
        path: String,
        /// Underlying schematic error.
        source: SchematicError,
    },
}
