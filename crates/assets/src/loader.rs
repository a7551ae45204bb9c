use std::fs;
use std::path::Path;

use tracing::debug;

use crate::{AssetError, JsonItemCatalog, Layout, Schematic};

/// Load the item catalog (`items.json`) from disk.
pub fn catalog_from_file(path: &Path) -> Result<JsonItemCatalog, AssetError> {
    let data = read(path)?;
    let catalog = JsonItemCatalog::from_json(&data).map_err(|source| AssetError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    debug!(path = %path.display(), items = catalog.len(), "Loaded item catalog");
    Ok(catalog)
}

/// Load the installation layout (`cloud.json`) from disk.
pub fn layout_from_file(path: &Path) -> Result<Layout, AssetError> {
    let data = read(path)?;
    let layout = serde_json::from_str::<Layout>(&data).map_err(|source| AssetError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    debug!(path = %path.display(), floors = layout.floor_count(), "Loaded installation layout");
    Ok(layout)
}

/// Load a schematic text file from disk.
pub fn schematic_from_file(path: &Path) -> Result<Schematic, AssetError> {
    let data = read(path)?;
    let schematic = Schematic::parse(&data).map_err(|source| AssetError::Schematic {
        path: path.display().to_string(),
        source,
    })?;
    debug!(path = %path.display(), layers = schematic.layer_count(), "Loaded schematic");
    Ok(schematic)
}

fn read(path: &Path) -> Result<String, AssetError> {
    fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.display().to_string(),
        source,
    })
}
