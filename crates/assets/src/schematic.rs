//! Layered text schematics.
//!
//! ```text
//! layer 0
//! ss##ssss
//! W      i
//!
//! layer -1
//! ...
//! ```
//!
//! A `layer <n>` line opens the layer at vertical offset `n`; each following
//! non-empty line is one row of single-character symbols, row index counted
//! from the marker and column index from the start of the line. Lines made
//! of spaces are rows of air, so only truly empty lines are skipped.

use std::collections::BTreeMap;

use thiserror::Error;

use cloudaudit_core::CellOffset;

/// Text of the SmartChest schematic shipped with the crate.
pub const SMART_CHEST_SCHEMATIC: &str = include_str!("../assets/smartchest.txt");

/// Errors raised while parsing a schematic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchematicError {
    /// A line starting with `layer` is not `layer <signed integer>`.
    #[error("line {line}: malformed layer marker {text:?}")]
    MalformedMarker {
        /// 1-based line number.
        line: usize,
        /// Offending line.
        text: String,
    },
    /// A row appeared before the first layer marker.
    #[error("line {line}: row before any layer marker")]
    RowOutsideLayer {
        /// 1-based line number.
        line: usize,
    },
    /// The same layer offset was declared twice.
    #[error("line {line}: layer {layer} declared twice")]
    DuplicateLayer {
        /// 1-based line number.
        line: usize,
        /// Repeated offset.
        layer: i32,
    },
    /// Rows of one layer have different lengths.
    #[error("line {line}: row of layer {layer} has {found} cells, expected {expected}")]
    RaggedLayer {
        /// 1-based line number.
        line: usize,
        /// Layer offset.
        layer: i32,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
}

/// One symbol of a schematic at its relative offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchematicCell {
    /// Relative position within the unit.
    pub offset: CellOffset,
    /// Schematic symbol.
    pub symbol: char,
}

/// Parsed schematic: layer offset to a grid of rows. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schematic {
    layers: BTreeMap<i32, Vec<Vec<char>>>,
}

impl Schematic {
    /// Parse schematic text.
    pub fn parse(source: &str) -> Result<Self, SchematicError> {
        let mut layers: BTreeMap<i32, Vec<Vec<char>>> = BTreeMap::new();
        let mut current: Option<i32> = None;

        for (index, raw) in source.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix("layer") {
                let layer = rest
                    .strip_prefix(' ')
                    .and_then(|n| n.parse::<i32>().ok())
                    .ok_or_else(|| SchematicError::MalformedMarker {
                        line: line_no,
                        text: line.to_string(),
                    })?;
                if layers.contains_key(&layer) {
                    return Err(SchematicError::DuplicateLayer {
                        line: line_no,
                        layer,
                    });
                }
                layers.insert(layer, Vec::new());
                current = Some(layer);
                continue;
            }

            let layer = current.ok_or(SchematicError::RowOutsideLayer { line: line_no })?;
            let rows = layers.entry(layer).or_default();
            let row: Vec<char> = line.chars().collect();
            if let Some(first) = rows.first() {
                if first.len() != row.len() {
                    return Err(SchematicError::RaggedLayer {
                        line: line_no,
                        layer,
                        expected: first.len(),
                        found: row.len(),
                    });
                }
            }
            rows.push(row);
        }

        Ok(Self { layers })
    }

    /// The SmartChest schematic bundled with the crate.
    pub fn smart_chest() -> Result<Self, SchematicError> {
        Self::parse(SMART_CHEST_SCHEMATIC)
    }

    /// Layers in ascending offset order.
    pub fn layers(&self) -> impl Iterator<Item = (i32, &[Vec<char>])> + '_ {
        self.layers
            .iter()
            .map(|(layer, rows)| (*layer, rows.as_slice()))
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Every cell, layer by layer (ascending), then row, then column.
    pub fn cells(&self) -> impl Iterator<Item = SchematicCell> + '_ {
        self.layers.iter().flat_map(|(&layer, rows)| {
            rows.iter().enumerate().flat_map(move |(row, symbols)| {
                symbols.iter().enumerate().map(move |(col, &symbol)| SchematicCell {
                    offset: CellOffset::new(row as i32, layer, col as i32),
                    symbol,
                })
            })
        })
    }

    /// Symbol at an offset, if the schematic covers it.
    pub fn symbol_at(&self, offset: CellOffset) -> Option<char> {
        let rows = self.layers.get(&offset.layer)?;
        let row = rows.get(usize::try_from(offset.row).ok()?)?;
        row.get(usize::try_from(offset.col).ok()?).copied()
    }
}
