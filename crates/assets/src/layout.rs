//! Installation layout (`cloud.json`).
//!
//! The document is a list of floors; each floor maps a corridor index
//! (as a string) to the list of items assigned to that corridor's slots.
//! An assignment is either a bare item id or an object holding an item stub
//! plus an optional sign name and the X coordinate of the unit's
//! preliminary sorter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cloudaudit_core::{ItemStub, LogicalPosition, StubError};

/// Errors raised while reading a layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The document is not valid layout JSON.
    #[error("failed to parse installation layout: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What a unit stores, as listed in the layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAssignment")]
pub struct UnitAssignment {
    /// Stored item.
    #[serde(flatten)]
    pub stub: ItemStub,
    /// Sign text override; the catalog name is used otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// X coordinate of the preliminary sorting hopper for lower floors.
    #[serde(rename = "sorter", skip_serializing_if = "Option::is_none")]
    pub pre_sorter_x: Option<i32>,
}

impl UnitAssignment {
    /// Assignment of a plain item with no overrides.
    pub fn new(stub: ItemStub) -> Self {
        Self {
            stub,
            name: None,
            pre_sorter_x: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAssignment {
    Id(String),
    Record {
        #[serde(flatten)]
        stub: ItemStub,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        sorter: Option<i32>,
    },
}

impl TryFrom<RawAssignment> for UnitAssignment {
    type Error = StubError;

    fn try_from(raw: RawAssignment) -> Result<Self, Self::Error> {
        Ok(match raw {
            RawAssignment::Id(id) => UnitAssignment::new(ItemStub::parse(&id)?),
            RawAssignment::Record { stub, name, sorter } => UnitAssignment {
                stub,
                name,
                pre_sorter_x: sorter,
            },
        })
    }
}

/// One unit as listed in the layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutEntry<'a> {
    /// Where the unit is.
    pub position: LogicalPosition,
    /// What it stores.
    pub assignment: &'a UnitAssignment,
    /// Number of units in the unit's corridor.
    pub corridor_length: u32,
}

/// The whole installation: floors of corridors of unit assignments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout {
    floors: Vec<BTreeMap<i32, Vec<UnitAssignment>>>,
}

impl Layout {
    /// Parse a layout document.
    pub fn from_json(input: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Build a layout from floors of `corridor -> assignments`.
    pub fn from_floors(floors: Vec<BTreeMap<i32, Vec<UnitAssignment>>>) -> Self {
        Self { floors }
    }

    /// Number of floors.
    pub fn floor_count(&self) -> usize {
        self.floors.len()
    }

    /// Corridors of a floor in ascending order.
    pub fn corridors(&self, floor: u32) -> impl Iterator<Item = (i32, &[UnitAssignment])> + '_ {
        self.floors
            .get(floor as usize)
            .into_iter()
            .flat_map(|corridors| corridors.iter().map(|(c, units)| (*c, units.as_slice())))
    }

    /// Assignments of one corridor.
    pub fn corridor(&self, floor: u32, corridor: i32) -> Option<&[UnitAssignment]> {
        self.floors
            .get(floor as usize)?
            .get(&corridor)
            .map(Vec::as_slice)
    }

    /// Every unit in layout order: floor, corridor ascending, slot.
    pub fn entries(&self) -> impl Iterator<Item = LayoutEntry<'_>> + '_ {
        self.floors.iter().enumerate().flat_map(|(floor, corridors)| {
            corridors.iter().flat_map(move |(&corridor, units)| {
                let corridor_length = units.len() as u32;
                units.iter().enumerate().map(move |(slot, assignment)| LayoutEntry {
                    position: LogicalPosition::new(floor as u32, corridor, slot as u32),
                    assignment,
                    corridor_length,
                })
            })
        })
    }

    /// The unit at a logical position.
    pub fn entry(&self, position: LogicalPosition) -> Option<LayoutEntry<'_>> {
        let units = self.corridor(position.floor, position.corridor)?;
        let assignment = units.get(position.slot as usize)?;
        Some(LayoutEntry {
            position,
            assignment,
            corridor_length: units.len() as u32,
        })
    }

    /// First unit storing exactly `stub`.
    pub fn locate(&self, stub: &ItemStub) -> Option<LayoutEntry<'_>> {
        self.entries().find(|entry| &entry.assignment.stub == stub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudaudit_core::ItemVariant;

    const SAMPLE: &str = r#"[
        {
            "0": ["minecraft:stone", "minecraft:dirt"],
            "-1": [{"id": "minecraft:wool", "damage": 14, "name": "Red Wool"}]
        },
        {
            "1": [
                "minecraft:ender_pearl",
                {"id": "minecraft:written_book", "tagValue": null, "sorter": -20}
            ]
        }
    ]"#;

    #[test]
    fn iterates_in_layout_order() {
        let layout = Layout::from_json(SAMPLE).unwrap();
        let positions: Vec<_> = layout.entries().map(|e| e.position).collect();
        assert_eq!(
            positions,
            vec![
                LogicalPosition::new(0, -1, 0),
                LogicalPosition::new(0, 0, 0),
                LogicalPosition::new(0, 0, 1),
                LogicalPosition::new(1, 1, 0),
                LogicalPosition::new(1, 1, 1),
            ]
        );
        assert_eq!(layout.floor_count(), 2);
    }

    #[test]
    fn parses_assignment_records() {
        let layout = Layout::from_json(SAMPLE).unwrap();
        let wool = layout.entry(LogicalPosition::new(0, -1, 0)).unwrap();
        assert_eq!(wool.assignment.stub.variant(), &ItemVariant::Damage(14));
        assert_eq!(wool.assignment.name.as_deref(), Some("Red Wool"));
        assert_eq!(wool.corridor_length, 1);

        let book = layout.entry(LogicalPosition::new(1, 1, 1)).unwrap();
        assert_eq!(book.assignment.stub.variant(), &ItemVariant::Tag(None));
        assert_eq!(book.assignment.pre_sorter_x, Some(-20));
    }

    #[test]
    fn locates_items() {
        let layout = Layout::from_json(SAMPLE).unwrap();
        let pearl = ItemStub::parse("minecraft:ender_pearl").unwrap();
        let entry = layout.locate(&pearl).unwrap();
        assert_eq!(entry.position, LogicalPosition::new(1, 1, 0));
        assert_eq!(entry.corridor_length, 2);

        let wool = ItemStub::parse("minecraft:wool").unwrap();
        assert!(layout.locate(&wool).is_none());
    }

    #[test]
    fn rejects_conflicting_stubs() {
        let err = Layout::from_json(
            r#"[{"0": [{"id": "minecraft:stone", "damage": 1, "effect": "x"}]}]"#,
        );
        assert!(err.is_err());
    }
}
