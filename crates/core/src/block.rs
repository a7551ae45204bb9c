//! Block snapshots as reported by the world API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Block ids referenced by the auditor.
pub mod block_ids {
    #![allow(missing_docs)]

    pub const AIR: &str = "minecraft:air";
    pub const BEDROCK: &str = "minecraft:bedrock";
    pub const BREWING_STAND: &str = "minecraft:brewing_stand";
    pub const CAKE: &str = "minecraft:cake";
    pub const CAULDRON: &str = "minecraft:cauldron";
    pub const CHAIN_COMMAND_BLOCK: &str = "minecraft:chain_command_block";
    pub const CHEST: &str = "minecraft:chest";
    pub const COMMAND_BLOCK: &str = "minecraft:command_block";
    pub const CRAFTING_TABLE: &str = "minecraft:crafting_table";
    pub const DISPENSER: &str = "minecraft:dispenser";
    pub const DROPPER: &str = "minecraft:dropper";
    pub const END_PORTAL_FRAME: &str = "minecraft:end_portal_frame";
    pub const ENDER_PEARL: &str = "minecraft:ender_pearl";
    pub const FURNACE: &str = "minecraft:furnace";
    pub const GLOWSTONE: &str = "minecraft:glowstone";
    pub const HOPPER: &str = "minecraft:hopper";
    pub const JUKEBOX: &str = "minecraft:jukebox";
    pub const LIT_FURNACE: &str = "minecraft:lit_furnace";
    pub const OAK_STAIRS: &str = "minecraft:oak_stairs";
    pub const PLANKS: &str = "minecraft:planks";
    pub const POWERED_REPEATER: &str = "minecraft:powered_repeater";
    pub const REDSTONE_TORCH: &str = "minecraft:redstone_torch";
    pub const REDSTONE_WIRE: &str = "minecraft:redstone_wire";
    pub const REPEATING_COMMAND_BLOCK: &str = "minecraft:repeating_command_block";
    pub const STONE: &str = "minecraft:stone";
    pub const STONE_SLAB: &str = "minecraft:stone_slab";
    pub const STONEBRICK: &str = "minecraft:stonebrick";
    pub const TORCH: &str = "minecraft:torch";
    pub const TRAPPED_CHEST: &str = "minecraft:trapped_chest";
    pub const UNLIT_REDSTONE_TORCH: &str = "minecraft:unlit_redstone_torch";
    pub const UNPOWERED_COMPARATOR: &str = "minecraft:unpowered_comparator";
    pub const UNPOWERED_REPEATER: &str = "minecraft:unpowered_repeater";
    pub const WALL_SIGN: &str = "minecraft:wall_sign";
}

/// One occupied slot of a container inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySlot {
    /// Slot index within the container.
    #[serde(rename = "Slot")]
    pub slot: u8,
    /// Item id.
    pub id: String,
    /// Stack size in this slot.
    #[serde(rename = "Count")]
    pub count: u32,
    /// Damage value (durability or variant).
    #[serde(rename = "Damage", default)]
    pub damage: i16,
    /// Raw NBT tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Value>,
}

impl InventorySlot {
    /// Whether the item carries at least one enchantment.
    pub fn is_enchanted(&self) -> bool {
        self.tag
            .as_ref()
            .and_then(|tag| tag.get("ench"))
            .and_then(Value::as_array)
            .is_some_and(|ench| !ench.is_empty())
    }
}

/// Record held by a jukebox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordItem {
    /// Record item id.
    pub id: String,
}

/// Tile entity data attached to a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileEntity {
    /// Container inventory.
    #[serde(rename = "Items", default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<InventorySlot>>,
    #[serde(rename = "Text1", default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub text1: Option<String>,
    #[serde(rename = "Text2", default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub text2: Option<String>,
    #[serde(rename = "Text3", default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub text3: Option<String>,
    #[serde(rename = "Text4", default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub text4: Option<String>,
    /// Command block success counter.
    #[serde(rename = "SuccessCount", default, skip_serializing_if = "Option::is_none")]
    pub success_count: Option<u8>,
    /// Jukebox record.
    #[serde(rename = "RecordItem", default, skip_serializing_if = "Option::is_none")]
    pub record_item: Option<RecordItem>,
}

/// A block at one world coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDescriptor {
    /// Namespaced block id.
    pub id: String,
    /// Metadata: facing in the low bits, variant or mode in the rest.
    #[serde(default)]
    pub damage: u8,
    /// Tile entity, if the block has one.
    #[serde(rename = "tileEntity", default, skip_serializing_if = "Option::is_none")]
    pub tile_entity: Option<TileEntity>,
}

impl BlockDescriptor {
    /// A block with no tile entity.
    pub fn new(id: impl Into<String>, damage: u8) -> Self {
        Self {
            id: id.into(),
            damage,
            tile_entity: None,
        }
    }

    /// An air block.
    pub fn air() -> Self {
        Self::new(block_ids::AIR, 0)
    }

    /// A container block holding `items`.
    pub fn container(id: impl Into<String>, damage: u8, items: Vec<InventorySlot>) -> Self {
        Self {
            id: id.into(),
            damage,
            tile_entity: Some(TileEntity {
                items: Some(items),
                ..TileEntity::default()
            }),
        }
    }

    /// A wall sign with up to four raw text lines.
    pub fn wall_sign(damage: u8, lines: [&str; 4]) -> Self {
        Self {
            id: block_ids::WALL_SIGN.to_string(),
            damage,
            tile_entity: Some(TileEntity {
                text1: Some(lines[0].to_string()),
                text2: Some(lines[1].to_string()),
                text3: Some(lines[2].to_string()),
                text4: Some(lines[3].to_string()),
                ..TileEntity::default()
            }),
        }
    }

    /// Whether the block has the given id.
    pub fn is(&self, id: &str) -> bool {
        self.id == id
    }

    /// Container slots, `None` if the block has no inventory.
    pub fn items(&self) -> Option<&[InventorySlot]> {
        self.tile_entity
            .as_ref()
            .and_then(|te| te.items.as_deref())
    }

    /// The four raw sign lines; absent lines are `None`.
    pub fn sign_lines(&self) -> [Option<&str>; 4] {
        match &self.tile_entity {
            Some(te) => [
                te.text1.as_deref(),
                te.text2.as_deref(),
                te.text3.as_deref(),
                te.text4.as_deref(),
            ],
            None => [None; 4],
        }
    }

    /// Command block success count.
    pub fn success_count(&self) -> Option<u8> {
        self.tile_entity.as_ref().and_then(|te| te.success_count)
    }

    /// Jukebox record id.
    pub fn record_item(&self) -> Option<&str> {
        self.tile_entity
            .as_ref()
            .and_then(|te| te.record_item.as_ref())
            .map(|record| record.id.as_str())
    }
}

/// Output direction of a hopper (and of droppers, which can also face up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum HopperFacing {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl HopperFacing {
    /// Decode the facing bits (`metadata & 7`). Values 6 and 7 are unused.
    pub fn from_metadata(metadata: u8) -> Option<Self> {
        match metadata & 0x7 {
            0 => Some(HopperFacing::Down),
            1 => Some(HopperFacing::Up),
            2 => Some(HopperFacing::North),
            3 => Some(HopperFacing::South),
            4 => Some(HopperFacing::West),
            5 => Some(HopperFacing::East),
            _ => None,
        }
    }

    /// Metadata value encoding this facing.
    pub fn metadata(self) -> u8 {
        match self {
            HopperFacing::Down => 0,
            HopperFacing::Up => 1,
            HopperFacing::North => 2,
            HopperFacing::South => 3,
            HopperFacing::West => 4,
            HopperFacing::East => 5,
        }
    }

    /// Unit step `(dx, dy, dz)` toward the block this facing points into.
    pub fn step(self) -> (i32, i32, i32) {
        match self {
            HopperFacing::Down => (0, -1, 0),
            HopperFacing::Up => (0, 1, 0),
            HopperFacing::North => (0, 0, -1),
            HopperFacing::South => (0, 0, 1),
            HopperFacing::West => (-1, 0, 0),
            HopperFacing::East => (1, 0, 0),
        }
    }
}

impl fmt::Display for HopperFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HopperFacing::Down => "down",
            HopperFacing::Up => "up",
            HopperFacing::North => "north",
            HopperFacing::South => "south",
            HopperFacing::West => "west",
            HopperFacing::East => "east",
        })
    }
}

/// Describe raw facing metadata for messages, tolerating unused values.
pub fn describe_facing(metadata: u8) -> String {
    match HopperFacing::from_metadata(metadata) {
        Some(facing) => facing.to_string(),
        None => format!("unknown facing {}", metadata & 0x7),
    }
}

/// Which neighbour a torch is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TorchAttachment {
    West,
    East,
    North,
    South,
    Below,
}

impl TorchAttachment {
    /// Decode torch metadata (1..=5).
    pub fn from_metadata(metadata: u8) -> Option<Self> {
        match metadata {
            1 => Some(TorchAttachment::West),
            2 => Some(TorchAttachment::East),
            3 => Some(TorchAttachment::North),
            4 => Some(TorchAttachment::South),
            5 => Some(TorchAttachment::Below),
            _ => None,
        }
    }

    /// Metadata value for this attachment.
    pub fn metadata(self) -> u8 {
        match self {
            TorchAttachment::West => 1,
            TorchAttachment::East => 2,
            TorchAttachment::North => 3,
            TorchAttachment::South => 4,
            TorchAttachment::Below => 5,
        }
    }
}

impl fmt::Display for TorchAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TorchAttachment::West => "to its west",
            TorchAttachment::East => "to its east",
            TorchAttachment::North => "to its north",
            TorchAttachment::South => "to its south",
            TorchAttachment::Below => "below",
        })
    }
}

/// Describe raw torch metadata for messages.
pub fn describe_attachment(metadata: u8) -> String {
    match TorchAttachment::from_metadata(metadata) {
        Some(attachment) => attachment.to_string(),
        None => format!("with unknown attachment {metadata}"),
    }
}

/// Name of a stone variant (metadata of `minecraft:stone`).
pub fn stone_variant(damage: u8) -> &'static str {
    match damage {
        0 => "stone",
        1 => "granite",
        2 => "polished granite",
        3 => "diorite",
        4 => "polished diorite",
        5 => "andesite",
        6 => "polished andesite",
        _ => "unknown stone",
    }
}

/// Material name of a stone slab (`metadata & 7`).
pub fn slab_variant(damage: u8) -> &'static str {
    match damage & 0x7 {
        0 => "stone",
        1 => "sandstone",
        2 => "fake wood",
        3 => "cobblestone",
        4 => "brick",
        5 => "stone brick",
        6 => "Nether brick",
        _ => "quartz",
    }
}

/// Name of a stone brick variant.
pub fn stonebrick_variant(damage: u8) -> &'static str {
    match damage {
        0 => "regular",
        1 => "mossy",
        2 => "cracked",
        3 => "chiseled",
        _ => "unknown",
    }
}

/// Direction of a stairs block (`metadata & 3`).
pub fn stairs_facing(damage: u8) -> &'static str {
    match damage & 0x3 {
        0 => "west",
        1 => "east",
        2 => "south",
        _ => "north",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_api_block_format() {
        let block: BlockDescriptor = serde_json::from_value(json!({
            "id": "minecraft:hopper",
            "damage": 10,
            "tileEntity": {
                "Items": [
                    {"Slot": 0, "id": "minecraft:stone", "Count": 12, "Damage": 3},
                    {"Slot": 1, "id": "minecraft:ender_pearl", "Count": 1}
                ]
            }
        }))
        .unwrap();
        assert_eq!(
            HopperFacing::from_metadata(block.damage),
            Some(HopperFacing::North)
        );
        let items = block.items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].damage, 3);
        assert_eq!(items[1].damage, 0);
    }

    #[test]
    fn blocks_without_tile_entity_have_no_items() {
        let block: BlockDescriptor =
            serde_json::from_value(json!({"id": "minecraft:stone"})).unwrap();
        assert_eq!(block.damage, 0);
        assert!(block.items().is_none());
        assert_eq!(block.sign_lines(), [None; 4]);
    }

    #[test]
    fn hopper_facing_steps() {
        assert_eq!(HopperFacing::from_metadata(6), None);
        assert_eq!(HopperFacing::North.step(), (0, 0, -1));
        assert_eq!(HopperFacing::East.step(), (1, 0, 0));
        assert_eq!(HopperFacing::from_metadata(8), Some(HopperFacing::Down));
        assert_eq!(describe_facing(7), "unknown facing 7");
    }

    #[test]
    fn enchantment_detection() {
        let mut slot = InventorySlot {
            slot: 0,
            id: "minecraft:diamond_sword".into(),
            count: 1,
            damage: 0,
            tag: Some(json!({"ench": []})),
        };
        assert!(!slot.is_enchanted());
        slot.tag = Some(json!({"ench": [{"id": 16, "lvl": 5}]}));
        assert!(slot.is_enchanted());
    }

    #[test]
    fn variant_names() {
        assert_eq!(TorchAttachment::Below.to_string(), "below");
        assert_eq!(slab_variant(0xF), "quartz");
        assert_eq!(stone_variant(5), "andesite");
        assert_eq!(stairs_facing(4 | 1), "east");
    }
}
