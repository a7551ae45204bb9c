//! Catalog and world fixtures.
//!
//! [`PerfectUnit`] writes a SmartChest that passes every structural check
//! into a [`MemoryWorld`]; tests then break one block at a time.

use anyhow::Result;
use cloudaudit_assets::{JsonItemCatalog, Schematic};
use cloudaudit_core::{
    block_ids, BlockDescriptor, CellOffset, HopperFacing, InventorySlot, LogicalPosition,
    WallSide, WorldPos,
};
use cloudaudit_world::MemoryWorld;
use tracing::debug;

/// Item catalog covering the fixtures: plain, damage, effect and tag
/// variants, short stacks and a tool with durability.
pub const SAMPLE_ITEMS: &str = r#"{
    "minecraft": {
        "cobblestone": {"name": "Cobblestone"},
        "dirt": {"name": "Dirt"},
        "stone": {
            "name": "Stone",
            "damageValues": {
                "0": {"name": "Stone"},
                "1": {"name": "Granite"},
                "3": {"name": "Diorite"}
            }
        },
        "crafting_table": {"name": "Crafting Table"},
        "ender_pearl": {"name": "Ender Pearl", "stackable": 16},
        "snowball": {"name": "Snowball", "stackable": 16},
        "diamond_sword": {"name": "Diamond Sword", "stackable": false, "durability": 1561},
        "potion": {
            "name": "Potion",
            "stackable": false,
            "effects": {"minecraft": {"swiftness": {"name": "Potion of Swiftness"}}}
        },
        "written_book": {
            "name": "Written Book",
            "stackable": 16,
            "tagPath": ["title"],
            "tagVariants": {"Rules": {"name": "Rulebook"}}
        }
    }
}"#;

/// Parse [`SAMPLE_ITEMS`].
pub fn sample_catalog() -> Result<JsonItemCatalog> {
    Ok(JsonItemCatalog::from_json(SAMPLE_ITEMS)?)
}

/// Fuel used to give furnaces their comparator signal.
const FURNACE_FUEL: &str = "minecraft:cobblestone";

/// Storage chests in the order [`PerfectUnit::fill_stacks`] fills them.
pub const STORAGE_CHESTS: [CellOffset; 10] = [
    CellOffset::new(3, -6, 2),
    CellOffset::new(3, -6, 3),
    CellOffset::new(2, -5, 2),
    CellOffset::new(2, -5, 3),
    CellOffset::new(2, -4, 3),
    CellOffset::new(3, -4, 3),
    CellOffset::new(3, -3, 2),
    CellOffset::new(4, -3, 2),
    CellOffset::new(5, -2, 2),
    CellOffset::new(6, -2, 2),
];

const ACCESS_CHEST: [CellOffset; 2] = [CellOffset::new(5, 0, 3), CellOffset::new(5, 0, 2)];
const BOTTOM_DROPPER: CellOffset = CellOffset::new(5, -7, 3);

/// Builder for a structurally perfect SmartChest.
#[derive(Debug, Clone)]
pub struct PerfectUnit {
    /// Where to build.
    pub position: LogicalPosition,
    /// Units in the corridor.
    pub corridor_length: u32,
    /// Stored item id.
    pub item: String,
    /// Sign text.
    pub name: String,
    /// Maximum stack size of the stored item.
    pub stack_size: u32,
}

impl PerfectUnit {
    /// A unit storing `item`, labelled `name`.
    pub fn new(
        position: LogicalPosition,
        corridor_length: u32,
        item: impl Into<String>,
        name: impl Into<String>,
        stack_size: u32,
    ) -> Self {
        Self {
            position,
            corridor_length,
            item: item.into(),
            name: name.into(),
            stack_size,
        }
    }

    /// Cobblestone at floor 1, corridor 1, slot 4 in a corridor of 10.
    pub fn cobblestone() -> Self {
        Self::new(
            LogicalPosition::new(1, 1, 4),
            10,
            "minecraft:cobblestone",
            "Cobblestone",
            64,
        )
    }

    /// Filler expected in the sorting hopper.
    pub fn filler(&self) -> &'static str {
        if self.item == block_ids::CRAFTING_TABLE || self.stack_size > 1 && self.stack_size < 64 {
            block_ids::CRAFTING_TABLE
        } else {
            block_ids::ENDER_PEARL
        }
    }

    /// World position of a relative cell.
    pub fn cell(&self, row: i32, layer: i32, col: i32) -> WorldPos {
        self.position.cell(CellOffset::new(row, layer, col))
    }

    /// First block past the unit's overflow chain. With nothing built beyond
    /// it, this is the installation's overflow sink; otherwise lay a chain
    /// from here with [`lay_hopper_chain`].
    pub fn overflow_exit(&self) -> WorldPos {
        self.cell(0, -7, 8)
    }

    /// Write every block of the unit into `world`.
    pub fn build(&self, world: &mut MemoryWorld) -> Result<()> {
        let schematic = Schematic::smart_chest()?;
        let mut placed = 0usize;
        for cell in schematic.cells() {
            if let Some(block) = self.exemplar(cell.symbol, cell.offset) {
                world.set(self.position.cell(cell.offset), block);
                placed += 1;
            }
        }
        debug!(unit = %self.position, placed, "Built perfect unit");
        Ok(())
    }

    /// Put `stacks` full stacks of the item into the unit on top of the four
    /// that always sit in the bottom dropper: access chest first, then the
    /// storage chests. Below four stacks the access chest reads too low next
    /// to the stuck ones and the unit reports stuck items.
    pub fn fill_stacks(&self, world: &mut MemoryWorld, stacks: u32) {
        let dropper = (0..4).map(|slot| self.stack(slot, self.stack_size)).collect();
        world.set(
            self.position.cell(BOTTOM_DROPPER),
            BlockDescriptor::container(block_ids::DROPPER, HopperFacing::Up.metadata(), dropper),
        );

        let mut remaining = stacks;
        for offset in ACCESS_CHEST.iter().chain(STORAGE_CHESTS.iter()) {
            let count = remaining.min(27);
            remaining -= count;
            let items = (0..count as u8)
                .map(|slot| self.stack(slot, self.stack_size))
                .collect();
            world.set(
                self.position.cell(*offset),
                BlockDescriptor::container(block_ids::CHEST, 0, items),
            );
        }
    }

    fn stack(&self, slot: u8, count: u32) -> InventorySlot {
        slot_of(slot, &self.item, count)
    }

    fn wall(&self) -> WallSide {
        self.position.wall()
    }

    fn at_corridor_end(&self) -> bool {
        let slot = self.position.slot;
        slot + 1 == self.corridor_length || (slot + 2 == self.corridor_length && slot % 2 == 0)
    }

    /// Block satisfying `symbol` at `offset`; `None` leaves air.
    fn exemplar(&self, symbol: char, offset: CellOffset) -> Option<BlockDescriptor> {
        let wall = self.wall();
        let unit = self.position;
        let plain = |id: &str, damage: u8| Some(BlockDescriptor::new(id, damage));
        let hopper = |facing: HopperFacing| {
            Some(BlockDescriptor::container(
                block_ids::HOPPER,
                facing.metadata(),
                Vec::new(),
            ))
        };
        match symbol {
            ' ' | '?' | 'N' | 'X' => None,
            '!' => {
                let line = format!("{{\"text\":\"{}\"}}", self.name);
                let empty = r#"{"text":""}"#;
                Some(BlockDescriptor::wall_sign(
                    wall.pick(4, 5),
                    [empty, line.as_str(), empty, empty],
                ))
            }
            '#' => Some(BlockDescriptor::container(block_ids::CHEST, 0, Vec::new())),
            '<' => hopper(HopperFacing::South),
            '>' | '~' => hopper(HopperFacing::North),
            '^' => hopper(wall.pick(HopperFacing::East, HopperFacing::West)),
            'v' => hopper(wall.pick(HopperFacing::West, HopperFacing::East)),
            'x' => hopper(HopperFacing::Down),
            'H' => Some(self.sorting_hopper()),
            'C' => comparator_damage(offset, wall)
                .map(|damage| BlockDescriptor::new(block_ids::UNPOWERED_COMPARATOR, damage)),
            'D' => Some(BlockDescriptor::container(
                block_ids::DROPPER,
                HopperFacing::Up.metadata(),
                Vec::new(),
            )),
            'F' => {
                if offset == CellOffset::new(7, -1, 1) && self.at_corridor_end() {
                    plain(block_ids::STONE_SLAB, 0xF)
                } else if unit.corridor == 0
                    && unit.floor == 6
                    && offset.layer == -1
                    && offset.row == 7
                {
                    plain(block_ids::STONEBRICK, 0)
                } else {
                    Some(furnace(offset))
                }
            }
            'G' => plain(block_ids::GLOWSTONE, 0),
            'P' => plain(block_ids::OAK_STAIRS, wall.pick(1, 0) | 0x4),
            'Q' => plain(block_ids::STONE_SLAB, 0xF),
            'R' => repeater_damage(offset, wall)
                .map(|damage| BlockDescriptor::new(block_ids::UNPOWERED_REPEATER, damage)),
            'S' => plain(block_ids::STONE_SLAB, 0x8),
            'T' => torch_damage(offset, wall)
                .map(|damage| BlockDescriptor::new(block_ids::REDSTONE_TORCH, damage)),
            'W' if self.at_corridor_end() => plain(block_ids::STONE, 0),
            'W' => None,
            'c' | 'p' => {
                let (layer, material) = if symbol == 'c' {
                    (-7, block_ids::CRAFTING_TABLE)
                } else {
                    (-8, block_ids::PLANKS)
                };
                let stone = offset.layer == layer
                    && (unit.floor == 6 || unit.slot < 4 || (unit.slot < 6 && offset.col > 1));
                plain(if stone { block_ids::STONE } else { material }, 0)
            }
            'i' => plain(block_ids::TORCH, 5),
            'r' => plain(block_ids::REDSTONE_WIRE, 0),
            's' => plain(block_ids::STONE, 0),
            't' => plain(block_ids::REDSTONE_TORCH, 5),
            _ => None,
        }
    }

    fn sorting_hopper(&self) -> BlockDescriptor {
        let filler = self.filler();
        let first = if self.stack_size > 1 {
            self.item.as_str()
        } else {
            filler
        };
        let mut items = vec![slot_of(0, first, 1)];
        items.extend((1..5).map(|slot| slot_of(slot, filler, 1)));
        BlockDescriptor::container(block_ids::HOPPER, HopperFacing::North.metadata(), items)
    }
}

/// One inventory slot of `id`.
pub fn slot_of(slot: u8, id: &str, count: u32) -> InventorySlot {
    InventorySlot {
        slot,
        id: id.to_string(),
        count,
        damage: 0,
        tag: None,
    }
}

/// Lay `length` hoppers from `start`, each pointing at the next, and return
/// the position the last one points into.
pub fn lay_hopper_chain(
    world: &mut MemoryWorld,
    start: WorldPos,
    facing: HopperFacing,
    length: u32,
) -> WorldPos {
    let (dx, dy, dz) = facing.step();
    let mut pos = start;
    for _ in 0..length {
        world.set(
            pos,
            BlockDescriptor::container(block_ids::HOPPER, facing.metadata(), Vec::new()),
        );
        pos = pos.offset(dx, dy, dz);
    }
    pos
}

fn sided(wall: WallSide, left: u8, right: u8) -> u8 {
    wall.pick(left, right)
}

fn comparator_damage(offset: CellOffset, wall: WallSide) -> Option<u8> {
    const SUBTRACT: u8 = 0x4;
    let damage = match (offset.row, offset.layer, offset.col) {
        (5, -7, 2) | (5, -5, 2) => 2,
        (7, -3, 4) | (0, -1, 1) => 0,
        (1, -1, 2) => SUBTRACT,
        (2, 0, 2) | (4, 0, 2) => sided(wall, 1, 3) | SUBTRACT,
        (2, 0, 3) | (4, 0, 3) => 2,
        _ => return None,
    };
    Some(damage)
}

fn repeater_damage(offset: CellOffset, wall: WallSide) -> Option<u8> {
    let (facing, delay) = match (offset.row, offset.layer, offset.col) {
        (1, -8, 2) => (0, 4),
        (3, -8, 3) => (sided(wall, 3, 1), 2),
        (6, -6, 2) => (0, 2),
        (7, -5, 5) => (2, 2),
        (3, -3, 1) => (sided(wall, 1, 3), 2),
        _ => return None,
    };
    Some(facing | ((delay - 2) / 2) << 2)
}

fn torch_damage(offset: CellOffset, wall: WallSide) -> Option<u8> {
    let damage = match (offset.row, offset.layer, offset.col) {
        (3, -8, 1) | (4, -5, 1) => sided(wall, 1, 2),
        (4, -6, 1) | (5, -1, 1) => sided(wall, 2, 1),
        (2, -7, 1) | (4, -6, 2) | (7, -5, 3) | (1, -3, 3) => 3,
        (4, -5, 3) | (1, -4, 2) | (1, -1, 4) | (3, 0, 3) => 4,
        _ => return None,
    };
    Some(damage)
}

/// Furnace whose contents give the comparator signal its cell expects.
fn furnace(offset: CellOffset) -> BlockDescriptor {
    let counts: &[u32] = match (offset.row, offset.layer, offset.col) {
        (0, -1, 0) => &[64, 32],
        (2, 0, 4) => &[1],
        (4, 0, 4) => &[64],
        _ => &[],
    };
    let items = counts
        .iter()
        .enumerate()
        .map(|(slot, &count)| slot_of(slot as u8, FURNACE_FUEL, count))
        .collect();
    BlockDescriptor::container(block_ids::FURNACE, 0, items)
}
