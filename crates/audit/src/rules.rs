//! The rule book: what each schematic symbol demands of the block found at
//! its cell.
//!
//! Per-offset facts (comparator facings, repeater delays, torch attachments,
//! furnace fill signals, storage hopper sets) live in the tables below. A cell
//! whose offset is missing from the table its symbol needs is reported as
//! "not yet implemented", as is any symbol without a rule.

use std::collections::HashMap;

use cloudaudit_assets::ItemCatalog;
use cloudaudit_core::block::{slab_variant, stairs_facing, stone_variant, stonebrick_variant};
use cloudaudit_core::{
    block_ids, describe_attachment, describe_facing, BlockDescriptor, CellOffset, HopperFacing,
    InventorySlot, ItemStub, LogicalPosition, TorchAttachment, WallSide, WorldPos,
};
use cloudaudit_world::comparator_signal;

use crate::AuditError;

/// A value that may differ between the two corridor walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sided<T> {
    /// Value for units on the left wall (even slots).
    pub left: T,
    /// Value for units on the right wall (odd slots).
    pub right: T,
}

impl<T: Copy> Sided<T> {
    /// The same value on both walls.
    pub const fn same(value: T) -> Self {
        Self {
            left: value,
            right: value,
        }
    }

    /// Different values per wall.
    pub const fn walls(left: T, right: T) -> Self {
        Self { left, right }
    }

    /// Value for a wall.
    pub fn on(self, wall: WallSide) -> T {
        wall.pick(self.left, self.right)
    }
}

/// Offset-keyed table.
pub type CellTable<T> = &'static [(CellOffset, T)];

fn lookup<T: Copy>(table: CellTable<T>, offset: CellOffset) -> Option<T> {
    table
        .iter()
        .find(|(cell, _)| *cell == offset)
        .map(|(_, value)| *value)
}

const fn at(row: i32, layer: i32, col: i32) -> CellOffset {
    CellOffset::new(row, layer, col)
}

/// Comparator facing (`metadata & 3`).
pub const COMPARATOR_FACINGS: CellTable<Sided<u8>> = &[
    (at(5, -7, 2), Sided::same(2)),
    (at(5, -5, 2), Sided::same(2)),
    (at(7, -3, 4), Sided::same(0)),
    (at(0, -1, 1), Sided::same(0)),
    (at(1, -1, 2), Sided::same(0)),
    (at(2, 0, 2), Sided::walls(1, 3)),
    (at(2, 0, 3), Sided::same(2)),
    (at(4, 0, 2), Sided::walls(1, 3)),
    (at(4, 0, 3), Sided::same(2)),
];

/// Comparator mode, `true` for subtraction.
pub const COMPARATOR_SUBTRACTS: CellTable<bool> = &[
    (at(5, -7, 2), false),
    (at(5, -5, 2), false),
    (at(7, -3, 4), false),
    (at(0, -1, 1), false),
    (at(1, -1, 2), true),
    (at(2, 0, 2), true),
    (at(2, 0, 3), false),
    (at(4, 0, 2), true),
    (at(4, 0, 3), false),
];

/// Repeater facing (`metadata & 3`).
pub const REPEATER_FACINGS: CellTable<Sided<u8>> = &[
    (at(1, -8, 2), Sided::same(0)),
    (at(3, -8, 3), Sided::walls(3, 1)),
    (at(6, -6, 2), Sided::same(0)),
    (at(7, -5, 5), Sided::same(2)),
    (at(3, -3, 1), Sided::walls(1, 3)),
];

/// Repeater delay in game ticks.
pub const REPEATER_DELAYS: CellTable<u8> = &[
    (at(1, -8, 2), 4),
    (at(3, -8, 3), 2),
    (at(6, -6, 2), 2),
    (at(7, -5, 5), 2),
    (at(3, -3, 1), 2),
];

/// Redstone torch attachment metadata.
pub const TORCH_ATTACHMENTS: CellTable<Sided<u8>> = &[
    (at(3, -8, 1), Sided::walls(1, 2)),
    (at(2, -7, 1), Sided::same(3)),
    (at(4, -6, 1), Sided::walls(2, 1)),
    (at(4, -6, 2), Sided::same(3)),
    (at(4, -5, 1), Sided::walls(1, 2)),
    (at(4, -5, 3), Sided::same(4)),
    (at(7, -5, 3), Sided::same(3)),
    (at(1, -4, 2), Sided::same(4)),
    (at(1, -3, 3), Sided::same(3)),
    (at(1, -1, 4), Sided::same(4)),
    (at(5, -1, 1), Sided::walls(2, 1)),
    (at(3, 0, 3), Sided::same(4)),
];

/// Comparator signal each furnace must produce.
pub const FURNACE_SIGNALS: CellTable<u8> = &[
    (at(0, -6, 4), 0),
    (at(0, -6, 5), 0),
    (at(0, -6, 6), 0),
    (at(0, -6, 7), 0),
    (at(0, -1, 0), 8),
    (at(7, -1, 1), 0),
    (at(7, -1, 2), 0),
    (at(7, -1, 3), 0),
    (at(7, -1, 4), 0),
    (at(2, 0, 4), 1),
    (at(4, 0, 4), 5),
];

/// Hoppers facing south that hold stored items.
pub const SOUTH_STORAGE_HOPPERS: &[CellOffset] = &[at(5, -7, 4), at(6, -5, 4)];
/// Hoppers facing north that hold stored items.
pub const NORTH_STORAGE_HOPPERS: &[CellOffset] = &[at(3, -7, 3), at(3, -4, 2)];
/// Hoppers facing out of the wall that hold stored items.
pub const OUTWARD_STORAGE_HOPPERS: &[CellOffset] = &[
    at(3, -5, 3),
    at(6, -5, 3),
    at(7, -4, 3),
    at(5, -3, 2),
    at(6, -3, 2),
];
/// Hoppers facing the corridor that hold stored items.
pub const INWARD_STORAGE_HOPPERS: &[CellOffset] = &[at(3, -7, 4), at(4, -7, 4), at(2, -6, 3)];
/// Hoppers facing down that hold stored items.
pub const DOWNWARD_STORAGE_HOPPERS: &[CellOffset] = &[at(5, -1, 2)];

/// Everything a rule may look at for one cell.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    /// Unit being audited.
    pub unit: LogicalPosition,
    /// Number of units in the unit's corridor.
    pub corridor_length: u32,
    /// Relative offset of the cell.
    pub offset: CellOffset,
    /// World position of the cell.
    pub pos: WorldPos,
    /// Block found there.
    pub block: &'a BlockDescriptor,
}

impl Cell<'_> {
    fn wall(&self) -> WallSide {
        self.unit.wall()
    }

    /// The last unit of a corridor, or the second to last when it sits on the
    /// left wall opposite an empty slot.
    fn at_corridor_end(&self) -> bool {
        let slot = self.unit.slot;
        slot + 1 == self.corridor_length || (slot + 2 == self.corridor_length && slot % 2 == 0)
    }

    fn not_implemented(&self, check: &str, what: &str) -> String {
        format!(
            "{check} check for {what} at {} (relative coords: {}) not yet implemented.",
            self.pos, self.offset
        )
    }

    fn should_be(&self, expected: &str) -> String {
        format!(
            "Block at {} should be {expected}, is {}.",
            self.pos, self.block.id
        )
    }
}

/// Which way a hopper rule wants the hopper to point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopperDirection {
    /// A fixed world direction.
    Fixed(HopperFacing),
    /// East on the left wall, west on the right wall.
    Outward,
    /// West on the left wall, east on the right wall.
    Inward,
}

impl HopperDirection {
    fn resolve(self, wall: WallSide) -> HopperFacing {
        match self {
            HopperDirection::Fixed(facing) => facing,
            HopperDirection::Outward => wall.pick(HopperFacing::East, HopperFacing::West),
            HopperDirection::Inward => wall.pick(HopperFacing::West, HopperFacing::East),
        }
    }
}

/// Foundation row material that turns into stone near the corridor start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Foundation {
    /// Layer the row lies on.
    pub layer: i32,
    /// Block required away from the stone region.
    pub block: &'static str,
    /// Name used in messages.
    pub name: &'static str,
}

/// What one symbol demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRule {
    /// `' '`: air.
    Air,
    /// `?`: anything.
    Any,
    /// `!`: wall sign facing the corridor.
    WallSign,
    /// `#`: chest holding only the stored item.
    Chest,
    /// `<`, `>`, `^`, `v`, `x`: hopper with a facing; the listed cells hold
    /// only the stored item.
    Hopper {
        /// Required facing.
        direction: HopperDirection,
        /// Storage hoppers among the cells using this symbol.
        storage: &'static [CellOffset],
        /// Skip row 0 of layer -7 for the first slots of a corridor.
        skip_corridor_start: bool,
    },
    /// `H`: hopper, any facing.
    AnyHopper,
    /// `C`: comparator.
    Comparator,
    /// `D`: dropper facing up holding only the stored item.
    Dropper,
    /// `F`: furnace with a fixed fill signal.
    Furnace,
    /// `G`: glowstone.
    Glowstone,
    /// `N`: overflow hopper pointing north on lower floors.
    OverflowNorth,
    /// `X`: overflow hopper pointing down where a chain passes.
    OverflowDown,
    /// `P`: upside-down oak stairs facing the wall.
    Stairs,
    /// `Q`: quartz top slab.
    QuartzSlab,
    /// `R`: repeater.
    Repeater,
    /// `S`: stone top slab.
    StoneSlab,
    /// `T`: redstone torch on the side of a block.
    RedstoneTorch,
    /// `W`: back wall, stone at the end of a corridor.
    BackWall,
    /// `c` and `p`: foundation rows.
    Foundation(Foundation),
    /// `i`: torch standing on a block.
    Torch,
    /// `r`: redstone dust.
    RedstoneDust,
    /// `s`: stone, bedrock allowed near the bottom of the world.
    Stone,
    /// `t`: redstone torch standing on a block.
    StandingRedstoneTorch,
    /// `~`: hopper chain segment, hopper or air.
    HopperChain,
    /// Symbol without a rule.
    Unimplemented(char),
}

/// Lowest Y at which `s` cells may be bedrock instead of stone.
pub const BEDROCK_CEILING: i32 = 5;

/// Symbol to rule mapping.
#[derive(Debug, Clone)]
pub struct RuleBook {
    rules: HashMap<char, SymbolRule>,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::smart_chest()
    }
}

impl RuleBook {
    /// Rules for the SmartChest schematic.
    pub fn smart_chest() -> Self {
        use HopperFacing::{Down, North, South};
        let hopper =
            |direction: HopperDirection, storage: &'static [CellOffset]| SymbolRule::Hopper {
                direction,
                storage,
                skip_corridor_start: false,
            };
        let rules = [
            (' ', SymbolRule::Air),
            ('?', SymbolRule::Any),
            ('!', SymbolRule::WallSign),
            ('#', SymbolRule::Chest),
            ('<', hopper(HopperDirection::Fixed(South), SOUTH_STORAGE_HOPPERS)),
            (
                '>',
                SymbolRule::Hopper {
                    direction: HopperDirection::Fixed(North),
                    storage: NORTH_STORAGE_HOPPERS,
                    skip_corridor_start: true,
                },
            ),
            ('^', hopper(HopperDirection::Outward, OUTWARD_STORAGE_HOPPERS)),
            ('v', hopper(HopperDirection::Inward, INWARD_STORAGE_HOPPERS)),
            ('x', hopper(HopperDirection::Fixed(Down), DOWNWARD_STORAGE_HOPPERS)),
            ('C', SymbolRule::Comparator),
            ('D', SymbolRule::Dropper),
            ('F', SymbolRule::Furnace),
            ('G', SymbolRule::Glowstone),
            ('H', SymbolRule::AnyHopper),
            ('N', SymbolRule::OverflowNorth),
            ('P', SymbolRule::Stairs),
            ('Q', SymbolRule::QuartzSlab),
            ('R', SymbolRule::Repeater),
            ('S', SymbolRule::StoneSlab),
            ('T', SymbolRule::RedstoneTorch),
            ('W', SymbolRule::BackWall),
            ('X', SymbolRule::OverflowDown),
            (
                'c',
                SymbolRule::Foundation(Foundation {
                    layer: -7,
                    block: block_ids::CRAFTING_TABLE,
                    name: "a crafting table",
                }),
            ),
            ('i', SymbolRule::Torch),
            (
                'p',
                SymbolRule::Foundation(Foundation {
                    layer: -8,
                    block: block_ids::PLANKS,
                    name: "oak planks",
                }),
            ),
            ('r', SymbolRule::RedstoneDust),
            ('s', SymbolRule::Stone),
            ('t', SymbolRule::StandingRedstoneTorch),
            ('~', SymbolRule::HopperChain),
        ];
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// Rule for a symbol; unknown symbols get [`SymbolRule::Unimplemented`].
    pub fn rule(&self, symbol: char) -> SymbolRule {
        self.rules
            .get(&symbol)
            .copied()
            .unwrap_or(SymbolRule::Unimplemented(symbol))
    }

    /// Number of symbols with a rule.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true when no symbol has a rule.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The stored item and the catalog used to recognise it.
pub struct Contents<'a, C: ?Sized> {
    /// Catalog for matching and naming slots.
    pub catalog: &'a C,
    /// Item the unit stores.
    pub stub: &'a ItemStub,
}

impl<C: ItemCatalog + ?Sized> Contents<'_, C> {
    /// First slot of `block` holding something other than the stored item.
    pub fn foreign_slot<'b>(
        &self,
        block: &'b BlockDescriptor,
    ) -> Result<Option<&'b InventorySlot>, AuditError> {
        for slot in block.items().unwrap_or(&[]) {
            if !self.catalog.slot_matches(self.stub, slot)? {
                return Ok(Some(slot));
            }
        }
        Ok(None)
    }

    fn name(&self, slot: &InventorySlot) -> String {
        self.catalog.slot_display_name(slot)
    }
}

impl SymbolRule {
    /// Check one cell. `Ok(None)` means the block satisfies the rule.
    pub fn check<C>(
        self,
        cell: &Cell<'_>,
        contents: &Contents<'_, C>,
    ) -> Result<Option<String>, AuditError>
    where
        C: ItemCatalog + ?Sized,
    {
        let block = cell.block;
        let pos = cell.pos;
        let wall = cell.wall();
        let message = match self {
            SymbolRule::Air => (!block.is(block_ids::AIR)).then(|| cell.should_be("air")),
            SymbolRule::Any => None,
            SymbolRule::WallSign => {
                if !block.is(block_ids::WALL_SIGN) {
                    Some(cell.should_be("a sign"))
                } else if block.damage != wall.pick(4, 5) {
                    Some(format!("Sign at {pos} is facing the wrong way."))
                } else {
                    None
                }
            }
            SymbolRule::Chest => {
                if !block.is(block_ids::CHEST) {
                    Some(cell.should_be("a chest"))
                } else {
                    contents.foreign_slot(block)?.map(|slot| {
                        format!(
                            "Storage chest at {pos} contains items of the wrong kind: {}.",
                            contents.name(slot)
                        )
                    })
                }
            }
            SymbolRule::Hopper {
                direction,
                storage,
                skip_corridor_start,
            } => {
                if skip_corridor_start
                    && cell.offset.layer == -7
                    && cell.offset.row == 0
                    && cell.unit.slot < 8
                {
                    // these units' overflow runs the other way
                    return Ok(None);
                }
                let expected = direction.resolve(wall);
                if !block.is(block_ids::HOPPER) {
                    Some(cell.should_be("a hopper"))
                } else if block.damage & 0x7 != expected.metadata() {
                    Some(format!(
                        "Hopper at {pos} should be pointing {expected}, is {}.",
                        describe_facing(block.damage)
                    ))
                } else if storage.contains(&cell.offset) {
                    contents.foreign_slot(block)?.map(|slot| {
                        format!(
                            "Storage hopper at {pos} contains items of the wrong kind: {}.",
                            contents.name(slot)
                        )
                    })
                } else {
                    None
                }
            }
            SymbolRule::AnyHopper => {
                (!block.is(block_ids::HOPPER)).then(|| cell.should_be("a hopper"))
            }
            SymbolRule::Comparator => check_comparator(cell),
            SymbolRule::Dropper => {
                if !block.is(block_ids::DROPPER) {
                    Some(cell.should_be("a dropper"))
                } else if block.damage & 0x7 != HopperFacing::Up.metadata() {
                    Some(format!(
                        "Dropper at {pos} should be facing up, is {}.",
                        describe_facing(block.damage)
                    ))
                } else {
                    contents.foreign_slot(block)?.map(|slot| {
                        format!(
                            "Dropper at {pos} contains items of the wrong kind: {}.",
                            contents.name(slot)
                        )
                    })
                }
            }
            SymbolRule::Furnace => check_furnace(cell, contents)?,
            SymbolRule::Glowstone => {
                (!block.is(block_ids::GLOWSTONE)).then(|| cell.should_be("glowstone"))
            }
            SymbolRule::OverflowNorth => {
                if cell.unit.floor > 1 && cell.unit.slot < 2 {
                    if block.is(block_ids::HOPPER) {
                        (block.damage != HopperFacing::North.metadata()).then(|| {
                            format!(
                                "Overflow hopper at {pos} should be pointing north, is {}.",
                                describe_facing(block.damage)
                            )
                        })
                    } else if block.is(block_ids::AIR) {
                        // chains that start further down leave this empty
                        None
                    } else {
                        Some(cell.should_be("a hopper"))
                    }
                } else {
                    (!block.is(block_ids::AIR)).then(|| cell.should_be("air"))
                }
            }
            SymbolRule::OverflowDown => {
                let unit = cell.unit;
                let below =
                    cell.offset.layer < -7 && unit.floor < 6 && (unit.slot == 4 || unit.slot == 5);
                let above = cell.offset.layer > -7 && unit.floor > 1 && unit.slot < 2;
                if below || above {
                    if block.is(block_ids::HOPPER) {
                        (block.damage != HopperFacing::Down.metadata()).then(|| {
                            format!(
                                "Overflow hopper at {pos} should be pointing down, is {}.",
                                describe_facing(block.damage)
                            )
                        })
                    } else if block.is(block_ids::AIR) {
                        None
                    } else {
                        Some(cell.should_be("air or a hopper"))
                    }
                } else {
                    (!block.is(block_ids::AIR)).then(|| cell.should_be("air"))
                }
            }
            SymbolRule::Stairs => {
                let facing = wall.pick(1, 0);
                if !block.is(block_ids::OAK_STAIRS) {
                    Some(cell.should_be("oak stairs"))
                } else if block.damage & 0x3 != facing {
                    Some(format!(
                        "Stairs at {pos} should be facing {}, is {}.",
                        stairs_facing(facing),
                        stairs_facing(block.damage)
                    ))
                } else if block.damage & 0x4 != 0x4 {
                    Some(format!("Stairs at {pos} should be upside-down."))
                } else {
                    None
                }
            }
            SymbolRule::QuartzSlab => check_top_slab(cell, 7),
            SymbolRule::Repeater => check_repeater(cell),
            SymbolRule::StoneSlab => check_top_slab(cell, 0),
            SymbolRule::RedstoneTorch => {
                if !is_redstone_torch(block) {
                    Some(cell.should_be("a redstone torch"))
                } else {
                    match lookup(TORCH_ATTACHMENTS, cell.offset) {
                        Some(expected) if expected.on(wall) != block.damage => Some(format!(
                            "Redstone torch at {pos} attached to the block {}, should be attached to the block {}.",
                            describe_attachment(block.damage),
                            describe_attachment(expected.on(wall))
                        )),
                        Some(_) => None,
                        None => Some(cell.not_implemented("Facing", "redstone torch")),
                    }
                }
            }
            SymbolRule::BackWall => {
                if cell.at_corridor_end() {
                    check_regular_stone(cell)
                } else {
                    None
                }
            }
            SymbolRule::Foundation(foundation) => {
                let unit = cell.unit;
                let stone_region = cell.offset.layer == foundation.layer
                    && (unit.floor == 6 || unit.slot < 4 || (unit.slot < 6 && cell.offset.col > 1));
                if stone_region {
                    check_regular_stone(cell)
                } else {
                    (!block.is(foundation.block)).then(|| cell.should_be(foundation.name))
                }
            }
            SymbolRule::Torch => {
                if !block.is(block_ids::TORCH) {
                    Some(cell.should_be("a torch"))
                } else if block.damage != TorchAttachment::Below.metadata() {
                    Some(format!(
                        "Torch at {pos} should be attached to the block below, is attached to the block {}.",
                        describe_attachment(block.damage)
                    ))
                } else {
                    None
                }
            }
            SymbolRule::RedstoneDust => {
                (!block.is(block_ids::REDSTONE_WIRE)).then(|| cell.should_be("redstone"))
            }
            SymbolRule::Stone => {
                if block.is(block_ids::BEDROCK) && pos.y < BEDROCK_CEILING {
                    None
                } else if !block.is(block_ids::STONE) {
                    Some(if pos.y < BEDROCK_CEILING {
                        cell.should_be("stone or bedrock")
                    } else {
                        cell.should_be("stone")
                    })
                } else {
                    check_regular_stone(cell)
                }
            }
            SymbolRule::StandingRedstoneTorch => {
                if !is_redstone_torch(block) {
                    Some(cell.should_be("a redstone torch"))
                } else if block.damage != TorchAttachment::Below.metadata() {
                    Some(format!(
                        "Redstone torch at {pos} should be attached to the block below, is attached to the block {}.",
                        describe_attachment(block.damage)
                    ))
                } else {
                    None
                }
            }
            SymbolRule::HopperChain => {
                // TODO: check facing and alignment of chain segments
                (!block.is(block_ids::HOPPER) && !block.is(block_ids::AIR))
                    .then(|| cell.should_be("a hopper or air"))
            }
            SymbolRule::Unimplemented(symbol) => Some(format!(
                "Not yet implemented: block at {pos} should be {symbol}."
            )),
        };
        Ok(message)
    }
}

fn is_redstone_torch(block: &BlockDescriptor) -> bool {
    block.is(block_ids::REDSTONE_TORCH) || block.is(block_ids::UNLIT_REDSTONE_TORCH)
}

fn check_regular_stone(cell: &Cell<'_>) -> Option<String> {
    let block = cell.block;
    if !block.is(block_ids::STONE) {
        Some(cell.should_be("stone"))
    } else if block.damage != 0 {
        Some(format!(
            "Block at {} should be regular stone, is {}.",
            cell.pos,
            stone_variant(block.damage)
        ))
    } else {
        None
    }
}

fn check_top_slab(cell: &Cell<'_>, material: u8) -> Option<String> {
    let block = cell.block;
    let name = slab_variant(material);
    if !block.is(block_ids::STONE_SLAB) {
        Some(cell.should_be(&format!("a {name} slab")))
    } else if block.damage & 0x7 != material {
        Some(format!(
            "Block at {} should be a {name} slab, is a {} slab.",
            cell.pos,
            slab_variant(block.damage)
        ))
    } else if block.damage & 0x8 != 0x8 {
        let mut title = name.to_string();
        if let Some(first) = title.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        Some(format!(
            "{title} slab at {} should be a top slab, is a bottom slab.",
            cell.pos
        ))
    } else {
        None
    }
}

fn check_comparator(cell: &Cell<'_>) -> Option<String> {
    let block = cell.block;
    let pos = cell.pos;
    if !block.is(block_ids::UNPOWERED_COMPARATOR) {
        return Some(cell.should_be("a comparator"));
    }
    match lookup(COMPARATOR_FACINGS, cell.offset) {
        Some(expected) if expected.on(cell.wall()) != block.damage & 0x3 => {
            return Some(format!("Comparator at {pos} is facing the wrong way."))
        }
        Some(_) => {}
        None => return Some(cell.not_implemented("Direction", "comparator")),
    }
    let subtracts = block.damage & 0x4 == 0x4;
    let mode = |subtract: bool| if subtract { "subtraction" } else { "comparison" };
    match lookup(COMPARATOR_SUBTRACTS, cell.offset) {
        Some(expected) if expected != subtracts => Some(format!(
            "Comparator at {pos} is in {} mode, should be in {} mode.",
            mode(subtracts),
            mode(expected)
        )),
        Some(_) => None,
        None => Some(cell.not_implemented("Mode", "comparator")),
    }
}

fn check_repeater(cell: &Cell<'_>) -> Option<String> {
    let block = cell.block;
    let pos = cell.pos;
    if !block.is(block_ids::UNPOWERED_REPEATER) && !block.is(block_ids::POWERED_REPEATER) {
        return Some(cell.should_be("a repeater"));
    }
    match lookup(REPEATER_FACINGS, cell.offset) {
        Some(expected) if expected.on(cell.wall()) != block.damage & 0x3 => {
            return Some(format!("Repeater at {pos} is facing the wrong way."))
        }
        Some(_) => {}
        None => return Some(cell.not_implemented("Direction", "repeater")),
    }
    let delay = 2 * (block.damage >> 2) + 2;
    match lookup(REPEATER_DELAYS, cell.offset) {
        Some(expected) if expected != delay => Some(format!(
            "Repeater at {pos} has a delay of {delay} game ticks, should be {expected}."
        )),
        Some(_) => None,
        None => Some(cell.not_implemented("Delay", "repeater")),
    }
}

fn check_furnace<C>(
    cell: &Cell<'_>,
    contents: &Contents<'_, C>,
) -> Result<Option<String>, AuditError>
where
    C: ItemCatalog + ?Sized,
{
    let block = cell.block;
    let pos = cell.pos;
    let offset = cell.offset;
    let unit = cell.unit;

    if offset.layer == -6 && offset.row == 0 && unit.slot < 2 {
        // overflow of the first units runs the other way
        return Ok(None);
    }
    if offset == at(7, -1, 1) && cell.at_corridor_end() {
        return Ok(check_top_slab(cell, 7));
    }
    if unit.corridor == 0 && unit.floor == 6 && offset.layer == -1 && offset.row == 7 {
        return Ok(if !block.is(block_ids::STONEBRICK) {
            Some(cell.should_be("stone bricks"))
        } else if block.damage != 0 {
            Some(format!(
                "Block at {pos} should be regular stone bricks, is {} stone bricks.",
                stonebrick_variant(block.damage)
            ))
        } else {
            None
        });
    }

    if !block.is(block_ids::FURNACE) {
        return Ok(Some(cell.should_be("a furnace")));
    }
    let Some(expected) = lookup(FURNACE_SIGNALS, offset) else {
        return Ok(Some(cell.not_implemented("Fill level", "furnace")));
    };
    let signal = comparator_signal(block, |slot| contents.catalog.slot_stack_size(slot).ok())
        .map_err(|source| AuditError::Signal { pos, source })?;
    Ok((signal != expected).then(|| {
        format!("Furnace at {pos} has a fill level of {signal}, should be {expected}.")
    }))
}
