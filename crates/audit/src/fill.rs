//! Fill level of a unit's containers.

use cloudaudit_core::{CellOffset, LogicalPosition};
use cloudaudit_world::{slot_count, BlockOracle};
use tracing::debug;

use crate::status::FillLevel;
use crate::AuditError;

/// Every container block counted in a complete SmartChest.
pub const CONTAINERS: [CellOffset; 22] = [
    CellOffset::new(3, -7, 3),
    CellOffset::new(3, -7, 4),
    CellOffset::new(4, -7, 4),
    CellOffset::new(5, -7, 3),
    CellOffset::new(5, -7, 4),
    CellOffset::new(2, -6, 3),
    CellOffset::new(3, -6, 2),
    CellOffset::new(3, -6, 3),
    CellOffset::new(2, -5, 2),
    CellOffset::new(2, -5, 3),
    CellOffset::new(3, -5, 3),
    CellOffset::new(2, -4, 3),
    CellOffset::new(3, -4, 2),
    CellOffset::new(3, -4, 3),
    CellOffset::new(3, -3, 2),
    CellOffset::new(4, -3, 2),
    CellOffset::new(5, -3, 2),
    CellOffset::new(6, -3, 2),
    CellOffset::new(5, -2, 2),
    CellOffset::new(6, -2, 2),
    CellOffset::new(5, 0, 2),
    CellOffset::new(5, 0, 3),
];

/// South and north halves of the access chest.
pub const ACCESS_CHEST: [CellOffset; 2] = [CellOffset::new(5, 0, 2), CellOffset::new(5, 0, 3)];

/// Lowest storage dropper; it always keeps a few stacks that never reach the
/// access chest.
pub const BOTTOM_DROPPER: CellOffset = CellOffset::new(5, -7, 3);

/// Stacks permanently held by [`BOTTOM_DROPPER`].
pub const STUCK_STACKS: u32 = 4;

/// Storage containers: every counted container except the access chest.
pub fn storage_containers() -> impl Iterator<Item = CellOffset> {
    CONTAINERS
        .into_iter()
        .filter(|offset| !ACCESS_CHEST.contains(offset))
}

/// Count the items stored in a unit.
///
/// With `smart_chest` every SmartChest container is counted, otherwise only
/// the access chest. Items with `damage > 0` are skipped for items that have
/// durability, and the stacks stuck in the bottom dropper are subtracted from
/// both the total and the capacity.
///
/// The capacity correction only applies when the bottom dropper is counted,
/// so a yellow unit (access chest only) gets the full 54 slots.
pub fn compute_fill_level<O>(
    unit: LogicalPosition,
    smart_chest: bool,
    stack_size: u32,
    durability: bool,
    oracle: &O,
) -> Result<FillLevel, AuditError>
where
    O: BlockOracle + ?Sized,
{
    let containers: &[CellOffset] = if smart_chest {
        &CONTAINERS
    } else {
        &ACCESS_CHEST
    };

    let mut total_items = 0u64;
    let mut max_slots = 0u32;
    for &offset in containers {
        let pos = unit.cell(offset);
        let block = oracle.block_at(pos)?;
        let slots = slot_count(&block.id).ok_or_else(|| AuditError::NotAContainer {
            pos,
            id: block.id.clone(),
        })?;
        max_slots += slots;

        let counted: u64 = block
            .items()
            .unwrap_or(&[])
            .iter()
            .filter(|slot| !durability || slot.damage == 0)
            .map(|slot| u64::from(slot.count))
            .sum();
        let stuck = if offset == BOTTOM_DROPPER {
            u64::from(STUCK_STACKS) * u64::from(stack_size)
        } else {
            0
        };
        total_items += counted.saturating_sub(stuck);
    }
    if containers.contains(&BOTTOM_DROPPER) {
        max_slots = max_slots.saturating_sub(STUCK_STACKS);
    }

    debug!(%unit, total_items, max_slots, smart_chest, "Computed fill level");
    Ok(FillLevel::new(stack_size, total_items, max_slots, smart_chest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudaudit_core::{block_ids, BlockDescriptor, InventorySlot};
    use cloudaudit_world::{MemoryWorld, OracleError};

    const UNIT: LogicalPosition = LogicalPosition::new(1, 1, 4);

    fn stack(slot: u8, count: u32, damage: i16) -> InventorySlot {
        InventorySlot {
            slot,
            id: "minecraft:diamond_sword".to_string(),
            count,
            damage,
            tag: None,
        }
    }

    /// Chests everywhere except a hopper at (2,-6,3) and the bottom dropper.
    fn empty_smart_chest() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        for offset in CONTAINERS {
            let id = if offset == BOTTOM_DROPPER {
                block_ids::DROPPER
            } else if offset == CellOffset::new(2, -6, 3) {
                block_ids::HOPPER
            } else {
                block_ids::CHEST
            };
            world.set(UNIT.cell(offset), BlockDescriptor::container(id, 0, Vec::new()));
        }
        world
    }

    #[test]
    fn access_chest_only() {
        let mut world = MemoryWorld::new();
        for offset in ACCESS_CHEST {
            world.set(
                UNIT.cell(offset),
                BlockDescriptor::container(block_ids::CHEST, 0, vec![stack(0, 1, 0)]),
            );
        }
        let level = compute_fill_level(UNIT, false, 1, true, &world).unwrap();
        assert_eq!(level.total_items, 2);
        assert_eq!(level.max_slots, 54);
        assert!(!level.is_smart_chest);
    }

    #[test]
    fn skips_damaged_items_only_with_durability() {
        let mut world = MemoryWorld::new();
        for offset in ACCESS_CHEST {
            world.set(
                UNIT.cell(offset),
                BlockDescriptor::container(
                    block_ids::CHEST,
                    0,
                    vec![stack(0, 1, 0), stack(1, 1, 12)],
                ),
            );
        }
        let with = compute_fill_level(UNIT, false, 1, true, &world).unwrap();
        let without = compute_fill_level(UNIT, false, 1, false, &world).unwrap();
        assert_eq!(with.total_items, 2);
        assert_eq!(without.total_items, 4);
    }

    #[test]
    fn bottom_dropper_stacks_are_subtracted() {
        let mut world = empty_smart_chest();
        let dropper = world.get_mut(UNIT.cell(BOTTOM_DROPPER)).unwrap();
        *dropper = BlockDescriptor::container(
            block_ids::DROPPER,
            1,
            (0..6).map(|slot| stack(slot, 1, 0)).collect(),
        );
        let level = compute_fill_level(UNIT, true, 1, false, &world).unwrap();
        assert_eq!(level.total_items, 2);
        // 20 chests, one hopper and the dropper, minus the stuck stacks
        assert_eq!(level.max_slots, 20 * 27 + 5 + 9 - STUCK_STACKS);
    }

    #[test]
    fn clamps_partially_filled_bottom_dropper() {
        let mut world = empty_smart_chest();
        let dropper = world.get_mut(UNIT.cell(BOTTOM_DROPPER)).unwrap();
        *dropper = BlockDescriptor::container(block_ids::DROPPER, 1, vec![stack(0, 1, 0)]);
        let level = compute_fill_level(UNIT, true, 1, false, &world).unwrap();
        assert!(level.is_empty());
    }

    #[test]
    fn non_container_is_an_error() {
        let world = MemoryWorld::new();
        let err = compute_fill_level(UNIT, false, 64, false, &world).unwrap_err();
        assert!(matches!(err, AuditError::NotAContainer { ref id, .. } if id == block_ids::AIR));
    }

    #[test]
    fn oracle_errors_propagate() {
        struct Broken;
        impl BlockOracle for Broken {
            fn block_at(
                &self,
                pos: cloudaudit_core::WorldPos,
            ) -> Result<BlockDescriptor, OracleError> {
                Err(OracleError::NotFound {
                    pos,
                    chunk: String::new(),
                })
            }
        }
        let err = compute_fill_level(UNIT, true, 64, false, &Broken).unwrap_err();
        assert!(matches!(err, AuditError::Oracle(_)));
    }

    #[test]
    fn storage_containers_exclude_access_chest() {
        let storage: Vec<_> = storage_containers().collect();
        assert_eq!(storage.len(), 20);
        assert!(!storage.contains(&ACCESS_CHEST[0]));
    }
}
