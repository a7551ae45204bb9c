//! Comparator output for blocks a comparator can read.

use cloudaudit_core::{block_ids, BlockDescriptor, InventorySlot};

/// Why a comparator signal could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    /// The block is not something a comparator reads.
    #[error("comparator signal for {id} is not supported")]
    Unsupported { id: String },
    /// A container or counter block without its tile entity data.
    #[error("{id} has no inventory data")]
    MissingInventory { id: String },
    /// No stack size is known for an item found in a container.
    #[error("unknown stack size for {id}")]
    UnknownStackSize { id: String },
    /// A jukebox holding something that is not a known record.
    #[error("unknown record {record} in jukebox")]
    UnknownRecord { record: String },
    /// The two halves passed as a double chest are not a chest pair.
    #[error("{first} and {second} do not form a double chest")]
    NotADoubleChest { first: String, second: String },
}

/// Inventory size of a container block, `None` for non-containers.
pub fn slot_count(id: &str) -> Option<u32> {
    match id {
        block_ids::FURNACE | block_ids::LIT_FURNACE => Some(3),
        block_ids::HOPPER | block_ids::BREWING_STAND => Some(5),
        block_ids::DISPENSER | block_ids::DROPPER => Some(9),
        block_ids::CHEST | block_ids::TRAPPED_CHEST => Some(27),
        _ => None,
    }
}

/// Whether the block is a container counted by [`slot_count`].
pub fn is_container(id: &str) -> bool {
    slot_count(id).is_some()
}

/// Signal of a comparator reading `block`.
///
/// `stack_size_of` resolves the maximum stack size of a slot's item.
pub fn comparator_signal<F>(block: &BlockDescriptor, stack_size_of: F) -> Result<u8, SignalError>
where
    F: FnMut(&InventorySlot) -> Option<u32>,
{
    if let Some(slots) = slot_count(&block.id) {
        let items = inventory(block)?;
        return container_signal(items.iter(), slots, stack_size_of);
    }
    match block.id.as_str() {
        block_ids::CAKE => Ok(14u8.saturating_sub(block.damage.saturating_mul(2))),
        block_ids::CAULDRON => Ok(block.damage),
        block_ids::COMMAND_BLOCK
        | block_ids::REPEATING_COMMAND_BLOCK
        | block_ids::CHAIN_COMMAND_BLOCK => {
            block
                .success_count()
                .ok_or_else(|| SignalError::MissingInventory {
                    id: block.id.clone(),
                })
        }
        block_ids::END_PORTAL_FRAME => Ok(if block.damage & 0x4 == 0x4 { 15 } else { 0 }),
        block_ids::JUKEBOX => {
            if block.damage == 0 {
                return Ok(0);
            }
            let record = block
                .record_item()
                .ok_or_else(|| SignalError::MissingInventory {
                    id: block.id.clone(),
                })?;
            record_signal(record).ok_or_else(|| SignalError::UnknownRecord {
                record: record.to_string(),
            })
        }
        _ => Err(SignalError::Unsupported {
            id: block.id.clone(),
        }),
    }
}

/// Signal of a comparator reading a double chest made of `first` and `second`.
pub fn double_chest_signal<F>(
    first: &BlockDescriptor,
    second: &BlockDescriptor,
    stack_size_of: F,
) -> Result<u8, SignalError>
where
    F: FnMut(&InventorySlot) -> Option<u32>,
{
    let is_chest = |id: &str| id == block_ids::CHEST || id == block_ids::TRAPPED_CHEST;
    if first.id != second.id || !is_chest(&first.id) {
        return Err(SignalError::NotADoubleChest {
            first: first.id.clone(),
            second: second.id.clone(),
        });
    }
    let items = inventory(first)?.iter().chain(inventory(second)?.iter());
    container_signal(items, 54, stack_size_of)
}

fn inventory(block: &BlockDescriptor) -> Result<&[InventorySlot], SignalError> {
    block.items().ok_or_else(|| SignalError::MissingInventory {
        id: block.id.clone(),
    })
}

fn container_signal<'a, I, F>(items: I, slots: u32, mut stack_size_of: F) -> Result<u8, SignalError>
where
    I: Iterator<Item = &'a InventorySlot>,
    F: FnMut(&InventorySlot) -> Option<u32>,
{
    let mut fullness = 0.0_f64;
    let mut total = 0u64;
    for slot in items {
        let max = stack_size_of(slot).ok_or_else(|| SignalError::UnknownStackSize {
            id: slot.id.clone(),
        })?;
        total += u64::from(slot.count);
        fullness += f64::from(slot.count) / f64::from(max.max(1));
    }
    if total == 0 {
        return Ok(0);
    }
    let signal = (1.0 + 14.0 * fullness / f64::from(slots)).floor();
    Ok(signal.clamp(0.0, 15.0) as u8)
}

fn record_signal(record: &str) -> Option<u8> {
    let name = record.strip_prefix("minecraft:record_")?;
    let signal = match name {
        "13" => 1,
        "cat" => 2,
        "blocks" => 3,
        "chirp" => 4,
        "far" => 5,
        "mall" => 6,
        "mellohi" => 7,
        "stal" => 8,
        "strad" => 9,
        "ward" => 10,
        "11" => 11,
        "wait" => 12,
        _ => return None,
    };
    Some(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudaudit_core::{RecordItem, TileEntity};

    fn stack(id: &str, count: u32) -> InventorySlot {
        InventorySlot {
            slot: 0,
            id: id.to_string(),
            count,
            damage: 0,
            tag: None,
        }
    }

    fn sixty_four(_: &InventorySlot) -> Option<u32> {
        Some(64)
    }

    #[test]
    fn empty_container_is_zero() {
        let hopper = BlockDescriptor::container(block_ids::HOPPER, 0, vec![]);
        assert_eq!(comparator_signal(&hopper, sixty_four), Ok(0));
    }

    #[test]
    fn single_item_gives_one() {
        let chest =
            BlockDescriptor::container(block_ids::CHEST, 0, vec![stack("minecraft:stone", 1)]);
        assert_eq!(comparator_signal(&chest, sixty_four), Ok(1));
    }

    #[test]
    fn full_containers_give_fifteen() {
        let items = (0..5).map(|_| stack("minecraft:stone", 64)).collect();
        let hopper = BlockDescriptor::container(block_ids::HOPPER, 0, items);
        assert_eq!(comparator_signal(&hopper, sixty_four), Ok(15));
    }

    #[test]
    fn furnace_fill_levels() {
        let one = BlockDescriptor::container(
            block_ids::FURNACE,
            0,
            vec![stack("minecraft:wooden_sword", 1)],
        );
        // an unstackable item fills a whole slot: 1 + 14/3
        assert_eq!(comparator_signal(&one, |_| Some(1)), Ok(5));
        let some =
            BlockDescriptor::container(block_ids::FURNACE, 0, vec![stack("minecraft:stone", 2)]);
        assert_eq!(comparator_signal(&some, sixty_four), Ok(1));
    }

    #[test]
    fn double_chest_uses_54_slots() {
        let full: Vec<_> = (0..27).map(|_| stack("minecraft:stone", 64)).collect();
        let north = BlockDescriptor::container(block_ids::CHEST, 0, full);
        let south = BlockDescriptor::container(block_ids::CHEST, 0, vec![]);
        // 27 of 54 slots full: 1 + 14 * 27 / 54 = 8
        assert_eq!(double_chest_signal(&north, &south, sixty_four), Ok(8));

        let hopper = BlockDescriptor::container(block_ids::HOPPER, 0, vec![]);
        assert!(matches!(
            double_chest_signal(&north, &hopper, sixty_four),
            Err(SignalError::NotADoubleChest { .. })
        ));
    }

    #[test]
    fn unknown_stack_size_fails() {
        let chest =
            BlockDescriptor::container(block_ids::CHEST, 0, vec![stack("minecraft:mystery", 1)]);
        assert!(matches!(
            comparator_signal(&chest, |_| None),
            Err(SignalError::UnknownStackSize { .. })
        ));
    }

    #[test]
    fn container_without_inventory_fails() {
        let dropper = BlockDescriptor::new(block_ids::DROPPER, 1);
        assert!(matches!(
            comparator_signal(&dropper, sixty_four),
            Err(SignalError::MissingInventory { .. })
        ));
    }

    #[test]
    fn non_container_blocks() {
        let cake = BlockDescriptor::new(block_ids::CAKE, 3);
        assert_eq!(comparator_signal(&cake, sixty_four), Ok(8));
        let cauldron = BlockDescriptor::new(block_ids::CAULDRON, 2);
        assert_eq!(comparator_signal(&cauldron, sixty_four), Ok(2));
        let frame = BlockDescriptor::new(block_ids::END_PORTAL_FRAME, 4 | 2);
        assert_eq!(comparator_signal(&frame, sixty_four), Ok(15));
        let mut jukebox = BlockDescriptor::new(block_ids::JUKEBOX, 1);
        jukebox.tile_entity = Some(TileEntity {
            record_item: Some(RecordItem {
                id: "minecraft:record_stal".into(),
            }),
            ..TileEntity::default()
        });
        assert_eq!(comparator_signal(&jukebox, sixty_four), Ok(8));
        let mut command = BlockDescriptor::new(block_ids::COMMAND_BLOCK, 0);
        command.tile_entity = Some(TileEntity {
            success_count: Some(3),
            ..TileEntity::default()
        });
        assert_eq!(comparator_signal(&command, sixty_four), Ok(3));
        assert!(matches!(
            comparator_signal(&BlockDescriptor::new(block_ids::STONE, 0), sixty_four),
            Err(SignalError::Unsupported { .. })
        ));
    }
}
