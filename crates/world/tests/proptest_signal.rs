//! Property-based tests for comparator signal arithmetic
//!
//! Validates signal invariants:
//! - Signal stays within 0..=15
//! - Signal is zero exactly when the container is empty
//! - Adding items never lowers the signal

use cloudaudit_core::{block_ids, BlockDescriptor, InventorySlot};
use cloudaudit_world::comparator_signal;
use proptest::prelude::*;

fn chest_with(counts: &[u32]) -> BlockDescriptor {
    let items = counts
        .iter()
        .enumerate()
        .filter(|(_, &count)| count > 0)
        .map(|(slot, &count)| InventorySlot {
            slot: slot as u8,
            id: "minecraft:stone".to_string(),
            count,
            damage: 0,
            tag: None,
        })
        .collect();
    BlockDescriptor::container(block_ids::CHEST, 0, items)
}

proptest! {
    /// Property: signal is in range and zero iff the chest is empty
    #[test]
    fn signal_range_and_zero(counts in prop::collection::vec(0u32..=64, 27)) {
        let signal = comparator_signal(&chest_with(&counts), |_| Some(64)).unwrap();
        prop_assert!(signal <= 15);
        prop_assert_eq!(signal == 0, counts.iter().all(|&c| c == 0));
    }

    /// Property: topping up one slot never lowers the signal
    #[test]
    fn signal_is_monotonic(
        counts in prop::collection::vec(0u32..64, 27),
        slot in 0usize..27,
        extra in 1u32..=64,
    ) {
        let before = comparator_signal(&chest_with(&counts), |_| Some(64)).unwrap();
        let mut more = counts.clone();
        more[slot] = (more[slot] + extra).min(64);
        let after = comparator_signal(&chest_with(&more), |_| Some(64)).unwrap();
        prop_assert!(after >= before);
    }
}
