//! Property-based tests for fill levels and to-do ordering
//!
//! Validates fill invariants:
//! - Fraction stays within 0..=1 and grows with the item count
//! - A unit is empty exactly when it holds nothing and full exactly at capacity
//! - Stuck dropper stacks never count as stored items
//! - Orange units sort before yellow ones regardless of fill

use cloudaudit_audit::{compute_fill_level, sort_key, FillLevel, Severity, UnitStatus};
use cloudaudit_core::LogicalPosition;
use cloudaudit_testkit::PerfectUnit;
use cloudaudit_world::MemoryWorld;
use proptest::prelude::*;

fn position() -> impl Strategy<Value = LogicalPosition> {
    (0u32..7, -3i32..4, 0u32..12).prop_map(|(floor, corridor, slot)| {
        LogicalPosition::new(floor, corridor, slot)
    })
}

proptest! {
    /// Property: fraction is in range and monotonic in the item count
    #[test]
    fn fraction_is_bounded_and_monotonic(
        stack_size in prop::sample::select(vec![1u32, 16, 64]),
        max_slots in 1u32..400,
        a in 0u64..30_000,
        b in 0u64..30_000,
    ) {
        let cap = u64::from(max_slots) * u64::from(stack_size);
        let (low, high) = (a.min(b).min(cap), a.max(b).min(cap));
        let low = FillLevel::new(stack_size, low, max_slots, true);
        let high = FillLevel::new(stack_size, high, max_slots, true);
        prop_assert!((0.0..=1.0).contains(&low.fraction()));
        prop_assert!(low.fraction() <= high.fraction());
    }

    /// Property: empty iff zero items, full iff at capacity
    #[test]
    fn empty_and_full_match_counts(
        stack_size in 1u32..=64,
        max_slots in 1u32..400,
        total in 0u64..30_000,
    ) {
        let level = FillLevel::new(stack_size, total, max_slots, true);
        prop_assert_eq!(level.is_empty(), total == 0);
        prop_assert_eq!(level.is_full(), total == level.max_items());
        prop_assert_eq!(level.fraction() == 0.0, total == 0);
    }

    /// Property: filling a SmartChest with n stacks reads back n stacks
    #[test]
    fn stuck_stacks_are_not_counted(stacks in 4u32..=300) {
        let unit = PerfectUnit::cobblestone();
        let mut world = MemoryWorld::new();
        unit.build(&mut world).unwrap();
        unit.fill_stacks(&mut world, stacks);

        let level = compute_fill_level(unit.position, true, 64, false, &world).unwrap();
        prop_assert_eq!(level.total_items, u64::from(stacks) * 64);
        prop_assert_eq!(level.max_slots, 374);
    }

    /// Property: orange units precede yellow units in the to-do list
    #[test]
    fn orange_sorts_before_yellow(
        a in position(),
        b in position(),
        fa in 0u64..640,
        fb in 0u64..640,
    ) {
        let orange = UnitStatus::new(Severity::Orange, "")
            .with_fill_level(FillLevel::new(64, fa, 10, false));
        let yellow = UnitStatus::new(Severity::Yellow, "")
            .with_fill_level(FillLevel::new(64, fb, 10, false));
        prop_assert!(sort_key(a, &orange) < sort_key(b, &yellow));
    }
}
