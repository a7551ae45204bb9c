//! End-to-end audits of SmartChests built into an in-memory world.

use std::collections::BTreeMap;

use cloudaudit_assets::{JsonItemCatalog, Layout, Schematic, UnitAssignment};
use cloudaudit_audit::{
    AuditConfig, CachePolicy, CloudAuditor, InstallationConfig, ResultCache, Severity,
    UnitRequest, UnitStatus, UnitValidator,
};
use cloudaudit_core::{
    block_ids, BlockDescriptor, HopperFacing, InventorySlot, ItemStub, LogicalPosition, WorldPos,
};
use cloudaudit_testkit::{lay_hopper_chain, sample_catalog, slot_of, PerfectUnit};
use cloudaudit_world::MemoryWorld;

struct Fixture {
    world: MemoryWorld,
    catalog: JsonItemCatalog,
    schematic: Schematic,
    installation: InstallationConfig,
    pre_sorter_x: Option<i32>,
}

impl Fixture {
    /// A world holding `unit` alone, its overflow ending right past the unit.
    fn with_unit(unit: &PerfectUnit) -> Self {
        let mut world = MemoryWorld::new();
        unit.build(&mut world).unwrap();
        Self {
            world,
            catalog: sample_catalog().unwrap(),
            schematic: Schematic::smart_chest().unwrap(),
            installation: InstallationConfig {
                overflow_sink: unit.overflow_exit(),
                ..InstallationConfig::default()
            },
            pre_sorter_x: None,
        }
    }

    /// Add the preliminary sorter a unit below the pre-sorter floor needs.
    fn with_pre_sorter(mut self, unit: &PerfectUnit, x: i32) -> Self {
        let mut items = vec![slot_of(0, &unit.item, 1)];
        items.extend((1..5).map(|slot| slot_of(slot, unit.filler(), 1)));
        self.world.set(
            self.installation.pre_sorter(x),
            BlockDescriptor::container(block_ids::HOPPER, HopperFacing::South.metadata(), items),
        );
        self.pre_sorter_x = Some(x);
        self
    }

    fn validator(&self) -> UnitValidator<'_, MemoryWorld, JsonItemCatalog> {
        UnitValidator::new(&self.world, &self.catalog, &self.schematic, self.installation)
    }

    fn audit(&self, unit: &PerfectUnit, cache: Option<&mut ResultCache>) -> UnitStatus {
        let stub = ItemStub::parse(&unit.item).unwrap();
        let request = UnitRequest {
            name: Some(unit.name.as_str()),
            pre_sorter_x: self.pre_sorter_x,
            ..UnitRequest::new(unit.position, &stub, unit.corridor_length)
        };
        self.validator().validate_with(&request, cache).unwrap()
    }
}

fn chest_of(items: Vec<InventorySlot>) -> BlockDescriptor {
    BlockDescriptor::container(block_ids::CHEST, 0, items)
}

#[test]
fn perfect_half_full_unit_is_ok() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    unit.fill_stacks(&mut fixture.world, 187);

    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Ok, "{}", status.message);
    assert_eq!(status.message, "This SmartChest is in perfect state.");
    let level = status.fill_level.unwrap();
    assert!(level.is_smart_chest);
    assert_eq!(level.max_slots, 374);
    assert_eq!(status.fraction(), Some(0.5));
}

#[test]
fn empty_perfect_unit_is_ok_and_empty() {
    let unit = PerfectUnit::cobblestone();
    let fixture = Fixture::with_unit(&unit);
    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Ok, "{}", status.message);
    assert!(status.fill_level.unwrap().is_empty());
}

#[test]
fn missing_access_chest_half_is_gray() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    fixture.world.clear(unit.cell(5, 0, 3));

    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Gray);
    assert_eq!(status.message, "North half of access chest does not exist.");
    assert!(status.fill_level.is_none());
}

#[test]
fn missing_droppers_make_the_unit_orange() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    for layer in -7..0 {
        fixture.world.clear(unit.cell(5, layer, 3));
    }
    // without droppers the schematic is not walked
    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Orange, "{}", status.message);
    assert_eq!(status.message, "SmartChest droppers do not exist.");
    assert!(!status.fill_level.unwrap().is_smart_chest);
}

#[test]
fn some_missing_droppers_are_listed() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    fixture.world.clear(unit.cell(5, -5, 3));
    fixture.world.clear(unit.cell(5, -3, 3));

    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Orange, "{}", status.message);
    assert_eq!(status.message, "SmartChest droppers at y=58, y=60 do not exist.");
}

#[test]
fn single_missing_dropper_names_the_block() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    fixture
        .world
        .set(unit.cell(5, -4, 3), BlockDescriptor::new(block_ids::STONE, 0));

    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Orange, "{}", status.message);
    assert_eq!(
        status.message,
        "SmartChest dropper at y=59 does not exist, is minecraft:stone."
    );
}

#[test]
fn missing_overflow_is_red() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    let hopper = unit.cell(1, -7, 4);
    fixture.world.clear(hopper);
    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Red);
    assert_eq!(
        status.message,
        format!("Overflow hopper at x={} does not exist, is minecraft:air.", hopper.x)
    );

    fixture.world.clear(unit.cell(2, -7, 4));
    fixture.world.clear(unit.cell(0, -7, 4));
    let status = fixture.audit(&unit, None);
    assert_eq!(status.message, "Missing overflow hoppers.");
}

#[test]
fn broken_overflow_chain_is_red() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    let segment = unit.cell(0, -7, 6);
    fixture.world.set(segment, BlockDescriptor::new(block_ids::STONE, 0));

    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Red);
    assert!(
        status
            .message
            .ends_with(&format!("block at {segment} is not a hopper.")),
        "{}",
        status.message
    );
}

#[test]
fn foreign_item_in_storage_chest_is_named() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    let chest = unit.cell(3, -6, 2);
    fixture
        .world
        .set(chest, chest_of(vec![slot_of(0, "minecraft:dirt", 3)]));

    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Red);
    assert_eq!(
        status.message,
        format!("Storage chest at {chest} contains items of the wrong kind: Dirt.")
    );
}

#[test]
fn wrong_sign_text_is_red() {
    let mut unit = PerfectUnit::cobblestone();
    let fixture = Fixture::with_unit(&unit);
    unit.name = "Cobble".to_string();

    let status = fixture.audit(&unit, None);
    assert_eq!(
        status.message,
        "Sign has wrong text: should be 'Cobble', is 'Cobblestone'."
    );
}

#[test]
fn stuck_items_without_access_chest_contents_are_red() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    unit.fill_stacks(&mut fixture.world, 0);

    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Red);
    assert!(status.message.starts_with("Access chest is empty but there are items stuck"));
}

#[test]
fn sorter_full_of_filler_is_yellow() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    let pearls = (0..5).map(|slot| slot_of(slot, block_ids::ENDER_PEARL, 1)).collect();
    fixture.world.set(
        unit.cell(7, -3, 3),
        BlockDescriptor::container(block_ids::HOPPER, HopperFacing::North.metadata(), pearls),
    );

    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Yellow, "{}", status.message);
    assert!(status.message.starts_with("Sorting hopper is full of Ender Pearl"));
    assert!(status.fill_level.is_some());
}

#[test]
fn sorter_with_extra_filler_is_red() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    let mut items = vec![slot_of(0, "minecraft:cobblestone", 1)];
    items.push(slot_of(1, block_ids::ENDER_PEARL, 2));
    items.extend((2..4).map(|slot| slot_of(slot, block_ids::ENDER_PEARL, 1)));
    fixture.world.set(
        unit.cell(7, -3, 3),
        BlockDescriptor::container(block_ids::HOPPER, HopperFacing::North.metadata(), items),
    );

    let status = fixture.audit(&unit, None);
    assert_eq!(
        status.message,
        "Sorting hopper: too much Ender Pearl in slot 1."
    );
}

#[test]
fn unstackable_item_is_cyan_until_damaged() {
    let unit = PerfectUnit::new(
        LogicalPosition::new(1, 1, 4),
        10,
        "minecraft:diamond_sword",
        "Diamond Sword",
        1,
    );
    let mut fixture = Fixture::with_unit(&unit);
    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Cyan, "{}", status.message);
    assert!(status.message.contains("not stackable"));

    let chest = unit.cell(3, -6, 2);
    let mut sword = slot_of(0, "minecraft:diamond_sword", 1);
    sword.damage = 12;
    fixture.world.set(chest, chest_of(vec![sword]));
    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Red);
    assert_eq!(
        status.message,
        format!("Item in storage container at {chest} is damaged.")
    );
}

#[test]
fn cached_clean_results_hide_later_breakage() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    let mut cache = ResultCache::in_memory(CachePolicy::default());

    assert_eq!(fixture.audit(&unit, Some(&mut cache)).severity, Severity::Ok);
    assert_eq!(cache.len(), 1);

    let glowstone = unit.cell(5, 1, 1);
    fixture
        .world
        .set(glowstone, BlockDescriptor::new(block_ids::STONE, 0));
    assert_eq!(fixture.audit(&unit, Some(&mut cache)).severity, Severity::Ok);

    let mut fresh = ResultCache::in_memory(CachePolicy::default());
    let status = fixture.audit(&unit, Some(&mut fresh));
    assert_eq!(
        status.message,
        format!("Block at {glowstone} should be glowstone, is minecraft:stone.")
    );
    assert_eq!(fresh.get(unit.position).unwrap().message, Some(status.message));
}

#[test]
fn cached_errors_are_rechecked_unless_trusted() {
    let unit = PerfectUnit::cobblestone();
    let fixture = Fixture::with_unit(&unit);

    let mut cache = ResultCache::in_memory(CachePolicy::default());
    cache.put(unit.position, Some("stale".to_string()));
    assert_eq!(fixture.audit(&unit, Some(&mut cache)).severity, Severity::Ok);
    assert_eq!(cache.get(unit.position).unwrap().message, None);

    let trusting = CachePolicy {
        trust_cached_errors: true,
        ..CachePolicy::default()
    };
    let mut cache = ResultCache::in_memory(trusting);
    cache.put(unit.position, Some("stale".to_string()));
    let status = fixture.audit(&unit, Some(&mut cache));
    assert_eq!(status, UnitStatus::red("stale"));
}

#[test]
fn broken_input_chain_marks_the_feeder_red() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    let start = WorldPos::new(100, 10, 100);
    let end = lay_hopper_chain(&mut fixture.world, start, HopperFacing::East, 5);
    fixture.installation.input_chain_start = start;
    fixture.installation.input_chain_end = end;
    fixture.installation.overflow_feeder = unit.position;

    assert_eq!(fixture.validator().global_checks(None).unwrap(), None);
    assert_eq!(fixture.audit(&unit, None).severity, Severity::Ok);

    let gap = start.offset(2, 0, 0);
    fixture.world.clear(gap);
    let expected = format!(
        "Input hopper chain at {start} is not connected to the unsorted overflow at {end}: block at {gap} is not a hopper."
    );
    assert_eq!(
        fixture.validator().global_checks(None).unwrap(),
        Some(expected.clone())
    );
    assert_eq!(fixture.audit(&unit, None), UnitStatus::red(expected));
}

#[test]
fn todo_lists_most_urgent_units_first() {
    let cobblestone = PerfectUnit::new(
        LogicalPosition::new(1, 0, 4),
        10,
        "minecraft:cobblestone",
        "Cobblestone",
        64,
    );
    let pearls = PerfectUnit::new(
        LogicalPosition::new(1, 1, 4),
        10,
        "minecraft:ender_pearl",
        "Ender Pearl",
        16,
    );
    let mut world = MemoryWorld::new();
    cobblestone.build(&mut world).unwrap();
    cobblestone.fill_stacks(&mut world, 187);
    pearls.build(&mut world).unwrap();
    let tables = (0..5)
        .map(|slot| slot_of(slot, block_ids::CRAFTING_TABLE, 1))
        .collect();
    world.set(
        pearls.cell(7, -3, 3),
        BlockDescriptor::container(block_ids::HOPPER, HopperFacing::North.metadata(), tables),
    );
    // both overflow chains join one line running west
    let sink = lay_hopper_chain(&mut world, pearls.overflow_exit(), HopperFacing::West, 30);

    let corridor = |item: &PerfectUnit| {
        let mut units = vec![UnitAssignment::new(ItemStub::parse("minecraft:dirt").unwrap()); 10];
        units[4] = UnitAssignment::new(ItemStub::parse(&item.item).unwrap());
        units
    };
    let floor = BTreeMap::from([(0, corridor(&cobblestone)), (1, corridor(&pearls))]);
    let layout = Layout::from_floors(vec![BTreeMap::new(), floor]);

    let config = AuditConfig {
        cache_dir: None,
        installation: InstallationConfig {
            overflow_sink: sink,
            ..InstallationConfig::default()
        },
        ..AuditConfig::dev()
    };
    let catalog = sample_catalog().unwrap();
    let schematic = Schematic::smart_chest().unwrap();
    let mut auditor = CloudAuditor::new(&world, &catalog, &schematic, &layout, &config);

    let all = auditor.all_statuses().unwrap();
    assert_eq!(all.len(), 20);
    assert_eq!(all[4].position, cobblestone.position);
    assert_eq!(all[4].status.severity, Severity::Ok, "{}", all[4].status.message);
    assert_eq!(all[14].status.severity, Severity::Yellow, "{}", all[14].status.message);

    let todo = auditor.todo().unwrap();
    assert_eq!(todo.len(), 20);
    // the feeder unit carries the failed input chain check
    assert_eq!(todo[0].position, LogicalPosition::new(1, 1, 0));
    assert_eq!(todo[0].status.severity, Severity::Red);
    // odd floors list corridors from east to west
    assert_eq!(todo[1].status.severity, Severity::Gray);
    assert_eq!(todo[1].position.corridor, 1);
    assert_eq!(todo[18].name, "Ender Pearl");
    assert_eq!(todo[19].position, cobblestone.position);

    let report = auditor
        .status_of_item(&ItemStub::parse("minecraft:cobblestone").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(report.name, "Cobblestone");
    assert_eq!(report.status.fraction(), Some(0.5));
}

fn clear_overflow(fixture: &mut Fixture, unit: &PerfectUnit) {
    for row in 0..3 {
        fixture.world.clear(unit.cell(row, -7, 4));
    }
}

#[test]
fn unstackable_unit_without_overflow_stays_cyan() {
    let unit = PerfectUnit::new(
        LogicalPosition::new(1, 1, 4),
        10,
        "minecraft:diamond_sword",
        "Diamond Sword",
        1,
    );
    let mut fixture = Fixture::with_unit(&unit);
    clear_overflow(&mut fixture, &unit);

    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Cyan, "{}", status.message);
    assert!(status.fill_level.unwrap().is_smart_chest);
}

#[test]
fn filler_sorter_without_overflow_stays_yellow() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    let pearls = (0..5).map(|slot| slot_of(slot, block_ids::ENDER_PEARL, 1)).collect();
    fixture.world.set(
        unit.cell(7, -3, 3),
        BlockDescriptor::container(block_ids::HOPPER, HopperFacing::North.metadata(), pearls),
    );
    clear_overflow(&mut fixture, &unit);

    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Yellow, "{}", status.message);
    assert!(status.message.starts_with("Sorting hopper is full of Ender Pearl"));
}

#[test]
fn missing_sorting_hopper_is_yellow() {
    let unit = PerfectUnit::cobblestone();
    let mut fixture = Fixture::with_unit(&unit);
    fixture.world.clear(unit.cell(7, -3, 3));

    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Yellow, "{}", status.message);
    assert_eq!(status.message, "Sorting hopper does not exist, is minecraft:air.");
    // only the access chest counts, without the stuck stack correction
    let level = status.fill_level.unwrap();
    assert!(!level.is_smart_chest);
    assert_eq!(level.max_slots, 54);
}

#[test]
fn lower_floors_check_the_preliminary_sorter() {
    let unit = PerfectUnit::new(
        LogicalPosition::new(5, 1, 4),
        10,
        "minecraft:cobblestone",
        "Cobblestone",
        64,
    );
    let status = Fixture::with_unit(&unit).audit(&unit, None);
    assert_eq!(status.severity, Severity::Red);
    assert_eq!(
        status.message,
        "Preliminary sorter coordinate missing from cloud.json."
    );

    let mut fixture = Fixture::with_unit(&unit).with_pre_sorter(&unit, -40);
    let pre_sorter = fixture.installation.pre_sorter(-40);
    let status = fixture.audit(&unit, None);
    assert_eq!(status.severity, Severity::Ok, "{}", status.message);

    let mut items = vec![slot_of(0, "minecraft:dirt", 1)];
    items.extend((1..5).map(|slot| slot_of(slot, block_ids::ENDER_PEARL, 1)));
    fixture.world.set(
        pre_sorter,
        BlockDescriptor::container(block_ids::HOPPER, HopperFacing::South.metadata(), items),
    );
    let status = fixture.audit(&unit, None);
    assert_eq!(
        status.message,
        "Preliminary sorting hopper is sorting the wrong item: Dirt."
    );

    fixture.world.set(
        pre_sorter,
        BlockDescriptor::container(block_ids::HOPPER, HopperFacing::North.metadata(), Vec::new()),
    );
    let status = fixture.audit(&unit, None);
    assert!(
        status.message.starts_with(&format!(
            "Preliminary sorting hopper ({pre_sorter}) should be pointing south"
        )),
        "{}",
        status.message
    );

    fixture.world.clear(pre_sorter);
    let status = fixture.audit(&unit, None);
    assert_eq!(
        status.message,
        "Preliminary sorter is missing (should be at -40 30 52)."
    );
}

#[test]
fn perfect_units_pass_on_every_wall_and_floor() {
    let cobblestone = |floor, corridor, slot, corridor_length| {
        PerfectUnit::new(
            LogicalPosition::new(floor, corridor, slot),
            corridor_length,
            "minecraft:cobblestone",
            "Cobblestone",
            64,
        )
    };
    let units = [
        cobblestone(1, 0, 0, 10),
        cobblestone(2, 0, 1, 10),
        cobblestone(3, -2, 9, 10),
        cobblestone(4, 2, 8, 9),
        cobblestone(5, 1, 6, 10),
        cobblestone(6, 0, 4, 10),
        cobblestone(6, 1, 7, 8),
        PerfectUnit::new(
            LogicalPosition::new(2, -1, 3),
            6,
            "minecraft:snowball",
            "Snowball",
            16,
        ),
        PerfectUnit::new(
            LogicalPosition::new(6, -1, 2),
            10,
            "minecraft:diamond_sword",
            "Diamond Sword",
            1,
        ),
    ];
    for unit in &units {
        let mut fixture = Fixture::with_unit(unit);
        if unit.stack_size > 1 && unit.position.floor > 4 {
            fixture = fixture.with_pre_sorter(unit, -40);
        }
        let expected = if unit.stack_size > 1 {
            Severity::Ok
        } else {
            Severity::Cyan
        };
        let status = fixture.audit(unit, None);
        assert_eq!(
            status.severity, expected,
            "{}: {}",
            unit.position, status.message
        );
    }
}
