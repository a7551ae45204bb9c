//! Per-unit validation pipeline.
//!
//! A cheap probe classifies the unit (gray, orange, cyan, yellow or pending
//! ok) from a handful of blocks. The detailed checks then look for build
//! errors, the expensive part being the walk over every schematic cell; their
//! result is what the [`ResultCache`] stores. Finally the fill level is
//! computed for units without errors.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, warn};

use cloudaudit_assets::{CatalogError, ItemCatalog, LayoutEntry, Schematic};
use cloudaudit_core::{
    block_ids, describe_facing, BlockDescriptor, CellOffset, HopperFacing, InventorySlot,
    ItemStub, LogicalPosition, WorldPos,
};
use cloudaudit_world::{comparator_signal, double_chest_signal, BlockOracle};

use crate::cache::ResultCache;
use crate::config::InstallationConfig;
use crate::fill::{compute_fill_level, storage_containers, BOTTOM_DROPPER};
use crate::rules::{Cell, Contents, RuleBook};
use crate::status::{Severity, UnitStatus};
use crate::tracer::is_connected;
use crate::AuditError;

/// North half of the access chest; the unit's base coordinate.
pub const ACCESS_CHEST_NORTH: CellOffset = CellOffset::new(5, 0, 3);
/// South half of the access chest.
pub const ACCESS_CHEST_SOUTH: CellOffset = CellOffset::new(5, 0, 2);
/// Hopper that diverts the stored item into the SmartChest.
pub const SORTING_HOPPER: CellOffset = CellOffset::new(7, -3, 3);
/// Item name sign above the access chest.
pub const SIGN: CellOffset = CellOffset::new(6, 1, 2);
/// Overflow hoppers, nearest to the access chest first.
pub const OVERFLOW_HOPPERS: [CellOffset; 3] = [
    CellOffset::new(2, -7, 4),
    CellOffset::new(1, -7, 4),
    CellOffset::new(0, -7, 4),
];
/// Where the unit's overflow hopper chain starts.
pub const OVERFLOW_CHAIN_START: CellOffset = CellOffset::new(0, -7, 4);

const DROPPER_LAYERS: std::ops::Range<i32> = -7..0;
const SORTER_SLOTS: u8 = 5;

const PERFECT: &str = "This SmartChest is in perfect state.";
const PERFECT_UNSTACKABLE: &str =
    "This SmartChest is in perfect state (but the item is not stackable, so it can't be sorted).";

/// One unit to validate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitRequest<'a> {
    /// Where the unit is.
    pub position: LogicalPosition,
    /// What it stores.
    pub stub: &'a ItemStub,
    /// Expected sign text, when it differs from the catalog name.
    pub name: Option<&'a str>,
    /// X coordinate of the unit's preliminary sorting hopper.
    pub pre_sorter_x: Option<i32>,
    /// Number of units in the corridor.
    pub corridor_length: u32,
}

impl<'a> UnitRequest<'a> {
    /// A request without sign name or pre-sorter.
    pub fn new(position: LogicalPosition, stub: &'a ItemStub, corridor_length: u32) -> Self {
        Self {
            position,
            stub,
            name: None,
            pre_sorter_x: None,
            corridor_length,
        }
    }
}

impl<'a> From<LayoutEntry<'a>> for UnitRequest<'a> {
    fn from(entry: LayoutEntry<'a>) -> Self {
        Self {
            position: entry.position,
            stub: &entry.assignment.stub,
            name: entry.assignment.name.as_deref(),
            pre_sorter_x: entry.assignment.pre_sorter_x,
            corridor_length: entry.corridor_length,
        }
    }
}

/// What the cheap probe found.
#[derive(Debug, Clone)]
pub struct UnitProbe {
    /// Severity the unit gets unless a build error turns up.
    pub severity: Severity,
    /// Message for that severity.
    pub message: String,
    /// Both access chest halves are chests.
    pub exists: bool,
    /// All seven storage droppers are present.
    pub has_smart_chest: bool,
    /// Maximum stack size of the stored item.
    pub stack_size: u32,
    /// The item has a durability bar.
    pub durability: bool,
    /// A working sorting hopper is present.
    pub has_sorter: bool,
    /// Overflow hoppers that are not hoppers.
    pub missing_overflow: Vec<WorldPos>,
    /// Item filling the sorter slots the stored item does not use.
    pub filler: ItemStub,
    /// Expected sign text.
    pub item_name: String,
    north_half: BlockDescriptor,
    south_half: BlockDescriptor,
    sorting_hopper: BlockDescriptor,
}

impl UnitProbe {
    /// More than one item fits in a slot.
    pub fn stackable(&self) -> bool {
        self.stack_size > 1
    }

    /// All overflow hoppers are present.
    pub fn has_overflow(&self) -> bool {
        self.missing_overflow.is_empty()
    }

    fn pending(&self) -> UnitStatus {
        UnitStatus::new(self.severity, self.message.clone())
    }
}

/// Sorter whose slots [`UnitValidator`] checks.
#[derive(Debug, Clone, Copy)]
struct SorterKind {
    title: &'static str,
    lower: &'static str,
    /// Slot 0 may hold the filler instead of the item.
    filler_in_first_slot: bool,
}

const PRE_SORTER: SorterKind = SorterKind {
    title: "Preliminary sorting hopper",
    lower: "preliminary sorting hopper",
    filler_in_first_slot: false,
};

const SORTER: SorterKind = SorterKind {
    title: "Sorting hopper",
    lower: "sorting hopper",
    filler_in_first_slot: true,
};

/// Validates units against the schematic and the rule book.
pub struct UnitValidator<'a, O: ?Sized, C: ?Sized> {
    oracle: &'a O,
    catalog: &'a C,
    schematic: &'a Schematic,
    rules: RuleBook,
    installation: InstallationConfig,
}

impl<'a, O, C> UnitValidator<'a, O, C>
where
    O: BlockOracle + ?Sized,
    C: ItemCatalog + ?Sized,
{
    /// Validator using the SmartChest rule book.
    pub fn new(
        oracle: &'a O,
        catalog: &'a C,
        schematic: &'a Schematic,
        installation: InstallationConfig,
    ) -> Self {
        Self {
            oracle,
            catalog,
            schematic,
            rules: RuleBook::smart_chest(),
            installation,
        }
    }

    /// Replace the rule book.
    pub fn with_rules(mut self, rules: RuleBook) -> Self {
        self.rules = rules;
        self
    }

    /// Installation constants in use.
    pub fn installation(&self) -> &InstallationConfig {
        &self.installation
    }

    /// Validate a unit without a result cache.
    pub fn validate(&self, request: &UnitRequest<'_>) -> Result<UnitStatus, AuditError> {
        self.validate_with(request, None)
    }

    /// Validate a unit, reusing and recording detailed-check results in
    /// `cache`. The cache is updated in memory only; saving is up to the
    /// caller.
    pub fn validate_with(
        &self,
        request: &UnitRequest<'_>,
        mut cache: Option<&mut ResultCache>,
    ) -> Result<UnitStatus, AuditError> {
        let position = request.position;
        let probe = self.probe(request)?;
        debug!(%position, severity = %probe.severity, "Probed unit");

        if position == self.installation.overflow_feeder {
            if let Some(message) = self.global_checks(cache.as_deref_mut())? {
                return Ok(UnitStatus::red(message));
            }
        }
        if probe.severity == Severity::Gray {
            return Ok(probe.pending());
        }

        let cached = cache.as_deref().and_then(|cache| {
            cache
                .get(position)
                .filter(|hit| hit.message.is_none() || cache.policy().trust_cached_errors)
        });
        let message = match cached {
            Some(hit) => {
                debug!(%position, timestamp = %hit.timestamp, "Using cached check result");
                hit.message
            }
            None => {
                let message = self.detailed_checks(request, &probe)?;
                if let Some(cache) = cache.as_deref_mut() {
                    cache.put(position, message.clone());
                }
                message
            }
        };
        if let Some(message) = message {
            return Ok(UnitStatus::red(message));
        }

        let smart_chest = matches!(probe.severity, Severity::Ok | Severity::Cyan);
        match compute_fill_level(
            position,
            smart_chest,
            probe.stack_size,
            probe.durability,
            self.oracle,
        ) {
            Ok(level) => Ok(probe.pending().with_fill_level(level)),
            Err(err) => {
                warn!(%position, "Fill level failed, re-running checks: {err}");
                let message = self.detailed_checks(request, &probe)?;
                if let Some(cache) = cache {
                    cache.put(position, message.clone());
                }
                match message {
                    Some(message) => Ok(UnitStatus::red(message)),
                    None => Err(err),
                }
            }
        }
    }

    /// Classify a unit from the access chest, droppers, sorting hopper and
    /// overflow hoppers.
    pub fn probe(&self, request: &UnitRequest<'_>) -> Result<UnitProbe, AuditError> {
        let unit = request.position;
        let info = self.catalog.item(request.stub)?;
        let stackable = info.is_stackable();
        let mut pending: Option<(Severity, String)> = None;

        // access chest
        let north_half = self.oracle.block_at(unit.cell(ACCESS_CHEST_NORTH))?;
        let south_half = self.oracle.block_at(unit.cell(ACCESS_CHEST_SOUTH))?;
        let exists = match (north_half.is(block_ids::CHEST), south_half.is(block_ids::CHEST)) {
            (true, true) => true,
            (false, false) => {
                pending = Some((Severity::Gray, "Access chest does not exist.".to_string()));
                false
            }
            (false, true) => {
                pending = Some((
                    Severity::Gray,
                    "North half of access chest does not exist.".to_string(),
                ));
                false
            }
            (true, false) => {
                pending = Some((
                    Severity::Gray,
                    "South half of access chest does not exist.".to_string(),
                ));
                false
            }
        };

        // storage droppers
        let mut missing_droppers = Vec::new();
        for layer in DROPPER_LAYERS {
            let pos = unit.cell(CellOffset::new(5, layer, 3));
            let block = self.oracle.block_at(pos)?;
            if !block.is(block_ids::DROPPER) {
                missing_droppers.push((pos, block.id));
            }
        }
        let has_smart_chest = missing_droppers.is_empty();
        if pending.is_none() {
            pending = match missing_droppers.as_slice() {
                [] => None,
                [(pos, id)] => Some(format!(
                    "SmartChest dropper at y={} does not exist, is {id}.",
                    pos.y
                )),
                missing if missing.len() == DROPPER_LAYERS.len() => {
                    Some("SmartChest droppers do not exist.".to_string())
                }
                missing => Some(format!(
                    "SmartChest droppers at y={} do not exist.",
                    join_values(missing.iter().map(|(pos, _)| pos.y), ", y=")
                )),
            }
            .map(|message| (Severity::Orange, message));
        }

        if !stackable && pending.is_none() {
            pending = Some((Severity::Cyan, PERFECT_UNSTACKABLE.to_string()));
        }

        // sorting hopper
        let filler = filler_item(request.stub, stackable, info.stack_size)?;
        let sorter_pos = unit.cell(SORTING_HOPPER);
        let sorting_hopper = self.oracle.block_at(sorter_pos)?;
        let mut has_sorter = false;
        if !sorting_hopper.is(block_ids::HOPPER) {
            if pending.is_none() {
                pending = Some((
                    Severity::Yellow,
                    format!("Sorting hopper does not exist, is {}.", sorting_hopper.id),
                ));
            }
        } else {
            let first = sorting_hopper
                .items()
                .unwrap_or(&[])
                .iter()
                .find(|slot| slot.slot == 0);
            let full_of_filler = match first {
                Some(slot) if stackable => {
                    !self.catalog.slot_matches(request.stub, slot)?
                        && self.catalog.slot_matches(&filler, slot)?
                }
                _ => false,
            };
            if full_of_filler {
                if matches!(pending, None | Some((Severity::Cyan, _))) {
                    pending = Some((
                        Severity::Yellow,
                        format!(
                            "Sorting hopper is full of {}, but the sorted item is stackable, so the first slot should contain the item.",
                            self.catalog.display_name(&filler)
                        ),
                    ));
                }
            } else {
                has_sorter = true;
            }
        }

        // overflow hoppers
        let mut missing_overflow = Vec::new();
        for offset in OVERFLOW_HOPPERS {
            let pos = unit.cell(offset);
            if !self.oracle.block_at(pos)?.is(block_ids::HOPPER) {
                missing_overflow.push(pos);
            }
        }

        let (severity, message) = pending.unwrap_or((Severity::Ok, PERFECT.to_string()));
        Ok(UnitProbe {
            severity,
            message,
            exists,
            has_smart_chest,
            stack_size: info.stack_size,
            durability: info.has_durability(),
            has_sorter,
            missing_overflow,
            item_name: request.name.map(str::to_string).unwrap_or(info.name),
            filler,
            north_half,
            south_half,
            sorting_hopper,
        })
    }

    /// Build-error checks. `Ok(None)` means the unit has no errors.
    pub fn detailed_checks(
        &self,
        request: &UnitRequest<'_>,
        probe: &UnitProbe,
    ) -> Result<Option<String>, AuditError> {
        let unit = request.position;
        let contents = Contents {
            catalog: self.catalog,
            stub: request.stub,
        };

        if probe.stackable() && probe.has_sorter {
            debug!(%unit, "Checking overflow and preliminary sorter");
            if let Some(message) = self.check_overflow_presence(probe)? {
                return Ok(Some(message));
            }
            if self.installation.needs_pre_sorter(unit.floor) {
                if let Some(message) = self.check_pre_sorter(request, probe)? {
                    return Ok(Some(message));
                }
            }
        }

        if probe.has_sorter {
            debug!(%unit, "Checking sorting hopper");
            let hopper = &probe.sorting_hopper;
            if hopper.damage != HopperFacing::North.metadata() {
                return Ok(Some(format!(
                    "Sorting hopper ({}) should be pointing north, but is facing {}.",
                    unit.cell(SORTING_HOPPER),
                    describe_facing(hopper.damage)
                )));
            }
            if let Some(message) =
                self.check_sorter_slots(SORTER, hopper, request.stub, probe, probe.stackable())?
            {
                return Ok(Some(message));
            }
        }

        if probe.exists {
            debug!(%unit, "Checking access chest and sign");
            for half in [&probe.north_half, &probe.south_half] {
                if let Some(slot) = contents.foreign_slot(half)? {
                    return Ok(Some(format!(
                        "Access chest contains items of the wrong kind: {}.",
                        self.catalog.slot_display_name(slot)
                    )));
                }
            }
            if let Some(message) = self.check_sign(unit, &probe.item_name)? {
                return Ok(Some(message));
            }
        }

        if probe.has_overflow() {
            debug!(%unit, "Tracing overflow chain");
            let start = unit.cell(OVERFLOW_CHAIN_START);
            let end = self.installation.overflow_sink;
            if let (false, reason) = is_connected(start, end, self.oracle)? {
                return Ok(Some(format!(
                    "Overflow hopper chain at {start} is not connected to the Smelting Center item elevator at {end}: {}.",
                    reason.unwrap_or_default()
                )));
            }
        }

        if probe.exists && probe.has_smart_chest {
            // sorter and overflow still under construction are not build errors
            if probe.has_overflow() && (probe.has_sorter || !probe.stackable()) {
                debug!(%unit, "Walking schematic");
                if let Some(message) = self.walk_schematic(request, &contents)? {
                    return Ok(Some(message));
                }
            }
            if let Some(message) = self.check_stuck_items(unit, probe)? {
                return Ok(Some(message));
            }
        }

        if probe.durability && probe.has_smart_chest {
            debug!(%unit, "Checking tool durability");
            for offset in storage_containers() {
                let pos = unit.cell(offset);
                let block = self.oracle.block_at(pos)?;
                for slot in block.items().unwrap_or(&[]) {
                    if slot.damage > 0 {
                        return Ok(Some(format!(
                            "Item in storage container at {pos} is damaged."
                        )));
                    }
                    if slot.is_enchanted() {
                        return Ok(Some(format!(
                            "Item in storage container at {pos} is enchanted."
                        )));
                    }
                }
            }
        }

        Ok(None)
    }

    /// Installation-wide checks: the input hopper chain must reach the
    /// unsorted overflow. Fresh results are taken from and written to the
    /// cache's globals entry.
    pub fn global_checks(
        &self,
        cache: Option<&mut ResultCache>,
    ) -> Result<Option<String>, AuditError> {
        if let Some(hit) = cache.as_deref().and_then(|cache| {
            cache
                .global()
                .filter(|hit| hit.message.is_none() || cache.policy().trust_cached_errors)
        }) {
            debug!(timestamp = %hit.timestamp, "Using cached global check result");
            return Ok(hit.message);
        }

        let start = self.installation.input_chain_start;
        let end = self.installation.input_chain_end;
        debug!(%start, %end, "Tracing input hopper chain");
        let message = match is_connected(start, end, self.oracle)? {
            (true, _) => None,
            (false, reason) => Some(format!(
                "Input hopper chain at {start} is not connected to the unsorted overflow at {end}: {}.",
                reason.unwrap_or_default()
            )),
        };
        if let Some(cache) = cache {
            cache.put_global(message.clone());
        }
        Ok(message)
    }

    fn check_overflow_presence(&self, probe: &UnitProbe) -> Result<Option<String>, AuditError> {
        Ok(match probe.missing_overflow.as_slice() {
            [] => None,
            [pos] => {
                let block = self.oracle.block_at(*pos)?;
                Some(format!(
                    "Overflow hopper at x={} does not exist, is {}.",
                    pos.x, block.id
                ))
            }
            missing if missing.len() == OVERFLOW_HOPPERS.len() => {
                Some("Missing overflow hoppers.".to_string())
            }
            missing => Some(format!(
                "Overflow hoppers at x={} do not exist.",
                join_values(missing.iter().map(|pos| pos.x), ", x=")
            )),
        })
    }

    fn check_pre_sorter(
        &self,
        request: &UnitRequest<'_>,
        probe: &UnitProbe,
    ) -> Result<Option<String>, AuditError> {
        let Some(x) = request.pre_sorter_x else {
            return Ok(Some(
                "Preliminary sorter coordinate missing from cloud.json.".to_string(),
            ));
        };
        let pos = self.installation.pre_sorter(x);
        let hopper = self.oracle.block_at(pos)?;
        if !hopper.is(block_ids::HOPPER) {
            return Ok(Some(format!(
                "Preliminary sorter is missing (should be at {pos})."
            )));
        }
        if hopper.damage != HopperFacing::South.metadata() {
            return Ok(Some(format!(
                "Preliminary sorting hopper ({pos}) should be pointing south, but is facing {}.",
                describe_facing(hopper.damage)
            )));
        }
        self.check_sorter_slots(PRE_SORTER, &hopper, request.stub, probe, true)
    }

    /// Slot 0 holds the item when `sorts_item`; every other slot holds exactly
    /// one filler item.
    fn check_sorter_slots(
        &self,
        kind: SorterKind,
        hopper: &BlockDescriptor,
        stub: &ItemStub,
        probe: &UnitProbe,
        sorts_item: bool,
    ) -> Result<Option<String>, AuditError> {
        let filler = &probe.filler;
        let filler_name = || self.catalog.display_name(filler);
        let mut empty: BTreeSet<u8> = (0..SORTER_SLOTS).collect();
        for slot in hopper.items().unwrap_or(&[]) {
            empty.remove(&slot.slot);
            if slot.slot == 0 && sorts_item {
                let accepted = self.catalog.slot_matches(stub, slot)?
                    || kind.filler_in_first_slot && self.catalog.slot_matches(filler, slot)?;
                if !accepted {
                    return Ok(Some(format!(
                        "{} is sorting the wrong item: {}.",
                        kind.title,
                        self.catalog.slot_display_name(slot)
                    )));
                }
            } else {
                if !self.catalog.slot_matches(filler, slot)? {
                    return Ok(Some(format!(
                        "{} has wrong filler item in slot {}: {} (should be {}).",
                        kind.title,
                        slot.slot,
                        self.catalog.slot_display_name(slot),
                        filler_name()
                    )));
                }
                if slot.count > 1 {
                    return Ok(Some(format!(
                        "{}: too much {} in slot {}.",
                        kind.title,
                        filler_name(),
                        slot.slot
                    )));
                }
            }
        }
        Ok(match empty.len() {
            0 => None,
            n if n == usize::from(SORTER_SLOTS) => Some(format!("{} is empty.", kind.title)),
            1 => empty
                .first()
                .map(|slot| format!("Slot {slot} of the {} is empty.", kind.lower)),
            _ => Some(format!(
                "Some slots in the {} are empty: {}.",
                kind.lower,
                join_words(&empty.iter().map(u8::to_string).collect::<Vec<_>>())
            )),
        })
    }

    fn check_sign(
        &self,
        unit: LogicalPosition,
        item_name: &str,
    ) -> Result<Option<String>, AuditError> {
        let sign = self.oracle.block_at(unit.cell(SIGN))?;
        if !sign.is(block_ids::WALL_SIGN) {
            return Ok(Some("Sign is missing.".to_string()));
        }
        let text = sign_text(&sign);
        let expected = item_name.replace('\u{2161}', "II");
        Ok((text != expected).then(|| {
            format!("Sign has wrong text: should be '{item_name}', is '{text}'.")
        }))
    }

    fn walk_schematic(
        &self,
        request: &UnitRequest<'_>,
        contents: &Contents<'_, C>,
    ) -> Result<Option<String>, AuditError> {
        let unit = request.position;
        for cell in self.schematic.cells() {
            let pos = unit.cell(cell.offset);
            let block = self.oracle.block_at(pos)?;
            let rule = self.rules.rule(cell.symbol);
            let cell = Cell {
                unit,
                corridor_length: request.corridor_length,
                offset: cell.offset,
                pos,
                block: &block,
            };
            if let Some(message) = rule.check(&cell, contents)? {
                debug!(%unit, %pos, ?rule, "Schematic mismatch");
                return Ok(Some(message));
            }
        }
        Ok(None)
    }

    /// The access chest reads almost empty while the bottom dropper still
    /// holds more than its stuck stacks.
    fn check_stuck_items(
        &self,
        unit: LogicalPosition,
        probe: &UnitProbe,
    ) -> Result<Option<String>, AuditError> {
        let stack_size = |slot: &InventorySlot| self.catalog.slot_stack_size(slot).ok();
        let access =
            double_chest_signal(&probe.north_half, &probe.south_half, stack_size).map_err(
                |source| AuditError::Signal {
                    pos: unit.cell(ACCESS_CHEST_NORTH),
                    source,
                },
            )?;
        let dropper_pos = unit.cell(BOTTOM_DROPPER);
        let dropper = self.oracle.block_at(dropper_pos)?;
        let bottom = comparator_signal(&dropper, stack_size).map_err(|source| {
            AuditError::Signal {
                pos: dropper_pos,
                source,
            }
        })?;
        Ok((access < 2 && bottom > 2).then(|| {
            format!(
                "Access chest is {}empty but there are items stuck in the storage dropper at {dropper_pos}.",
                if access == 0 { "" } else { "almost " }
            )
        }))
    }
}

/// Filler for a sorter: crafting tables for crafting tables and items that
/// stack to less than 64, ender pearls otherwise.
fn filler_item(stub: &ItemStub, stackable: bool, stack_size: u32) -> Result<ItemStub, AuditError> {
    let id = if stub.is(block_ids::CRAFTING_TABLE) || stackable && stack_size < 64 {
        block_ids::CRAFTING_TABLE
    } else {
        block_ids::ENDER_PEARL
    };
    Ok(ItemStub::parse(id).map_err(CatalogError::from)?)
}

/// Non-empty sign lines joined by spaces. Each line is a JSON text component;
/// private-use formatting characters are dropped.
fn sign_text(sign: &BlockDescriptor) -> String {
    sign.sign_lines()
        .into_iter()
        .flatten()
        .map(|raw| {
            let text = match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(component)) => component
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                Ok(Value::String(text)) => text,
                _ => raw.to_string(),
            };
            text.chars()
                .filter(|c| !('\u{f700}'..='\u{f703}').contains(c))
                .collect::<String>()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_values(values: impl Iterator<Item = i32>, separator: &str) -> String {
    values
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// `a`, `a and b`, `a, b, and c`.
fn join_words(words: &[String]) -> String {
    match words {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}
