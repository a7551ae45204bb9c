//! Installation-wide reports: every unit's status in layout order and the
//! prioritised to-do list.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::{info, warn};

use cloudaudit_assets::{ItemCatalog, Layout, LayoutEntry, Schematic};
use cloudaudit_core::{ItemStub, LogicalPosition};
use cloudaudit_world::BlockOracle;

use crate::cache::ResultCache;
use crate::config::AuditConfig;
use crate::status::{Severity, UnitStatus};
use crate::validator::{UnitRequest, UnitValidator};
use crate::AuditError;

/// Status of one unit together with what it stores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitReport {
    /// Where the unit is.
    pub position: LogicalPosition,
    /// Stored item.
    pub item: ItemStub,
    /// Display name of the stored item.
    pub name: String,
    /// Audit outcome.
    #[serde(flatten)]
    pub status: UnitStatus,
}

/// Priority of a unit in the to-do list; smaller sorts first.
#[derive(Debug, Clone, Copy)]
pub struct SortKey {
    /// Report section, see [`bucket`].
    pub bucket: u8,
    /// Fill fraction, negated for orange units.
    pub fraction: Option<f64>,
    /// Floor, negated for orange units.
    pub floor: i64,
    /// Corridor, negated on odd floors.
    pub corridor: i64,
    /// Slot.
    pub slot: u32,
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let fraction = match (self.fraction, other.fraction) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.total_cmp(&b),
        };
        self.bucket
            .cmp(&other.bucket)
            .then(fraction)
            .then(self.floor.cmp(&other.floor))
            .then(self.corridor.cmp(&other.corridor))
            .then(self.slot.cmp(&other.slot))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

/// Report section: red, gray, orange, yellow, cyan with items, ok with items,
/// empty cyan, empty ok.
pub fn bucket(status: &UnitStatus) -> u8 {
    let empty = status.fill_level.is_some_and(|level| level.is_empty());
    match (status.severity, empty) {
        (Severity::Red, _) => 0,
        (Severity::Gray, _) => 1,
        (Severity::Orange, _) => 2,
        (Severity::Yellow, _) => 3,
        (Severity::Cyan, false) => 4,
        (Severity::Ok, false) => 5,
        (Severity::Cyan, true) => 6,
        (Severity::Ok, true) => 7,
    }
}

/// Sort key of a unit in the to-do list.
pub fn sort_key(position: LogicalPosition, status: &UnitStatus) -> SortKey {
    let orange = status.severity == Severity::Orange;
    let sign = if orange { -1 } else { 1 };
    let floor = i64::from(position.floor);
    let corridor = i64::from(position.corridor);
    SortKey {
        bucket: bucket(status),
        fraction: status.fraction().map(|f| if orange { -f } else { f }),
        floor: floor * sign,
        corridor: if position.floor % 2 == 0 {
            corridor
        } else {
            -corridor
        },
        slot: position.slot,
    }
}

/// Whether a unit belongs in the to-do list: everything except full ok and
/// cyan units.
pub fn needs_work(status: &UnitStatus) -> bool {
    let finished = matches!(status.severity, Severity::Ok | Severity::Cyan)
        && status.fill_level.is_some_and(|level| level.is_full());
    !finished
}

/// Audits the whole installation.
pub struct CloudAuditor<'a, O: ?Sized, C: ?Sized> {
    validator: UnitValidator<'a, O, C>,
    catalog: &'a C,
    layout: &'a Layout,
    cache: Option<ResultCache>,
}

impl<'a, O, C> CloudAuditor<'a, O, C>
where
    O: BlockOracle + ?Sized,
    C: ItemCatalog + ?Sized,
{
    /// Auditor with the result cache configured in `config`.
    pub fn new(
        oracle: &'a O,
        catalog: &'a C,
        schematic: &'a Schematic,
        layout: &'a Layout,
        config: &AuditConfig,
    ) -> Self {
        Self {
            validator: UnitValidator::new(oracle, catalog, schematic, config.installation),
            catalog,
            layout,
            cache: Some(ResultCache::open(config.cache_dir.as_deref(), config.cache)),
        }
    }

    /// Use `cache` instead of the configured one; `None` disables caching.
    pub fn with_cache(mut self, cache: Option<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The result cache, if any.
    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    /// The installation layout.
    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    /// Where an item is stored.
    pub fn locate(&self, stub: &ItemStub) -> Option<LayoutEntry<'a>> {
        self.layout.locate(stub)
    }

    /// Status of one unit.
    pub fn status_of(&mut self, request: &UnitRequest<'_>) -> Result<UnitStatus, AuditError> {
        let status = self.validator.validate_with(request, self.cache.as_mut())?;
        self.save_cache();
        Ok(status)
    }

    /// Status of the unit storing `stub`, if the layout has one.
    pub fn status_of_item(&mut self, stub: &ItemStub) -> Result<Option<UnitReport>, AuditError> {
        let Some(entry) = self.locate(stub) else {
            return Ok(None);
        };
        let report = self.report(entry)?;
        self.save_cache();
        Ok(Some(report))
    }

    /// Every unit in layout order.
    pub fn all_statuses(&mut self) -> Result<Vec<UnitReport>, AuditError> {
        let layout = self.layout;
        let reports = layout
            .entries()
            .map(|entry| self.report(entry))
            .collect::<Result<Vec<_>, _>>()?;
        self.save_cache();

        for severity in Severity::ALL {
            let count = reports
                .iter()
                .filter(|report| report.status.severity == severity)
                .count();
            info!(%severity, count, "Audited units");
        }
        Ok(reports)
    }

    /// Units needing work, most urgent first.
    pub fn todo(&mut self) -> Result<Vec<UnitReport>, AuditError> {
        let mut reports: Vec<_> = self
            .all_statuses()?
            .into_iter()
            .filter(|report| needs_work(&report.status))
            .collect();
        reports.sort_by_key(|report| sort_key(report.position, &report.status));
        Ok(reports)
    }

    /// Installation-wide checks; `None` when they pass.
    pub fn global_status(&mut self) -> Result<Option<String>, AuditError> {
        let message = self.validator.global_checks(self.cache.as_mut())?;
        self.save_cache();
        Ok(message)
    }

    fn report(&mut self, entry: LayoutEntry<'_>) -> Result<UnitReport, AuditError> {
        let request = UnitRequest::from(entry);
        let status = self.validator.validate_with(&request, self.cache.as_mut())?;
        Ok(UnitReport {
            position: entry.position,
            item: entry.assignment.stub.clone(),
            name: entry
                .assignment
                .name
                .clone()
                .unwrap_or_else(|| self.catalog.display_name(&entry.assignment.stub)),
            status,
        })
    }

    fn save_cache(&self) {
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.save() {
                warn!("Failed to save result cache: {err}");
            }
        }
    }
}
