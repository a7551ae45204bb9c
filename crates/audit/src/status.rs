//! Per-unit audit outcome: severity, message and fill level.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a unit's state, ordered from healthy to broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Fully built and correct.
    Ok,
    /// Correct, but the item is not stackable so the unit has no sorter.
    Cyan,
    /// No working sorter yet.
    Yellow,
    /// No SmartChest yet, only the access chest.
    Orange,
    /// The access chest does not exist.
    Gray,
    /// A build error.
    Red,
}

impl Severity {
    /// Every severity in ascending order.
    pub const ALL: [Severity; 6] = [
        Severity::Ok,
        Severity::Cyan,
        Severity::Yellow,
        Severity::Orange,
        Severity::Gray,
        Severity::Red,
    ];

    /// Lowercase label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Ok => "ok",
            Severity::Cyan => "cyan",
            Severity::Yellow => "yellow",
            Severity::Orange => "orange",
            Severity::Gray => "gray",
            Severity::Red => "red",
        }
    }

    /// Whether units of this severity carry a fill level.
    pub fn has_fill_level(self) -> bool {
        matches!(
            self,
            Severity::Ok | Severity::Cyan | Severity::Yellow | Severity::Orange
        )
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How full a unit is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillLevel {
    /// Maximum stack size of the stored item.
    pub stack_size: u32,
    /// Items counted across the unit's containers.
    pub total_items: u64,
    /// Slots available to the item.
    pub max_slots: u32,
    /// Whether the count covers a full SmartChest or only the access chest.
    pub is_smart_chest: bool,
}

impl FillLevel {
    /// Build a fill level.
    pub fn new(stack_size: u32, total_items: u64, max_slots: u32, is_smart_chest: bool) -> Self {
        Self {
            stack_size,
            total_items,
            max_slots,
            is_smart_chest,
        }
    }

    /// Capacity in items.
    pub fn max_items(&self) -> u64 {
        u64::from(self.max_slots) * u64::from(self.stack_size)
    }

    /// Occupied fraction. Zero-capacity units count as empty.
    pub fn fraction(&self) -> f64 {
        let max = self.max_items();
        if max == 0 {
            return 0.0;
        }
        self.total_items as f64 / max as f64
    }

    /// Nothing stored.
    pub fn is_empty(&self) -> bool {
        self.total_items == 0
    }

    /// Exactly at capacity.
    pub fn is_full(&self) -> bool {
        self.total_items == self.max_items()
    }

    /// `(full stacks, remaining items)`.
    pub fn stacks(&self) -> (u64, u64) {
        let stack = u64::from(self.stack_size.max(1));
        (self.total_items / stack, self.total_items % stack)
    }
}

impl fmt::Display for FillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let container = if self.is_smart_chest {
            "SmartChest"
        } else {
            "Chest"
        };
        if self.is_empty() {
            return write!(f, "{container} is empty.");
        }
        if self.is_full() {
            return write!(f, "{container} is full.");
        }
        let unit = if self.stack_size == 1 { "item" } else { "stack" };
        let (stacks, items) = self.stacks();
        write!(
            f,
            "{container} is filled {}% ({stacks} {unit}{}",
            (100.0 * self.fraction()) as u32,
            plural(stacks)
        )?;
        if items > 0 {
            write!(f, " and {items} item{}", plural(items))?;
        }
        write!(f, " out of {} {unit}s).", self.max_slots)
    }
}

fn plural(count: u64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Outcome of auditing one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStatus {
    /// Overall severity.
    pub severity: Severity,
    /// Diagnostic message.
    pub message: String,
    /// Fill level, present only for ok, cyan, yellow and orange units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_level: Option<FillLevel>,
}

impl UnitStatus {
    /// A status without a fill level.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            fill_level: None,
        }
    }

    /// A build error.
    pub fn red(message: impl Into<String>) -> Self {
        Self::new(Severity::Red, message)
    }

    /// Attach a fill level.
    pub fn with_fill_level(mut self, fill_level: FillLevel) -> Self {
        self.fill_level = Some(fill_level);
        self
    }

    /// Fill fraction, when known.
    pub fn fraction(&self) -> Option<f64> {
        self.fill_level.as_ref().map(FillLevel::fraction)
    }
}
