#![warn(missing_docs)]
//! Structural auditing of Cloud SmartChest units.
//!
//! [`UnitValidator`] classifies one unit against the SmartChest schematic
//! using a [`BlockOracle`](cloudaudit_world::BlockOracle) and an
//! [`ItemCatalog`](cloudaudit_assets::ItemCatalog); [`CloudAuditor`] runs it
//! over the whole layout and builds the prioritised to-do list.

pub mod aggregator;
pub mod cache;
pub mod config;
mod error;
pub mod fill;
pub mod rules;
pub mod status;
pub mod tracer;
pub mod validator;

pub use aggregator::{bucket, needs_work, sort_key, CloudAuditor, SortKey, UnitReport};
pub use cache::{CacheError, CachedResult, ResultCache, CACHE_FILE_NAME};
pub use config::{AuditConfig, CachePolicy, Environment, InstallationConfig};
pub use error::AuditError;
pub use fill::{compute_fill_level, CONTAINERS};
pub use rules::{RuleBook, SymbolRule};
pub use status::{FillLevel, Severity, UnitStatus};
pub use tracer::is_connected;
pub use validator::{UnitProbe, UnitRequest, UnitValidator};
