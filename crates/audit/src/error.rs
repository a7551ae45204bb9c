use cloudaudit_assets::CatalogError;
use cloudaudit_core::WorldPos;
use cloudaudit_world::{OracleError, SignalError};
use thiserror::Error;

/// Failures that keep the auditor from producing a status.
///
/// Structural problems never show up here; they become red, orange, yellow
/// or gray statuses. These are failures of the collaborators.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The block oracle failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),
    /// The item catalog failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// A comparator signal could not be computed.
    #[error("comparator signal at {pos}: {source}")]
    Signal {
        /// Position of the measured block.
        pos: WorldPos,
        /// Underlying error.
        source: SignalError,
    },
    /// A block counted as a unit container is not one.
    #[error("expected a container at {pos}, found {id}")]
    NotAContainer {
        /// Queried position.
        pos: WorldPos,
        /// Block found there.
        id: String,
    },
}
