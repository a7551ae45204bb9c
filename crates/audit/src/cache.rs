//! Persistent cache of detailed-check results.
//!
//! The file (`cloud-chests.json` in the cache directory) maps
//! floor → corridor → slot to `{"errorMessage": ..., "timestamp": ...}`, with
//! timestamps in UTC formatted as `%Y-%m-%d %H:%M:%S`. The installation-wide
//! input chain check lives under the `globals` key.
//!
//! Nothing here is fatal: an unreadable file starts an empty cache and a
//! malformed timestamp is a miss.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use cloudaudit_core::LogicalPosition;

use crate::config::CachePolicy;

/// File name of the cache inside the cache directory.
pub const CACHE_FILE_NAME: &str = "cloud-chests.json";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors raised while writing the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Writing the cache file failed.
    #[error("failed to write result cache {path:?}")]
    Io {
        /// Cache file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The cache could not be serialized.
    #[error("failed to serialize result cache")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CacheEntry {
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
    timestamp: String,
}

impl CacheEntry {
    fn new(message: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            error_message: message,
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    fn fresh<R: Rng + ?Sized>(
        &self,
        policy: &CachePolicy,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<CachedResult> {
        let timestamp = match NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT) {
            Ok(naive) => Utc.from_utc_datetime(&naive),
            Err(err) => {
                debug!(
                    timestamp = %self.timestamp,
                    %err,
                    "Ignoring cache entry with malformed timestamp"
                );
                return None;
            }
        };
        (now - timestamp < policy.ttl(rng)).then(|| CachedResult {
            message: self.error_message.clone(),
            timestamp,
        })
    }
}

type Floors = BTreeMap<String, BTreeMap<String, BTreeMap<String, CacheEntry>>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    globals: Option<CacheEntry>,
    #[serde(flatten)]
    floors: Floors,
}

/// A cache hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResult {
    /// Stored error message; `None` means the checks passed.
    pub message: Option<String>,
    /// When the checks ran.
    pub timestamp: DateTime<Utc>,
}

/// Cache of detailed-check results keyed by logical position.
#[derive(Debug, Clone)]
pub struct ResultCache {
    path: Option<PathBuf>,
    policy: CachePolicy,
    file: CacheFile,
}

impl ResultCache {
    /// A cache that is never written to disk.
    pub fn in_memory(policy: CachePolicy) -> Self {
        Self {
            path: None,
            policy,
            file: CacheFile::default(),
        }
    }

    /// Load the cache from `dir`, or start empty.
    ///
    /// A file that cannot be parsed is removed.
    pub fn open(dir: Option<&Path>, policy: CachePolicy) -> Self {
        let Some(dir) = dir else {
            return Self::in_memory(policy);
        };
        let path = dir.join(CACHE_FILE_NAME);
        let file = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(file) => file,
                Err(err) => {
                    warn!("Discarding corrupted result cache {}: {err}", path.display());
                    if let Err(err) = fs::remove_file(&path) {
                        warn!("Failed to remove {}: {err}", path.display());
                    }
                    CacheFile::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => CacheFile::default(),
            Err(err) => {
                warn!("Failed to read result cache {}: {err}", path.display());
                CacheFile::default()
            }
        };
        Self {
            path: Some(path),
            policy,
            file,
        }
    }

    /// Lifetime rules in force.
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Cache file, when persistent.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of cached unit results.
    pub fn len(&self) -> usize {
        self.file
            .floors
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    /// No unit results cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fresh result for a unit as of `now`, drawing the lifetime from `rng`.
    pub fn get_at<R: Rng + ?Sized>(
        &self,
        position: LogicalPosition,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<CachedResult> {
        self.file
            .floors
            .get(&position.floor.to_string())?
            .get(&position.corridor.to_string())?
            .get(&position.slot.to_string())?
            .fresh(&self.policy, now, rng)
    }

    /// Fresh result for a unit.
    pub fn get(&self, position: LogicalPosition) -> Option<CachedResult> {
        self.get_at(position, Utc::now(), &mut rand::thread_rng())
    }

    /// Record a unit result checked at `now`.
    pub fn put_at(
        &mut self,
        position: LogicalPosition,
        message: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.file
            .floors
            .entry(position.floor.to_string())
            .or_default()
            .entry(position.corridor.to_string())
            .or_default()
            .insert(position.slot.to_string(), CacheEntry::new(message, now));
    }

    /// Record a unit result checked now.
    pub fn put(&mut self, position: LogicalPosition, message: Option<String>) {
        self.put_at(position, message, Utc::now());
    }

    /// Fresh result of the installation-wide checks as of `now`.
    pub fn global_at<R: Rng + ?Sized>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<CachedResult> {
        self.file.globals.as_ref()?.fresh(&self.policy, now, rng)
    }

    /// Fresh result of the installation-wide checks.
    pub fn global(&self) -> Option<CachedResult> {
        self.global_at(Utc::now(), &mut rand::thread_rng())
    }

    /// Record the installation-wide result checked at `now`.
    pub fn put_global_at(&mut self, message: Option<String>, now: DateTime<Utc>) {
        self.file.globals = Some(CacheEntry::new(message, now));
    }

    /// Record the installation-wide result checked now.
    pub fn put_global(&mut self, message: Option<String>) {
        self.put_global_at(message, Utc::now());
    }

    /// Write the cache back if it has a path whose directory exists.
    pub fn save(&self) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !path.parent().is_some_and(Path::is_dir) {
            debug!("Cache directory for {} does not exist, not saving", path.display());
            return Ok(());
        }
        let text = serde_json::to_string_pretty(&self.file)?;
        fs::write(path, text).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(entries = self.len(), "Saved result cache to {}", path.display());
        Ok(())
    }
}
