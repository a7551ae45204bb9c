//! Auditor configuration.
//!
//! [`AuditConfig::dev`] and [`AuditConfig::prod`] are the two deployment
//! presets; every field can be overridden from a config file since the struct
//! deserializes with per-field defaults taken from the dev preset.

use std::path::PathBuf;

use chrono::Duration;
use rand::Rng;
use serde::{Deserialize, Serialize};

use cloudaudit_core::{LogicalPosition, WorldPos};
use cloudaudit_world::DEFAULT_CHUNK_CAPACITY;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development checkout.
    #[default]
    Dev,
    /// Production deployment.
    Prod,
}

/// How long cached check results stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachePolicy {
    /// Minimum age at which an entry expires.
    pub base_ttl_minutes: u32,
    /// Upper bound (exclusive) of the random extra lifetime drawn per read.
    pub jitter_minutes: u32,
    /// Reuse cached error messages instead of re-running the checks.
    pub trust_cached_errors: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            base_ttl_minutes: 60,
            jitter_minutes: 60,
            trust_cached_errors: false,
        }
    }
}

impl CachePolicy {
    /// Draw the lifetime used for one cache read.
    pub fn ttl<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let jitter = if self.jitter_minutes == 0 {
            0
        } else {
            rng.gen_range(0..self.jitter_minutes)
        };
        Duration::minutes(i64::from(self.base_ttl_minutes) + i64::from(jitter))
    }

    /// Longest lifetime any read can draw.
    pub fn max_ttl(&self) -> Duration {
        Duration::minutes(
            i64::from(self.base_ttl_minutes) + i64::from(self.jitter_minutes.saturating_sub(1)),
        )
    }
}

/// Fixed points of the installation outside any single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallationConfig {
    /// First hopper after the input buffer.
    pub input_chain_start: WorldPos,
    /// Unsorted-overflow chest half the input chain must reach.
    pub input_chain_end: WorldPos,
    /// Dropper feeding the smelting center elevator, where every unit's
    /// overflow chain ends.
    pub overflow_sink: WorldPos,
    /// Unit whose status also reflects the input chain check.
    pub overflow_feeder: LogicalPosition,
    /// Units on floors strictly below this index need a preliminary sorter.
    pub pre_sorter_min_floor: u32,
    /// Y of the preliminary sorting hoppers.
    pub pre_sorter_y: i32,
    /// Z of the preliminary sorting hoppers.
    pub pre_sorter_z: i32,
}

impl Default for InstallationConfig {
    fn default() -> Self {
        Self {
            input_chain_start: WorldPos::new(14, 61, 32),
            input_chain_end: WorldPos::new(-1, 25, 52),
            overflow_sink: WorldPos::new(-35, 6, 38),
            overflow_feeder: LogicalPosition::new(1, 1, 0),
            pre_sorter_min_floor: 4,
            pre_sorter_y: 30,
            pre_sorter_z: 52,
        }
    }
}

impl InstallationConfig {
    /// World position of a preliminary sorting hopper.
    pub fn pre_sorter(&self, x: i32) -> WorldPos {
        WorldPos::new(x, self.pre_sorter_y, self.pre_sorter_z)
    }

    /// Whether units on `floor` need a preliminary sorter.
    pub fn needs_pre_sorter(&self, floor: u32) -> bool {
        floor > self.pre_sorter_min_floor
    }
}

/// Complete auditor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Which preset this configuration started from.
    pub environment: Environment,
    /// Checkout of the assets repository (`json/items.json`, `json/cloud.json`).
    pub assets_root: PathBuf,
    /// Checkout of the site (`static/smartchest.txt`).
    pub document_root: PathBuf,
    /// Directory of exported chunk snapshots.
    pub world_dir: PathBuf,
    /// Directory for the result cache; caching to disk is off when unset.
    pub cache_dir: Option<PathBuf>,
    /// Public host name, used in reports.
    pub host: String,
    /// Chunk snapshots kept in memory per run.
    pub chunk_cache_capacity: usize,
    /// Cache lifetime rules.
    pub cache: CachePolicy,
    /// Installation constants.
    pub installation: InstallationConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self::dev()
    }
}

impl AuditConfig {
    /// Development preset.
    pub fn dev() -> Self {
        Self {
            environment: Environment::Dev,
            assets_root: PathBuf::from(
                "/opt/git/github.com/wurstmineberg/assets.wurstmineberg.de/branch/dev",
            ),
            document_root: PathBuf::from(
                "/opt/git/github.com/wurstmineberg/alltheitems.wurstmineberg.de/branch/dev",
            ),
            world_dir: PathBuf::from("/opt/wurstmineberg/world-export/dev"),
            cache_dir: Some(PathBuf::from("/opt/wurstmineberg/cache/alltheitems-dev")),
            host: "dev.wurstmineberg.de".to_string(),
            chunk_cache_capacity: DEFAULT_CHUNK_CAPACITY,
            cache: CachePolicy::default(),
            installation: InstallationConfig::default(),
        }
    }

    /// Production preset.
    pub fn prod() -> Self {
        Self {
            environment: Environment::Prod,
            assets_root: PathBuf::from(
                "/opt/git/github.com/wurstmineberg/assets.wurstmineberg.de/master",
            ),
            document_root: PathBuf::from(
                "/opt/git/github.com/wurstmineberg/alltheitems.wurstmineberg.de/master",
            ),
            world_dir: PathBuf::from("/opt/wurstmineberg/world-export/wurstmineberg"),
            cache_dir: Some(PathBuf::from("/opt/wurstmineberg/cache/alltheitems")),
            host: "wurstmineberg.de".to_string(),
            ..Self::dev()
        }
    }

    /// Preset for an environment.
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Dev => Self::dev(),
            Environment::Prod => Self::prod(),
        }
    }

    /// `items.json` path.
    pub fn items_path(&self) -> PathBuf {
        self.assets_root.join("json").join("items.json")
    }

    /// `cloud.json` path.
    pub fn layout_path(&self) -> PathBuf {
        self.assets_root.join("json").join("cloud.json")
    }

    /// SmartChest schematic path.
    pub fn schematic_path(&self) -> PathBuf {
        self.document_root.join("static").join("smartchest.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn presets_differ_in_paths_only() {
        let dev = AuditConfig::dev();
        let prod = AuditConfig::prod();
        assert_eq!(prod.environment, Environment::Prod);
        assert_ne!(dev.assets_root, prod.assets_root);
        assert_eq!(dev.installation, prod.installation);
        assert_eq!(dev.cache, prod.cache);
        assert_eq!(AuditConfig::for_environment(Environment::Prod), prod);
    }

    #[test]
    fn ttl_stays_within_one_to_two_hours() {
        let policy = CachePolicy::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let ttl = policy.ttl(&mut rng);
            assert!(ttl >= Duration::hours(1));
            assert!(ttl < Duration::hours(2));
        }
        assert_eq!(policy.max_ttl(), Duration::minutes(119));
    }

    #[test]
    fn zero_jitter_is_fixed() {
        let policy = CachePolicy {
            jitter_minutes: 0,
            ..CachePolicy::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(policy.ttl(&mut rng), Duration::hours(1));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: AuditConfig =
            serde_json::from_str(r#"{"environment": "prod", "installation": {"pre_sorter_y": 31}}"#)
                .unwrap();
        assert_eq!(config.environment, Environment::Prod);
        assert_eq!(config.installation.pre_sorter_y, 31);
        assert_eq!(config.installation.pre_sorter_z, 52);
        assert_eq!(config.chunk_cache_capacity, DEFAULT_CHUNK_CAPACITY);
    }

    #[test]
    fn paths_follow_repository_layout() {
        let config = AuditConfig::prod();
        assert!(config.items_path().ends_with("json/items.json"));
        assert!(config.layout_path().ends_with("json/cloud.json"));
        assert!(config.schematic_path().ends_with("static/smartchest.txt"));
    }
}
