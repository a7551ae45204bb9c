use cloudaudit_audit::{AuditConfig, Environment};
use std::{fs, path::Path};
use toml::{Table, Value};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/cloudaudit.toml";

/// Load the auditor configuration from `path`.
///
/// The preset is picked by `environment`, else by the file's own
/// `environment` key, else dev; keys present in the file override it. Read
/// and parse errors fall back to the bare preset.
pub fn load_from_path(path: &Path, environment: Option<Environment>) -> AuditConfig {
    let overrides = match fs::read_to_string(path) {
        Ok(contents) => match contents.parse::<Table>() {
            Ok(table) => table,
            Err(err) => {
                warn!("Failed to parse {}: {err}. Using defaults", path.display());
                Table::new()
            }
        },
        Err(err) => {
            let missing_default = path == Path::new(DEFAULT_CONFIG_PATH)
                && err.kind() == std::io::ErrorKind::NotFound;
            if !missing_default {
                warn!("Failed to read {}: {err}. Using defaults", path.display());
            }
            Table::new()
        }
    };

    let environment = environment
        .or_else(|| {
            overrides
                .get("environment")
                .and_then(|value| value.clone().try_into().ok())
        })
        .unwrap_or_default();
    let preset = AuditConfig::for_environment(environment);

    match apply_overrides(&preset, overrides, environment) {
        Ok(config) => config,
        Err(err) => {
            warn!("Invalid settings in {}: {err}. Using defaults", path.display());
            preset
        }
    }
}

fn apply_overrides(
    preset: &AuditConfig,
    overrides: Table,
    environment: Environment,
) -> Result<AuditConfig, toml::de::Error> {
    let mut merged = match Value::try_from(preset) {
        Ok(Value::Table(table)) => table,
        _ => Table::new(),
    };
    merge(&mut merged, overrides);
    let mut config: AuditConfig = Value::Table(merged).try_into()?;
    config.environment = environment;
    Ok(config)
}

/// Recursively lay `overlay` over `base`; nested tables merge key by key.
fn merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(nested)) => merge(existing, nested),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
