//! Binding configuration via `pathbind.toml`
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the stock behavior: 50 ms minimum update interval, no implicit creation,
//! and children included in the default listen set.

use pathbind_core::{BindError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name looked up by hosts that load configuration from disk.
pub const CONFIG_FILE_NAME: &str = "pathbind.toml";

/// Default minimum interval between two deliveries to one binding
pub const DEFAULT_MIN_UPDATE_INTERVAL_MS: u64 = 50;

/// Binding configuration loaded from `pathbind.toml`.
///
/// # Example
///
/// ```toml
/// # Minimum time between two render-state replacements (default: 50)
/// min_update_interval_ms = 50
///
/// # Create missing entities from their template (default: false)
/// create_if_missing = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Minimum milliseconds between deliveries to one binding
    #[serde(default = "default_min_update_interval_ms")]
    pub min_update_interval_ms: u64,
    /// Whether bindings create absent entities when the caller does not say
    #[serde(default)]
    pub create_if_missing: bool,
    /// Whether the default listen set includes `base.$every`
    #[serde(default = "default_listen_children")]
    pub default_listen_children: bool,
}

fn default_min_update_interval_ms() -> u64 {
    DEFAULT_MIN_UPDATE_INTERVAL_MS
}

fn default_listen_children() -> bool {
    true
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            min_update_interval_ms: default_min_update_interval_ms(),
            create_if_missing: false,
            default_listen_children: default_listen_children(),
        }
    }
}

impl BindingConfig {
    /// Minimum interval as a `Duration`
    pub fn min_update_interval(&self) -> Duration {
        Duration::from_millis(self.min_update_interval_ms)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# pathbind binding configuration
#
# Minimum time in milliseconds between two render-state replacements for
# one binding. Notifications arriving faster are coalesced into one delivery
# at the end of the window. 0 delivers every notification immediately.
min_update_interval_ms = 50

# Create an absent entity from its template when a binding does not say
# otherwise (default: false, which fails the render with "path not found").
create_if_missing = false

# Listen to direct children of the bound path by default, in addition to the
# path itself (default: true).
default_listen_children = true
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Config`] if the text is not valid TOML for this struct.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| BindError::Config(format!("Failed to parse binding config: {}", e)))
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BindError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            BindError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                BindError::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BindError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            BindError::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
