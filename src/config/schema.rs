/// Configuration schema and defaults for streaks.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[general]`, `[web]`, `[display]`, and `[logging]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_COLOR;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level streaks configuration.
///
/// Maps directly to the `~/.streaks/config.toml` and `.streaks.toml` file
/// schemas. All sections and fields are optional; missing values fall back
/// to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreaksConfig {
    pub general: GeneralConfig,
    pub web: WebConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [general]
// ---------------------------------------------------------------------------

/// Where habits live and how new ones start out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding `habits.json`. `~` is expanded to the home directory.
    pub data_dir: String,
    /// Color given to habits created without one (`#RRGGBB`).
    pub default_color: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.streaks".to_string(),
            default_color: DEFAULT_COLOR.to_string(),
        }
    }
}

impl GeneralConfig {
    /// Resolved path of the habit store file.
    pub fn store_path(&self) -> Option<PathBuf> {
        expand_home(&self.data_dir).map(|dir| dir.join("habits.json"))
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for `streaks web`.
    pub addr: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9746".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Colored terminal output. `NO_COLOR` in the environment also disables it.
    pub color: bool,
    /// Width of the completion-rate bar in `streaks list`.
    pub bar_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            bar_width: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Activity log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether mutations are appended to the activity log.
    pub enabled: bool,
    /// Path to the activity log file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.streaks/activity.jsonl".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Resolved log path, or `None` when logging is disabled.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        expand_home(&self.path)
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl StreaksConfig {
    /// Generate the annotated default TOML config file content.
    pub fn default_toml() -> String {
        r##"# streaks configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (STREAKS_*)
#   2. Project config (.streaks.toml in current directory)
#   3. User global config (~/.streaks/config.toml)
#   4. Built-in defaults

[general]
data_dir = "~/.streaks"        # habits.json lives here
default_color = "#10B981"      # color for new habits

[web]
addr = "127.0.0.1:9746"        # streaks web listen address

[display]
color = true                   # colored terminal output
bar_width = 10                 # completion bar width in `streaks list`

[logging]
enabled = true
path = "~/.streaks/activity.jsonl"
"##
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = StreaksConfig::default();
        assert_eq!(config.general.data_dir, "~/.streaks");
        assert_eq!(config.general.default_color, "#10B981");
        assert_eq!(config.web.addr, "127.0.0.1:9746");
        assert!(config.display.color);
        assert_eq!(config.display.bar_width, 10);
        assert!(config.logging.enabled);
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[web]
addr = "0.0.0.0:8080"
"#;
        let config: StreaksConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.web.addr, "0.0.0.0:8080");
        // All other sections fall back to defaults
        assert_eq!(config.general.data_dir, "~/.streaks");
        assert!(config.logging.enabled);
    }

    #[test]
    fn default_toml_parses_back() {
        let toml_str = StreaksConfig::default_toml();
        let config: StreaksConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, StreaksConfig::default());
    }

    #[test]
    fn expand_home_handles_tilde_and_plain_paths() {
        assert_eq!(
            expand_home("/var/lib/streaks"),
            Some(PathBuf::from("/var/lib/streaks"))
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~"), Some(home.clone()));
            assert_eq!(expand_home("~/.streaks"), Some(home.join(".streaks")));
        }
    }

    #[test]
    fn disabled_logging_has_no_path() {
        let logging = LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
        assert_eq!(logging.resolved_path(), None);
    }

    #[test]
    fn store_path_is_inside_data_dir() {
        let general = GeneralConfig {
            data_dir: "/tmp/streaks-data".to_string(),
            ..GeneralConfig::default()
        };
        assert_eq!(
            general.store_path(),
            Some(PathBuf::from("/tmp/streaks-data/habits.json"))
        );
    }
}
