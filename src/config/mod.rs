/// Configuration system for streaks.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::StreaksConfig::default()`]
/// 2. **User global config** — `~/.streaks/config.toml`
/// 3. **Project local config** — `.streaks.toml` in the current working directory
/// 4. **Environment variables** — `STREAKS_*` overrides (highest precedence)
///
/// Later layers override earlier ones at the key level: the TOML layers are
/// deep-merged as tables before deserialization, so a project file that only
/// sets `[web] addr` keeps everything else from the global file.
///
/// # Usage
///
/// ```rust,ignore
/// use streaks::config;
///
/// let cfg = config::load();
/// let store = Store::open_default(&cfg)?;
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::StreaksConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved streaks configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. Malformed or unreadable files are skipped so a typo in a config
/// file never locks the user out of their habits.
pub fn load() -> StreaksConfig {
    let layers = [global_config_path(), project_config_path()];
    let mut config = load_layers(layers.iter().flatten().map(PathBuf::as_path));
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Merge the TOML files at `paths` (lowest precedence first) over defaults.
fn load_layers<'a>(paths: impl Iterator<Item = &'a Path>) -> StreaksConfig {
    let mut merged = toml::Value::Table(toml::map::Map::new());
    for path in paths {
        if let Some(layer) = load_toml_value(path) {
            merge_values(&mut merged, layer);
        }
    }
    merged.try_into().unwrap_or_default()
}

/// Read a TOML file as an untyped value tree.
///
/// Returns `None` if the file doesn't exist, can't be read, or isn't valid
/// TOML for the schema.
fn load_toml_value(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    // Reject files that parse as TOML but not as a config.
    value.clone().try_into::<StreaksConfig>().ok()?;
    Some(value)
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any
/// other value in the overlay replaces the base value.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.streaks/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".streaks").join("config.toml"))
}

/// Path to the project local config: `.streaks.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".streaks.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `STREAKS_DATA_DIR` — directory holding `habits.json`
/// - `STREAKS_DEFAULT_COLOR` — color for new habits (ignored unless `#RRGGBB`)
/// - `STREAKS_WEB_ADDR` — listen address for `streaks web`
/// - `STREAKS_COLOR` — colored output (`1`/`true`/`yes`/`on`)
/// - `STREAKS_LOGGING` — activity log enabled
/// - `STREAKS_LOG_PATH` — activity log file
fn apply_env_overrides(config: &mut StreaksConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("STREAKS_DATA_DIR")
        && !val.is_empty()
    {
        config.general.data_dir = val;
    }
    if let Some(val) = var("STREAKS_DEFAULT_COLOR")
        && crate::validation::color(&val).is_ok()
    {
        config.general.default_color = val;
    }
    if let Some(val) = var("STREAKS_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Some(val) = var("STREAKS_COLOR") {
        config.display.color = is_truthy(&val);
    }
    if let Some(val) = var("STREAKS_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Some(val) = var("STREAKS_LOG_PATH")
        && !val.is_empty()
    {
        config.logging.path = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.streaks/config.toml`.
///
/// Creates the `~/.streaks/` directory if it doesn't exist. Returns an error
/// if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.streaks/ directory")?;
    }

    fs::write(&path, StreaksConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Reads the current global config (or defaults), updates the specified key,
/// and writes the result back. Supports dotted keys like `web.addr`.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_config_value_in(&path, key, value)
}

fn set_config_value_in(path: &Path, key: &str, value: &str) -> Result<()> {
    // Start from the existing file, or from serialized defaults so every
    // known key is present with its type.
    let content = if path.exists() {
        fs::read_to_string(path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&StreaksConfig::default())
            .context("failed to serialize default config")?
    };
    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;

    // Keys missing from a sparse file are still valid if the schema has them.
    let defaults: toml::Value = toml::Value::try_from(StreaksConfig::default())
        .context("failed to serialize default config")?;
    fill_missing_key(&mut root, &defaults, key);

    set_toml_value(&mut root, key, value)?;

    // The result must still deserialize as a config.
    root.clone()
        .try_into::<StreaksConfig>()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, output).context("failed to write config file")?;

    Ok(())
}

/// Copy the default for a dotted `key` into `root` if `root` lacks it.
fn fill_missing_key(root: &mut toml::Value, defaults: &toml::Value, key: &str) {
    let Some((section, leaf)) = key.split_once('.') else {
        return;
    };
    let Some(default_leaf) = defaults.get(section).and_then(|s| s.get(leaf)) else {
        return;
    };
    let Some(table) = root.as_table_mut() else {
        return;
    };
    let section_value = table
        .entry(section.to_string())
        .or_insert(toml::Value::Table(toml::map::Map::new()));
    if let Some(section_table) = section_value.as_table_mut() {
        section_table
            .entry(leaf.to_string())
            .or_insert(default_leaf.clone());
    }
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key: '{key}'");
    }

    // Navigate to the parent table
    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    // Parse according to the type of the existing value
    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("config key '{key}' cannot be set from the command line"),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = StreaksConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("STREAKS_DATA_DIR", "/srv/habits"),
                ("STREAKS_WEB_ADDR", "0.0.0.0:9000"),
                ("STREAKS_LOGGING", "off"),
                ("STREAKS_COLOR", "0"),
            ]),
        );
        assert_eq!(config.general.data_dir, "/srv/habits");
        assert_eq!(config.web.addr, "0.0.0.0:9000");
        assert!(!config.logging.enabled);
        assert!(!config.display.color);
    }

    #[test]
    fn env_override_ignores_invalid_color() {
        let mut config = StreaksConfig::default();
        apply_env_overrides(&mut config, env(&[("STREAKS_DEFAULT_COLOR", "purple")]));
        assert_eq!(config.general.default_color, "#10B981");

        apply_env_overrides(&mut config, env(&[("STREAKS_DEFAULT_COLOR", "#FF00AA")]));
        assert_eq!(config.general.default_color, "#FF00AA");
    }

    #[test]
    fn layers_merge_key_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        fs::write(&global, "[general]\ndata_dir = \"/data\"\n[web]\naddr = \"a:1\"\n").unwrap();
        fs::write(&project, "[web]\naddr = \"b:2\"\n").unwrap();

        let config = load_layers([global.as_path(), project.as_path()].into_iter());
        assert_eq!(config.general.data_dir, "/data");
        assert_eq!(config.web.addr, "b:2");
        assert!(config.logging.enabled);
    }

    #[test]
    fn malformed_layer_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let broken = dir.path().join("broken.toml");
        fs::write(&global, "[web]\naddr = \"a:1\"\n").unwrap();
        fs::write(&broken, "[web\naddr = ").unwrap();

        let config = load_layers([global.as_path(), broken.as_path()].into_iter());
        assert_eq!(config.web.addr, "a:1");
    }

    #[test]
    fn set_toml_value_updates_string() {
        let mut root: toml::Value = toml::from_str("[web]\naddr = \"a:1\"\n").unwrap();
        set_toml_value(&mut root, "web.addr", "b:2").unwrap();
        assert_eq!(root["web"]["addr"].as_str(), Some("b:2"));
    }

    #[test]
    fn set_toml_value_updates_bool_and_integer() {
        let mut root: toml::Value =
            toml::from_str("[display]\ncolor = true\nbar_width = 10\n").unwrap();
        set_toml_value(&mut root, "display.color", "no").unwrap();
        set_toml_value(&mut root, "display.bar_width", "20").unwrap();
        assert_eq!(root["display"]["color"].as_bool(), Some(false));
        assert_eq!(root["display"]["bar_width"].as_integer(), Some(20));
    }

    #[test]
    fn set_toml_value_rejects_bad_input() {
        let mut root: toml::Value = toml::from_str("[display]\nbar_width = 10\n").unwrap();
        assert!(set_toml_value(&mut root, "display.bar_width", "wide").is_err());
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
        assert!(set_toml_value(&mut root, "display.unknown", "value").is_err());
        assert!(set_toml_value(&mut root, "display.", "value").is_err());
    }

    #[test]
    fn set_config_value_in_creates_file_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        set_config_value_in(&path, "web.addr", "127.0.0.1:1234").unwrap();

        let config: StreaksConfig = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.web.addr, "127.0.0.1:1234");
        assert_eq!(config.general, schema::GeneralConfig::default());
    }

    #[test]
    fn set_config_value_in_fills_keys_missing_from_sparse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[web]\naddr = \"a:1\"\n").unwrap();

        set_config_value_in(&path, "logging.enabled", "false").unwrap();

        let config: StreaksConfig = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.web.addr, "a:1");
        assert!(!config.logging.enabled);
    }

    #[test]
    fn show_effective_config_returns_toml() {
        let toml_str = show_effective_config().unwrap();
        let _: StreaksConfig = toml::from_str(&toml_str).unwrap();
    }
}
