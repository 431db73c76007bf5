// Configuration loading and validation (config/dashboard.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// dashboard.toml structs
// ---------------------------------------------------------------------------

/// The whole of `config/dashboard.toml`. Every section and key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct DashboardConfig {
    pub metrics: MetricsConfig,
    pub layout: LayoutConfig,
    pub theme: ThemeConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Interval between metric polls.
    pub tick_ms: u64,
    /// Samples kept per metric.
    pub history_len: usize,
    /// `host:port` timed with a TCP connect for the ping metric.
    pub ping_host: String,
    pub ping_timeout_ms: u64,
    /// Shell out to `nvidia-smi` for the GPU metrics.
    pub gpu_query: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            tick_ms: 500,
            history_len: 60,
            ping_host: "1.1.1.1:53".into(),
            ping_timeout_ms: 1000,
            gpu_query: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Layout file, relative to the working directory.
    pub path: String,
    /// Shrink the grid to its occupied bounding box after add/remove.
    pub auto_compact: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            path: "config/layout.txt".into(),
            auto_compact: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Theme used when the layout names none or an unknown one.
    pub default: String,
    /// Optional JSON file with extra or overriding themes.
    pub themes_path: Option<String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        ThemeConfig {
            default: "light".into(),
            themes_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Interval between redraws.
    pub render_ms: u64,
    /// Blank terminal columns/rows between grid cells.
    pub cell_spacing: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            render_ms: 33,
            cell_spacing: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/dashboard.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<DashboardConfig, ConfigError> {
    let path = base_dir.join("config").join("dashboard.toml");
    let text = read_file(&path)?;
    let config: DashboardConfig = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            // Never overwrite a user's edited copy.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<DashboardConfig, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &DashboardConfig) -> Result<(), ConfigError> {
    let positive_fields: &[(&str, u64)] = &[
        ("metrics.tick_ms", config.metrics.tick_ms),
        ("metrics.history_len", config.metrics.history_len as u64),
        ("metrics.ping_timeout_ms", config.metrics.ping_timeout_ms),
        ("ui.render_ms", config.ui.render_ms),
    ];
    for (name, val) in positive_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if config.layout.path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "layout.path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.theme.default.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "theme.default".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Helper: the workspace root holding `defaults/` (works whether
    /// `cargo test` runs from the crate directory or the workspace root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        cwd.ancestors()
            .find(|dir| dir.join("defaults").join("dashboard.toml").exists())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| panic!("Cannot locate defaults/ directory from CWD {:?}", cwd))
    }

    /// Fresh scratch directory with a `config/` subdirectory.
    fn scratch(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        tmp
    }

    fn write_config(base: &Path, toml_text: &str) {
        fs::write(base.join("config/dashboard.toml"), toml_text).unwrap();
    }

    #[test]
    fn shipped_defaults_load_and_validate() {
        let tmp = scratch("hwdash_config_shipped_defaults");
        fs::copy(
            project_root().join("defaults/dashboard.toml"),
            tmp.join("config/dashboard.toml"),
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("should load shipped defaults");
        assert_eq!(config.metrics.tick_ms, 500);
        assert_eq!(config.metrics.history_len, 60);
        assert_eq!(config.layout.path, "config/layout.txt");
        assert!(config.layout.auto_compact);
        assert_eq!(config.theme.default, "light");
        assert_eq!(config.ui.render_ms, 33);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_file_uses_built_in_defaults() {
        let tmp = scratch("hwdash_config_empty");
        write_config(&tmp, "");
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config, DashboardConfig::default());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let tmp = scratch("hwdash_config_partial");
        write_config(&tmp, "[metrics]\ntick_ms = 250\n\n[layout]\nauto_compact = false\n");
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.metrics.tick_ms, 250);
        assert_eq!(config.metrics.history_len, 60);
        assert!(!config.layout.auto_compact);
        assert_eq!(config.layout.path, "config/layout.txt");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let tmp = scratch("hwdash_config_missing");
        match load_config_from(&tmp) {
            Err(ConfigError::FileNotFound { path }) => {
                assert!(path.ends_with("config/dashboard.toml"));
            }
            other => panic!("expected FileNotFound, got: {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let tmp = scratch("hwdash_config_malformed");
        write_config(&tmp, "[metrics\ntick_ms = ");
        match load_config_from(&tmp) {
            Err(ConfigError::ParseError { .. }) => {}
            other => panic!("expected ParseError, got: {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn zero_tick_is_validation_error() {
        let tmp = scratch("hwdash_config_zero_tick");
        write_config(&tmp, "[metrics]\ntick_ms = 0\n");
        match load_config_from(&tmp) {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "metrics.tick_ms");
            }
            other => panic!("expected ValidationError, got: {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_layout_path_is_validation_error() {
        let tmp = scratch("hwdash_config_empty_layout_path");
        write_config(&tmp, "[layout]\npath = \"  \"\n");
        match load_config_from(&tmp) {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "layout.path");
            }
            other => panic!("expected ValidationError, got: {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_and_skips_existing() {
        let tmp = std::env::temp_dir().join("hwdash_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("defaults/dashboard.toml"), "[ui]\nrender_ms = 50\n").unwrap();
        fs::write(tmp.join("defaults/layout.txt"), "[circle cpu 1x1]\n").unwrap();
        fs::write(tmp.join("defaults/themes.json.example"), "{}").unwrap();
        fs::write(tmp.join("config/dashboard.toml"), "[ui]\nrender_ms = 99\n").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config/layout.txt")]);
        assert!(!tmp.join("config/themes.json.example").exists());

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.ui.render_ms, 99, "existing file must not be overwritten");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_without_any_directory_errors() {
        let tmp = std::env::temp_dir().join("hwdash_config_no_dirs");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        match ensure_config_files(&tmp) {
            Err(ConfigError::DefaultsCopyError { message }) => {
                assert!(message.contains("defaults/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }
}
