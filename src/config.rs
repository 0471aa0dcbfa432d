//! Configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user `config.toml` in the working directory (or the
//! directory passed with `--config-dir`) overrides any subset of keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! quality = 90              # Lossy encoding quality (1-100)
//! format = "jpg"            # Extension of produced variants
//!
//! [crop]
//! upscale = true            # Whether `plan` may enlarge the original
//!
//! [[crop.default_variants]] # Variants `init` writes into new job manifests
//! mode = "fill"
//! width = 400
//! height = 300
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{FillMode, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Output formats the backend can encode.
pub const OUTPUT_FORMATS: &[&str] = &["jpg", "jpeg", "png", "webp", "avif", "tif", "tiff"];

/// Configuration loaded from `config.toml`.
///
/// All fields have defaults; user files only specify what they override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Encoding settings for produced variants.
    pub output: OutputConfig,
    /// Crop planning defaults.
    pub crop: CropConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        let format = self.output.format.to_lowercase();
        if !OUTPUT_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::Validation(format!(
                "output.format must be one of {}",
                OUTPUT_FORMATS.join(", ")
            )));
        }
        if self.crop.default_variants.is_empty() {
            return Err(ConfigError::Validation(
                "crop.default_variants must not be empty".into(),
            ));
        }
        if let Some(bad) = self.crop.default_variants.iter().find(|v| !v.is_valid()) {
            return Err(ConfigError::Validation(format!(
                "crop.default_variants: {bad} needs positive dimensions"
            )));
        }
        Ok(())
    }
}

/// Encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Lossy encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// File extension of produced variants; selects the encoder.
    pub format: String,
}

impl OutputConfig {
    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: 90,
            format: "jpg".to_string(),
        }
    }
}

/// Crop planning defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    /// Allow the `plan` command to enlarge the original. `--no-upscale`
    /// overrides this per invocation.
    pub upscale: bool,
    /// Variants that `init` attaches to every discovered image.
    pub default_variants: Vec<FillMode>,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            upscale: true,
            default_variants: vec![
                FillMode::Fill {
                    width: 400.0,
                    height: 300.0,
                },
                FillMode::FillMax {
                    width: 1200.0,
                    height: 630.0,
                },
            ],
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in `dir`, layered over stock defaults.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# focuspoint configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# Lossy encoding quality for JPEG and AVIF (1 = worst, 100 = best).
quality = 90

# Extension of produced variants: jpg, jpeg, png, webp, avif, tif or tiff.
format = "jpg"

# ---------------------------------------------------------------------------
# Crop planning
# ---------------------------------------------------------------------------
[crop]
# Whether `plan` may enlarge the original to fill the target.
# Pass --no-upscale to override per invocation.
upscale = true

# Variants `init` attaches to every image it finds.
# mode is one of: fill, fill_max, crop_width, crop_height.
[[crop.default_variants]]
mode = "fill"
width = 400
height = 300

[[crop.default_variants]]
mode = "fill_max"
width = 1200
height = 630

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
