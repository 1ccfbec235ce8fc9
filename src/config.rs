//! Renderer configuration module.
//!
//! Handles loading, validating, and merging a `render.toml` file. Stock
//! defaults reproduce the conventions of the published site; a user file only
//! needs the keys it wants to override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [urls]
//! image_base = "/images/issues"        # Site path images are published under
//! image_cdn_base = "http://s3.amazonaws.com/appendixjournal-images/images/attachments"
//! audio_base = "/audio"                # Site path audio is published under
//! audio_source_prefix = "http://s3.amazonaws.com/appendixjournal-audio"
//! video_embed_base = "https://www.youtube.com/embed/"
//!
//! [paragraphs]
//! anchor_ids = true                    # Emit id="paragraph-N" on paragraphs
//! anchor_prefix = "paragraph-"
//!
//! [input]
//! skip_names = ["contributors", "cover.jpg", "bundle.json",
//!               "cover-chapter-1.jpg", "cover-chapter-2.jpg", "cover-chapter-3.jpg"]
//!
//! [processing]
//! max_processes = 4                    # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

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
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Renderer configuration loaded from `render.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// URL bases for published media.
    pub urls: UrlConfig,
    /// Paragraph anchor settings.
    pub paragraphs: ParagraphConfig,
    /// Input file selection.
    pub input: InputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl RenderConfig {
    /// Validate config values are usable for URL and id construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.urls.image_base.trim().is_empty() {
            return Err(ConfigError::Validation(
                "urls.image_base must not be empty".into(),
            ));
        }
        if self.urls.video_embed_base.trim().is_empty() {
            return Err(ConfigError::Validation(
                "urls.video_embed_base must not be empty".into(),
            ));
        }
        let prefix_ok = self
            .paragraphs
            .anchor_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !prefix_ok {
            return Err(ConfigError::Validation(
                "paragraphs.anchor_prefix may only contain ASCII letters, digits, '-' and '_'"
                    .into(),
            ));
        }
        Ok(())
    }
}

/// URL bases for published media.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrlConfig {
    /// Site path that issue images live under (`{base}/{volume}/{number}/…`).
    pub image_base: String,
    /// Bucket URL that supernote `url-format` paths are appended to.
    pub image_cdn_base: String,
    /// Site path that audio files are served from.
    pub audio_base: String,
    /// Source URL prefix removed from audio URLs before joining `audio_base`.
    pub audio_source_prefix: String,
    /// Embed URL that video ids are appended to.
    pub video_embed_base: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            image_base: "/images/issues".to_string(),
            image_cdn_base: "http://s3.amazonaws.com/appendixjournal-images/images/attachments"
                .to_string(),
            audio_base: "/audio".to_string(),
            audio_source_prefix: "http://s3.amazonaws.com/appendixjournal-audio".to_string(),
            video_embed_base: "https://www.youtube.com/embed/".to_string(),
        }
    }
}

/// Paragraph anchor settings.
///
/// Anchors follow the most recent content schema. Turning them off
/// reproduces the output of issues published before paragraph links existed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParagraphConfig {
    pub anchor_ids: bool,
    pub anchor_prefix: String,
}

impl Default for ParagraphConfig {
    fn default() -> Self {
        Self {
            anchor_ids: true,
            anchor_prefix: "paragraph-".to_string(),
        }
    }
}

impl ParagraphConfig {
    /// The `id` attribute for paragraph `number`, if anchors are enabled.
    pub fn anchor_for(&self, number: u32) -> Option<String> {
        self.anchor_ids
            .then(|| format!("{}{}", self.anchor_prefix, number))
    }
}

/// Input file selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// File names that are never treated as article content, wherever they
    /// appear on the command line.
    pub skip_names: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            skip_names: [
                "contributors",
                "cover.jpg",
                "bundle.json",
                "cover-chapter-1.jpg",
                "cover-chapter-2.jpg",
                "cover-chapter-3.jpg",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of articles rendered in parallel.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`
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
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(RenderConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
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

/// Load a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<RenderConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RenderConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the renderer config.
///
/// With no path the stock defaults are used. A given path must exist.
pub fn load_config(path: Option<&Path>) -> Result<RenderConfig, ConfigError> {
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `render.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Appendix Render Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Published media URLs
# ---------------------------------------------------------------------------
[urls]
# Site path issue images are published under:
#   {image_base}/{volume}/{number}/{size}-{file}
image_base = "/images/issues"

# Bucket that supernote image `url-format` paths are appended to
# (used by the `images` command).
image_cdn_base = "http://s3.amazonaws.com/appendixjournal-images/images/attachments"

# Audio links become {audio_base}{url without audio_source_prefix}.
audio_base = "/audio"
audio_source_prefix = "http://s3.amazonaws.com/appendixjournal-audio"

# Video ids are appended to this embed URL.
video_embed_base = "https://www.youtube.com/embed/"

# ---------------------------------------------------------------------------
# Paragraph anchors
# ---------------------------------------------------------------------------
[paragraphs]
# Emit id="{anchor_prefix}{number}" on every paragraph so supernotes and
# internal links can target it. Set to false for the pre-anchor layout.
anchor_ids = true
anchor_prefix = "paragraph-"

# ---------------------------------------------------------------------------
# Input selection
# ---------------------------------------------------------------------------
[input]
# File names skipped wherever they appear among the input paths.
skip_names = [
    "contributors",
    "cover.jpg",
    "bundle.json",
    "cover-chapter-1.jpg",
    "cover-chapter-2.jpg",
    "cover-chapter-3.jpg",
]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum articles rendered in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_site_urls() {
        let config = RenderConfig::default();
        assert_eq!(config.urls.image_base, "/images/issues");
        assert_eq!(config.urls.audio_base, "/audio");
        assert_eq!(config.urls.video_embed_base, "https://www.youtube.com/embed/");
    }

    #[test]
    fn default_audio_prefix_matches_source_bucket() {
        let config = RenderConfig::default();
        assert_eq!(config.urls.audio_source_prefix.len(), 45);
    }

    #[test]
    fn default_skip_names() {
        let config = RenderConfig::default();
        assert!(config.input.skip_names.contains(&"bundle.json".to_string()));
        assert_eq!(config.input.skip_names.len(), 6);
    }

    #[test]
    fn anchor_for_respects_toggle() {
        let mut paragraphs = ParagraphConfig::default();
        assert_eq!(paragraphs.anchor_for(12).as_deref(), Some("paragraph-12"));
        paragraphs.anchor_ids = false;
        assert_eq!(paragraphs.anchor_for(12), None);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[urls]
image_base = "/media"
"#;
        let config: RenderConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.urls.image_base, "/media");
        // Default values preserved
        assert_eq!(config.urls.audio_base, "/audio");
        assert!(config.paragraphs.anchor_ids);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.urls.image_base, "/images/issues");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("render.toml");
        fs::write(
            &path,
            r#"
[paragraphs]
anchor_ids = false

[processing]
max_processes = 2
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(!config.paragraphs.anchor_ids);
        assert_eq!(config.processing.max_processes, Some(2));
        assert_eq!(config.paragraphs.anchor_prefix, "paragraph-");
    }

    #[test]
    fn load_config_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("render.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[urls]
audio_base = "/sound"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let urls = merged.get("urls").unwrap();
        assert_eq!(urls.get("audio_base").unwrap().as_str(), Some("/sound"));
        assert_eq!(
            urls.get("image_base").unwrap().as_str(),
            Some("/images/issues")
        );
    }

    #[test]
    fn merge_toml_replaces_lists() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[input]
skip_names = ["index.json"]
"#,
        )
        .unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.input.skip_names, vec!["index.json".to_string()]);
    }

    // =========================================================================
    // Validation and unknown keys
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<RenderConfig, _> = toml::from_str(
            r#"
[urls]
image_bsae = "/x"
"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<RenderConfig, _> = toml::from_str("[themes]\nx = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn validate_empty_image_base() {
        let mut config = RenderConfig::default();
        config.urls.image_base = " ".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_anchor_prefix_characters() {
        let mut config = RenderConfig::default();
        config.paragraphs.anchor_prefix = "para graph\"".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("anchor_prefix"));
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(RenderConfig::default().validate().is_ok());
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: RenderConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = RenderConfig::default();
        assert_eq!(config.urls.image_base, defaults.urls.image_base);
        assert_eq!(config.urls.image_cdn_base, defaults.urls.image_cdn_base);
        assert_eq!(
            config.urls.audio_source_prefix,
            defaults.urls.audio_source_prefix
        );
        assert_eq!(config.input.skip_names, defaults.input.skip_names);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        assert!(val.is_table());
        assert!(val.get("urls").is_some());
        assert!(val.get("paragraphs").is_some());
        assert!(val.get("input").is_some());
    }
}
