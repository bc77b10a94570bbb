//! Configuration for the OAK tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (oak.toml)
//! - Environment variables (OAK__*)
//!
//! ## Example config file (oak.toml):
//! ```toml
//! [validate]
//! schema_dir = "./schemas"
//!
//! [build]
//! output_subdir = "site"
//! output_format = "pretty"
//! refresh_card_stats = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::site::SiteOptions;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OakConfig {
    /// Validation settings
    #[serde(default)]
    pub validate: ValidateConfig,

    /// Site build settings
    #[serde(default)]
    pub build: BuildConfig,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateConfig {
    /// Directory holding the protocol schema files
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,
}

/// Site build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output directory, relative to the source directory, when none is given
    #[serde(default = "default_output_subdir")]
    pub output_subdir: String,

    /// Output format (pretty or compact)
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Refresh artifact count and update time on the published card
    #[serde(default = "default_true")]
    pub refresh_card_stats: bool,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

// Default value functions
fn default_schema_dir() -> PathBuf {
    PathBuf::from("schemas")
}

fn default_output_subdir() -> String {
    "site".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_subdir: default_output_subdir(),
            output_format: OutputFormat::Pretty,
            refresh_card_stats: true,
        }
    }
}

impl BuildConfig {
    /// Output directory used when the caller gives none
    pub fn output_for(&self, source: &Path) -> PathBuf {
        source.join(&self.output_subdir)
    }

    pub fn site_options(&self) -> SiteOptions {
        SiteOptions {
            output_format: self.output_format,
            refresh_card_stats: self.refresh_card_stats,
        }
    }
}

impl OakConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["oak.toml", ".oak.toml", "config/oak.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "oak", "oak") {
            let xdg_config = config_dir.config_dir().join("oak.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (OAK__*)
        builder = builder.add_source(
            Environment::with_prefix("OAK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get the schema directory (resolves relative paths)
    pub fn schema_dir(&self) -> PathBuf {
        if self.validate.schema_dir.is_absolute() {
            self.validate.schema_dir.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.validate.schema_dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OakConfig::default();
        assert_eq!(config.validate.schema_dir, PathBuf::from("schemas"));
        assert_eq!(config.build.output_subdir, "site");
        assert!(config.build.refresh_card_stats);
    }

    #[test]
    fn test_serialize_config() {
        let config = OakConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[validate]"));
        assert!(toml_str.contains("[build]"));
        assert!(toml_str.contains("output_format = \"pretty\""));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[build]\noutput_subdir = \"public\"\noutput_format = \"compact\"\n",
        )
        .unwrap();

        let config = OakConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.build.output_subdir, "public");
        assert_eq!(config.build.output_format, OutputFormat::Compact);
        assert_eq!(config.validate.schema_dir, PathBuf::from("schemas"));
        assert_eq!(
            config.build.output_for(Path::new("agent")),
            PathBuf::from("agent/public")
        );
    }
}
