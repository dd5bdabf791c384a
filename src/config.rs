//! Configuration management for the transformer
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (jsonschema-transform.toml)
//! - Environment variables (JSONSCHEMA_TRANSFORM__*)
//!
//! Command line flags override whatever is loaded here.
//!
//! ## Example config file (jsonschema-transform.toml):
//! ```toml
//! [parser]
//! base_uri = "https://example.com/schemas"
//! depth = 1
//! strict = true
//!
//! [output]
//! path = "docs/diagram.%s"
//! overwrite = false
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for a transform run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Parser settings
    #[serde(default)]
    pub parser: ParserConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Parser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Base URI that `$id`s and class sources are resolved against
    #[serde(default)]
    pub base_uri: Option<String>,

    /// Maximum distance of a class from the input schemas (-1 = unlimited)
    #[serde(default = "default_depth")]
    pub depth: i64,

    /// Fail on unreadable or invalid input files
    #[serde(default)]
    pub strict: bool,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output file; `%s` is replaced by the format extension
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Replace an existing output file
    #[serde(default)]
    pub overwrite: bool,
}

fn default_depth() -> i64 {
    -1
}

fn default_output_path() -> String {
    "diagram.%s".to_string()
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            base_uri: None,
            depth: default_depth(),
            strict: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            overwrite: false,
        }
    }
}

impl TransformConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["jsonschema-transform.toml", ".jsonschema-transform.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "emptyless", "jsonschema-transform") {
            let xdg_config = config_dir.config_dir().join("config.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("JSONSCHEMA_TRANSFORM")
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

    /// Output path for a format extension (`%s` replaced)
    pub fn output_path(&self, extension: &str) -> PathBuf {
        PathBuf::from(self.output.path.replace("%s", extension))
    }
}
