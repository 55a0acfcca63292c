//! Configuration management for schema translation
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-canon.toml)
//! - Environment variables (SCHEMA_CANON__*)
//!
//! ## Example config file (schema-canon.toml):
//! ```toml
//! [naming]
//! sys = "."
//! default_namespace_name = "oscal-common"
//!
//! [namespaces.prefixes]
//! oscal-catalog = "cat"
//! oscal-metadata = "m"
//! "" = "c"
//!
//! [output]
//! combined_dir = "out/combined"
//! package_dir = "out/package"
//! split_packages = true
//! formats = ["jadn", "proto"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{Result, TranslateError};

/// Main configuration for the translator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Naming constraints applied to generated identifiers
    #[serde(default)]
    pub naming: NamingConfig,

    /// Pre-registered namespace prefixes
    #[serde(default)]
    pub namespaces: NamespaceConfig,

    /// Input selection
    #[serde(default)]
    pub input: InputConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Naming configuration
///
/// The first four values are copied verbatim into every package's `config`
/// block so downstream tools apply the same constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Maximum string length for generated identifiers
    #[serde(default = "default_max_string")]
    pub max_string: usize,

    /// Separator used to build synthetic names for anonymous types
    #[serde(default = "default_sys")]
    pub sys: String,

    /// Pattern a type name (without namespace prefix) must match
    #[serde(default = "default_type_name")]
    pub type_name: String,

    /// Pattern a field name must match
    #[serde(default = "default_field_name")]
    pub field_name: String,

    /// Name used in namespace URIs for the empty (shared) namespace
    #[serde(default = "default_namespace_name")]
    pub default_namespace_name: String,

    /// Local name of the synthetic per-document root type
    #[serde(default = "default_root_marker")]
    pub root_marker: String,

    /// Path segment naming the item type of a standalone array
    #[serde(default = "default_items_segment")]
    pub items_segment: String,
}

/// Namespace configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Namespace key -> short prefix. The empty key is the shared namespace.
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,
}

/// Input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Skip documents whose relative path starts with one of these
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,

    /// Only load documents whose relative path starts with one of these
    #[serde(default)]
    pub include_prefixes: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for one combined schema per input document
    #[serde(default = "default_combined_dir")]
    pub combined_dir: PathBuf,

    /// Directory for one schema per namespace
    #[serde(default = "default_package_dir")]
    pub package_dir: PathBuf,

    /// Split combined tables into per-namespace packages
    #[serde(default = "default_true")]
    pub split_packages: bool,

    /// Output formats to write
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,

    /// Pretty-print JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

/// Output notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Canonical IR in its JSON form
    Jadn,
    /// Protocol-Buffer-like text
    Proto,
}

// Default value functions
fn default_max_string() -> usize {
    1000
}

fn default_sys() -> String {
    ".".to_string()
}

fn default_type_name() -> String {
    "^[$A-Z][-.$A-Za-z0-9]{0,96}$".to_string()
}

fn default_field_name() -> String {
    "^[$a-z][-_$A-Za-z0-9]{0,63}$".to_string()
}

fn default_namespace_name() -> String {
    "common".to_string()
}

fn default_root_marker() -> String {
    "$Root".to_string()
}

fn default_items_segment() -> String {
    "items".to_string()
}

fn default_skip_prefixes() -> Vec<String> {
    vec![
        "target/".to_string(),
        ".git/".to_string(),
        "out/".to_string(),
    ]
}

fn default_combined_dir() -> PathBuf {
    PathBuf::from("out/combined")
}

fn default_package_dir() -> PathBuf {
    PathBuf::from("out/package")
}

fn default_true() -> bool {
    true
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Jadn]
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            max_string: default_max_string(),
            sys: default_sys(),
            type_name: default_type_name(),
            field_name: default_field_name(),
            default_namespace_name: default_namespace_name(),
            root_marker: default_root_marker(),
            items_segment: default_items_segment(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: default_skip_prefixes(),
            include_prefixes: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            combined_dir: default_combined_dir(),
            package_dir: default_package_dir(),
            split_packages: true,
            formats: default_formats(),
            pretty: true,
        }
    }
}

impl NamingConfig {
    /// The separator as a char. Must be a single character that cannot
    /// appear in a declared name.
    pub fn separator(&self) -> Result<char> {
        let mut chars = self.sys.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '$' | ':')) => Ok(c),
            _ => Err(TranslateError::InvalidConfig(format!(
                "separator '{}' must be one character outside [-_$:A-Za-z0-9]",
                self.sys
            ))),
        }
    }

    /// The fixed `config` block written into package info
    pub fn info_config(&self) -> BTreeMap<String, serde_json::Value> {
        let mut config = BTreeMap::new();
        config.insert("$MaxString".to_string(), serde_json::json!(self.max_string));
        config.insert("$Sys".to_string(), serde_json::json!(self.sys));
        config.insert("$TypeName".to_string(), serde_json::json!(self.type_name));
        config.insert("$FieldName".to_string(), serde_json::json!(self.field_name));
        config
    }
}

impl TranslateConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "schema-canon.toml",
            ".schema-canon.toml",
            "config/schema-canon.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "schema-canon", "schema-canon") {
            let xdg_config = config_dir.config_dir().join("schema-canon.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_CANON")
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
}
