//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{MonitorError, Result};
use crate::parser::{FieldRule, LineParser, NUMBER_PATTERN};
use crate::record::{Schema, SchemaField, TIME_FIELD};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub parser: ParserConfig,

    #[serde(default = "default_fields")]
    pub fields: Vec<FieldConfig>,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Log file configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Rows between durability syncs; 0 syncs only at close
    #[serde(default = "default_flush_every")]
    pub flush_every: u32,
}

/// Line parser configuration
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ParserConfig {
    /// Literal line that ends a measurement block
    #[serde(default)]
    pub end_marker: Option<String>,
}

/// One measured field
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FieldConfig {
    pub name: String,

    /// Regex with one capture group; defaults to `<name>: <number>`
    #[serde(default)]
    pub pattern: Option<String>,

    #[serde(default)]
    pub unit: Option<String>,

    /// Required fields are logged and gate completeness
    #[serde(default = "default_required")]
    pub required: bool,
}

impl FieldConfig {
    fn rule(&self) -> FieldRule {
        match &self.pattern {
            Some(pattern) => FieldRule::new(self.name.clone(), pattern.clone()),
            None => FieldRule::labelled(self.name.clone(), &self.name),
        }
    }
}

// Default value functions
fn default_serial_port() -> String { crate::serial::DEFAULT_PORT.to_string() }
fn default_baud_rate() -> u32 { crate::serial::DEFAULT_BAUD_RATE }

fn default_file_prefix() -> String { "sensor_output".to_string() }
fn default_flush_every() -> u32 { 10 }

fn default_required() -> bool { true }

fn default_fields() -> Vec<FieldConfig> {
    vec![
        FieldConfig {
            name: "Temperature".to_string(),
            pattern: Some(format!("Temperature: {}", NUMBER_PATTERN)),
            unit: Some("deg C".to_string()),
            required: true,
        },
        FieldConfig {
            name: "Relative Humidity".to_string(),
            pattern: Some(format!("Relative Humidity: {}", NUMBER_PATTERN)),
            unit: Some("%".to_string()),
            required: false,
        },
        FieldConfig {
            name: "CO2".to_string(),
            pattern: Some(format!("CO2: {}", NUMBER_PATTERN)),
            unit: Some("ppm".to_string()),
            required: true,
        },
    ]
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_prefix: default_file_prefix(),
            flush_every: default_flush_every(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            output: OutputConfig::default(),
            parser: ParserConfig::default(),
            fields: default_fields(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use co2_monitor::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.trim().is_empty() {
            return Err(MonitorError::Config("serial port cannot be empty".to_string()));
        }

        if self.serial.baud_rate == 0 {
            return Err(MonitorError::Config("baud_rate must be greater than 0".to_string()));
        }

        if self.output.file_prefix.trim().is_empty() {
            return Err(MonitorError::Config("file_prefix cannot be empty".to_string()));
        }

        if let Some(marker) = &self.parser.end_marker {
            if marker.is_empty() {
                return Err(MonitorError::Config("end_marker cannot be empty".to_string()));
            }
        }

        if self.fields.iter().any(|field| field.name == TIME_FIELD) {
            return Err(MonitorError::Config(format!(
                "'{}' is reserved for the timestamp column",
                TIME_FIELD
            )));
        }

        // Schema and parser construction check names, duplicates and patterns
        self.schema()?;
        self.line_parser()?;

        Ok(())
    }

    /// Schema of the required fields, in configuration order
    pub fn schema(&self) -> Result<Schema> {
        // Tracked-only fields share the name space with required ones
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(MonitorError::Config(format!("duplicate field name '{}'", field.name)));
            }
        }

        let required = self
            .fields
            .iter()
            .filter(|field| field.required)
            .map(|field| SchemaField::new(field.name.clone(), field.unit.as_deref()))
            .collect();

        Ok(Schema::new(required)?.with_end_marker(self.parser.end_marker.is_some()))
    }

    /// Line parser over every configured field (required or tracked)
    pub fn line_parser(&self) -> Result<LineParser> {
        let rules: Vec<FieldRule> = self.fields.iter().map(FieldConfig::rule).collect();
        LineParser::new(&rules, self.parser.end_marker.as_deref())
    }
}
