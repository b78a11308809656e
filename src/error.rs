//! # Error Types
//!
//! Custom error types for the CO2 monitor using `thiserror`.

use thiserror::Error;

/// Main error type for the CO2 monitor
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Serial endpoint could not be opened (wrong name, busy or absent device)
    #[error("Cannot open serial port {port}: {reason}")]
    TransportUnavailable { port: String, reason: String },

    /// I/O error while reading a line from the serial endpoint
    #[error("Serial read failed: {0}")]
    TransportRead(#[source] std::io::Error),

    /// Log file could not be created
    #[error("Cannot create output file {path}: {source}")]
    DestinationUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Write or sync failure on an open log file
    #[error("Output file error: {0}")]
    Destination(#[source] std::io::Error),

    /// CSV encoding or decoding errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file parsing errors
    #[error("Configuration error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Invalid field pattern
    #[error("Invalid field pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Offline plotting errors
    #[error("Plot error: {0}")]
    Plot(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the CO2 monitor
pub type Result<T> = std::result::Result<T, MonitorError>;
