//! # CO2 Monitor Library
//!
//! Log CO2, temperature and humidity readings streamed by a sensor board over
//! a serial port.
//!
//! This library provides the streaming record assembly loop: text lines are
//! parsed into single-field extractions, merged into a running record, and
//! each record that satisfies the schema is stamped and appended to a CSV
//! log with a periodic durability sync. Logs can be plotted offline.

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod plot;
pub mod record;
pub mod serial;
pub mod shutdown;
pub mod telemetry;
