//! # Telemetry Module
//!
//! Handles persisting completed sensor records to CSV log files.
//!
//! This module handles:
//! - Log file naming from the capture timestamp
//! - Writing the header and one row per completed record
//! - Periodic durability syncs (every N rows)
//! - Clean close at shutdown

pub mod logger;
pub mod timestamp;

pub use logger::{CsvFileDestination, Destination, DurableLogger};
pub use timestamp::{Clock, FixedClock, LocalClock, TIME_FORMAT};
