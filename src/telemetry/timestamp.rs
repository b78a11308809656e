//! Capture timestamps and log file naming.

use chrono::{Local, NaiveDateTime};

/// Timestamp format shared by file names and the `Time` column
pub const TIME_FORMAT: &str = "%Y%m%d_%H_%M_%S";

/// Log file extension
pub const FILE_EXTENSION: &str = "csv";

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Render a timestamp as `YYYYMMDD_HH_MM_SS`
pub fn format_timestamp(time: &NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Parse a `YYYYMMDD_HH_MM_SS` timestamp
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text.trim(), TIME_FORMAT)
}

/// Output file name: `<prefix>_<YYYYMMDD_HH_MM_SS>.csv`
pub fn output_file_name(prefix: &str, time: &NaiveDateTime) -> String {
    format!("{}_{}.{}", prefix, format_timestamp(time), FILE_EXTENSION)
}
