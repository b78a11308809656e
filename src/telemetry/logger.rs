//! # Durable CSV Logger
//!
//! Owns the open log destination, writes one row per completed record and
//! forces data to disk every `flush_every` rows. The flush cadence bounds
//! how many records can be lost if the process is killed without a clean
//! shutdown.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::timestamp::{format_timestamp, output_file_name, Clock};
use crate::error::{MonitorError, Result};
use crate::record::{CompletedRecord, Schema};

/// Row-oriented append sink
#[cfg_attr(test, mockall::automock)]
pub trait Destination: Send {
    /// Append one row
    fn write_row(&mut self, row: &[String]) -> Result<()>;

    /// Force buffered rows to durable storage
    fn sync(&mut self) -> Result<()>;
}

/// CSV file on disk
///
/// Rows are terminated with `\r\n` and quoted only when needed, matching the
/// historical log files.
pub struct CsvFileDestination {
    writer: csv::Writer<File>,
}

impl std::fmt::Debug for CsvFileDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvFileDestination").finish_non_exhaustive()
    }
}

impl CsvFileDestination {
    /// Create (or truncate) the file at `path`
    ///
    /// # Errors
    ///
    /// Returns `DestinationUnavailable` if the file cannot be created
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| MonitorError::DestinationUnavailable {
            path: path.display().to_string(),
            source,
        })?;

        let writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);

        Ok(Self { writer })
    }
}

impl Destination for CsvFileDestination {
    fn write_row(&mut self, row: &[String]) -> Result<()> {
        self.writer.write_record(row)?;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.writer.flush().map_err(MonitorError::Destination)?;
        self.writer.get_ref().sync_all().map_err(MonitorError::Destination)
    }
}

/// Render a numeric cell at full precision, keeping a decimal point on
/// integral values (`412.0`)
pub fn format_value(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

/// Build the CSV row for a completed record, in schema order
pub fn render_row(schema: &Schema, record: &CompletedRecord) -> Vec<String> {
    std::iter::once(format_timestamp(&record.time))
        .chain(schema.fields().iter().map(|field| {
            record
                .get(&field.name)
                .map(format_value)
                .unwrap_or_default()
        }))
        .collect()
}

/// Log writer with a periodic durability sync
pub struct DurableLogger<D: Destination = CsvFileDestination> {
    destination: Option<D>,
    path: PathBuf,
    schema: Schema,
    flush_every: u32,
    unsynced: u32,
    records_written: u64,
}

impl<D: Destination> std::fmt::Debug for DurableLogger<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableLogger")
            .field("path", &self.path)
            .field("flush_every", &self.flush_every)
            .field("records_written", &self.records_written)
            .field("closed", &self.destination.is_none())
            .finish_non_exhaustive()
    }
}

impl DurableLogger<CsvFileDestination> {
    /// Create `<prefix>_<timestamp>.csv` and write the header row
    ///
    /// # Arguments
    ///
    /// * `prefix` - File name prefix, may include a directory
    /// * `schema` - Logged columns
    /// * `flush_every` - Rows between durability syncs (`0` = only at close)
    /// * `clock` - Source of the file name timestamp
    ///
    /// # Errors
    ///
    /// Returns `DestinationUnavailable` if the file cannot be created
    pub fn open(prefix: &str, schema: Schema, flush_every: u32, clock: &dyn Clock) -> Result<Self> {
        let path = PathBuf::from(output_file_name(prefix, &clock.now()));
        let destination = CsvFileDestination::create(&path)?;
        let logger = Self::with_destination(destination, path, schema, flush_every)?;
        info!("Opened CSV file {}", logger.path.display());
        Ok(logger)
    }
}

impl<D: Destination> DurableLogger<D> {
    /// Wrap an already-open destination and write the header row
    pub fn with_destination(
        mut destination: D,
        path: PathBuf,
        schema: Schema,
        flush_every: u32,
    ) -> Result<Self> {
        destination.write_row(&schema.header())?;

        Ok(Self {
            destination: Some(destination),
            path,
            schema,
            flush_every,
            unsynced: 0,
            records_written: 0,
        })
    }

    /// Write one row and sync when the cadence is reached
    ///
    /// # Errors
    ///
    /// Returns error if the logger is closed or the write/sync fails
    pub fn append(&mut self, record: &CompletedRecord) -> Result<()> {
        let row = render_row(&self.schema, record);
        let destination = self.destination.as_mut().ok_or_else(closed_error)?;
        destination.write_row(&row)?;

        self.records_written += 1;
        self.unsynced += 1;

        if self.flush_every > 0 && self.unsynced >= self.flush_every {
            self.flush()?;
        }
        Ok(())
    }

    /// Force all appended rows to durable storage
    pub fn flush(&mut self) -> Result<()> {
        let destination = self.destination.as_mut().ok_or_else(closed_error)?;
        destination.sync()?;
        debug!("Synced {} rows to {}", self.unsynced, self.path.display());
        self.unsynced = 0;
        Ok(())
    }

    /// Final sync and release of the destination
    ///
    /// Calling `close` again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut destination) = self.destination.take() {
            destination.sync()?;
            info!("Closed output file {}.", self.path.display());
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.destination.is_none()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

fn closed_error() -> MonitorError {
    MonitorError::Destination(io::Error::new(
        io::ErrorKind::NotConnected,
        "log destination already closed",
    ))
}
