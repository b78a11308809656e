//! # Acquisition Loop
//!
//! Drives parser, accumulator and logger against a live line source.
//!
//! States: `Starting -> Running -> Draining -> Stopped`.
//!
//! Each running iteration:
//! 1. stops if cancellation was requested,
//! 2. logs the current record if it is complete (before any new input is
//!    consumed, so at most one complete record is ever held),
//! 3. blocks on the next line,
//! 4. parses the line and merges it into the record.
//!
//! Cancellation is only observed between iterations; an in-flight read is
//! never interrupted. Read errors are fatal and not retried.

use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{MonitorError, Result};
use crate::parser::LineParser;
use crate::record::{accumulator, Record};
use crate::serial::{open_serial, LineSource};
use crate::shutdown::CancellationSignal;
use crate::telemetry::{Clock, Destination, DurableLogger, LocalClock};

/// Lifecycle of one acquisition run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Starting,
    Running,
    Draining,
    Stopped,
}

/// Why the running phase ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Cancellation observed at an iteration boundary
    Cancelled,
    /// The device closed the stream
    SourceClosed,
}

/// Outcome of a clean run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub lines_read: u64,
    pub records_written: u64,
    pub end_reason: EndReason,
}

/// Single-task acquisition loop
pub struct Acquisition {
    parser: LineParser,
    signal: CancellationSignal,
    clock: Box<dyn Clock>,
    state: LoopState,
}

impl std::fmt::Debug for Acquisition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Acquisition")
            .field("state", &self.state)
            .field("cancelled", &self.signal.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Acquisition {
    /// Create a loop in the `Starting` state using local wall-clock time
    pub fn new(parser: LineParser, signal: CancellationSignal) -> Self {
        Self {
            parser,
            signal,
            clock: Box::new(LocalClock),
            state: LoopState::Starting,
        }
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn transition(&mut self, next: LoopState) {
        debug!("Acquisition state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run until cancelled, the source closes, or a fatal error occurs
    ///
    /// Both the source and the logger are closed exactly once before this
    /// returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns `TransportRead` on a read failure, or the logger error if a
    /// row cannot be written or synced.
    pub async fn run<S, D>(&mut self, mut source: S, mut logger: DurableLogger<D>) -> Result<RunSummary>
    where
        S: LineSource,
        D: Destination,
    {
        self.transition(LoopState::Running);

        let mut record = accumulator::reset();
        let mut lines_read: u64 = 0;

        let outcome = loop {
            if self.signal.is_cancelled() {
                break Ok(EndReason::Cancelled);
            }

            if accumulator::is_complete(&record, logger.schema()) {
                if let Err(e) = self.log_record(&mut logger, std::mem::take(&mut record)) {
                    break Err(e);
                }
            }

            match source.read_line().await {
                Ok(Some(line)) => {
                    lines_read += 1;
                    let partial = self.parser.parse(&line);
                    if partial.is_empty() {
                        debug!("Ignoring line: {:?}", line);
                    }
                    record = accumulator::merge(record, &partial);
                }
                Ok(None) => {
                    warn!("Serial port closed by the device");
                    break Ok(EndReason::SourceClosed);
                }
                Err(e) => {
                    error!("Serial read failed: {}", e);
                    break Err(MonitorError::TransportRead(e));
                }
            }
        };

        self.transition(LoopState::Draining);

        let outcome = match outcome {
            Ok(reason) if accumulator::is_complete(&record, logger.schema()) => {
                self.log_record(&mut logger, record).map(|_| reason)
            }
            Ok(reason) => {
                if !record.is_empty() {
                    debug!("Discarding incomplete record with {} fields", record.len());
                }
                Ok(reason)
            }
            Err(e) => Err(e),
        };

        source.close();
        info!("Finished reading from serial.");
        let closed = logger.close();
        self.transition(LoopState::Stopped);

        match outcome {
            Ok(end_reason) => {
                closed?;
                Ok(RunSummary {
                    output_path: logger.path().to_path_buf(),
                    lines_read,
                    records_written: logger.records_written(),
                    end_reason,
                })
            }
            Err(e) => {
                if let Err(close_error) = closed {
                    warn!("Failed to close output file: {}", close_error);
                }
                Err(e)
            }
        }
    }

    fn log_record<D: Destination>(&self, logger: &mut DurableLogger<D>, record: Record) -> Result<()> {
        let completed = record.stamp(self.clock.now());
        logger.append(&completed)?;
        info!("{}", completed.display(logger.schema()));
        Ok(())
    }
}

/// Open the log file, then the serial port, and run the loop
///
/// If the port cannot be opened the already-created log file (header only)
/// is closed before the error is returned.
///
/// # Errors
///
/// Returns `DestinationUnavailable`, `TransportUnavailable`, or any error
/// from [`Acquisition::run`].
pub async fn acquire(config: &Config, signal: CancellationSignal) -> Result<RunSummary> {
    let mut acquisition = Acquisition::new(config.line_parser()?, signal);

    let mut logger = DurableLogger::open(
        &config.output.file_prefix,
        config.schema()?,
        config.output.flush_every,
        acquisition.clock(),
    )?;

    let source = match open_serial(&config.serial.port, config.serial.baud_rate) {
        Ok(source) => source,
        Err(e) => {
            error!("Error: Cannot open serial port {}.", config.serial.port);
            if let Err(close_error) = logger.close() {
                warn!("Failed to close output file: {}", close_error);
            }
            return Err(e);
        }
    };

    acquisition.run(source, logger).await
}
