//! # Serial Communication Module
//!
//! Handles the serial link to the sensor board.
//!
//! This module handles:
//! - Opening the serial port at the configured baud rate (8N1)
//! - Reading newline-delimited text lines
//! - Releasing the port at shutdown
//!
//! There is no retry or reconnect: a port that cannot be opened, or a read
//! that fails, ends the run.

pub mod port_trait;

use crate::error::{MonitorError, Result};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info};

pub use port_trait::{BufLineSource, LineSource};

/// Default serial port name
pub const DEFAULT_PORT: &str = "COM3";

/// Default baud rate of the sensor board
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Line source backed by a serial port
pub type SerialLineSource = BufLineSource<tokio_serial::SerialStream>;

/// Open a serial port with 8N1 settings and no flow control
///
/// # Arguments
///
/// * `port` - Port name (e.g., "COM3" or "/dev/ttyACM0")
/// * `baud_rate` - Line speed
///
/// # Errors
///
/// Returns `TransportUnavailable` if the port is absent, busy or cannot be
/// configured
///
/// # Examples
///
/// ```no_run
/// use co2_monitor::serial::open_serial;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let source = open_serial("/dev/ttyACM0", 115_200)?;
///     Ok(())
/// }
/// ```
pub fn open_serial(port: &str, baud_rate: u32) -> Result<SerialLineSource> {
    debug!("Trying to open serial port: {} at {} baud", port, baud_rate);

    let stream = tokio_serial::new(port, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| MonitorError::TransportUnavailable {
            port: port.to_string(),
            reason: e.to_string(),
        })?;

    info!("Connected to serial port {}", port);
    Ok(BufLineSource::new(stream))
}
