//! # CO2 Monitor
//!
//! Log CO2 sensor telemetry from a serial port to CSV, and plot the logs.
//!
//! # Control Flow
//!
//! `read_serial`:
//! 1. Create `<prefix>_<timestamp>.csv` and write the header
//! 2. Open the serial port
//! 3. Assemble and log records until Ctrl+C or the device closes the port
//! 4. Close the port and the file (final sync)
//!
//! `plot`: render every logged column against time into an SVG file.
//!
//! # Examples
//!
//! ```bash
//! co2-monitor read_serial /dev/ttyACM0 115200 office 10
//! co2-monitor plot office_20220108_12_55_43.csv
//! ```
//!
//! Expected output:
//! ```text
//! INFO co2_monitor::telemetry::logger: Opened CSV file sensor_output_20220108_12_55_43.csv
//! INFO co2_monitor::serial: Connected to serial port /dev/ttyACM0
//! INFO co2_monitor::acquisition: --------
//! Temperature : 21.50 deg C
//! CO2 : 412.30 ppm
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use co2_monitor::acquisition::acquire;
use co2_monitor::cli::{Cli, Command};
use co2_monitor::config::Config;
use co2_monitor::plot::{latest_log, plot_file};
use co2_monitor::shutdown::CancellationSignal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Command::ReadSerial(args) => {
            args.apply(&mut config);
            config.validate().context("Invalid arguments")?;

            info!("CO2 Monitor v{} starting...", env!("CARGO_PKG_VERSION"));

            let signal = CancellationSignal::new();
            signal.install_ctrl_c_handler();
            info!("Press Ctrl+C to exit");

            let summary = acquire(&config, signal).await.context("Serial logging failed")?;
            info!(
                "Logged {} records from {} lines to {} ({:?})",
                summary.records_written,
                summary.lines_read,
                summary.output_path.display(),
                summary.end_reason
            );
        }
        Command::Plot(args) => {
            let input = match args.file_name {
                Some(path) => path,
                None => latest_log(&config.output.file_prefix)
                    .context("No log file given and none found")?,
            };
            let output = plot_file(&input, args.output.as_deref())
                .with_context(|| format!("Failed to plot {}", input.display()))?;
            info!("Wrote plot {}", output.display());
        }
    }

    Ok(())
}
