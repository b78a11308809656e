//! CLI argument parsing.
//!
//! Two subcommands: `read_serial` logs the serial stream to CSV and `plot`
//! renders a finished log. Positional arguments override the configuration
//! file, which overrides the built-in defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;

/// Log CO2 sensor telemetry from a serial port and plot the results.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "co2-monitor")]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Read sensor lines from the serial port and log complete records.
    #[command(name = "read_serial")]
    ReadSerial(ReadSerialArgs),
    /// Plot a CSV log to SVG.
    Plot(PlotArgs),
}

/// Arguments for the read_serial command.
#[derive(Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadSerialArgs {
    /// Serial port name (default: COM3)
    pub port: Option<String>,

    /// Baud rate (default: 115200)
    pub baud: Option<u32>,

    /// Output file prefix (default: sensor_output)
    pub file_prefix: Option<String>,

    /// Rows between disk syncs, 0 = only at exit (default: 10)
    #[arg(value_name = "FLUSH_EVERY_N_LINES")]
    pub flush_every: Option<u32>,
}

impl ReadSerialArgs {
    /// Overlay the given arguments onto `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(prefix) = &self.file_prefix {
            config.output.file_prefix = prefix.clone();
        }
        if let Some(flush_every) = self.flush_every {
            config.output.flush_every = flush_every;
        }
    }
}

/// Arguments for the plot command.
#[derive(Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct PlotArgs {
    /// CSV log to plot (default: newest <file_prefix>_*.csv)
    pub file_name: Option<PathBuf>,

    /// SVG output path (default: the log path with .svg)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_read_serial_defaults() {
        let cli = Cli::try_parse_from(["co2-monitor", "read_serial"]).unwrap();
        assert_eq!(cli.config, None);
        assert_eq!(cli.command, Command::ReadSerial(ReadSerialArgs::default()));
    }

    #[test]
    fn test_read_serial_all_positionals() {
        let cli = Cli::try_parse_from([
            "co2-monitor",
            "read_serial",
            "/dev/ttyUSB0",
            "9600",
            "office",
            "1",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Command::ReadSerial(ReadSerialArgs {
                port: Some("/dev/ttyUSB0".to_string()),
                baud: Some(9600),
                file_prefix: Some("office".to_string()),
                flush_every: Some(1),
            })
        );
    }

    #[test]
    fn test_read_serial_partial_positionals() {
        let cli = Cli::try_parse_from(["co2-monitor", "read_serial", "COM4"]).unwrap();
        let Command::ReadSerial(args) = cli.command else {
            panic!("expected read_serial");
        };
        assert_eq!(args.port.as_deref(), Some("COM4"));
        assert_eq!(args.baud, None);
    }

    #[test]
    fn test_invalid_baud_rejected() {
        let result = Cli::try_parse_from(["co2-monitor", "read_serial", "COM3", "fast"]);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_plot_args() {
        let cli = Cli::try_parse_from(["co2-monitor", "plot", "log.csv", "-o", "out.svg"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Plot(PlotArgs {
                file_name: Some(PathBuf::from("log.csv")),
                output: Some(PathBuf::from("out.svg")),
            })
        );
    }

    #[test]
    fn test_plot_without_file() {
        let cli = Cli::try_parse_from(["co2-monitor", "plot"]).unwrap();
        assert_eq!(cli.command, Command::Plot(PlotArgs::default()));
    }

    #[test]
    fn test_global_config_flag() {
        let cli =
            Cli::try_parse_from(["co2-monitor", "read_serial", "--config", "monitor.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("monitor.toml")));
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["co2-monitor"]).is_err());
    }

    #[test]
    fn test_unknown_subcommand_is_error() {
        let result = Cli::try_parse_from(["co2-monitor", "calibrate"]);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        ReadSerialArgs {
            port: Some("/dev/ttyACM1".to_string()),
            baud: None,
            file_prefix: None,
            flush_every: Some(0),
        }
        .apply(&mut config);

        assert_eq!(config.serial.port, "/dev/ttyACM1");
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.output.file_prefix, "sensor_output");
        assert_eq!(config.output.flush_every, 0);
    }
}
