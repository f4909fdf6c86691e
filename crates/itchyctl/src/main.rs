//! itchyctl - ITCHy tactile mouse control CLI
//!
//! Lists devices, runs the smoke check, streams state reports and sends the
//! configuration commands (LED, simulation parameters, calibration).

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};
use itchy::{Color, SimulationParameters};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::ConfigCommands;
use crate::error::CliError;
use crate::session::Session;

#[derive(Parser, Debug)]
#[command(name = "itchyctl")]
#[command(about = "ITCHy tactile mouse control CLI - configure, calibrate and monitor the device")]
#[command(version)]
#[command(long_about = "
itchyctl talks to the ITCHy tactile mouse over raw HID. It sends the
configuration commands the firmware understands (LED color, simulation
parameters, calibration target, calibration start, save) and streams the
state reports the device produces.

Use --simulate to run against the built-in firmware model instead of
hardware, and --json for machine-readable output.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(long, global = true, help = "Output in JSON format for machine parsing")]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use the simulated device instead of hardware
    #[arg(long, global = true)]
    simulate: bool,

    /// Configuration file (defaults to the per-user config location)
    #[arg(long, global = true, env = "ITCHYCTL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// List connected ITCHy devices
    List,

    /// Initialize, print one state and cycle the LED through red, green, blue
    Smoke {
        /// Pause after each color in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },

    /// Stream state reports
    Monitor {
        /// Stop after this many seconds
        #[arg(long)]
        duration_secs: Option<f32>,
    },

    /// Set the LED color
    Color {
        r: u8,
        g: u8,
        b: u8,
    },

    /// Send simulation parameters
    Params {
        /// Virtual mass in kg
        #[arg(long)]
        mass: f32,
        /// Spring constant in N/m
        #[arg(long)]
        stiffness: f32,
        /// Damping in N·s/m
        #[arg(long)]
        damping: f32,
        /// Report interval in milliseconds
        #[arg(long, default_value_t = 20)]
        update_rate: u32,
    },

    /// Send the size of the calibration rectangle
    CalibrationTarget {
        #[arg(long)]
        width_cm: f32,
        #[arg(long)]
        height_cm: f32,
    },

    /// Start the two-stroke calibration on the device
    Calibrate,

    /// Persist parameters and calibration on the device
    Save,

    /// Send the simulation parameters and calibration target from the config file
    Apply,

    /// Configuration file commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("itchyctl={log_level},itchy={log_level},itchy_sim={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let result = execute_command(&cli);

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }

            let exit_code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            std::process::exit(exit_code);
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    if let Commands::Config(cmd) = &cli.command {
        return commands::config::execute(cmd, cli.config.as_deref(), cli.json);
    }

    let session = Session::load(cli.config.as_deref(), cli.simulate)?;

    match &cli.command {
        Commands::List => commands::device::list_devices(&session, cli.json),
        Commands::Smoke { interval_ms } => {
            commands::monitor::smoke(&session, Duration::from_millis(*interval_ms))
        }
        Commands::Monitor { duration_secs } => {
            let duration = duration_secs
                .map(|secs| {
                    Duration::try_from_secs_f32(secs)
                        .map_err(|e| CliError::ValidationError(format!("Invalid duration: {e}")))
                })
                .transpose()?;
            commands::monitor::monitor(&session, duration, cli.json)
        }
        Commands::Color { r, g, b } => {
            commands::device::set_color(&session, Color::new(*r, *g, *b), cli.json)
        }
        Commands::Params {
            mass,
            stiffness,
            damping,
            update_rate,
        } => commands::device::set_parameters(
            &session,
            SimulationParameters {
                mass: *mass,
                stiffness: *stiffness,
                damping: *damping,
                update_rate_ms: *update_rate,
            },
            cli.json,
        ),
        Commands::CalibrationTarget {
            width_cm,
            height_cm,
        } => commands::device::set_calibration_target(&session, *width_cm, *height_cm, cli.json),
        Commands::Calibrate => commands::device::start_calibration(&session, cli.json),
        Commands::Save => commands::device::save(&session, cli.json),
        Commands::Apply => commands::device::apply(&session, cli.json),
        Commands::Config(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    // --- Global flag parsing ---

    #[test]
    fn parse_list_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["itchyctl", "list"])?;
        assert!(!cli.json);
        assert!(!cli.simulate);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
        assert_eq!(cli.command, Commands::List);
        Ok(())
    }

    #[test]
    fn parse_global_flags_after_subcommand() -> TestResult {
        let cli = Cli::try_parse_from([
            "itchyctl",
            "monitor",
            "--json",
            "--simulate",
            "--config",
            "/tmp/itchy.json",
        ])?;
        assert!(cli.json);
        assert!(cli.simulate);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/itchy.json")));
        Ok(())
    }

    #[test]
    fn parse_verbose_levels() -> TestResult {
        let cli = Cli::try_parse_from(["itchyctl", "-vv", "list"])?;
        assert_eq!(cli.verbose, 2);
        Ok(())
    }

    // --- Command parsing ---

    #[test]
    fn parse_smoke_default_interval() -> TestResult {
        let cli = Cli::try_parse_from(["itchyctl", "smoke"])?;
        assert_eq!(cli.command, Commands::Smoke { interval_ms: 1000 });
        Ok(())
    }

    #[test]
    fn parse_monitor_duration() -> TestResult {
        let cli = Cli::try_parse_from(["itchyctl", "monitor", "--duration-secs", "2.5"])?;
        assert_eq!(
            cli.command,
            Commands::Monitor {
                duration_secs: Some(2.5)
            }
        );
        Ok(())
    }

    #[test]
    fn parse_color() -> TestResult {
        let cli = Cli::try_parse_from(["itchyctl", "color", "255", "128", "0"])?;
        assert_eq!(
            cli.command,
            Commands::Color {
                r: 255,
                g: 128,
                b: 0
            }
        );
        Ok(())
    }

    #[test]
    fn parse_color_out_of_range_fails() {
        let result = Cli::try_parse_from(["itchyctl", "color", "256", "0", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_params() -> TestResult {
        let cli = Cli::try_parse_from([
            "itchyctl",
            "params",
            "--mass",
            "0.1",
            "--stiffness",
            "2000",
            "--damping",
            "30",
        ])?;
        match cli.command {
            Commands::Params {
                mass, update_rate, ..
            } => {
                assert!((mass - 0.1).abs() < f32::EPSILON);
                assert_eq!(update_rate, 20);
            }
            other => return Err(format!("expected Params, got {other:?}").into()),
        }
        Ok(())
    }

    #[test]
    fn parse_params_requires_mass() {
        let result = Cli::try_parse_from(["itchyctl", "params", "--stiffness", "1", "--damping", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_calibration_target() -> TestResult {
        let cli = Cli::try_parse_from([
            "itchyctl",
            "calibration-target",
            "--width-cm",
            "30",
            "--height-cm",
            "20",
        ])?;
        assert!(matches!(cli.command, Commands::CalibrationTarget { .. }));
        Ok(())
    }

    #[test]
    fn parse_config_init_force() -> TestResult {
        let cli = Cli::try_parse_from(["itchyctl", "config", "init", "--force"])?;
        assert_eq!(
            cli.command,
            Commands::Config(ConfigCommands::Init { force: true })
        );
        Ok(())
    }

    #[test]
    fn parse_unknown_command_fails() {
        assert!(Cli::try_parse_from(["itchyctl", "flash"]).is_err());
    }
}
