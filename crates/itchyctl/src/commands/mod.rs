//! Command implementations for itchyctl

pub mod config;
pub mod device;
pub mod monitor;

use clap::Subcommand;

#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}
