// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use crate::output::OutputMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "tunnelkeeper")]
#[command(about = "Open and supervise an SSH port-forward tunnel through a bastion host")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputMode::Normal, global = true)]
    pub output: OutputMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a template tunnel.yml in the current directory
    Init {
        /// Overwrite an existing tunnel.yml
        #[arg(long)]
        force: bool,
    },

    /// Validate the tunnel config and print the ssh command
    Check {
        /// Path to the tunnel config (default: discover tunnel.yml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Open the tunnel and keep it open until Ctrl-C
    Open {
        /// Path to the tunnel config (default: discover tunnel.yml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// How often to check that ssh is still alive
        #[arg(long, default_value = "5s", value_parser = humantime_serde::re::humantime::parse_duration)]
        watch_interval: Duration,
    },

    /// Generate an RSA key pair with ssh-keygen
    Keygen {
        /// Write the keys to PATH and PATH.pub instead of printing them
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// ssh-keygen executable to run
        #[arg(long, default_value = "ssh-keygen")]
        program: PathBuf,
    },
}
