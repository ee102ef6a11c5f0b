// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "krouo")]
#[command(about = "Port-knock gate for SSH access")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new krouo.yml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Knock the configured port sequences without connecting
    Knock {
        /// Only knock this target host
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Knock, then run a command on the target over SSH
    Run {
        /// Only run on this target host
        #[arg(short, long)]
        target: Option<String>,

        /// Command to execute remotely
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
}
