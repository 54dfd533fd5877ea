pub mod card;
pub mod config;
pub mod screens;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "sugarmoon", about = "An animated birthday card for the terminal.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the card (the default).
    Play {
        /// Skip the confetti burst when the gift opens
        #[arg(long = "no-confetti")]
        no_confetti: bool,
        /// Frame interval in milliseconds
        #[arg(long = "tick-ms")]
        tick_ms: Option<u64>,
    },
    /// Show the effective settings.
    Config,
    /// Write a default settings file.
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
    /// Print shell completions.
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}
