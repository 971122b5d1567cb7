//! CLI argument parsing for the nemt-router binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nemt-router", about = "NEMT route optimization service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP/WebSocket server (default if no subcommand given)
    Serve,
}
