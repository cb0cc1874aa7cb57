//! Command-line interface for the cookbook server.

use clap::{Parser, Subcommand};

/// Cookbook - recipe sharing with threaded comments
#[derive(Parser)]
#[command(name = "cookbook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the web server (default)
    #[command(alias = "daemon")]
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Write a default config.toml if none exists
    #[command(alias = "init")]
    InitConfig,
}
