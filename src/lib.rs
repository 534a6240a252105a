//! # apictl library
//!
//! Core functionality for moving APIs and Applications between API Manager
//! environments as zip archives.

use clap::Parser;

pub mod archive;
pub mod client;
pub mod commands;
pub mod compare;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod model;

/// CLI tool for exporting and importing APIs and Applications
///
/// Archives downloaded from an environment carry a meta file with the import
/// options to use, so they can be imported into another environment as-is.
#[derive(Parser)]
#[command(
    name = "apictl",
    version,
    about = "CLI tool for exporting and importing APIs and Applications between API Manager environments",
    long_about = "Export APIs and Applications from an API Manager environment as zip archives and import them into another.\n\nEnvironments are registered with 'apictl env add' and logged into with 'apictl login'."
)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(long, global = true)]
    pub verbose: bool,
    /// Allow connections to endpoints with invalid TLS certificates
    #[arg(short = 'k', long, global = true)]
    pub insecure: bool,
    #[command(subcommand)]
    pub cmd: Option<commands::Commands>,
}
