//! # apictl
//!
//! Command-line client that exports and imports APIs and Applications
//! to and from API Manager environments.
//!
//! ## Quick Start
//!
//! ```bash
//! # Register two environments
//! apictl env add dev --apim https://dev.example.com:9443
//! apictl env add prod --apim https://prod.example.com:9443
//!
//! # Log in and move an Application across
//! apictl login dev -u admin -p admin
//! apictl export-app -n SampleApp -o admin -e dev
//! apictl login prod -u admin -p admin
//! apictl import-app -f ~/.config/apictl/exported/apps/dev/admin_SampleApp.zip -e prod
//!
//! # Export an API with Basic credentials
//! apictl export-api -n PizzaShackAPI -v 1.0.0 -e dev -u admin -p admin
//! ```
//!
//! ## Configuration
//!
//! - `main_config.yaml` - environments and settings
//! - `keys.yaml` - stored logins
//!
//! Both live in `~/.config/apictl`, or in `$APICTL_CONFIG_DIR` when set.

use anyhow::Result;
use apictl::{
    commands::{self, GlobalOpts},
    Cli,
};
use clap::Parser;
use std::io;

/// Main entry point for apictl
///
/// Parses command-line arguments, sets up logging on stderr and delegates to
/// the command handler. Errors are printed by the runtime with a non-zero exit.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "apictl=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cmd = cli.cmd.unwrap_or_else(|| {
        eprintln!("No command provided. Use --help to see available commands.");
        std::process::exit(1);
    });
    commands::run(
        cmd,
        GlobalOpts {
            insecure: cli.insecure,
        },
    )
    .await
}
