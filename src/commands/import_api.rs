use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use std::path::PathBuf;

use super::{basic_client, GlobalOpts};
use crate::archive::{load_import_source, read_meta_file};
use crate::config::load_main_config;
use crate::constants::META_FILE_API;

#[derive(Args, Debug)]
pub struct ImportApiArgs {
    /// API archive (.zip) or extracted API directory
    #[arg(short = 'f', long)]
    pub file: PathBuf,
    /// Environment to which the API should be imported
    #[arg(short = 'e', long)]
    pub environment: Option<String>,
    /// Keep the original provider of the API (default: true)
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub preserve_provider: Option<bool>,
    /// Update the API if it already exists
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub update: Option<bool>,
    #[arg(short = 'u', long)]
    pub username: Option<String>,
    #[arg(short = 'p', long)]
    pub password: Option<String>,
}

pub async fn run(args: ImportApiArgs, opts: GlobalOpts) -> Result<()> {
    tracing::info!("import-api called");
    let config = load_main_config()?;
    let env = config.resolve_environment(args.environment.as_deref())?;

    let (archive, file_name) = load_import_source(&args.file)?;
    let recorded = read_meta_file(&archive, META_FILE_API)
        .with_context(|| format!("reading {}", args.file.display()))?
        .map(|m| m.deploy.import)
        .unwrap_or_default();
    let preserve_provider = args
        .preserve_provider
        .or(recorded.preserve_provider)
        .unwrap_or(true);
    let update = args.update.or(recorded.update).unwrap_or(false);

    let client = basic_client(
        &config,
        &env,
        args.username.as_deref(),
        args.password.as_deref(),
        opts,
    )?;
    client
        .import_api(archive, &file_name, preserve_provider, update)
        .await?;

    println!("Successfully imported API!");
    Ok(())
}
