use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use std::path::PathBuf;

use super::{oauth_client, GlobalOpts};
use crate::archive::{load_import_source, read_meta_file, ImportConfig};
use crate::client::AppImportOptions;
use crate::config::load_main_config;
use crate::constants::META_FILE_APPLICATION;

#[derive(Args, Debug)]
pub struct ImportAppArgs {
    /// Application archive (.zip) or extracted Application directory
    #[arg(short = 'f', long)]
    pub file: PathBuf,
    /// Environment to which the Application should be imported
    #[arg(short = 'e', long)]
    pub environment: Option<String>,
    /// Owner to import the Application as
    #[arg(short = 'o', long)]
    pub owner: Option<String>,
    /// Keep the owner recorded in the archive
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub preserve_owner: Option<bool>,
    /// Update the Application if it already exists
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub update: Option<bool>,
    /// Do not import the consumer keys
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub skip_keys: Option<bool>,
    /// Do not import the subscriptions
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub skip_subscriptions: Option<bool>,
    #[arg(short = 'u', long)]
    pub username: Option<String>,
    #[arg(short = 'p', long)]
    pub password: Option<String>,
}

impl ImportAppArgs {
    /// Flags win over the archive's meta file; anything unset is `false`
    pub fn options(&self, recorded: &ImportConfig) -> AppImportOptions {
        AppImportOptions {
            owner: self.owner.clone(),
            preserve_owner: self
                .preserve_owner
                .or(recorded.preserve_owner)
                .unwrap_or(false),
            update: self.update.or(recorded.update).unwrap_or(false),
            skip_keys: self.skip_keys.or(recorded.skip_keys).unwrap_or(false),
            skip_subscriptions: self
                .skip_subscriptions
                .or(recorded.skip_subscriptions)
                .unwrap_or(false),
        }
    }
}

pub async fn run(args: ImportAppArgs, opts: GlobalOpts) -> Result<()> {
    tracing::info!("import-app called");
    let config = load_main_config()?;
    let env = config.resolve_environment(args.environment.as_deref())?;

    let (archive, file_name) = load_import_source(&args.file)?;
    let recorded = read_meta_file(&archive, META_FILE_APPLICATION)
        .with_context(|| format!("reading {}", args.file.display()))?
        .map(|m| m.deploy.import)
        .unwrap_or_default();
    let options = args.options(&recorded);
    tracing::debug!("import options: {:?}", options);

    let client = oauth_client(
        &config,
        &env,
        args.username.as_deref(),
        args.password.as_deref(),
        opts,
    )
    .await?;
    client.import_app(archive, &file_name, &options).await?;

    println!("Successfully imported Application!");
    Ok(())
}
