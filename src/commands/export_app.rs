use anyhow::{Context, Result};
use clap::{ArgAction, Args};

use super::{oauth_client, GlobalOpts};
use crate::archive::{
    application_archive_name, exported_apps_dir, include_meta_file, write_archive, MetaData,
};
use crate::config::load_main_config;
use crate::constants::META_FILE_APPLICATION;

#[derive(Args, Debug)]
pub struct ExportAppArgs {
    /// Name of the Application to be exported
    #[arg(short = 'n', long)]
    pub name: String,
    /// Owner of the Application to be exported
    #[arg(short = 'o', long)]
    pub owner: String,
    /// Environment from which the Application should be exported
    #[arg(short = 'e', long)]
    pub environment: Option<String>,
    /// Export the Application together with its consumer keys
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub with_keys: bool,
    /// Format of the Application definition inside the archive (JSON or YAML)
    #[arg(long)]
    pub format: Option<String>,
    #[arg(short = 'u', long)]
    pub username: Option<String>,
    #[arg(short = 'p', long)]
    pub password: Option<String>,
}

pub async fn run(args: ExportAppArgs, opts: GlobalOpts) -> Result<()> {
    tracing::info!("export-app called");
    let config = load_main_config()?;
    let env = config.resolve_environment(args.environment.as_deref())?;
    let client = oauth_client(
        &config,
        &env,
        args.username.as_deref(),
        args.password.as_deref(),
        opts,
    )
    .await?;

    let exported = client
        .export_app(&args.name, &args.owner, args.with_keys, args.format.as_deref())
        .await?;

    let meta = MetaData::for_application(&args.name, &args.owner);
    let archive = include_meta_file(&exported, META_FILE_APPLICATION, &meta)
        .context("Error creating the final zip archive with application_meta.yaml file")?;
    let path = write_archive(
        &exported_apps_dir(&config.export_directory(), &env),
        &application_archive_name(&args.name, &args.owner),
        &archive,
    )?;

    println!("Successfully exported Application!");
    println!("Find the exported Application at {}", path.display());
    Ok(())
}
