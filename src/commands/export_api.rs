use anyhow::{Context, Result};
use clap::Args;

use super::{basic_client, GlobalOpts};
use crate::archive::{
    api_archive_name, exported_apis_dir, include_meta_file, write_archive, MetaData,
};
use crate::config::load_main_config;
use crate::constants::META_FILE_API;

#[derive(Args, Debug)]
pub struct ExportApiArgs {
    /// Name of the API to be exported
    #[arg(short = 'n', long)]
    pub name: String,
    /// Version of the API to be exported
    #[arg(short = 'v', long)]
    pub version: String,
    /// Provider of the API
    #[arg(short = 'r', long)]
    pub provider: Option<String>,
    /// Environment from which the API should be exported
    #[arg(short = 'e', long)]
    pub environment: Option<String>,
    #[arg(short = 'u', long)]
    pub username: Option<String>,
    #[arg(short = 'p', long)]
    pub password: Option<String>,
}

pub async fn run(args: ExportApiArgs, opts: GlobalOpts) -> Result<()> {
    tracing::info!("export-api called");
    let config = load_main_config()?;
    let env = config.resolve_environment(args.environment.as_deref())?;
    let client = basic_client(
        &config,
        &env,
        args.username.as_deref(),
        args.password.as_deref(),
        opts,
    )?;

    let exported = client
        .export_api(&args.name, &args.version, args.provider.as_deref())
        .await?;

    let meta = MetaData::for_api(&args.name, &args.version);
    let archive = include_meta_file(&exported, META_FILE_API, &meta)
        .context("Error creating the final zip archive with api_meta.yaml file")?;
    let path = write_archive(
        &exported_apis_dir(&config.export_directory(), &env),
        &api_archive_name(&args.name, &args.version),
        &archive,
    )?;
    println!("Successfully exported API!");
    println!("Find the exported API at {}", path.display());

    let apis = client
        .list_apis(&args.name)
        .await
        .context("Error getting list of APIs")?;
    println!("Number of APIs exported: {}", apis.count);
    Ok(())
}
