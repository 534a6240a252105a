use anyhow::{anyhow, Result};
use clap::Args;

use super::{oauth_client, GlobalOpts};
use crate::config::load_main_config;

#[derive(Args, Debug)]
pub struct DeleteAppArgs {
    /// Name of the Application to be deleted
    #[arg(short = 'n', long)]
    pub name: String,
    /// Owner of the Application
    #[arg(short = 'o', long)]
    pub owner: Option<String>,
    #[arg(short = 'e', long)]
    pub environment: Option<String>,
    #[arg(short = 'u', long)]
    pub username: Option<String>,
    #[arg(short = 'p', long)]
    pub password: Option<String>,
}

pub async fn run(args: DeleteAppArgs, opts: GlobalOpts) -> Result<()> {
    tracing::info!("delete-app called");
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

    let app = client
        .find_application(&args.name, args.owner.as_deref())
        .await?
        .ok_or_else(|| anyhow!("Application '{}' not found in {}", args.name, env))?;
    client.delete_application(&app.application_id).await?;

    println!("{} Application deleted successfully!", args.name);
    Ok(())
}
