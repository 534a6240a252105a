use anyhow::{Context, Result};
use clap::Args;

use super::GlobalOpts;
use crate::client::{ApimClient, Auth};
use crate::config::load_main_config;
use crate::credentials::{keys_path, resolve_credentials, KeyStore, StoredCredential};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Environment to log into
    pub environment: String,
    #[arg(short = 'u', long)]
    pub username: Option<String>,
    #[arg(short = 'p', long)]
    pub password: Option<String>,
}

pub async fn run(args: LoginArgs, opts: GlobalOpts) -> Result<()> {
    let config = load_main_config()?;
    let env_cfg = config.environment(&args.environment)?;

    // a fresh login never reuses what is stored
    let creds = resolve_credentials(
        &args.environment,
        args.username.as_deref(),
        args.password.as_deref(),
        &KeyStore::default(),
    )?;

    let client = ApimClient::new(
        &args.environment,
        env_cfg,
        &config.config,
        opts.insecure,
        Auth::None,
    )?;
    let registration = client
        .register_client(&creds)
        .await
        .with_context(|| format!("Error logging into {}", args.environment))?;

    let path = keys_path();
    let mut store = KeyStore::load(&path)?;
    store.insert(
        &args.environment,
        StoredCredential::new(&creds, &registration.client_id, &registration.client_secret),
    );
    store.save(&path)?;

    println!("Logged into {} environment", args.environment);
    Ok(())
}
