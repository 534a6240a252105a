use anyhow::Result;
use clap::Subcommand;

use crate::client::{ApimClient, Auth};
use crate::config::MainConfig;
use crate::credentials::{keys_path, resolve_credentials, KeyStore};

pub mod completions;
pub mod delete_app;
pub mod env;
pub mod export_api;
pub mod export_app;
pub mod import_api;
pub mod import_app;
pub mod list_apps;
pub mod login;
pub mod logout;

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Manage API Manager environments (add/list/remove)")]
    Env {
        #[command(subcommand)]
        cmd: env::EnvCommands,
    },
    #[command(about = "Register a client with an environment and store the credentials")]
    Login(login::LoginArgs),
    #[command(about = "Forget the stored credentials of an environment")]
    Logout { environment: String },
    #[command(
        about = "Export an API from an environment",
        long_about = "Export APIs from an environment\n\nExamples:\n  apictl export-api -n TwitterAPI -v 1.0.0 -e dev\n  apictl export-api -n FacebookAPI -v 2.1.0 -e production"
    )]
    ExportApi(export_api::ExportApiArgs),
    #[command(about = "Import an API archive or directory into an environment")]
    ImportApi(import_api::ImportApiArgs),
    #[command(
        about = "Export an Application from an environment",
        long_about = "Export an Application from an environment\n\nExamples:\n  apictl export-app -n SampleApp -o admin -e dev\n  apictl export-app -n SampleApp -o admin -e prod --with-keys"
    )]
    ExportApp(export_app::ExportAppArgs),
    #[command(about = "Import an Application archive or directory into an environment")]
    ImportApp(import_app::ImportAppArgs),
    #[command(about = "List the Applications of an environment")]
    ListApps(list_apps::ListAppsArgs),
    #[command(about = "Delete an Application by name")]
    DeleteApp(delete_app::DeleteAppArgs),
    #[command(about = "Emit shell completion scripts (bash/zsh/fish)")]
    Completions { shell: String },
}

/// Flags that apply to every command
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalOpts {
    pub insecure: bool,
}

pub async fn run(cmd: Commands, opts: GlobalOpts) -> Result<()> {
    match cmd {
        Commands::Env { cmd } => env::run(cmd).await,
        Commands::Login(args) => login::run(args, opts).await,
        Commands::Logout { environment } => logout::run(environment).await,
        Commands::ExportApi(args) => export_api::run(args, opts).await,
        Commands::ImportApi(args) => import_api::run(args, opts).await,
        Commands::ExportApp(args) => export_app::run(args, opts).await,
        Commands::ImportApp(args) => import_app::run(args, opts).await,
        Commands::ListApps(args) => list_apps::run(args, opts).await,
        Commands::DeleteApp(args) => delete_app::run(args, opts).await,
        Commands::Completions { shell } => completions::run(shell),
    }
}

/// Client for the import/export endpoints, authenticated with Basic credentials
fn basic_client(
    config: &MainConfig,
    env: &str,
    username: Option<&str>,
    password: Option<&str>,
    opts: GlobalOpts,
) -> Result<ApimClient> {
    let store = KeyStore::load(&keys_path())?;
    let creds = resolve_credentials(env, username, password, &store)?;
    ApimClient::new(
        env,
        config.environment(env)?,
        &config.config,
        opts.insecure,
        Auth::Basic(creds),
    )
}

/// Client for the devportal REST API, authenticated with an access token
async fn oauth_client(
    config: &MainConfig,
    env: &str,
    username: Option<&str>,
    password: Option<&str>,
    opts: GlobalOpts,
) -> Result<ApimClient> {
    let path = keys_path();
    let mut store = KeyStore::load(&path)?;
    let creds = resolve_credentials(env, username, password, &store)?;
    let stored = store.get(env).filter(|s| s.username == creds.username);
    let (client, credential) = ApimClient::with_password_grant(
        env,
        config.environment(env)?,
        &config.config,
        opts.insecure,
        &creds,
        stored,
    )
    .await?;

    // keep the registered client so the next command skips registration
    if store.get(env) != Some(&credential) {
        tracing::debug!("storing credentials of '{}' for {}", creds.username, env);
        store.insert(env, credential);
        store.save(&path)?;
    }
    Ok(client)
}
