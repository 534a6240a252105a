use crate::config::{load_main_config, save_main_config, EnvironmentConfig};
use crate::credentials::{keys_path, KeyStore};
use anyhow::{anyhow, Result};
use clap::Subcommand;
use std::io::{stdin, stdout, Write};

#[derive(Subcommand, Debug)]
pub enum EnvCommands {
    /// List all configured environments
    List,
    /// Add a new environment
    Add {
        name: String,
        /// Base URL of the API Manager (prompted for when omitted)
        #[arg(long)]
        apim: Option<String>,
        #[arg(long)]
        import_export: Option<String>,
        #[arg(long)]
        publisher: Option<String>,
        #[arg(long)]
        devportal: Option<String>,
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        registration: Option<String>,
        /// Make this the default environment
        #[arg(long)]
        default: bool,
    },
    /// Remove an environment by name
    Remove { name: String },
}

fn prompt(msg: &str) -> Result<String> {
    print!("{msg}: ");
    stdout().flush()?;
    let mut input = String::new();
    stdin().read_line(&mut input)?;
    let val = input.trim().to_string();
    if val.is_empty() {
        Err(anyhow!("{} cannot be empty", msg))
    } else {
        Ok(val)
    }
}

pub async fn run(cmd: EnvCommands) -> Result<()> {
    let mut config = load_main_config()?;

    match cmd {
        EnvCommands::List => {
            if config.environments.is_empty() {
                println!("(no environments defined)");
            } else {
                let default = config.default_environment();
                for (name, env) in &config.environments {
                    let marker = if default.as_deref() == Some(name.as_str()) {
                        " (default)"
                    } else {
                        ""
                    };
                    println!(" - {} → {}{}", name, env.apim_endpoint, marker);
                }
            }
        }
        EnvCommands::Add {
            name,
            apim,
            import_export,
            publisher,
            devportal,
            token,
            registration,
            default,
        } => {
            if config.environments.contains_key(&name) {
                return Err(anyhow!("environment '{}' already exists", name));
            }
            let apim_endpoint = match apim {
                Some(url) => url,
                None => prompt("API Manager endpoint")?,
            };
            config.environments.insert(
                name.clone(),
                EnvironmentConfig {
                    apim_endpoint,
                    import_export_endpoint: import_export,
                    publisher_endpoint: publisher,
                    devportal_endpoint: devportal,
                    token_endpoint: token,
                    registration_endpoint: registration,
                },
            );
            if default {
                config.config.default_environment = Some(name.clone());
            }
            save_main_config(&config)?;
            println!("✅ Added environment '{name}' successfully");
        }
        EnvCommands::Remove { name } => {
            if config.environments.remove(&name).is_none() {
                println!("no such environment '{name}'");
                return Ok(());
            }
            if config.config.default_environment.as_deref() == Some(name.as_str()) {
                config.config.default_environment = None;
            }
            save_main_config(&config)?;

            let path = keys_path();
            let mut store = KeyStore::load(&path)?;
            if store.remove(&name).is_some() {
                store.save(&path)?;
            }
            println!("removed '{name}'");
        }
    }

    Ok(())
}
