use anyhow::Result;
use clap::{Args, ValueEnum};
use comfy_table::{presets::UTF8_BORDERS_ONLY, Table};

use super::{oauth_client, GlobalOpts};
use crate::config::load_main_config;
use crate::model::ApplicationInfo;

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    #[value(name = "jsonArray")]
    JsonArray,
}

#[derive(Args, Debug)]
pub struct ListAppsArgs {
    #[arg(short = 'e', long)]
    pub environment: Option<String>,
    /// Only list Applications of this owner
    #[arg(short = 'o', long)]
    pub owner: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    #[arg(short = 'u', long)]
    pub username: Option<String>,
    #[arg(short = 'p', long)]
    pub password: Option<String>,
}

pub async fn run(args: ListAppsArgs, opts: GlobalOpts) -> Result<()> {
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

    let apps = client.list_apps(args.owner.as_deref()).await?;
    println!("{}", render(&apps.list, args.format)?);
    Ok(())
}

fn render(apps: &[ApplicationInfo], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => apps
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?
            .join("\n"),
        OutputFormat::JsonArray => serde_json::to_string_pretty(apps)?,
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(["ID", "NAME", "OWNER", "STATUS", "GROUP ID"]);
            for app in apps {
                table.add_row([
                    app.application_id.clone(),
                    app.name.clone(),
                    app.owner.clone(),
                    app.status.clone(),
                    app.groups.join(","),
                ]);
            }
            table.to_string()
        }
    })
}
