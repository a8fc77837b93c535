mod args;
mod logging;
mod render;

use std::collections::HashMap;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use neon_api::NeonClient;
use tracing::{debug, info};
use usage_app::{AppState, ConfigSources, load_launch_pricing, read_env_file, write_pricing};

use crate::args::CliArgs;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    logging::init_logging(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    if let Some(path) = &args.write_pricing {
        let table = load_launch_pricing()?;
        write_pricing(path, &table)
            .with_context(|| format!("failed to write pricing to {}", path.display()))?;
        println!("Wrote {} plan pricing to {}.", table.plan, path.display());
        return Ok(());
    }

    let sources = ConfigSources {
        cli: args.overrides(),
        env: process_env(),
        dotenv: read_env_file(&args.env_file)
            .with_context(|| format!("failed to read {}", args.env_file.display()))?,
    };
    let state = AppState::load(&sources)?;
    debug!(settings = ?state.settings, "resolved settings");

    let client = NeonClient::new(
        &state.settings.api_key,
        &state.settings.api_url,
        state.settings.org_id.as_deref(),
    )?;

    let now = Utc::now();
    let window = state.consumption_window(now)?;
    info!(from = %window.from, to = %window.to, "fetching usage");
    let (projects, records) = tokio::try_join!(
        client.fetch_projects(),
        client.fetch_consumption(&window, state.settings.granularity),
    )
    .context("failed to fetch usage from the Neon API")?;

    let report = state.build_report(&projects, &records, now)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::TextReport(&report));
    }
    Ok(())
}

// Non-unicode variables cannot hold any of our settings.
fn process_env() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}
