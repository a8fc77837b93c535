use std::path::PathBuf;

use clap::Parser;
use usage_app::CliOverrides;
use usage_app::config::DEFAULT_ENV_FILE;

/// Neon usage report with month-end cost forecast for the Launch plan.
///
/// The API key is read from NEON_API_KEY in the environment or the env file.
#[derive(Debug, Parser)]
#[command(name = "neon-usage", version, about)]
pub struct CliArgs {
    /// Organization ID (for org accounts), e.g. org-morning-bread-12345678
    #[arg(long)]
    pub org_id: Option<String>,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Leave projects deleted this month out of every total
    /// (`--active-only=false` overrides NEON_USAGE_ACTIVE_ONLY)
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub active_only: Option<bool>,

    /// Consumption bucket size: hourly, daily or monthly
    #[arg(long)]
    pub granularity: Option<String>,

    /// JSON pricing table to use instead of the built-in Launch plan prices
    #[arg(long, value_name = "FILE")]
    pub pricing: Option<PathBuf>,

    /// Write the built-in pricing table to FILE and exit
    #[arg(long, value_name = "FILE")]
    pub write_pricing: Option<PathBuf>,

    /// Env file consulted after the process environment
    #[arg(long, value_name = "FILE", default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    /// Neon API base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl CliArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            org_id: self.org_id.clone(),
            api_url: self.api_url.clone(),
            granularity: self.granularity.clone(),
            active_only: self.active_only,
            pricing_path: self.pricing.clone(),
        }
    }
}
