pub mod app;
pub mod config;
pub mod error;
pub mod pricing;
pub mod report;
pub mod util;

pub use app::AppState;
pub use config::{CliOverrides, ConfigSources, Settings, read_env_file, resolve};
pub use error::{AppError, Result};
pub use pricing::{load_launch_pricing, load_pricing, resolve_pricing, write_pricing};
pub use report::{ReportOptions, build_report};
pub use util::time::{billing_period, consumption_window, days_in_month};
