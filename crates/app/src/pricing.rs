use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{AppError, Result};
use usage_core::PricingTable;

/// Loads the pricing table for this run: the file at `path` when given,
/// otherwise the built-in Launch plan table.
pub fn resolve_pricing(path: Option<&Path>) -> Result<PricingTable> {
    let table = match path {
        Some(path) => load_pricing(path)?,
        None => load_launch_pricing()?,
    };
    table.validate()?;
    tracing::debug!(plan = %table.plan, "pricing table loaded");
    Ok(table)
}

pub fn load_pricing(path: &Path) -> Result<PricingTable> {
    let file = fs::File::open(path).map_err(|err| {
        AppError::Config(format!("open pricing file {}: {}", path.display(), err))
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(AppError::from)
}

pub fn load_launch_pricing() -> Result<PricingTable> {
    let data = include_str!("../launch-pricing.json");
    serde_json::from_str(data).map_err(AppError::from)
}

pub fn write_pricing(path: &Path, table: &PricingTable) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, table).map_err(AppError::from)
}
