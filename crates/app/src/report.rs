use chrono::{DateTime, Utc};
use ingest::{ProjectRef, aggregate_usage, classify_projects};
use usage_core::{
    Granularity, PricingTable, UsageRecord, UsageReport, attribute_costs, project_forecast,
};

use crate::error::Result;
use crate::util::time::billing_period;

#[derive(Clone, Copy, Debug, Default)]
pub struct ReportOptions {
    pub granularity: Granularity,
    pub active_only: bool,
}

/// Runs classification, aggregation, cost attribution and forecasting over
/// already-fetched API data. Any error aborts the whole report.
pub fn build_report(
    live: &[ProjectRef],
    records: &[UsageRecord],
    options: ReportOptions,
    pricing: &PricingTable,
    now: DateTime<Utc>,
) -> Result<UsageReport> {
    let period = billing_period(now)?;
    let elapsed = period.elapsed();

    let projects = classify_projects(live, records, options.active_only);
    let aggregate = aggregate_usage(&projects, records, options.granularity)?;
    let current = attribute_costs(&aggregate.projects, pricing)?;
    let forecast = project_forecast(&aggregate.projects, elapsed, pricing)?;

    tracing::info!(
        projects = current.projects.len(),
        current_total = current.account.total_usd,
        forecast_total = forecast.account.total_usd,
        "report built"
    );

    Ok(UsageReport {
        generated_at: now,
        period,
        granularity: aggregate.granularity,
        elapsed,
        active_only: options.active_only,
        usage: aggregate.account,
        current,
        forecast,
        pricing: pricing.clone(),
    })
}
