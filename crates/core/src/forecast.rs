use crate::{
    ElapsedFraction, ForecastResult, MetricKind, PricingTable, ProjectStatus, ProjectUsage,
    Result, UsageTotals, attribute_costs,
};

/// Month-end quantity for one metric.
///
/// Active projects extrapolate cumulative metrics linearly and hold
/// point-in-time metrics at their snapshot. Deleted projects cannot accrue
/// further, so cumulative metrics lock at their current value and
/// point-in-time metrics drop to zero.
pub fn forecast_quantity(
    status: ProjectStatus,
    kind: MetricKind,
    current: f64,
    elapsed: ElapsedFraction,
) -> f64 {
    match (status, kind) {
        (ProjectStatus::Active, MetricKind::Cumulative) => current / elapsed.value(),
        (ProjectStatus::Active, MetricKind::PointInTime) => current,
        (ProjectStatus::Deleted, MetricKind::Cumulative) => current,
        (ProjectStatus::Deleted, MetricKind::PointInTime) => 0.0,
    }
}

pub fn forecast_usage(
    status: ProjectStatus,
    usage: &UsageTotals,
    elapsed: ElapsedFraction,
) -> UsageTotals {
    usage
        .iter()
        .map(|(metric, quantity)| {
            (
                metric,
                forecast_quantity(status, metric.kind(), quantity, elapsed),
            )
        })
        .collect()
}

/// Projects every project to month end and re-prices the result, including
/// a fresh proportional split of the transfer free tier.
pub fn project_forecast(
    projects: &[ProjectUsage],
    elapsed: ElapsedFraction,
    pricing: &PricingTable,
) -> Result<ForecastResult> {
    let forecasted = projects
        .iter()
        .map(|entry| ProjectUsage {
            project: entry.project.clone(),
            usage: forecast_usage(entry.project.status, &entry.usage, elapsed),
        })
        .collect::<Vec<_>>();
    let attribution = attribute_costs(&forecasted, pricing)?;
    Ok(ForecastResult {
        elapsed,
        projects: attribution.projects,
        account: attribution.account,
    })
}
