use std::collections::HashMap;

use usage_core::{
    Granularity, Project, ProjectUsage, Result, UsageAggregate, UsageError, UsageRecord,
    UsageTotals,
};

/// Sums records per project and metric, then across projects.
///
/// Buckets are summed regardless of how many there are; `granularity` only
/// describes which buckets the API returned. Records for projects outside
/// `projects` (deleted ones excluded by `active_only`) do not contribute.
pub fn aggregate_usage(
    projects: &[Project],
    records: &[UsageRecord],
    granularity: Granularity,
) -> Result<UsageAggregate> {
    let index: HashMap<&str, usize> = projects
        .iter()
        .enumerate()
        .map(|(position, project)| (project.id.as_str(), position))
        .collect();
    let mut per_project = vec![UsageTotals::default(); projects.len()];
    let mut excluded = 0usize;

    for record in records {
        if !record.quantity.is_finite() || record.quantity < 0.0 {
            return Err(UsageError::MalformedResponse(format!(
                "invalid {} quantity {} for project {}",
                record.metric.as_str(),
                record.quantity,
                record.project_id
            )));
        }
        match index.get(record.project_id.as_str()) {
            Some(position) => per_project[*position].add(record.metric, record.quantity),
            None => excluded += 1,
        }
    }

    let mut account = UsageTotals::default();
    for totals in &per_project {
        account.merge(totals);
    }
    tracing::debug!(
        records = records.len(),
        excluded,
        projects = projects.len(),
        granularity = granularity.as_str(),
        "aggregated usage"
    );

    Ok(UsageAggregate {
        granularity,
        projects: projects
            .iter()
            .cloned()
            .zip(per_project)
            .map(|(project, usage)| ProjectUsage { project, usage })
            .collect(),
        account,
    })
}
