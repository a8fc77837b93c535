use std::collections::HashSet;

use usage_core::{Project, ProjectStatus, UsageRecord};

use crate::types::ProjectRef;

/// Tags every project id seen in either source.
///
/// Ids from the live list are active; ids that only appear in consumption
/// records belong to projects deleted during the period. Live projects keep
/// their listing order, deleted ones follow in first-seen record order.
/// With `active_only`, deleted projects are left out entirely.
pub fn classify_projects(
    live: &[ProjectRef],
    records: &[UsageRecord],
    active_only: bool,
) -> Vec<Project> {
    let mut seen = HashSet::new();
    let mut projects = Vec::new();
    for project in live {
        if seen.insert(project.id.as_str()) {
            projects.push(Project {
                id: project.id.clone(),
                name: project.name.clone(),
                status: ProjectStatus::Active,
            });
        }
    }
    let active_count = projects.len();
    if !active_only {
        for record in records {
            if seen.insert(record.project_id.as_str()) {
                projects.push(Project {
                    id: record.project_id.clone(),
                    name: record.project_id.clone(),
                    status: ProjectStatus::Deleted,
                });
            }
        }
    }
    tracing::debug!(
        active = active_count,
        deleted = projects.len() - active_count,
        active_only,
        "classified projects"
    );
    projects
}
