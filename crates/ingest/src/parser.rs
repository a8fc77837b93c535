use chrono::{DateTime, Utc};
use serde_json::Value;
use usage_core::{BYTES_PER_GB, Metric, Result, SECONDS_PER_HOUR, UsageError, UsageRecord};

use crate::types::{Page, ProjectRef};

/// Metric names accepted from the consumption endpoint. Anything outside
/// this set is rejected rather than skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireMetric {
    ComputeUnitSeconds,
    RootBranchBytesMonth,
    ChildBranchBytesMonth,
    InstantRestoreBytesMonth,
    PublicNetworkTransferBytes,
    PrivateNetworkTransferBytes,
    ExtraBranchesMonth,
}

pub const WIRE_METRIC_NAMES: [&str; 7] = [
    "compute_unit_seconds",
    "root_branch_bytes_month",
    "child_branch_bytes_month",
    "instant_restore_bytes_month",
    "public_network_transfer_bytes",
    "private_network_transfer_bytes",
    "extra_branches_month",
];

impl WireMetric {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "compute_unit_seconds" => Some(Self::ComputeUnitSeconds),
            "root_branch_bytes_month" => Some(Self::RootBranchBytesMonth),
            "child_branch_bytes_month" => Some(Self::ChildBranchBytesMonth),
            "instant_restore_bytes_month" => Some(Self::InstantRestoreBytesMonth),
            "public_network_transfer_bytes" => Some(Self::PublicNetworkTransferBytes),
            "private_network_transfer_bytes" => Some(Self::PrivateNetworkTransferBytes),
            "extra_branches_month" => Some(Self::ExtraBranchesMonth),
            _ => None,
        }
    }

    pub fn metric(self) -> Metric {
        match self {
            Self::ComputeUnitSeconds => Metric::Compute,
            Self::RootBranchBytesMonth | Self::ChildBranchBytesMonth => Metric::Storage,
            Self::InstantRestoreBytesMonth => Metric::InstantRestore,
            Self::PublicNetworkTransferBytes => Metric::TransferPublic,
            Self::PrivateNetworkTransferBytes => Metric::TransferPrivate,
            Self::ExtraBranchesMonth => Metric::ExtraBranches,
        }
    }

    /// Converts a raw counter into the unit the metric is priced in.
    pub fn to_billing_units(self, raw: f64) -> f64 {
        match self {
            Self::ComputeUnitSeconds => raw / SECONDS_PER_HOUR,
            Self::ExtraBranchesMonth => raw,
            _ => raw / BYTES_PER_GB,
        }
    }
}

fn malformed(message: String) -> UsageError {
    UsageError::MalformedResponse(message)
}

fn field_str<'a>(value: &'a Value, key: &str, context: &str) -> Result<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(format!("{context} is missing string field `{key}`")))
}

fn field_array<'a>(value: &'a Value, key: &str, context: &str) -> Result<&'a [Value]> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| malformed(format!("{context} is missing array field `{key}`")))
}

fn extract_cursor(value: &Value) -> Option<String> {
    value
        .get("pagination")
        .and_then(|pagination| pagination.get("cursor"))
        .and_then(Value::as_str)
        .filter(|cursor| !cursor.is_empty())
        .map(str::to_string)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| malformed(format!("invalid timestamp {raw:?}: {err}")))
}

pub fn parse_projects_page(body: &Value) -> Result<Page<ProjectRef>> {
    let projects = field_array(body, "projects", "projects response")?;
    let items = projects
        .iter()
        .map(|project| {
            let id = field_str(project, "id", "project")?;
            let name = project
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .unwrap_or(id);
            Ok(ProjectRef {
                id: id.to_string(),
                name: name.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Page {
        items,
        entries: projects.len(),
        cursor: extract_cursor(body),
    })
}

pub fn parse_consumption_page(body: &Value) -> Result<Page<UsageRecord>> {
    let projects = field_array(body, "projects", "consumption response")?;
    let mut records = Vec::new();
    for project in projects {
        let project_id = field_str(project, "project_id", "consumption entry")?;
        let context = format!("consumption for project {project_id}");
        for period in field_array(project, "periods", &context)? {
            for bucket in field_array(period, "consumption", &context)? {
                let time_bucket =
                    parse_timestamp(field_str(bucket, "timeframe_start", &context)?)?;
                for sample in field_array(bucket, "metrics", &context)? {
                    records.push(parse_sample(project_id, time_bucket, sample)?);
                }
            }
        }
    }
    Ok(Page {
        items: records,
        entries: projects.len(),
        cursor: extract_cursor(body),
    })
}

fn parse_sample(
    project_id: &str,
    time_bucket: DateTime<Utc>,
    sample: &Value,
) -> Result<UsageRecord> {
    let name = field_str(sample, "metric_name", "metric sample")?;
    let wire = WireMetric::from_name(name).ok_or_else(|| {
        malformed(format!("unknown metric {name:?} for project {project_id}"))
    })?;
    let raw = sample.get("value").and_then(Value::as_f64).ok_or_else(|| {
        malformed(format!("metric {name} for project {project_id} has no value"))
    })?;
    if !raw.is_finite() || raw < 0.0 {
        return Err(malformed(format!(
            "metric {name} for project {project_id} has invalid value {raw}"
        )));
    }
    Ok(UsageRecord {
        project_id: project_id.to_string(),
        metric: wire.metric(),
        quantity: wire.to_billing_units(raw),
        time_bucket,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn consumption(metrics: Value) -> Value {
        json!({
            "projects": [{
                "project_id": "p1",
                "periods": [{
                    "period_plan": "launch",
                    "consumption": [{
                        "timeframe_start": "2026-10-01T00:00:00Z",
                        "timeframe_end": "2026-10-02T00:00:00Z",
                        "metrics": metrics
                    }]
                }]
            }]
        })
    }

    #[test]
    fn wire_names_all_resolve() {
        for name in WIRE_METRIC_NAMES {
            assert!(WireMetric::from_name(name).is_some(), "{name}");
        }
    }

    #[test]
    fn consumption_converts_to_billing_units() {
        let body = consumption(json!([
            {"metric_name": "compute_unit_seconds", "value": 7200},
            {"metric_name": "root_branch_bytes_month", "value": 1073741824u64},
            {"metric_name": "public_network_transfer_bytes", "value": 2147483648u64},
            {"metric_name": "extra_branches_month", "value": 1.5}
        ]));
        let page = parse_consumption_page(&body).expect("page");
        let quantities: Vec<(Metric, f64)> = page
            .items
            .iter()
            .map(|record| (record.metric, record.quantity))
            .collect();
        assert_eq!(
            quantities,
            vec![
                (Metric::Compute, 2.0),
                (Metric::Storage, 1.0),
                (Metric::TransferPublic, 2.0),
                (Metric::ExtraBranches, 1.5),
            ]
        );
        assert_eq!(page.items[0].project_id, "p1");
        assert_eq!(
            page.items[0].time_bucket.to_rfc3339(),
            "2026-10-01T00:00:00+00:00"
        );
        assert_eq!(page.cursor, None);
    }

    #[test]
    fn unknown_metric_is_malformed() {
        let body = consumption(json!([
            {"metric_name": "compute_unit_seconds", "value": 10},
            {"metric_name": "logical_size_bytes", "value": 10}
        ]));
        let err = parse_consumption_page(&body).expect_err("unknown metric");
        assert!(matches!(err, UsageError::MalformedResponse(ref message) if message.contains("logical_size_bytes")));
    }

    #[test]
    fn negative_value_is_malformed() {
        let body = consumption(json!([{"metric_name": "compute_unit_seconds", "value": -1}]));
        assert!(matches!(
            parse_consumption_page(&body),
            Err(UsageError::MalformedResponse(_))
        ));
    }

    #[test]
    fn missing_fields_are_malformed() {
        let no_value = consumption(json!([{"metric_name": "compute_unit_seconds"}]));
        assert!(parse_consumption_page(&no_value).is_err());

        let no_project = json!({"projects": [{"periods": []}]});
        assert!(parse_consumption_page(&no_project).is_err());

        let bad_time = json!({"projects": [{"project_id": "p1", "periods": [{"consumption": [
            {"timeframe_start": "yesterday", "metrics": []}
        ]}]}]});
        assert!(parse_consumption_page(&bad_time).is_err());

        assert!(parse_consumption_page(&json!({})).is_err());
    }

    #[test]
    fn projects_page_reads_cursor_and_defaults_name() {
        let body = json!({
            "projects": [
                {"id": "p1", "name": "billing-api"},
                {"id": "p2", "name": ""}
            ],
            "pagination": {"cursor": "p2"}
        });
        let page = parse_projects_page(&body).expect("page");
        assert_eq!(
            page.items,
            vec![
                ProjectRef {
                    id: "p1".to_string(),
                    name: "billing-api".to_string()
                },
                ProjectRef {
                    id: "p2".to_string(),
                    name: "p2".to_string()
                },
            ]
        );
        assert_eq!(page.entries, 2);
        assert_eq!(page.cursor.as_deref(), Some("p2"));
    }
}
