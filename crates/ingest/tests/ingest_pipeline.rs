use ingest::{aggregate_usage, classify_projects, parse_consumption_page, parse_projects_page};
use serde_json::json;
use usage_core::{Granularity, Metric, ProjectStatus, UsageError};

fn projects_body() -> serde_json::Value {
    json!({
        "projects": [
            {"id": "p-live", "name": "storefront"},
            {"id": "p-idle", "name": "sandbox"}
        ],
        "pagination": {"cursor": "p-idle"}
    })
}

fn consumption_body() -> serde_json::Value {
    json!({
        "projects": [
            {
                "project_id": "p-live",
                "periods": [{
                    "consumption": [
                        {
                            "timeframe_start": "2026-10-01T00:00:00Z",
                            "metrics": [
                                {"metric_name": "compute_unit_seconds", "value": 3600},
                                {"metric_name": "root_branch_bytes_month", "value": 536870912u64},
                                {"metric_name": "child_branch_bytes_month", "value": 536870912u64}
                            ]
                        },
                        {
                            "timeframe_start": "2026-10-02T00:00:00Z",
                            "metrics": [
                                {"metric_name": "compute_unit_seconds", "value": 1800}
                            ]
                        }
                    ]
                }]
            },
            {
                "project_id": "p-removed",
                "periods": [{
                    "consumption": [{
                        "timeframe_start": "2026-10-01T00:00:00Z",
                        "metrics": [
                            {"metric_name": "public_network_transfer_bytes", "value": 1073741824u64}
                        ]
                    }]
                }]
            }
        ]
    })
}

#[test]
fn pages_classify_and_aggregate_across_projects() {
    let live = parse_projects_page(&projects_body()).expect("projects").items;
    let records = parse_consumption_page(&consumption_body())
        .expect("consumption")
        .items;

    let projects = classify_projects(&live, &records, false);
    assert_eq!(projects.len(), 3);
    assert_eq!(projects[2].id, "p-removed");
    assert_eq!(projects[2].status, ProjectStatus::Deleted);

    let aggregate = aggregate_usage(&projects, &records, Granularity::Daily).expect("aggregate");
    let storefront = &aggregate.projects[0].usage;
    assert_eq!(storefront.get(Metric::Compute), 1.5);
    assert_eq!(storefront.get(Metric::Storage), 1.0);
    assert!(aggregate.projects[1].usage.is_empty());
    assert_eq!(aggregate.account.get(Metric::TransferPublic), 1.0);
}

#[test]
fn active_only_removes_deleted_usage_from_account() {
    let live = parse_projects_page(&projects_body()).expect("projects").items;
    let records = parse_consumption_page(&consumption_body())
        .expect("consumption")
        .items;

    let projects = classify_projects(&live, &records, true);
    let aggregate = aggregate_usage(&projects, &records, Granularity::Daily).expect("aggregate");
    assert_eq!(aggregate.projects.len(), 2);
    assert!(!aggregate.account.contains(Metric::TransferPublic));
}

#[test]
fn unknown_metric_stops_the_pipeline() {
    let body = json!({
        "projects": [{
            "project_id": "p-live",
            "periods": [{"consumption": [{
                "timeframe_start": "2026-10-01T00:00:00Z",
                "metrics": [{"metric_name": "data_storage_bytes_hour", "value": 1}]
            }]}]
        }]
    });
    let err = parse_consumption_page(&body).expect_err("unknown metric");
    assert!(matches!(err, UsageError::MalformedResponse(_)));
}
