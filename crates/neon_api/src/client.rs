use std::time::Duration;

use chrono::SecondsFormat;
use ingest::{Page, ProjectRef, WIRE_METRIC_NAMES, parse_consumption_page, parse_projects_page};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, info};
use usage_core::{Granularity, TimeWindow, UsageRecord};

use crate::error::{ApiError, Result};
use crate::validate::validate_org_id;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PROJECTS_PAGE_LIMIT: usize = 400;
const CONSUMPTION_PAGE_LIMIT: usize = 100;

/// Neon API client scoped to one account (personal or organization).
#[derive(Debug, Clone)]
pub struct NeonClient {
    http: reqwest::Client,
    base_url: String,
    org_id: Option<String>,
    projects_page_limit: usize,
    consumption_page_limit: usize,
}

impl NeonClient {
    pub fn new(api_key: &str, base_url: &str, org_id: Option<&str>) -> Result<Self> {
        if let Some(org_id) = org_id {
            validate_org_id(org_id)?;
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| ApiError::Client("API key contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ApiError::Client(format!("build http client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            org_id: org_id.map(str::to_string),
            projects_page_limit: PROJECTS_PAGE_LIMIT,
            consumption_page_limit: CONSUMPTION_PAGE_LIMIT,
        })
    }

    pub fn with_page_limits(mut self, projects: usize, consumption: usize) -> Self {
        self.projects_page_limit = projects.max(1);
        self.consumption_page_limit = consumption.max(1);
        self
    }

    /// Live (non-deleted) projects, across all pages.
    pub async fn fetch_projects(&self) -> Result<Vec<ProjectRef>> {
        let limit = self.projects_page_limit;
        let params = vec![("limit", limit.to_string())];
        let projects = self
            .collect_pages("projects", params, limit, parse_projects_page)
            .await?;
        info!(count = projects.len(), "fetched projects");
        Ok(projects)
    }

    /// Consumption records for every project billed in `window`, deleted
    /// projects included.
    pub async fn fetch_consumption(
        &self,
        window: &TimeWindow,
        granularity: Granularity,
    ) -> Result<Vec<UsageRecord>> {
        let limit = self.consumption_page_limit;
        let params = vec![
            ("from", window.from.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("to", window.to.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("granularity", granularity.as_str().to_string()),
            ("metrics", WIRE_METRIC_NAMES.join(",")),
            ("limit", limit.to_string()),
        ];
        let records = self
            .collect_pages(
                "consumption_history/v2/projects",
                params,
                limit,
                parse_consumption_page,
            )
            .await?;
        info!(
            count = records.len(),
            granularity = granularity.as_str(),
            "fetched consumption records"
        );
        Ok(records)
    }

    async fn collect_pages<T, F>(
        &self,
        endpoint: &str,
        base_params: Vec<(&'static str, String)>,
        limit: usize,
        parse: F,
    ) -> Result<Vec<T>>
    where
        F: Fn(&Value) -> usage_core::Result<Page<T>>,
    {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut params = base_params.clone();
            if let Some(org_id) = &self.org_id {
                params.push(("org_id", org_id.clone()));
            }
            if let Some(cursor) = &cursor {
                params.push(("cursor", cursor.clone()));
            }

            let body = self.get_json(endpoint, &params).await?;
            let page = parse(&body)?;
            debug!(endpoint, entries = page.entries, "fetched page");
            items.extend(page.items);

            // A short page is the last one; an unchanged cursor would loop forever.
            match page.cursor {
                Some(next) if page.entries >= limit && cursor.as_deref() != Some(next.as_str()) => {
                    cursor = Some(next);
                }
                _ => break,
            }
        }
        Ok(items)
    }

    async fn get_json(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(ApiError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status, endpoint));
        }

        let bytes = response.bytes().await.map_err(ApiError::Network)?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        })
    }
}
