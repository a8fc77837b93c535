use chrono::{DateTime, Utc};
use ingest::ProjectRef;
use usage_core::{PricingTable, TimeWindow, UsageRecord, UsageReport};

use crate::config::{self, ConfigSources, Settings};
use crate::error::Result;
use crate::pricing;
use crate::report::{self, ReportOptions};
use crate::util::time;

/// Resolved settings and pricing shared by the CLI for one run.
#[derive(Clone, Debug)]
pub struct AppState {
    pub settings: Settings,
    pub pricing: PricingTable,
}

impl AppState {
    pub fn new(settings: Settings, pricing: PricingTable) -> Self {
        Self { settings, pricing }
    }

    pub fn load(sources: &ConfigSources) -> Result<Self> {
        let settings = config::resolve(sources)?;
        let pricing = pricing::resolve_pricing(settings.pricing_path.as_deref())?;
        Ok(Self::new(settings, pricing))
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            granularity: self.settings.granularity,
            active_only: self.settings.active_only,
        }
    }

    pub fn consumption_window(&self, now: DateTime<Utc>) -> Result<TimeWindow> {
        time::consumption_window(now, self.settings.granularity)
    }

    pub fn build_report(
        &self,
        live: &[ProjectRef],
        records: &[UsageRecord],
        now: DateTime<Utc>,
    ) -> Result<UsageReport> {
        report::build_report(live, records, self.report_options(), &self.pricing, now)
    }
}
