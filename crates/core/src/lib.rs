use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod cost;
mod error;
mod forecast;

pub use cost::{attribute_costs, cost_breakdown, transfer_allowance};
pub use error::{Result, UsageError};
pub use forecast::{forecast_quantity, forecast_usage, project_forecast};

pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Billable usage dimensions reported by the consumption API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Compute,
    Storage,
    InstantRestore,
    TransferPublic,
    TransferPrivate,
    ExtraBranches,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Compute,
        Metric::Storage,
        Metric::InstantRestore,
        Metric::TransferPublic,
        Metric::TransferPrivate,
        Metric::ExtraBranches,
    ];

    pub fn kind(self) -> MetricKind {
        match self {
            Self::Compute | Self::TransferPublic | Self::TransferPrivate => MetricKind::Cumulative,
            Self::Storage | Self::InstantRestore | Self::ExtraBranches => MetricKind::PointInTime,
        }
    }

    pub fn cost_line(self) -> CostLine {
        match self {
            Self::Compute => CostLine::Compute,
            Self::Storage => CostLine::Storage,
            Self::InstantRestore => CostLine::InstantRestore,
            Self::TransferPublic | Self::TransferPrivate => CostLine::Transfer,
            Self::ExtraBranches => CostLine::ExtraBranches,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Storage => "storage",
            Self::InstantRestore => "instant_restore",
            Self::TransferPublic => "transfer_public",
            Self::TransferPrivate => "transfer_private",
            Self::ExtraBranches => "extra_branches",
        }
    }
}

/// How a metric behaves over a billing month.
///
/// Cumulative metrics only grow, so the amount so far is a lower bound on the
/// month-end amount. Point-in-time metrics are snapshots of a gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Cumulative,
    PointInTime,
}

/// A priced line on the bill. Public and private transfer share one line
/// and one free-tier allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostLine {
    Compute,
    Storage,
    InstantRestore,
    Transfer,
    ExtraBranches,
}

impl CostLine {
    pub const ALL: [CostLine; 5] = [
        CostLine::Compute,
        CostLine::Storage,
        CostLine::InstantRestore,
        CostLine::Transfer,
        CostLine::ExtraBranches,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Storage => "storage",
            Self::InstantRestore => "instant_restore",
            Self::Transfer => "transfer",
            Self::ExtraBranches => "extra_branches",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Compute => "CU-hours",
            Self::Storage | Self::InstantRestore => "GB-month",
            Self::Transfer => "GB",
            Self::ExtraBranches => "branch-months",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Hourly,
    #[default]
    Daily,
    Monthly,
}

impl Granularity {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub status: ProjectStatus,
}

impl Project {
    pub fn is_deleted(&self) -> bool {
        self.status == ProjectStatus::Deleted
    }
}

/// One metric sample for one project and one time bucket, already converted
/// to its billing unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub project_id: String,
    pub metric: Metric,
    pub quantity: f64,
    pub time_bucket: DateTime<Utc>,
}

/// Per-metric quantities. Metrics never observed have no entry, which keeps
/// "absent from the data" apart from "observed as zero".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageTotals {
    quantities: BTreeMap<Metric, f64>,
}

impl UsageTotals {
    pub fn get(&self, metric: Metric) -> f64 {
        self.quantities.get(&metric).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, metric: Metric) -> bool {
        self.quantities.contains_key(&metric)
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    pub fn add(&mut self, metric: Metric, quantity: f64) {
        *self.quantities.entry(metric).or_insert(0.0) += quantity;
    }

    pub fn merge(&mut self, other: &UsageTotals) {
        for (metric, quantity) in other.iter() {
            self.add(metric, quantity);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.quantities
            .iter()
            .map(|(metric, quantity)| (*metric, *quantity))
    }

    pub fn observes_line(&self, line: CostLine) -> bool {
        self.quantities
            .keys()
            .any(|metric| metric.cost_line() == line)
    }

    pub fn line_quantity(&self, line: CostLine) -> f64 {
        self.iter()
            .filter(|(metric, _)| metric.cost_line() == line)
            .map(|(_, quantity)| quantity)
            .sum()
    }
}

impl FromIterator<(Metric, f64)> for UsageTotals {
    fn from_iter<I: IntoIterator<Item = (Metric, f64)>>(iter: I) -> Self {
        let mut totals = UsageTotals::default();
        for (metric, quantity) in iter {
            totals.add(metric, quantity);
        }
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectUsage {
    pub project: Project,
    pub usage: UsageTotals,
}

/// Output of aggregation: per-project totals and their account-wide sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageAggregate {
    pub granularity: Granularity,
    pub projects: Vec<ProjectUsage>,
    pub account: UsageTotals,
}

/// Share of the billing month that has passed, in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElapsedFraction(f64);

impl ElapsedFraction {
    pub const COMPLETE: ElapsedFraction = ElapsedFraction(1.0);

    /// `day` is the 1-based day of the month, counted as elapsed.
    pub fn from_day(day: u32, days_in_month: u32) -> Self {
        let days_in_month = days_in_month.max(1);
        let day = day.clamp(1, days_in_month);
        Self(f64::from(day) / f64::from(days_in_month))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Fixed price list for one plan tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    pub plan: String,
    pub rates: BTreeMap<CostLine, f64>,
    pub transfer_free_tier_gb: f64,
    pub minimum_charge: f64,
}

impl PricingTable {
    pub fn rate(&self, line: CostLine) -> Result<f64> {
        self.rates.get(&line).copied().ok_or_else(|| {
            UsageError::PricingConfig(format!(
                "no rate configured for {} on plan {}",
                line.as_str(),
                self.plan
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        for (line, rate) in &self.rates {
            if !rate.is_finite() || *rate < 0.0 {
                return Err(UsageError::PricingConfig(format!(
                    "invalid rate for {}: {}",
                    line.as_str(),
                    rate
                )));
            }
        }
        if !self.transfer_free_tier_gb.is_finite() || self.transfer_free_tier_gb < 0.0 {
            return Err(UsageError::PricingConfig(format!(
                "invalid transfer free tier: {}",
                self.transfer_free_tier_gb
            )));
        }
        if !self.minimum_charge.is_finite() || self.minimum_charge < 0.0 {
            return Err(UsageError::PricingConfig(format!(
                "invalid minimum charge: {}",
                self.minimum_charge
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LineCost {
    pub quantity: f64,
    pub included: f64,
    pub billable: f64,
    pub cost_usd: f64,
}

impl LineCost {
    fn accumulate(&mut self, other: &LineCost) {
        self.quantity += other.quantity;
        self.included += other.included;
        self.billable += other.billable;
        self.cost_usd += other.cost_usd;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub lines: BTreeMap<CostLine, LineCost>,
    pub subtotal_usd: f64,
    pub minimum_charge_usd: f64,
    pub total_usd: f64,
}

impl CostBreakdown {
    pub fn from_lines(lines: BTreeMap<CostLine, LineCost>, minimum_charge_usd: f64) -> Self {
        let subtotal_usd = lines.values().map(|line| line.cost_usd).sum();
        Self::with_subtotal(lines, subtotal_usd, minimum_charge_usd)
    }

    pub(crate) fn with_subtotal(
        lines: BTreeMap<CostLine, LineCost>,
        subtotal_usd: f64,
        minimum_charge_usd: f64,
    ) -> Self {
        Self {
            lines,
            subtotal_usd,
            minimum_charge_usd,
            total_usd: subtotal_usd.max(minimum_charge_usd),
        }
    }

    pub fn line(&self, line: CostLine) -> Option<&LineCost> {
        self.lines.get(&line)
    }

    pub fn cost(&self, line: CostLine) -> f64 {
        self.line(line).map(|value| value.cost_usd).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCost {
    pub project: Project,
    pub usage: UsageTotals,
    pub cost: CostBreakdown,
}

/// Current month-to-date costs per project and for the whole account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAttribution {
    pub projects: Vec<ProjectCost>,
    pub account: CostBreakdown,
}

/// Projected month-end costs. Same shape as [`CostAttribution`], priced at
/// forecast quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub elapsed: ElapsedFraction,
    pub projects: Vec<ProjectCost>,
    pub account: CostBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub day: u32,
    pub days_in_month: u32,
    /// Elapsed share of the month as a percentage, one decimal.
    pub progress_percent: f64,
}

impl BillingPeriod {
    pub fn new(year: i32, month: u32, label: String, day: u32, days_in_month: u32) -> Self {
        let elapsed = ElapsedFraction::from_day(day, days_in_month);
        Self {
            year,
            month,
            label,
            day,
            days_in_month,
            progress_percent: (elapsed.value() * 1000.0).round() / 10.0,
        }
    }

    pub fn elapsed(&self) -> ElapsedFraction {
        ElapsedFraction::from_day(self.day, self.days_in_month)
    }
}

/// Everything the renderer needs, fully populated regardless of output mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub generated_at: DateTime<Utc>,
    pub period: BillingPeriod,
    pub granularity: Granularity,
    pub elapsed: ElapsedFraction,
    pub active_only: bool,
    /// Account-wide usage before pricing; transfer stays split by network.
    pub usage: UsageTotals,
    pub current: CostAttribution,
    pub forecast: ForecastResult,
    pub pricing: PricingTable,
}
