use std::collections::BTreeMap;

use crate::{
    CostAttribution, CostBreakdown, CostLine, LineCost, PricingTable, ProjectCost, ProjectUsage,
    Result, UsageError, UsageTotals,
};

/// Share of the org-wide transfer free tier a project is entitled to.
///
/// The share is proportional to the project's part of total transfer and
/// never exceeds the project's own usage, so the shares add up to
/// `min(total_transfer, free_tier_gb)`.
pub fn transfer_allowance(project_transfer: f64, total_transfer: f64, free_tier_gb: f64) -> f64 {
    if total_transfer <= 0.0 || project_transfer <= 0.0 {
        return 0.0;
    }
    project_transfer.min(project_transfer * free_tier_gb / total_transfer)
}

/// Prices a single set of totals given the transfer allowance it may use.
pub fn cost_breakdown(
    usage: &UsageTotals,
    transfer_allowance_gb: f64,
    pricing: &PricingTable,
    minimum_charge_usd: f64,
) -> Result<CostBreakdown> {
    validate_usage(usage)?;
    let mut lines = BTreeMap::new();
    for line in CostLine::ALL {
        if !usage.observes_line(line) {
            continue;
        }
        let rate = pricing.rate(line)?;
        let quantity = usage.line_quantity(line);
        let included = match line {
            CostLine::Transfer => transfer_allowance_gb.max(0.0).min(quantity),
            _ => 0.0,
        };
        let billable = (quantity - included).max(0.0);
        lines.insert(
            line,
            LineCost {
                quantity,
                included,
                billable,
                cost_usd: billable * rate,
            },
        );
    }
    Ok(CostBreakdown::from_lines(lines, minimum_charge_usd))
}

/// Prices every project and sums them into the account breakdown.
///
/// Project breakdowns carry no minimum charge; the floor applies to the
/// account total only.
pub fn attribute_costs(
    projects: &[ProjectUsage],
    pricing: &PricingTable,
) -> Result<CostAttribution> {
    pricing.validate()?;

    let mut account_usage = UsageTotals::default();
    for entry in projects {
        account_usage.merge(&entry.usage);
    }
    let total_transfer = account_usage.line_quantity(CostLine::Transfer);

    let mut account_lines: BTreeMap<CostLine, LineCost> = BTreeMap::new();
    let mut subtotal_usd = 0.0;
    let mut costs = Vec::with_capacity(projects.len());
    for entry in projects {
        let allowance = transfer_allowance(
            entry.usage.line_quantity(CostLine::Transfer),
            total_transfer,
            pricing.transfer_free_tier_gb,
        );
        let cost = cost_breakdown(&entry.usage, allowance, pricing, 0.0)?;
        for (line, value) in &cost.lines {
            account_lines.entry(*line).or_default().accumulate(value);
        }
        subtotal_usd += cost.subtotal_usd;
        costs.push(ProjectCost {
            project: entry.project.clone(),
            usage: entry.usage.clone(),
            cost,
        });
    }

    Ok(CostAttribution {
        projects: costs,
        account: CostBreakdown::with_subtotal(account_lines, subtotal_usd, pricing.minimum_charge),
    })
}

fn validate_usage(usage: &UsageTotals) -> Result<()> {
    for (metric, quantity) in usage.iter() {
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(UsageError::MalformedResponse(format!(
                "invalid {} quantity: {}",
                metric.as_str(),
                quantity
            )));
        }
    }
    Ok(())
}
