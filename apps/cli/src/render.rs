use std::fmt;

use usage_core::{CostBreakdown, CostLine, Metric, ProjectCost, UsageReport};

const WIDTH: usize = 60;

/// Plain-text layout of a report.
pub struct TextReport<'a>(pub &'a UsageReport);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "\nNeon Usage Report - {}", report.period.label)?;
        writeln!(
            f,
            "Generated: {}",
            report.generated_at.format("%Y-%m-%d %H:%M UTC")
        )?;
        writeln!(
            f,
            "Day {} of {} ({:.1}% of month), {} consumption buckets",
            report.period.day,
            report.period.days_in_month,
            report.period.progress_percent,
            report.granularity.as_str()
        )?;
        if report.active_only {
            writeln!(f, "Projects deleted this month are excluded.")?;
        }
        separator(f, '=')?;

        section(f, "PER-PROJECT USAGE")?;
        if report.current.projects.is_empty() {
            writeln!(f, "\nNo projects found.")?;
        }
        for (current, forecast) in report
            .current
            .projects
            .iter()
            .zip(report.forecast.projects.iter())
        {
            write_project(f, current, forecast)?;
        }

        section(f, "CURRENT USAGE (Month-to-Date)")?;
        for (line, cost) in &report.current.account.lines {
            writeln!(f, "\n{}:", line_label(*line))?;
            writeln!(
                f,
                "  Usage:     {} {}",
                format_number(cost.quantity, 2),
                line.unit()
            )?;
            if *line == CostLine::Transfer {
                for (metric, label) in [
                    (Metric::TransferPublic, "Public"),
                    (Metric::TransferPrivate, "Private"),
                ] {
                    if report.usage.contains(metric) {
                        writeln!(
                            f,
                            "  {:<11}{} GB",
                            format!("{label}:"),
                            format_number(report.usage.get(metric), 2)
                        )?;
                    }
                }
                writeln!(f, "  Included:  {} GB", format_number(cost.included, 2))?;
                writeln!(f, "  Billable:  {} GB", format_number(cost.billable, 2))?;
            }
            writeln!(f, "  Cost:      {}", format_currency(cost.cost_usd))?;
        }
        separator(f, '-')?;
        writeln!(f, "\nCURRENT TOTAL (Month-to-Date)")?;
        write_totals(f, &report.current.account)?;

        section(f, "FORECAST (End of Month)")?;
        writeln!(f)?;
        for (line, cost) in &report.forecast.account.lines {
            writeln!(
                f,
                "{:<16}{} ({} {})",
                format!("{}:", line_label(*line)),
                format_currency(cost.cost_usd),
                format_number(cost.quantity, 2),
                line.unit()
            )?;
        }
        separator(f, '-')?;
        writeln!(f, "\nFORECAST TOTAL")?;
        write_totals(f, &report.forecast.account)?;

        separator(f, '=')?;
        writeln!(f, "\nPricing based on Neon {} plan", report.pricing.plan)?;
        for (line, rate) in &report.pricing.rates {
            writeln!(f, "  {}: ${}/{}", line_label(*line), rate, line.unit())?;
        }
        writeln!(
            f,
            "  Transfer free tier: {} GB per month, shared across projects",
            report.pricing.transfer_free_tier_gb
        )?;
        writeln!(
            f,
            "  Minimum monthly charge: {}",
            format_currency(report.pricing.minimum_charge)
        )
    }
}

fn write_project(
    f: &mut fmt::Formatter<'_>,
    current: &ProjectCost,
    forecast: &ProjectCost,
) -> fmt::Result {
    let tag = if current.project.is_deleted() {
        " [deleted]"
    } else {
        ""
    };
    writeln!(
        f,
        "\n{} ({}){}",
        current.project.name,
        short_id(&current.project.id),
        tag
    )?;
    for (line, cost) in &current.cost.lines {
        writeln!(
            f,
            "  {:<16}{} {}",
            format!("{}:", line_label(*line)),
            format_number(cost.quantity, 2),
            line.unit()
        )?;
    }
    writeln!(f, "  Cost:           {}", format_currency(current.cost.total_usd))?;
    writeln!(f, "  Forecast:       {}", format_currency(forecast.cost.total_usd))
}

fn write_totals(f: &mut fmt::Formatter<'_>, breakdown: &CostBreakdown) -> fmt::Result {
    writeln!(f, "  Subtotal:  {}", format_currency(breakdown.subtotal_usd))?;
    writeln!(f, "  Minimum:   {}", format_currency(breakdown.minimum_charge_usd))?;
    writeln!(f, "  TOTAL:     {}", format_currency(breakdown.total_usd))
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    separator(f, '-')?;
    writeln!(f, "\n{title}")?;
    separator(f, '-')
}

fn separator(f: &mut fmt::Formatter<'_>, ch: char) -> fmt::Result {
    writeln!(f, "{}", ch.to_string().repeat(WIDTH))
}

fn line_label(line: CostLine) -> &'static str {
    match line {
        CostLine::Compute => "Compute",
        CostLine::Storage => "Storage",
        CostLine::InstantRestore => "Instant Restore",
        CostLine::Transfer => "Data Transfer",
        CostLine::ExtraBranches => "Extra Branches",
    }
}

fn short_id(id: &str) -> String {
    match id.char_indices().nth(8) {
        Some((index, _)) => format!("{}...", &id[..index]),
        None => id.to_string(),
    }
}

pub fn format_currency(amount: f64) -> String {
    format!("${}", format_number(amount, 2))
}

/// Fixed decimals with comma thousands separators.
pub fn format_number(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match formatted.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (formatted.as_str(), None),
    };
    let mut grouped = String::with_capacity(formatted.len() + integer.len() / 3 + 1);
    if value < 0.0 && formatted.chars().any(|ch| ch != '0' && ch != '.') {
        grouped.push('-');
    }
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}
