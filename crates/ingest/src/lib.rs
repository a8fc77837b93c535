mod lifecycle;
mod parser;
mod totals;
mod types;

pub use lifecycle::classify_projects;
pub use parser::{
    WIRE_METRIC_NAMES, WireMetric, parse_consumption_page, parse_projects_page,
};
pub use totals::aggregate_usage;
pub use types::{Page, ProjectRef};
