/// Terminal errors for a report run. No partial report is produced once one
/// of these is raised.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("pricing config error: {0}")]
    PricingConfig(String),
}

pub type Result<T> = std::result::Result<T, UsageError>;
