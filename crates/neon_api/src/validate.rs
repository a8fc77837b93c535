use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ApiError, Result};

static ORG_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^org-[a-zA-Z0-9-]{1,64}$").expect("valid org id pattern"));

pub fn validate_org_id(value: &str) -> Result<&str> {
    if ORG_ID_PATTERN.is_match(value) {
        Ok(value)
    } else {
        Err(ApiError::InvalidIdentifier {
            kind: "org_id (expected 'org-...')",
            value: value.to_string(),
        })
    }
}
