use serde::{Deserialize, Serialize};

/// A live project as listed by the projects endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Top-level entries on the page, which is what the API's `limit` counts.
    pub entries: usize,
    pub cursor: Option<String>,
}
