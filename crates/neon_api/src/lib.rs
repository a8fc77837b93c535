//! Thin async client for the Neon v2 API: the live project list and the
//! consumption history the usage report is built from.

mod client;
mod error;
mod validate;

pub use client::NeonClient;
pub use error::{ApiError, Result};
pub use validate::validate_org_id;
