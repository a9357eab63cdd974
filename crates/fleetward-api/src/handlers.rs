//! Route handlers, grouped by resource.

pub mod auth;
pub mod devices;
pub mod health;
pub mod sessions;
pub mod stats;

use axum::http::HeaderName;
use serde::Deserialize;

pub(crate) const TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

/// 1-based page selection shared by list endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}
