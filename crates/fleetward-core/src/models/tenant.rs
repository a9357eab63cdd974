//! Tenant domain model.
//!
//! A tenant is the isolation boundary for one organization's users,
//! devices and sessions. Tenant ids are opaque strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Username of the owning user; used as the namespace of every
    /// device enrolled into this tenant.
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub id: String,
    pub name: String,
    pub owner: String,
}
