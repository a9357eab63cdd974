//! Session domain model.
//!
//! A session records one remote-access connection between a user and
//! a device. It starts unauthenticated, is flipped to authenticated by
//! the connection broker once credentials check out, and is finished
//! when the connection closes. Finished sessions are kept for history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub tenant_id: String,
    pub device_uid: String,
    pub username: String,
    pub ip_address: Option<String>,
    pub authenticated: bool,
    pub started_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Derived from `finished_at`; kept in the JSON for clients.
    #[serde(default)]
    pub active: bool,
}

impl Session {
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

/// Body of `POST /internal/sessions`.
///
/// Brokers send `authenticated: false` alongside the descriptor; the
/// field is accepted for that reason but may not be `true`. Only
/// `PATCH /internal/sessions/{uid}` authenticates a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSession {
    pub uid: String,
    pub device_uid: String,
    pub username: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub authenticated: bool,
}

/// Storage input: the descriptor plus the tenant copied from the device.
/// New sessions are always stored unauthenticated.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub uid: String,
    pub tenant_id: String,
    pub device_uid: String,
    pub username: String,
    pub ip_address: Option<String>,
}

/// Body of `PATCH /internal/sessions/{uid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetSessionAuthenticated {
    pub authenticated: bool,
}
