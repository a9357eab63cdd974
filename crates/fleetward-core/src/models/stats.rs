//! Per-tenant aggregate counters served by `GET /api/stats`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stats {
    /// Devices in `accepted` status.
    pub registered_devices: u64,
    pub pending_devices: u64,
    /// Accepted devices seen within the online window.
    pub online_devices: u64,
    /// Sessions that have not been finished.
    pub active_sessions: u64,
}
