//! Device domain model.
//!
//! A device is enrolled into a tenant the first time it authenticates
//! with an identity the registry has not seen before. Its uid is a pure
//! function of the tenant and the identity, so re-authenticating never
//! mints a second record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::FleetError;

/// Maximum length of a device name.
pub const MAX_DEVICE_NAME_LEN: usize = 64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Pending,
    Accepted,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Pending => "pending",
            DeviceStatus::Accepted => "accepted",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeviceStatus::Pending),
            "accepted" => Ok(DeviceStatus::Accepted),
            other => Err(FleetError::validation(format!(
                "unknown device status: {other}"
            ))),
        }
    }
}

/// Hardware identity asserted by the device agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeviceIdentity {
    pub mac: String,
}

/// Operating-system information reported by the device agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeviceInfo {
    pub id: String,
    pub pretty_name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub uid: String,
    pub tenant_id: String,
    pub name: String,
    /// Username of the tenant owner.
    pub namespace: String,
    pub identity: DeviceIdentity,
    pub info: DeviceInfo,
    pub public_key: String,
    pub status: DeviceStatus,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/devices/auth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceAuthRequest {
    pub info: DeviceInfo,
    pub tenant_id: String,
    pub identity: DeviceIdentity,
    pub public_key: String,
}

/// Fields written when a device enrolls (or re-authenticates).
#[derive(Debug, Clone)]
pub struct EnrollDevice {
    pub uid: String,
    pub tenant_id: String,
    pub name: String,
    pub namespace: String,
    pub identity: DeviceIdentity,
    pub info: DeviceInfo,
    pub public_key: String,
}

/// Result of a get-or-create enrollment.
#[derive(Debug, Clone)]
pub struct Enrollment {
    pub device: Device,
    /// `true` when this call created the record.
    pub created: bool,
}

/// Optional filters for device listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceFilter {
    pub status: Option<DeviceStatus>,
}

/// Derive the stable device uid: hex SHA-256 over the tenant id and the
/// MAC address, separated by a NUL byte.
pub fn derive_uid(tenant_id: &str, identity: &DeviceIdentity) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tenant_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(identity.mac.as_bytes());
    hex::encode(hasher.finalize())
}

/// Name given to a freshly enrolled device.
pub fn default_name(identity: &DeviceIdentity) -> String {
    identity.mac.replace(':', "-")
}

/// Trim a device name supplied by a caller. Any text is accepted as long
/// as it is non-empty and at most [`MAX_DEVICE_NAME_LEN`] characters.
pub fn normalize_name(name: &str) -> Result<String, FleetError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FleetError::validation("device name must not be empty"));
    }
    if name.chars().count() > MAX_DEVICE_NAME_LEN {
        return Err(FleetError::validation(format!(
            "device name must be at most {MAX_DEVICE_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}
