//! Device registry: lookup, listing, renaming, approval and removal.

use chrono::{Duration, Utc};
use tracing::{debug, info};

use crate::error::{FleetError, FleetResult};
use crate::models::device::{Device, DeviceFilter, DeviceStatus, normalize_name};
use crate::models::stats::Stats;
use crate::repository::{DeviceRepository, PaginatedResult, Pagination, SessionRepository};
use crate::sync::{KeyedLocks, device_key, device_name_key};

use super::ensure_tenant;

/// Tunables for the device registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// A device counts as online when it authenticated within this many
    /// seconds (default: 120).
    pub online_window_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            online_window_secs: 120,
        }
    }
}

impl RegistryConfig {
    /// The online window as a duration, or `None` when it does not fit.
    pub fn online_window(&self) -> Option<Duration> {
        i64::try_from(self.online_window_secs)
            .ok()
            .and_then(Duration::try_seconds)
    }
}

/// Tenant-scoped device registry.
pub struct DeviceService<D: DeviceRepository, S: SessionRepository> {
    devices: D,
    sessions: S,
    locks: KeyedLocks,
    config: RegistryConfig,
}

impl<D: DeviceRepository, S: SessionRepository> DeviceService<D, S> {
    pub fn new(devices: D, sessions: S, config: RegistryConfig) -> Self {
        Self {
            devices,
            sessions,
            locks: KeyedLocks::new(),
            config,
        }
    }

    /// Share a lock registry with other components mutating devices.
    pub fn with_locks(mut self, locks: KeyedLocks) -> Self {
        self.locks = locks;
        self
    }

    pub async fn get(&self, tenant_id: &str, uid: &str) -> FleetResult<Device> {
        let device = self.devices.get_by_uid(uid).await?;
        ensure_tenant(&device.tenant_id, tenant_id)?;
        Ok(device)
    }

    pub async fn list(
        &self,
        tenant_id: &str,
        filter: DeviceFilter,
        pagination: Pagination,
    ) -> FleetResult<PaginatedResult<Device>> {
        self.devices.list(tenant_id, filter, pagination).await
    }

    /// Rename a device. Names are unique within a tenant.
    pub async fn rename(&self, tenant_id: &str, uid: &str, name: &str) -> FleetResult<Device> {
        let name = normalize_name(name)?;

        let _device_guard = self.locks.lock(&device_key(uid)).await;
        let device = self.get(tenant_id, uid).await?;
        if device.name == name {
            return Ok(device);
        }

        let _name_guard = self.locks.lock(&device_name_key(tenant_id, &name)).await;
        if let Some(other) = self.devices.find_by_name(tenant_id, &name).await?
            && other.uid != uid
        {
            return Err(FleetError::conflict(format!(
                "device name '{name}' is already in use"
            )));
        }

        let renamed = self.devices.rename(tenant_id, uid, &name).await?;
        info!(uid = %uid, old = %device.name, new = %renamed.name, "Device renamed");
        Ok(renamed)
    }

    /// Approve a pending device. Accepting an accepted device is a no-op.
    pub async fn accept(&self, tenant_id: &str, uid: &str) -> FleetResult<Device> {
        let _guard = self.locks.lock(&device_key(uid)).await;
        let device = self.get(tenant_id, uid).await?;
        if device.status == DeviceStatus::Accepted {
            debug!(uid = %uid, "Device already accepted");
            return Ok(device);
        }

        let accepted = self
            .devices
            .set_status(tenant_id, uid, DeviceStatus::Accepted)
            .await?;
        info!(uid = %uid, tenant_id = %tenant_id, "Device accepted");
        Ok(accepted)
    }

    /// Finish the device's live sessions, then remove it. A failure while
    /// finishing leaves the device in place.
    pub async fn delete(&self, tenant_id: &str, uid: &str) -> FleetResult<()> {
        let _guard = self.locks.lock(&device_key(uid)).await;
        self.get(tenant_id, uid).await?;

        let closed = self.sessions.finish_device_sessions(tenant_id, uid).await?;
        self.devices.delete(tenant_id, uid).await?;
        info!(uid = %uid, closed_sessions = closed, "Device deleted");
        Ok(())
    }

    pub async fn stats(&self, tenant_id: &str) -> FleetResult<Stats> {
        let since = self
            .config
            .online_window()
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| {
                FleetError::Internal(format!(
                    "online window of {}s is out of range",
                    self.config.online_window_secs
                ))
            })?;

        Ok(Stats {
            registered_devices: self
                .devices
                .count_by_status(tenant_id, DeviceStatus::Accepted)
                .await?,
            pending_devices: self
                .devices
                .count_by_status(tenant_id, DeviceStatus::Pending)
                .await?,
            online_devices: self.devices.count_online(tenant_id, since).await?,
            active_sessions: self.sessions.count_active(tenant_id).await?,
        })
    }
}
