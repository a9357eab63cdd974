//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Listing and mutating
//! operations on tenant-owned records take a `tenant_id` to enforce
//! data isolation; uid lookups are unscoped so that callers can tell a
//! missing record apart from one owned by another tenant.

use chrono::{DateTime, Utc};

use crate::error::FleetResult;
use crate::models::{
    device::{Device, DeviceFilter, DeviceStatus, EnrollDevice, Enrollment},
    session::{NewSession, Session},
    tenant::{CreateTenant, Tenant},
    user::{CreateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Pagination {
    /// Largest page a caller may request.
    pub const MAX_LIMIT: u64 = 1000;

    /// Build from 1-based `page` / `per_page` query parameters.
    pub fn from_page(page: Option<u64>, per_page: Option<u64>) -> Self {
        let limit = per_page
            .unwrap_or(Self::default().limit)
            .clamp(1, Self::MAX_LIMIT);
        let page = page.unwrap_or(1).max(1);
        Self {
            offset: (page - 1) * limit,
            limit,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = FleetResult<Tenant>> + Send;
    fn get_by_id(&self, id: &str) -> impl Future<Output = FleetResult<Tenant>> + Send;
}

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = FleetResult<User>> + Send;
    /// Usernames are unique across tenants.
    fn get_by_username(&self, username: &str) -> impl Future<Output = FleetResult<User>> + Send;
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

pub trait DeviceRepository: Send + Sync {
    /// Get-or-create keyed on `input.uid`.
    ///
    /// A first call creates the device in `pending` status. Later calls
    /// refresh `info`, `public_key` and `last_seen` on the existing
    /// record and report `created = false`.
    fn enroll(&self, input: EnrollDevice) -> impl Future<Output = FleetResult<Enrollment>> + Send;

    /// Unscoped lookup by uid.
    fn get_by_uid(&self, uid: &str) -> impl Future<Output = FleetResult<Device>> + Send;

    /// Find a device of the tenant by its name.
    fn find_by_name(
        &self,
        tenant_id: &str,
        name: &str,
    ) -> impl Future<Output = FleetResult<Option<Device>>> + Send;

    fn list(
        &self,
        tenant_id: &str,
        filter: DeviceFilter,
        pagination: Pagination,
    ) -> impl Future<Output = FleetResult<PaginatedResult<Device>>> + Send;

    fn rename(
        &self,
        tenant_id: &str,
        uid: &str,
        name: &str,
    ) -> impl Future<Output = FleetResult<Device>> + Send;

    fn set_status(
        &self,
        tenant_id: &str,
        uid: &str,
        status: DeviceStatus,
    ) -> impl Future<Output = FleetResult<Device>> + Send;

    /// Hard delete. Fails with `NotFound` when nothing was removed.
    fn delete(&self, tenant_id: &str, uid: &str) -> impl Future<Output = FleetResult<()>> + Send;

    fn count_by_status(
        &self,
        tenant_id: &str,
        status: DeviceStatus,
    ) -> impl Future<Output = FleetResult<u64>> + Send;

    /// Accepted devices whose `last_seen` is at or after `since`.
    fn count_online(
        &self,
        tenant_id: &str,
        since: DateTime<Utc>,
    ) -> impl Future<Output = FleetResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the uid is taken.
    fn create(&self, input: NewSession) -> impl Future<Output = FleetResult<Session>> + Send;

    /// Unscoped lookup by uid.
    fn get_by_uid(&self, uid: &str) -> impl Future<Output = FleetResult<Session>> + Send;

    /// Newest sessions first.
    fn list(
        &self,
        tenant_id: &str,
        pagination: Pagination,
    ) -> impl Future<Output = FleetResult<PaginatedResult<Session>>> + Send;

    fn set_authenticated(
        &self,
        uid: &str,
        authenticated: bool,
    ) -> impl Future<Output = FleetResult<Session>> + Send;

    /// Refresh `last_seen`.
    fn touch(&self, uid: &str) -> impl Future<Output = FleetResult<Session>> + Send;

    /// Set `finished_at` on the session.
    fn finish(&self, uid: &str) -> impl Future<Output = FleetResult<Session>> + Send;

    /// Finish every unfinished session of a device. Returns how many
    /// sessions were closed.
    fn finish_device_sessions(
        &self,
        tenant_id: &str,
        device_uid: &str,
    ) -> impl Future<Output = FleetResult<u64>> + Send;

    /// Sessions of the tenant that have not been finished.
    fn count_active(&self, tenant_id: &str) -> impl Future<Output = FleetResult<u64>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_from_page_defaults() {
        let p = Pagination::from_page(None, None);
        assert_eq!(p.offset, 0);
        assert_eq!(p.limit, 100);
    }

    #[test]
    fn pagination_from_page_computes_offset() {
        let p = Pagination::from_page(Some(3), Some(20));
        assert_eq!(p.offset, 40);
        assert_eq!(p.limit, 20);
    }

    #[test]
    fn pagination_from_page_clamps() {
        let p = Pagination::from_page(Some(0), Some(0));
        assert_eq!(p.offset, 0);
        assert_eq!(p.limit, 1);

        let p = Pagination::from_page(None, Some(50_000));
        assert_eq!(p.limit, Pagination::MAX_LIMIT);
    }
}
