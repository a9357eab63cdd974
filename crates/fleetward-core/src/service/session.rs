//! Session tracker.

use tracing::{debug, info};

use crate::error::{FleetError, FleetResult};
use crate::models::session::{CreateSession, NewSession, Session};
use crate::repository::{DeviceRepository, PaginatedResult, Pagination, SessionRepository};
use crate::sync::{KeyedLocks, device_key, session_key};

use super::{ServiceContext, ensure_tenant};

pub struct SessionService<S: SessionRepository, D: DeviceRepository> {
    sessions: S,
    devices: D,
    locks: KeyedLocks,
}

impl<S: SessionRepository, D: DeviceRepository> SessionService<S, D> {
    pub fn new(sessions: S, devices: D) -> Self {
        Self {
            sessions,
            devices,
            locks: KeyedLocks::new(),
        }
    }

    /// Share the lock registry of the device registry, so that session
    /// creation and device removal exclude each other.
    pub fn with_locks(mut self, locks: KeyedLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Record a new, unauthenticated session. The device must exist; the
    /// session inherits its tenant.
    pub async fn create(&self, input: CreateSession) -> FleetResult<Session> {
        if input.uid.trim().is_empty() {
            return Err(FleetError::validation("session uid must not be empty"));
        }
        if input.username.trim().is_empty() {
            return Err(FleetError::validation("username must not be empty"));
        }
        if input.authenticated {
            return Err(FleetError::validation(
                "sessions start unauthenticated; authenticate them separately",
            ));
        }

        // Held until the session is stored, so a concurrent device delete
        // either runs first (and the device is gone) or finishes this one.
        let _device_guard = self.locks.lock(&device_key(&input.device_uid)).await;
        let device = self.devices.get_by_uid(&input.device_uid).await?;

        let _guard = self.locks.lock(&session_key(&input.uid)).await;
        let session = self
            .sessions
            .create(NewSession {
                uid: input.uid,
                tenant_id: device.tenant_id,
                device_uid: device.uid,
                username: input.username,
                ip_address: input.ip_address,
            })
            .await?;

        info!(
            uid = %session.uid,
            device_uid = %session.device_uid,
            username = %session.username,
            "Session created"
        );
        Ok(session)
    }

    /// Mark a session authenticated. The flag is one-way.
    pub async fn set_authenticated(&self, uid: &str, authenticated: bool) -> FleetResult<Session> {
        if !authenticated {
            return Err(FleetError::validation(
                "a session cannot be marked unauthenticated",
            ));
        }

        let _guard = self.locks.lock(&session_key(uid)).await;
        let session = self.sessions.get_by_uid(uid).await?;
        if session.is_finished() {
            return Err(FleetError::conflict(format!("session {uid} is finished")));
        }
        if session.authenticated {
            debug!(uid = %uid, "Session already authenticated");
            return Ok(session);
        }

        let session = self.sessions.set_authenticated(uid, true).await?;
        info!(uid = %uid, "Session authenticated");
        Ok(session)
    }

    pub async fn get(&self, tenant_id: &str, uid: &str) -> FleetResult<Session> {
        let session = self.sessions.get_by_uid(uid).await?;
        ensure_tenant(&session.tenant_id, tenant_id)?;
        Ok(session)
    }

    pub async fn list(
        &self,
        tenant_id: &str,
        pagination: Pagination,
    ) -> FleetResult<PaginatedResult<Session>> {
        self.sessions.list(tenant_id, pagination).await
    }

    /// Close a session. Finishing twice keeps the first timestamp.
    pub async fn finish(&self, ctx: &ServiceContext, uid: &str) -> FleetResult<Session> {
        let _guard = self.locks.lock(&session_key(uid)).await;
        let session = self.sessions.get_by_uid(uid).await?;
        if let Some(tenant_id) = ctx.tenant_id.as_deref() {
            ensure_tenant(&session.tenant_id, tenant_id)?;
        }
        if session.is_finished() {
            return Ok(session);
        }

        let session = self.sessions.finish(uid).await?;
        info!(
            uid = %uid,
            requested_by = ctx.username.as_deref().unwrap_or("-"),
            "Session finished"
        );
        Ok(session)
    }

    /// Refresh `last_seen` of a live session.
    pub async fn keepalive(&self, uid: &str) -> FleetResult<Session> {
        let _guard = self.locks.lock(&session_key(uid)).await;
        let session = self.sessions.get_by_uid(uid).await?;
        if session.is_finished() {
            return Err(FleetError::conflict(format!("session {uid} is finished")));
        }
        self.sessions.touch(uid).await
    }
}
