//! Shared application state.

use std::sync::Arc;

use fleetward_auth::{AuthConfig, AuthService};
use fleetward_core::service::{DeviceService, RegistryConfig, SessionService};
use fleetward_core::sync::KeyedLocks;
use fleetward_db::repository::{
    SurrealDeviceRepository, SurrealSessionRepository, SurrealTenantRepository,
    SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

type Users = SurrealUserRepository<Any>;
type Tenants = SurrealTenantRepository<Any>;
type Devices = SurrealDeviceRepository<Any>;
type Sessions = SurrealSessionRepository<Any>;

/// Services shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService<Users, Tenants, Devices>>,
    pub devices: Arc<DeviceService<Devices, Sessions>>,
    pub sessions: Arc<SessionService<Sessions, Devices>>,
}

impl AppState {
    pub fn new(db: Surreal<Any>, auth_config: AuthConfig, registry: RegistryConfig) -> Self {
        let users = match auth_config.pepper.clone() {
            Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper),
            None => SurrealUserRepository::new(db.clone()),
        };
        let tenants = SurrealTenantRepository::new(db.clone());
        let devices = SurrealDeviceRepository::new(db.clone());
        let sessions = SurrealSessionRepository::new(db);

        // One registry: enrollment, device mutations and session creation
        // on a device exclude each other.
        let locks = KeyedLocks::new();

        Self {
            auth: Arc::new(
                AuthService::new(users, tenants, devices.clone(), auth_config)
                    .with_locks(locks.clone()),
            ),
            devices: Arc::new(
                DeviceService::new(devices.clone(), sessions.clone(), registry)
                    .with_locks(locks.clone()),
            ),
            sessions: Arc::new(SessionService::new(sessions, devices).with_locks(locks)),
        }
    }
}
