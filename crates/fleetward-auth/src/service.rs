//! Identity gate: user login, device authentication with implicit
//! enrollment, and internal token minting.

use fleetward_core::error::{FleetError, FleetResult};
use fleetward_core::models::device::{
    DeviceAuthRequest, EnrollDevice, default_name, derive_uid,
};
use fleetward_core::repository::{DeviceRepository, TenantRepository, UserRepository};
use fleetward_core::sync::{KeyGuard, KeyedLocks, device_key, device_name_key};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::{self, ValidatedClaims};

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    pub token: String,
    pub user: String,
    pub name: String,
    pub tenant: String,
    pub email: String,
}

/// Successful device authentication.
#[derive(Debug)]
pub struct DeviceAuthOutput {
    pub token: String,
    pub uid: String,
    pub name: String,
    pub namespace: String,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer has
/// no dependency on the database crate.
pub struct AuthService<U: UserRepository, T: TenantRepository, D: DeviceRepository> {
    user_repo: U,
    tenant_repo: T,
    device_repo: D,
    locks: KeyedLocks,
    config: AuthConfig,
}

impl<U, T, D> AuthService<U, T, D>
where
    U: UserRepository,
    T: TenantRepository,
    D: DeviceRepository,
{
    pub fn new(user_repo: U, tenant_repo: T, device_repo: D, config: AuthConfig) -> Self {
        Self {
            user_repo,
            tenant_repo,
            device_repo,
            locks: KeyedLocks::new(),
            config,
        }
    }

    /// Share the per-uid lock registry with the device registry.
    pub fn with_locks(mut self, locks: KeyedLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Authenticate a user with username + password and issue a token.
    ///
    /// Unknown users and wrong passwords produce the same error.
    pub async fn login(&self, input: LoginInput) -> FleetResult<LoginOutput> {
        let user = match self.user_repo.get_by_username(&input.username).await {
            Ok(u) => u,
            Err(FleetError::NotFound { .. }) => {
                debug!(username = %input.username, "Login for unknown user");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            warn!(username = %user.username, "Login rejected: bad password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = token::issue_user_token(&user, &self.config)?;
        info!(username = %user.username, tenant_id = %user.tenant_id, "User logged in");

        Ok(LoginOutput {
            token,
            user: user.username,
            name: user.name,
            tenant: user.tenant_id,
            email: user.email,
        })
    }

    /// Authenticate a device, enrolling it as pending the first time its
    /// identity is seen. Repeated calls return the same uid.
    pub async fn authenticate_device(
        &self,
        req: DeviceAuthRequest,
    ) -> FleetResult<DeviceAuthOutput> {
        if req.identity.mac.trim().is_empty() {
            return Err(FleetError::validation("device identity must carry a MAC"));
        }
        let tenant = self.tenant_repo.get_by_id(&req.tenant_id).await?;

        let uid = derive_uid(&tenant.id, &req.identity);
        let enrollment = {
            let _guard = self.locks.lock(&device_key(&uid)).await;
            // Only a first enrollment names the device; re-authentication
            // keeps whatever name it has now.
            let (name, _name_guard) = match self.device_repo.get_by_uid(&uid).await {
                Ok(device) => (device.name, None),
                Err(FleetError::NotFound { .. }) => {
                    let (name, guard) = self
                        .claim_device_name(&tenant.id, &default_name(&req.identity))
                        .await?;
                    (name, Some(guard))
                }
                Err(e) => return Err(e),
            };
            self.device_repo
                .enroll(EnrollDevice {
                    uid: uid.clone(),
                    tenant_id: tenant.id,
                    name,
                    namespace: tenant.owner,
                    identity: req.identity,
                    info: req.info,
                    public_key: req.public_key,
                })
                .await?
        };

        let device = enrollment.device;
        if enrollment.created {
            info!(uid = %device.uid, tenant_id = %device.tenant_id, "Device enrolled");
        } else {
            debug!(uid = %device.uid, "Device re-authenticated");
        }

        let token = token::issue_device_token(&device, &self.config)?;
        Ok(DeviceAuthOutput {
            token,
            uid: device.uid,
            name: device.name,
            namespace: device.namespace,
        })
    }

    /// First name in the tenant not held by another device: `base`, then
    /// `base-2`, `base-3` and so on. The returned guard keeps the name
    /// reserved until the caller has stored the device.
    async fn claim_device_name(
        &self,
        tenant_id: &str,
        base: &str,
    ) -> FleetResult<(String, KeyGuard)> {
        let mut suffix = 1u32;
        loop {
            let candidate = match suffix {
                1 => base.to_string(),
                n => format!("{base}-{n}"),
            };
            let guard = self.locks.lock(&device_name_key(tenant_id, &candidate)).await;
            if self
                .device_repo
                .find_by_name(tenant_id, &candidate)
                .await?
                .is_none()
            {
                if suffix > 1 {
                    debug!(
                        tenant_id = %tenant_id,
                        base = %base,
                        name = %candidate,
                        "Default device name taken"
                    );
                }
                return Ok((candidate, guard));
            }
            suffix += 1;
        }
    }

    /// Mint a service token for `tenant_id`. No credential check; only
    /// reachable from the internal router.
    pub async fn issue_internal_token(&self, tenant_id: &str) -> FleetResult<String> {
        let tenant = self.tenant_repo.get_by_id(tenant_id).await?;
        let token = token::issue_service_token(&tenant.id, &self.config)?;
        debug!(tenant_id = %tenant.id, "Issued internal token");
        Ok(token)
    }

    pub fn validate_token(&self, raw: &str) -> FleetResult<ValidatedClaims> {
        Ok(token::validate_access_token(raw, &self.config)?)
    }
}
