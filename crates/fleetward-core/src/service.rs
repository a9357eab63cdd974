//! Device registry and session tracker services.
//!
//! Both are generic over the repository traits so that neither depends
//! on the storage crate.

mod device;
mod session;

pub use device::{DeviceService, RegistryConfig};
pub use session::SessionService;

use crate::error::{FleetError, FleetResult};

/// Authorization context of a trusted internal caller.
///
/// Internal endpoints are not authenticated with end-user tokens; the
/// calling service states on whose behalf it acts instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceContext {
    pub tenant_id: Option<String>,
    pub username: Option<String>,
}

impl ServiceContext {
    pub fn new(tenant_id: Option<String>, username: Option<String>) -> Self {
        Self {
            tenant_id,
            username,
        }
    }
}

/// Reject access to a record owned by another tenant.
fn ensure_tenant(owner: &str, caller: &str) -> FleetResult<()> {
    if owner == caller {
        Ok(())
    } else {
        Err(FleetError::TenantContext)
    }
}
