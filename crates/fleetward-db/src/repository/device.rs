//! SurrealDB implementation of [`DeviceRepository`].
//!
//! The device uid is the record id, so two concurrent first-time
//! enrollments of one identity cannot both create a record: the loser's
//! `CREATE` fails and it re-reads the winner's record.

use chrono::{DateTime, Utc};
use fleetward_core::error::FleetResult;
use fleetward_core::models::device::{
    Device, DeviceFilter, DeviceIdentity, DeviceInfo, DeviceStatus, EnrollDevice, Enrollment,
};
use fleetward_core::repository::{DeviceRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;

use super::{CountRow, first_total};
use crate::error::DbError;

/// DB-side row struct for queries where the uid is already known.
#[derive(Debug, SurrealValue)]
struct DeviceRow {
    tenant_id: String,
    name: String,
    namespace: String,
    mac: String,
    info_id: String,
    info_pretty_name: String,
    info_version: String,
    public_key: String,
    status: String,
    last_seen: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct DeviceRowWithId {
    record_id: String,
    tenant_id: String,
    name: String,
    namespace: String,
    mac: String,
    info_id: String,
    info_pretty_name: String,
    info_version: String,
    public_key: String,
    status: String,
    last_seen: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<DeviceStatus, DbError> {
    s.parse()
        .map_err(|_| DbError::Corrupt(format!("unknown device status: {s}")))
}

impl DeviceRow {
    fn try_into_device(self, uid: &str) -> Result<Device, DbError> {
        Ok(Device {
            uid: uid.to_string(),
            tenant_id: self.tenant_id,
            name: self.name,
            namespace: self.namespace,
            identity: DeviceIdentity { mac: self.mac },
            info: DeviceInfo {
                id: self.info_id,
                pretty_name: self.info_pretty_name,
                version: self.info_version,
            },
            public_key: self.public_key,
            status: parse_status(&self.status)?,
            last_seen: self.last_seen,
            created_at: self.created_at,
        })
    }
}

impl DeviceRowWithId {
    fn try_into_device(self) -> Result<Device, DbError> {
        Ok(Device {
            status: parse_status(&self.status)?,
            uid: self.record_id,
            tenant_id: self.tenant_id,
            name: self.name,
            namespace: self.namespace,
            identity: DeviceIdentity { mac: self.mac },
            info: DeviceInfo {
                id: self.info_id,
                pretty_name: self.info_pretty_name,
                version: self.info_version,
            },
            public_key: self.public_key,
            last_seen: self.last_seen,
            created_at: self.created_at,
        })
    }
}

fn first_device(rows: Vec<DeviceRow>, uid: &str) -> Result<Device, DbError> {
    let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
        entity: "device".into(),
        id: uid.to_string(),
    })?;
    row.try_into_device(uid)
}

/// SurrealDB implementation of the Device repository.
#[derive(Clone)]
pub struct SurrealDeviceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDeviceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Refresh the mutable enrollment fields of an existing device.
    async fn refresh(&self, input: &EnrollDevice) -> Result<Option<Device>, DbError> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('device', $uid) SET \
                 info_id = $info_id, \
                 info_pretty_name = $info_pretty_name, \
                 info_version = $info_version, \
                 public_key = $public_key, \
                 last_seen = time::now(), \
                 updated_at = time::now() \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("uid", input.uid.clone()))
            .bind(("tenant_id", input.tenant_id.clone()))
            .bind(("info_id", input.info.id.clone()))
            .bind(("info_pretty_name", input.info.pretty_name.clone()))
            .bind(("info_version", input.info.version.clone()))
            .bind(("public_key", input.public_key.clone()))
            .await?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<DeviceRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_device(&input.uid))
            .transpose()
    }
}

impl<C: Connection> DeviceRepository for SurrealDeviceRepository<C> {
    async fn enroll(&self, input: EnrollDevice) -> FleetResult<Enrollment> {
        let result = self
            .db
            .query(
                "CREATE type::record('device', $uid) SET \
                 tenant_id = $tenant_id, \
                 name = $name, \
                 namespace = $namespace, \
                 mac = $mac, \
                 info_id = $info_id, \
                 info_pretty_name = $info_pretty_name, \
                 info_version = $info_version, \
                 public_key = $public_key, \
                 status = 'pending'",
            )
            .bind(("uid", input.uid.clone()))
            .bind(("tenant_id", input.tenant_id.clone()))
            .bind(("name", input.name.clone()))
            .bind(("namespace", input.namespace.clone()))
            .bind(("mac", input.identity.mac.clone()))
            .bind(("info_id", input.info.id.clone()))
            .bind(("info_pretty_name", input.info.pretty_name.clone()))
            .bind(("info_version", input.info.version.clone()))
            .bind(("public_key", input.public_key.clone()))
            .await
            .map_err(DbError::from)?;

        match result.check() {
            Ok(mut result) => {
                let rows: Vec<DeviceRow> = result.take(0).map_err(DbError::from)?;
                let device = first_device(rows, &input.uid)?;
                Ok(Enrollment {
                    device,
                    created: true,
                })
            }
            Err(create_err) => {
                debug!(uid = %input.uid, "Device already enrolled, refreshing");
                match self.refresh(&input).await? {
                    Some(device) => Ok(Enrollment {
                        device,
                        created: false,
                    }),
                    // Not a duplicate id after all.
                    None => Err(DbError::Query(create_err.to_string()).into()),
                }
            }
        }
    }

    async fn get_by_uid(&self, uid: &str) -> FleetResult<Device> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('device', $uid)")
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DeviceRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_device(rows, uid)?)
    }

    async fn find_by_name(&self, tenant_id: &str, name: &str) -> FleetResult<Option<Device>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM device \
                 WHERE tenant_id = $tenant_id AND name = $name \
                 LIMIT 1",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DeviceRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(DeviceRowWithId::try_into_device)
            .transpose()?)
    }

    async fn list(
        &self,
        tenant_id: &str,
        filter: DeviceFilter,
        pagination: Pagination,
    ) -> FleetResult<PaginatedResult<Device>> {
        let status_clause = if filter.status.is_some() {
            " AND status = $status"
        } else {
            ""
        };
        let status = filter.status.map(|s| s.as_str().to_string());

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM device \
                 WHERE tenant_id = $tenant_id{status_clause} GROUP ALL"
            ))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("status", status.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = first_total(&count_rows);

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM device \
                 WHERE tenant_id = $tenant_id{status_clause} \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("status", status))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DeviceRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(DeviceRowWithId::try_into_device)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn rename(&self, tenant_id: &str, uid: &str, name: &str) -> FleetResult<Device> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('device', $uid) SET \
                 name = $name, updated_at = time::now() \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("uid", uid.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<DeviceRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_device(rows, uid)?)
    }

    async fn set_status(
        &self,
        tenant_id: &str,
        uid: &str,
        status: DeviceStatus,
    ) -> FleetResult<Device> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('device', $uid) SET \
                 status = $status, updated_at = time::now() \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("uid", uid.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<DeviceRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_device(rows, uid)?)
    }

    async fn delete(&self, tenant_id: &str, uid: &str) -> FleetResult<()> {
        let mut result = self
            .db
            .query(
                "DELETE type::record('device', $uid) \
                 WHERE tenant_id = $tenant_id RETURN BEFORE",
            )
            .bind(("uid", uid.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DeviceRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "device".into(),
                id: uid.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn count_by_status(&self, tenant_id: &str, status: DeviceStatus) -> FleetResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM device \
                 WHERE tenant_id = $tenant_id AND status = $status \
                 GROUP ALL",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_total(&rows))
    }

    async fn count_online(&self, tenant_id: &str, since: DateTime<Utc>) -> FleetResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM device \
                 WHERE tenant_id = $tenant_id AND status = 'accepted' \
                 AND last_seen >= $since \
                 GROUP ALL",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("since", since))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_total(&rows))
    }
}
