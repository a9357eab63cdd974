//! SurrealDB implementation of [`SessionRepository`].

use chrono::{DateTime, Utc};
use fleetward_core::error::{FleetError, FleetResult};
use fleetward_core::models::session::{NewSession, Session};
use fleetward_core::repository::{PaginatedResult, Pagination, SessionRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::{CountRow, first_total, is_duplicate};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SessionRow {
    tenant_id: String,
    device_uid: String,
    username: String,
    ip_address: Option<String>,
    authenticated: bool,
    started_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    tenant_id: String,
    device_uid: String,
    username: String,
    ip_address: Option<String>,
    authenticated: bool,
    started_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

/// Projection used when only the number of touched records matters.
#[derive(Debug, SurrealValue)]
struct IdRow {
    #[allow(dead_code)]
    record_id: String,
}

impl SessionRow {
    fn into_session(self, uid: &str) -> Session {
        Session {
            uid: uid.to_string(),
            tenant_id: self.tenant_id,
            device_uid: self.device_uid,
            username: self.username,
            ip_address: self.ip_address,
            authenticated: self.authenticated,
            started_at: self.started_at,
            last_seen: self.last_seen,
            active: self.finished_at.is_none(),
            finished_at: self.finished_at,
        }
    }
}

impl From<SessionRowWithId> for Session {
    fn from(row: SessionRowWithId) -> Self {
        Session {
            uid: row.record_id,
            tenant_id: row.tenant_id,
            device_uid: row.device_uid,
            username: row.username,
            ip_address: row.ip_address,
            authenticated: row.authenticated,
            started_at: row.started_at,
            last_seen: row.last_seen,
            active: row.finished_at.is_none(),
            finished_at: row.finished_at,
        }
    }
}

fn first_session(rows: Vec<SessionRow>, uid: &str) -> Result<Session, DbError> {
    rows.into_iter()
        .next()
        .map(|row| row.into_session(uid))
        .ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: uid.to_string(),
        })
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Run a single-record UPDATE and return the updated session.
    async fn update_one(&self, uid: &str, set_clause: &str) -> FleetResult<Session> {
        let mut result = self
            .db
            .query(format!(
                "UPDATE type::record('session', $uid) SET {set_clause}"
            ))
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_session(rows, uid)?)
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: NewSession) -> FleetResult<Session> {
        let result = self
            .db
            .query(
                "CREATE type::record('session', $uid) SET \
                 tenant_id = $tenant_id, \
                 device_uid = $device_uid, \
                 username = $username, \
                 ip_address = $ip_address, \
                 authenticated = false",
            )
            .bind(("uid", input.uid.clone()))
            .bind(("tenant_id", input.tenant_id))
            .bind(("device_uid", input.device_uid))
            .bind(("username", input.username))
            .bind(("ip_address", input.ip_address))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| {
            if is_duplicate(&e) {
                FleetError::AlreadyExists {
                    entity: "session".into(),
                }
            } else {
                DbError::Query(e.to_string()).into()
            }
        })?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_session(rows, &input.uid)?)
    }

    async fn get_by_uid(&self, uid: &str) -> FleetResult<Session> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('session', $uid)")
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_session(rows, uid)?)
    }

    async fn list(
        &self,
        tenant_id: &str,
        pagination: Pagination,
    ) -> FleetResult<PaginatedResult<Session>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM session WHERE tenant_id = $tenant_id GROUP ALL")
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = first_total(&count_rows);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE tenant_id = $tenant_id \
                 ORDER BY started_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(PaginatedResult {
            items: rows.into_iter().map(Session::from).collect(),
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn set_authenticated(&self, uid: &str, authenticated: bool) -> FleetResult<Session> {
        let set_clause = if authenticated {
            "authenticated = true, last_seen = time::now()"
        } else {
            "authenticated = false, last_seen = time::now()"
        };
        self.update_one(uid, set_clause).await
    }

    async fn touch(&self, uid: &str) -> FleetResult<Session> {
        self.update_one(uid, "last_seen = time::now()").await
    }

    async fn finish(&self, uid: &str) -> FleetResult<Session> {
        self.update_one(
            uid,
            "finished_at = finished_at ?? time::now(), last_seen = time::now()",
        )
        .await
    }

    async fn finish_device_sessions(&self, tenant_id: &str, device_uid: &str) -> FleetResult<u64> {
        let mut result = self
            .db
            .query(
                "UPDATE session SET finished_at = time::now() \
                 WHERE tenant_id = $tenant_id \
                 AND device_uid = $device_uid \
                 AND finished_at = NONE \
                 RETURN meta::id(id) AS record_id",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("device_uid", device_uid.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }

    async fn count_active(&self, tenant_id: &str) -> FleetResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM session \
                 WHERE tenant_id = $tenant_id AND finished_at = NONE \
                 GROUP ALL",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_total(&rows))
    }
}
