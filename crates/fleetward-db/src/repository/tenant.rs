//! SurrealDB implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use fleetward_core::error::{FleetError, FleetResult};
use fleetward_core::models::tenant::{CreateTenant, Tenant};
use fleetward_core::repository::TenantRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::is_duplicate;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct TenantRow {
    name: String,
    owner: String,
    created_at: DateTime<Utc>,
}

impl TenantRow {
    fn into_tenant(self, id: String) -> Tenant {
        Tenant {
            id,
            name: self.name,
            owner: self.owner,
            created_at: self.created_at,
        }
    }
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> FleetResult<Tenant> {
        if input.id.trim().is_empty() {
            return Err(FleetError::validation("tenant id must not be empty"));
        }

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 name = $name, owner = $owner",
            )
            .bind(("id", input.id.clone()))
            .bind(("name", input.name))
            .bind(("owner", input.owner))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| {
            if is_duplicate(&e) {
                FleetError::AlreadyExists {
                    entity: "tenant".into(),
                }
            } else {
                DbError::Query(e.to_string()).into()
            }
        })?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: input.id.clone(),
        })?;

        Ok(row.into_tenant(input.id))
    }

    async fn get_by_id(&self, id: &str) -> FleetResult<Tenant> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('tenant', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_tenant(id.to_string()))
    }
}
