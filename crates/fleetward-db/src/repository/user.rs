//! User accounts. Users are provisioned by seeding; the gate only reads
//! them back by username at login.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version};
use chrono::{DateTime, Utc};
use fleetward_core::error::{FleetError, FleetResult};
use fleetward_core::models::user::{CreateUser, User};
use fleetward_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::is_duplicate;
use crate::error::DbError;

/// Every read selects `meta::id(id) AS record_id` so one row shape
/// serves creation and lookup.
#[derive(Debug, SurrealValue)]
struct UserRow {
    record_id: String,
    tenant_id: String,
    username: String,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, DbError> {
        let id = Uuid::parse_str(&row.record_id)
            .map_err(|e| DbError::Corrupt(format!("user id {}: {e}", row.record_id)))?;
        Ok(User {
            id,
            tenant_id: row.tenant_id,
            username: row.username,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_USER: &str = "SELECT meta::id(id) AS record_id, * FROM user";

/// Argon2id, m=19 MiB, t=2, p=1, random salt. With a pepper the input is
/// `pepper ++ password`; verification must use the same pepper.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    let params = Params::new(19 * 1024, 2, 1, None)
        .map_err(|e| DbError::Password(e.to_string()))?;
    let input = match pepper {
        Some(p) => format!("{p}{password}"),
        None => password.to_string(),
    };
    let salt = SaltString::generate(&mut OsRng);

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(input.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Password(e.to_string()))
}

#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> FleetResult<User> {
        if input.username.trim().is_empty() {
            return Err(FleetError::validation("username must not be empty"));
        }

        let id = Uuid::new_v4().to_string();
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let mut result = self
            .db
            .query(format!(
                "CREATE type::record('user', $id) SET \
                 tenant_id = $tenant_id, \
                 username = $username, name = $name, email = $email, \
                 password_hash = $password_hash RETURN NONE; \
                 {SELECT_USER} WHERE id = type::record('user', $id)"
            ))
            .bind(("id", id.clone()))
            .bind(("tenant_id", input.tenant_id))
            .bind(("username", input.username))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| -> FleetError {
                if is_duplicate(&e) {
                    FleetError::AlreadyExists {
                        entity: "user".into(),
                    }
                } else {
                    DbError::Query(e.to_string()).into()
                }
            })?;

        let rows: Vec<UserRow> = result.take(1).map_err(DbError::from)?;
        first_user(rows, &id)
    }

    async fn get_by_username(&self, username: &str) -> FleetResult<User> {
        let mut result = self
            .db
            .query(format!("{SELECT_USER} WHERE username = $username LIMIT 1"))
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        first_user(rows, &format!("username={username}"))
    }
}

fn first_user(rows: Vec<UserRow>, id: &str) -> FleetResult<User> {
    let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
        entity: "user".into(),
        id: id.to_string(),
    })?;
    Ok(User::try_from(row)?)
}
