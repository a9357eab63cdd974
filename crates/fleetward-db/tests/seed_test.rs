//! Seed loading against an in-memory store.

use fleetward_core::repository::{TenantRepository, UserRepository};
use fleetward_db::repository::{SurrealTenantRepository, SurrealUserRepository};
use fleetward_db::seed::{SeedData, SeedReport, apply_seed};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

const SEED: &str = r#"
[[tenants]]
id = "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
name = "dev"
owner = "username"

[[users]]
tenant_id = "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
username = "username"
name = "Dev User"
email = "user@example.com"
password = "password"
"#;

#[tokio::test]
async fn seed_creates_records_once() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    fleetward_db::run_migrations(&db).await.unwrap();

    let data = SeedData::from_toml(SEED).unwrap();
    let report = apply_seed(&db, data.clone(), None).await.unwrap();
    assert_eq!(
        report,
        SeedReport {
            tenants_created: 1,
            users_created: 1
        }
    );

    let again = apply_seed(&db, data, None).await.unwrap();
    assert_eq!(again, SeedReport::default());

    let tenant = SurrealTenantRepository::new(db.clone())
        .get_by_id("xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx")
        .await
        .unwrap();
    assert_eq!(tenant.owner, "username");

    let user = SurrealUserRepository::new(db)
        .get_by_username("username")
        .await
        .unwrap();
    assert_eq!(user.tenant_id, tenant.id);
    assert!(user.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    fleetward_db::run_migrations(&db).await.unwrap();
    fleetward_db::run_migrations(&db).await.unwrap();
}
