//! Startup against the shipped configuration files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fleetward_auth::{LoginInput, TokenKind};
use fleetward_server::config::Settings;

fn repo_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Shipped defaults, pointed at an in-memory database and absolute paths.
fn settings() -> Settings {
    let root = repo_root();
    let mut settings = Settings::load_from(&root.join("config"), Some(HashMap::new())).unwrap();
    settings.database.url = "mem://".into();
    settings.database.username = None;
    settings.database.password = None;
    settings.auth.jwt_private_key_path = root.join(&settings.auth.jwt_private_key_path);
    settings.auth.jwt_public_key_path = root.join(&settings.auth.jwt_public_key_path);
    settings.seed.file = settings.seed.file.map(|f| root.join(f));
    settings
}

#[test]
fn shipped_config_parses() {
    let settings = Settings::load_from(&repo_root().join("config"), Some(HashMap::new())).unwrap();
    assert_eq!(settings.server.bind, "0.0.0.0:8080");
    assert_eq!(settings.database.namespace, "fleetward");
    assert!(settings.seed.file.is_some());
}

#[tokio::test]
async fn bootstrap_seeds_and_serves_login() {
    let state = fleetward_server::bootstrap(&settings()).await.unwrap();

    let out = state
        .auth
        .login(LoginInput {
            username: "username".into(),
            password: "password".into(),
        })
        .await
        .unwrap();
    assert_eq!(out.tenant, "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx");

    let claims = state.auth.validate_token(&out.token).unwrap();
    assert_eq!(claims.kind(), TokenKind::User);
}

#[tokio::test]
async fn bootstrap_fails_without_keys() {
    let mut settings = settings();
    settings.auth.jwt_private_key_path = "/nonexistent/key.pem".into();
    assert!(fleetward_server::bootstrap(&settings).await.is_err());
}
