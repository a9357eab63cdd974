//! Server configuration.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `config/local.toml` (optional, not versioned)
//! 4. environment variables `FLEETWARD__<SECTION>__<KEY>`, e.g.
//!    `FLEETWARD__SERVER__INTERNAL_BIND=127.0.0.1:8081`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use fleetward_auth::AuthConfig;
use fleetward_core::service::RegistryConfig;
use fleetward_db::DbConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("cannot read {path}: {source}")]
    Key {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Longest accepted duration, about a century.
const MAX_DURATION_SECS: u64 = 100 * 365 * 24 * 3600;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub stats: StatsSettings,
    pub seed: SeedSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Public listener.
    pub bind: String,
    /// Listener for `/internal` routes. When unset they are served on
    /// `bind` together with the public routes.
    pub internal_bind: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".into(),
            internal_bind: None,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        let db = DbConfig::default();
        Self {
            url: db.url,
            namespace: db.namespace,
            database: db.database,
            username: db.username,
            password: db.password,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_private_key_path: PathBuf,
    pub jwt_public_key_path: PathBuf,
    pub jwt_issuer: String,
    pub access_token_lifetime_secs: u64,
    pub device_token_lifetime_secs: u64,
    pub pepper: Option<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        let auth = AuthConfig::default();
        Self {
            jwt_private_key_path: "config/keys/jwt-ed25519.pem".into(),
            jwt_public_key_path: "config/keys/jwt-ed25519.pub.pem".into(),
            jwt_issuer: auth.jwt_issuer,
            access_token_lifetime_secs: auth.access_token_lifetime_secs,
            device_token_lifetime_secs: auth.device_token_lifetime_secs,
            pepper: auth.pepper,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsSettings {
    pub online_window_secs: u64,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            online_window_secs: RegistryConfig::default().online_window_secs,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedSettings {
    /// TOML file of tenants and users applied at startup.
    pub file: Option<PathBuf>,
}

impl Settings {
    /// Load from `./config` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config"), None)
    }

    /// Load from `dir`. `env` replaces the process environment when set.
    pub fn load_from(
        dir: &Path,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(dir.join("default.toml")).required(false))
            .add_source(File::from(dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("FLEETWARD")
                    .prefix_separator("__")
                    .separator("__")
                    .source(env),
            )
            .build()?;
        settings.try_deserialize::<Self>()?.validated()
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?;
        settings.try_deserialize::<Self>()?.validated()
    }

    /// Durations must be positive and fit a signed timestamp offset.
    fn validated(self) -> Result<Self, ConfigError> {
        let durations = [
            ("server.request_timeout_secs", self.server.request_timeout_secs),
            (
                "auth.access_token_lifetime_secs",
                self.auth.access_token_lifetime_secs,
            ),
            (
                "auth.device_token_lifetime_secs",
                self.auth.device_token_lifetime_secs,
            ),
            ("stats.online_window_secs", self.stats.online_window_secs),
        ];
        for (key, secs) in durations {
            if secs == 0 || secs > MAX_DURATION_SECS {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("{secs} is outside 1..={MAX_DURATION_SECS}"),
                });
            }
        }
        Ok(self)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.database.url.clone(),
            namespace: self.database.namespace.clone(),
            database: self.database.database.clone(),
            username: self.database.username.clone(),
            password: self.database.password.clone(),
        }
    }

    /// Build the auth config, reading the signing keys from disk.
    pub fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        let read = |path: &Path| {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Key {
                path: path.to_path_buf(),
                source,
            })
        };
        Ok(AuthConfig {
            jwt_private_key_pem: read(&self.auth.jwt_private_key_path)?,
            jwt_public_key_pem: read(&self.auth.jwt_public_key_path)?,
            jwt_issuer: self.auth.jwt_issuer.clone(),
            access_token_lifetime_secs: self.auth.access_token_lifetime_secs,
            device_token_lifetime_secs: self.auth.device_token_lifetime_secs,
            pepper: self.auth.pepper.clone(),
        })
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            online_window_secs: self.stats.online_window_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_sources() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.server.bind, "0.0.0.0:8080");
        assert!(settings.server.internal_bind.is_none());
        assert_eq!(settings.server.request_timeout_secs, 30);
        assert_eq!(settings.database.namespace, "fleetward");
        assert_eq!(settings.auth.jwt_issuer, "fleetward");
        assert_eq!(settings.stats.online_window_secs, 120);
        assert!(settings.seed.file.is_none());
    }

    #[test]
    fn toml_overrides_single_keys() {
        let settings = Settings::from_toml(
            r#"
            [server]
            internal_bind = "127.0.0.1:8081"

            [database]
            url = "mem://"

            [stats]
            online_window_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(settings.server.bind, "0.0.0.0:8080");
        assert_eq!(
            settings.server.internal_bind.as_deref(),
            Some("127.0.0.1:8081")
        );
        assert_eq!(settings.db_config().url, "mem://");
        assert_eq!(settings.registry_config().online_window_secs, 30);
    }

    #[test]
    fn environment_overrides_files() {
        let env = HashMap::from([
            ("FLEETWARD__SERVER__BIND".to_string(), "127.0.0.1:9000".to_string()),
            ("FLEETWARD__AUTH__PEPPER".to_string(), "s3cret".to_string()),
        ]);
        let settings = Settings::load_from(Path::new("does-not-exist"), Some(env)).unwrap();
        assert_eq!(settings.server.bind, "127.0.0.1:9000");
        assert_eq!(settings.auth.pepper.as_deref(), Some("s3cret"));
    }

    #[test]
    fn out_of_range_durations_are_rejected() {
        for raw in [
            "[stats]\nonline_window_secs = 9223372036854775807",
            "[auth]\naccess_token_lifetime_secs = 0",
            "[auth]\ndevice_token_lifetime_secs = 9223372036854775807",
            "[server]\nrequest_timeout_secs = 0",
        ] {
            assert!(
                matches!(Settings::from_toml(raw), Err(ConfigError::Invalid { .. })),
                "{raw}"
            );
        }
        assert!(Settings::from_toml("[stats]\nonline_window_secs = 86400").is_ok());
    }

    #[test]
    fn missing_key_file_is_reported() {
        let settings = Settings::from_toml(
            r#"
            [auth]
            jwt_private_key_path = "/nonexistent/key.pem"
            "#,
        )
        .unwrap();
        assert!(matches!(
            settings.auth_config(),
            Err(ConfigError::Key { .. })
        ));
    }
}
