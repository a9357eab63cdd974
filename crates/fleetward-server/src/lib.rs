//! Fleetward server: configuration loading and process bootstrap.

pub mod config;

use std::time::Duration;

use fleetward_api::{AppState, app, internal_router, public_router, with_layers};
use fleetward_db::seed::{apply_seed, load_seed_file};
use fleetward_db::{DbManager, run_migrations};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Settings;

/// Connect to the database, migrate, apply the optional seed and build
/// the handler state.
pub async fn bootstrap(settings: &Settings) -> anyhow::Result<AppState> {
    let auth = settings.auth_config()?;

    let db = DbManager::connect(&settings.db_config()).await?;
    run_migrations(db.client()).await?;

    if let Some(path) = &settings.seed.file {
        let data = load_seed_file(path)?;
        let report = apply_seed(db.client(), data, auth.pepper.as_deref()).await?;
        info!(
            file = %path.display(),
            tenants = report.tenants_created,
            users = report.users_created,
            "Seed applied"
        );
    }

    Ok(AppState::new(
        db.client().clone(),
        auth,
        settings.registry_config(),
    ))
}

/// Bind the listeners and serve until ctrl-c.
pub async fn serve(settings: &Settings, state: AppState) -> anyhow::Result<()> {
    let timeout = Duration::from_secs(settings.server.request_timeout_secs);

    let Some(internal_bind) = &settings.server.internal_bind else {
        warn!(
            bind = %settings.server.bind,
            "No internal listener configured, /internal routes share the public listener"
        );
        let listener = TcpListener::bind(&settings.server.bind).await?;
        info!(addr = %listener.local_addr()?, "Listening");
        axum::serve(listener, app(state, timeout))
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        return Ok(());
    };

    let public = TcpListener::bind(&settings.server.bind).await?;
    let internal = TcpListener::bind(internal_bind).await?;
    info!(
        public = %public.local_addr()?,
        internal = %internal.local_addr()?,
        "Listening"
    );

    let public_app = with_layers(public_router(state.clone()), timeout);
    let internal_app = with_layers(internal_router(state), timeout);
    tokio::try_join!(
        async {
            axum::serve(public, public_app)
                .with_graceful_shutdown(shutdown_signal())
                .await
        },
        async {
            axum::serve(internal, internal_app)
                .with_graceful_shutdown(shutdown_signal())
                .await
        },
    )?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
