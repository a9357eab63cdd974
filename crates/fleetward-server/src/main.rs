use fleetward_server::config::Settings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("fleetward=info,tower_http=info"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    let settings = Settings::load()?;
    let state = fleetward_server::bootstrap(&settings).await?;
    fleetward_server::serve(&settings, state).await
}
