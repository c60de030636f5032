use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shinomontaj_server::{config::Config, db, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shinomontaj_server=debug,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let pool = db::init_db_pool(&config.database_url, config.max_pool_size)
        .await
        .context("failed to open database")?;
    info!(database_url = %config.database_url, "database ready");

    let state = handlers::AppState::new(pool, &config);
    let app = handlers::router(state, config.request_timeout());

    let listener = tokio::net::TcpListener::bind(config.server_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr()))?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app).await?;

    Ok(())
}
