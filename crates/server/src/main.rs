use anyhow::Context;
use episodic_engine::reclassify::ApplyPacing;
use episodic_server::config::ServerConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env();
    info!(db_path = %config.db_path, "connecting to database");

    let pool = episodic_db::connect(&config.db_path)
        .await
        .context("failed to connect to database")?;

    episodic_db::migrate::run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("migrations complete");

    let pacing = ApplyPacing {
        delay: config.apply_delay,
    };
    let app_state = episodic_server::state::AppState::new(pool, pacing);
    let app = episodic_server::routes::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .context("failed to bind")?;
    info!(
        addr = %config.bind_addr,
        apply_delay_ms = config.apply_delay.as_millis() as u64,
        "server listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
