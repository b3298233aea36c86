use miette::{IntoDiagnostic, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use visage_server::{build_router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    info!(bind_addr = %config.bind_addr, "starting visage gateway");

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .into_diagnostic()?;
    info!("listening on {}", bind_addr);
    axum::serve(listener, app).await.into_diagnostic()?;

    Ok(())
}
