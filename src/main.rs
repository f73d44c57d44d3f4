use simtrade::config::Config;
use simtrade::{app, AppState};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simtrade=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!(
        "Starting simtrade on {}:{} (base price {}, tick every {} ms)",
        config.host, config.port, config.price.base_price, config.price.tick_interval_ms
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("simtrade listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
