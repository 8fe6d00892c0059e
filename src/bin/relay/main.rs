use notion_calendar::config::RelayConfig;
use notion_calendar::error::Error;
use notion_calendar::relay::{router, RelayState};
use notion_calendar::shutdown::wait_for_signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Notion relay");

    let config = RelayConfig::load()?;
    let host = config.host.clone();
    let port = config.port;
    let upstream = config.notion_api_base.clone();

    let app = router(RelayState::new(config)?);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .map_err(Error::from)?;
    info!(
        "Notion relay running on http://{}:{} (forwarding to {})",
        host, port, upstream
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await
        .map_err(Error::from)?;

    info!("Notion relay stopped");
    Ok(())
}
