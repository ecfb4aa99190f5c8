use axum::Router;
use grablink::api;
use grablink::config::Config;
use grablink::extractor::YtDlpExtractor;
use grablink::server::{AppState, shutdown_signal};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config
            .logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("info");
        tracing_subscriber::EnvFilter::new(level)
    });
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let shared_state = Arc::new(AppState {
        extractor: Arc::new(YtDlpExtractor::new(config.extractor.clone())),
    });

    let app = Router::new()
        .merge(api::router())
        .with_state(shared_state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let address = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("grablink listening on {}", address);

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
