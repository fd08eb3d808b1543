use std::sync::Arc;

use detail_relay::{api, config::Config, relay::Relay};

#[tokio::main]
async fn main() {
    // A missing .env is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env();
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; generation requests will fail");
    }
    let port = config.port;
    let frontend = config.frontend_origin.clone();

    let relay = Arc::new(Relay::new(config).expect("failed to build upstream HTTP client"));
    let app = api::router(relay);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await.unwrap();
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    tracing::info!(%frontend, "accepting cross-origin requests");
    axum::serve(listener, app).await.unwrap();
}
