use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::OpenAiClient;
use greenfork_common::Config;
use greenfork_pipeline::{HttpFetcher, IngestService, UuidGenerator};
use greenfork_store::PgRecipeStore;

mod rest;

use rest::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("greenfork=info".parse()?))
        .init();

    let config = Config::from_env();
    config.log_redacted();

    let store = PgRecipeStore::connect(&config.database_url).await?;
    store.migrate().await?;

    let client = Arc::new(
        OpenAiClient::new(&config.openai_api_key)
            .with_text_models(&config.fast_model, &config.capable_model)
            .with_image_model(&config.image_model),
    );

    let ingest = IngestService::new(
        Arc::new(HttpFetcher::new(config.http_timeout_secs)?),
        client,
        Arc::new(store),
        Arc::new(UuidGenerator),
    );

    let state = Arc::new(AppState { ingest });

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/api/veganize", post(rest::api_veganize))
        .with_state(state)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("Greenfork API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
