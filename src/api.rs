use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::config::BODY_LIMIT_BYTES;
use crate::models::{ErrorBody, GenerationRequest, RawGenerationRequest};
use crate::relay::{Relay, RelayError};

pub const GENERATE_PATH: &str = "/api/generate-detail";

pub fn router(relay: Arc<Relay>) -> Router {
    let cors = cors_layer(&relay.config().frontend_origin);

    Router::new()
        .route("/health", get(health))
        .route(GENERATE_PATH, post(generate_endpoint))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .with_state(relay)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin([value]),
        Err(_) => {
            tracing::warn!(origin, "invalid FRONTEND_ORIGIN, cross-origin requests disabled");
            layer
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn generate_endpoint(
    State(relay): State<Arc<Relay>>,
    body: Result<Json<RawGenerationRequest>, JsonRejection>,
) -> Response {
    let Json(raw) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected request body");
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body.".into());
        }
    };

    let result = match GenerationRequest::try_from(raw) {
        Ok(req) => relay.generate(&req).await,
        Err(e) => Err(RelayError::from(e)),
    };

    match result {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            match &e {
                RelayError::Validation(_) => {}
                RelayError::MissingApiKey => {
                    tracing::error!("OPENAI_API_KEY is not configured");
                }
                RelayError::Upstream { status, message } => {
                    tracing::error!(status, message = %message, "OpenAI API error");
                }
                RelayError::Request(msg) => {
                    tracing::error!(error = %msg, "upstream request failed");
                }
                // Logged with the raw model output where it happened.
                RelayError::Parse(_) => {}
            }
            error_response(e.status(), e.user_message())
        }
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorBody { error })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn serve(config: Config) -> String {
        let relay = Arc::new(Relay::new(config).unwrap());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(relay)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let base = serve(Config::default()).await;
        let body: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn validation_errors_are_400_with_reason() {
        let base = serve(Config::default()).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}{}", base, GENERATE_PATH))
            .json(&json!({ "productDescription": "too short", "images": ["data:image/png;base64,AA"] }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: ErrorBody = resp.json().await.unwrap();
        assert_eq!(body.error, "Product description must be at least 10 characters.");

        let resp = client
            .post(format!("{}{}", base, GENERATE_PATH))
            .header("content-type", "application/json")
            .body("not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: ErrorBody = resp.json().await.unwrap();
        assert_eq!(body.error, "Invalid request body.");
    }

    #[tokio::test]
    async fn missing_key_is_generic_500() {
        let base = serve(Config::default()).await;
        let resp = reqwest::Client::new()
            .post(format!("{}{}", base, GENERATE_PATH))
            .json(&json!({
                "productDescription": "A comfortable ergonomic office chair",
                "referenceUrl": null,
                "images": ["data:image/png;base64,AA"]
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = resp.json().await.unwrap();
        assert_eq!(
            body.error,
            "A server configuration error occurred. Please contact the administrator."
        );
    }

    #[tokio::test]
    async fn cors_allows_only_configured_origin() {
        let base = serve(Config::default()).await;
        let client = reqwest::Client::new();

        let allowed = client
            .get(format!("{}/health", base))
            .header("origin", "http://localhost:5173")
            .send()
            .await
            .unwrap();
        assert_eq!(
            allowed.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );

        let denied = client
            .get(format!("{}/health", base))
            .header("origin", "http://evil.example")
            .send()
            .await
            .unwrap();
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }
}
