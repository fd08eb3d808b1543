use std::time::Duration;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::{GenerationRequest, GenerationResult};
use crate::parse::{self, ParseError};
use crate::prompt::build_prompt;
use crate::validate::ValidationError;

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = "detail-relay-api/1.0";
const IMAGE_DATA_PREFIX: &str = "data:image/";
const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.7;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("{0}")]
    Request(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream { status, .. } if *status < 500 => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the end user. Upstream and config detail stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            RelayError::Validation(e) => e.to_string(),
            RelayError::MissingApiKey => {
                "A server configuration error occurred. Please contact the administrator.".into()
            }
            RelayError::Upstream { status, .. } => match status {
                401 => "API authentication failed. Please contact the administrator.".into(),
                429 => "Too many requests. Please try again later.".into(),
                s if *s >= 500 => {
                    "The service is temporarily unavailable. Please try again later.".into()
                }
                _ => "Content generation failed.".into(),
            },
            RelayError::Request(_) => "A server error occurred. Please try again later.".into(),
            RelayError::Parse(ParseError::Empty) => {
                "No content was generated. Please try again.".into()
            }
            RelayError::Parse(_) => {
                "Failed to parse the generated content. Please try again.".into()
            }
        }
    }
}

// ── Chat completions wire types ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart<'a> {
    Text { text: String },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ImageUrl<'a> {
    pub url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamErrorBody {
    error: Option<UpstreamErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorDetail {
    message: Option<String>,
}

// ── Request assembly ─────────────────────────────────────────────────────────

/// One user message: the prompt first, then one part per data-URL image.
/// Entries that are not `data:image/...` are skipped.
pub fn build_chat_request<'a>(model: &'a str, req: &'a GenerationRequest) -> ChatRequest<'a> {
    let prompt = build_prompt(
        &req.product_description,
        req.reference_url.as_deref(),
        req.images.len(),
    );

    let mut content = vec![ContentPart::Text { text: prompt }];
    content.extend(
        req.images
            .iter()
            .filter(|image| image.starts_with(IMAGE_DATA_PREFIX))
            .map(|image| ContentPart::ImageUrl {
                image_url: ImageUrl { url: image.as_str() },
            }),
    );

    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content,
        }],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

// ── Relay ────────────────────────────────────────────────────────────────────

pub struct Relay {
    config: Config,
    client: reqwest::Client,
}

impl Relay {
    pub fn new(config: Config) -> Result<Self, RelayError> {
        let client = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RelayError::Request(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// One upstream call, no retries. The caller is expected to resubmit.
    pub async fn generate(&self, req: &GenerationRequest) -> Result<GenerationResult, RelayError> {
        let api_key = self
            .config
            .openai_api_key
            .as_deref()
            .ok_or(RelayError::MissingApiKey)?;

        tracing::info!(
            images = req.images.len(),
            description_chars = req.product_description.chars().count(),
            has_reference = req.reference_url.is_some(),
            "relaying generation request"
        );

        let body = build_chat_request(&self.config.openai_model, req);
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::Request(format!("TimeoutError: {}", e))
                } else if e.is_connect() {
                    RelayError::Request(format!("ConnectError: {}", e))
                } else {
                    RelayError::Request(format!("RequestError: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail: UpstreamErrorBody = response.json().await.unwrap_or_default();
            let message = detail
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("OpenAI API error: {}", status.as_u16()));
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Request(format!("DecodeError: {}", e)))?;

        let content = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        parse::parse_sections(&content, req.images.len()).map_err(|e| {
            tracing::error!(error = %e, raw = %content, "failed to parse model output");
            RelayError::Parse(e)
        })
    }
}
