//! Caller-side half of the flow: validate, encode, submit once, pair the
//! returned sections with the submitted images.

use url::Url;

use crate::api::GENERATE_PATH;
use crate::encode::{encode_image, ImageError, ImageFile};
use crate::models::{ErrorBody, GenerationRequest, GenerationResult, Section};
use crate::validate::{check_description, check_images, normalize_reference_url, ValidationError};

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Cannot connect to the server. Please check that it is running.")]
    Connect,
    #[error("{0}")]
    Server(String),
    #[error("No content was generated. Please try again.")]
    EmptyResult,
    #[error("A generation request is already in progress.")]
    Busy,
}

// ── Request building ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub product_description: String,
    pub reference_url: Option<String>,
}

/// Runs the same checks as the server, then encodes every image in order.
pub fn build_request(
    input: &ProductInput,
    images: &[ImageFile],
) -> Result<GenerationRequest, ClientError> {
    let product_description = check_description(&input.product_description)?;
    check_images(images)?;

    let images = images
        .iter()
        .map(encode_image)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GenerationRequest {
        product_description,
        reference_url: normalize_reference_url(input.reference_url.as_deref()),
        images,
    })
}

// ── HTTP client ──────────────────────────────────────────────────────────────

pub struct RelayClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let endpoint = Url::parse(base_url)?.join(GENERATE_PATH)?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
        })
    }

    pub async fn generate(
        &self,
        input: &ProductInput,
        images: &[ImageFile],
    ) -> Result<GenerationResult, ClientError> {
        let request = build_request(input, images)?;
        self.send(&request).await
    }

    pub async fn send(&self, request: &GenerationRequest) -> Result<GenerationResult, ClientError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "relay request failed");
                ClientError::Connect
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| {
                    format!("A server error occurred. ({})", status.as_u16())
                });
            return Err(ClientError::Server(message));
        }

        let result: GenerationResult = response
            .json()
            .await
            .map_err(|e| ClientError::Server(format!("Unexpected server response: {}", e)))?;
        if result.sections.is_empty() {
            return Err(ClientError::EmptyResult);
        }
        Ok(result)
    }
}

// ── Presentation state ───────────────────────────────────────────────────────

/// Form state owned by whoever renders it. One submission at a time.
#[derive(Debug, Default)]
pub struct DetailForm {
    pub input: ProductInput,
    images: Vec<ImageFile>,
    busy: bool,
    result: Option<GenerationResult>,
    submitted_images: Vec<ImageFile>,
    error: Option<String>,
}

impl DetailForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the acceptable files and drops the rest. The last rejection is
    /// kept as the form error; a batch with any accepted file clears it.
    pub fn add_images(&mut self, files: Vec<ImageFile>) -> usize {
        let mut added = 0;
        for file in files {
            match file.check() {
                Ok(_) => {
                    self.images.push(file);
                    added += 1;
                }
                Err(e) => self.error = Some(e.to_string()),
            }
        }
        if added > 0 {
            self.error = None;
        }
        added
    }

    pub fn remove_image(&mut self, index: usize) -> Option<ImageFile> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    pub fn images(&self) -> &[ImageFile] {
        &self.images
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    /// Sections of the last result paired with the images they were generated for.
    pub fn rendered_sections(&self) -> Vec<(&Section, &ImageFile)> {
        match &self.result {
            Some(result) => pair_sections(&result.sections, &self.submitted_images),
            None => Vec::new(),
        }
    }

    pub async fn submit(&mut self, client: &RelayClient) -> Result<(), ClientError> {
        if self.busy {
            return Err(ClientError::Busy);
        }
        self.error = None;

        let outcome = {
            self.busy = true;
            let _busy = BusyGuard(&mut self.busy);
            client.generate(&self.input, &self.images).await
        };

        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.submitted_images = self.images.clone();
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

/// Clears the busy flag even when the submit future is dropped mid-flight.
struct BusyGuard<'a>(&'a mut bool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

/// Index-aligned pairs; anything past the shorter list is skipped.
pub fn pair_sections<'a, T>(sections: &'a [Section], images: &'a [T]) -> Vec<(&'a Section, &'a T)> {
    sections.iter().zip(images.iter()).collect()
}
