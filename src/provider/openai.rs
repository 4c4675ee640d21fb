//! OpenAI-compatible images client (`POST {base}/images/generations`).

use crate::error::{ApiError, GenerationError};
use crate::provider::{GeneratedImage, ImageModel};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a str>,
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

// Helper function to map HTTP errors to GenerationError
fn map_http_error(error: reqwest::Error) -> GenerationError {
    if let Some(status) = error.status() {
        map_status(status.as_u16(), &error.to_string())
    } else if error.is_timeout() {
        GenerationError::Provider(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        GenerationError::Provider(format!("Connection error: {}", error))
    } else {
        GenerationError::Provider(format!("HTTP error: {}", error))
    }
}

fn map_status(status: u16, body: &str) -> GenerationError {
    match status {
        401 | 403 => GenerationError::AuthFailed(body.to_string()),
        429 => GenerationError::RateLimited(body.to_string()),
        _ => GenerationError::Provider(format!("Request failed with status {}: {}", status, body)),
    }
}

fn build_provider_http_client(timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(timeout)
        .build()
        .map_err(|e| ApiError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

/// OpenAI (or compatible) image generation client
pub struct OpenAiImageClient {
    client: Client,
    provider_name: &'static str,
    model: String,
    api_key: Option<String>,
    base_url: String,
    size: String,
}

impl OpenAiImageClient {
    pub fn new(
        provider_name: &'static str,
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
        size: String,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = build_provider_http_client(timeout)?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            provider_name,
            model,
            api_key,
            base_url,
            size,
        })
    }

    /// gpt-image models always return base64 and reject `response_format`.
    fn response_format(&self) -> Option<&'static str> {
        if self.model.starts_with("gpt-image") {
            None
        } else {
            Some("b64_json")
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, GenerationError> {
        let response = self.client.get(url).send().await.map_err(map_http_error)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(map_status(status, "image download failed"));
        }
        let bytes = response.bytes().await.map_err(map_http_error)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageModel for OpenAiImageClient {
    async fn invoke(&self, prompt: &str) -> Result<GeneratedImage, GenerationError> {
        let request = ImageGenerationRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: &self.size,
            response_format: self.response_format(),
        };

        let url = format!("{}/images/generations", self.base_url);
        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(map_http_error)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status, &error_text));
        }

        let parsed: ImageGenerationResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Provider(format!("Failed to parse response: {}", e)))?;

        let bytes = match parsed.data.into_iter().next() {
            Some(ImageData {
                b64_json: Some(encoded),
                ..
            }) => base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| GenerationError::Provider(format!("Invalid base64 image: {}", e)))?,
            Some(ImageData { url: Some(url), .. }) => {
                debug!(model = %self.model, "Downloading generated image from URL");
                self.download(&url).await?
            }
            _ => return Err(GenerationError::NoImage),
        };

        if bytes.is_empty() {
            return Err(GenerationError::NoImage);
        }
        Ok(GeneratedImage::from_bytes(bytes))
    }

    fn provider_name(&self) -> &str {
        self.provider_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
