//! Image Model Provider Abstraction
//!
//! The external image-generation capability consumed by the orchestrator: one prompt in,
//! one image payload (or a typed failure) out. Single call, single attempt.

use crate::error::{ApiError, GenerationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod openai;

pub use openai::OpenAiImageClient;

/// Raw image returned by a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedImage {
    /// Build from bytes, sniffing the mime type from the payload.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mime_type = sniff_mime_type(&bytes).to_string();
        Self { bytes, mime_type }
    }
}

/// Image model client trait
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Generate one image for a prompt. No internal retry.
    async fn invoke(&self, prompt: &str) -> Result<GeneratedImage, GenerationError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderType {
    /// OpenAI images API
    #[serde(rename = "openai")]
    OpenAI,
    /// Any server exposing an OpenAI-compatible `/images/generations` endpoint
    #[serde(rename = "local_custom")]
    LocalCustom,
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_type")]
    pub provider_type: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    /// Inline API key; prefer `api_key_env`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL, e.g. `http://localhost:8080/v1`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Requested image size, e.g. `1024x1024`
    #[serde(default = "default_image_size")]
    pub image_size: String,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_provider_type() -> ProviderType {
    ProviderType::OpenAI
}

fn default_model() -> String {
    "gpt-image-1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            endpoint: None,
            image_size: default_image_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("endpoint must be an http(s) URL, got '{}'", endpoint));
            }
        }
        if self.provider_type == ProviderType::LocalCustom && self.endpoint.is_none() {
            return Err("local_custom provider requires an endpoint".to_string());
        }
        if parse_image_size(&self.image_size).is_none() {
            return Err(format!(
                "image_size must look like WIDTHxHEIGHT, got '{}'",
                self.image_size
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be at least 1".to_string());
        }
        Ok(())
    }

    /// Inline key first, then the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty()))
    }

    /// Construct the configured client.
    pub fn build_client(&self) -> Result<Arc<dyn ImageModel>, ApiError> {
        self.validate().map_err(ApiError::ConfigError)?;
        let timeout = Duration::from_secs(self.request_timeout_secs);
        let client = match self.provider_type {
            ProviderType::OpenAI => {
                let api_key = self.resolve_api_key().ok_or_else(|| {
                    ApiError::ProviderNotConfigured(format!(
                        "no API key (set {} or provider.api_key)",
                        self.api_key_env
                    ))
                })?;
                OpenAiImageClient::new(
                    "openai",
                    self.model.clone(),
                    Some(api_key),
                    self.endpoint.clone(),
                    self.image_size.clone(),
                    timeout,
                )?
            }
            ProviderType::LocalCustom => OpenAiImageClient::new(
                "local_custom",
                self.model.clone(),
                self.resolve_api_key(),
                self.endpoint.clone(),
                self.image_size.clone(),
                timeout,
            )?,
        };
        Ok(Arc::new(client))
    }
}

fn parse_image_size(size: &str) -> Option<(u32, u32)> {
    let (w, h) = size.split_once('x')?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

/// Mime type of an encoded image payload; `application/octet-stream` when unknown.
pub fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type(),
        Err(_) => "application/octet-stream",
    }
}

/// File extension for a mime type.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}
