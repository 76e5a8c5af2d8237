//! Inference client: the single point of entry for hosted model calls.
//!
//! Every model interaction goes through a [`TextGenerator`]. The production
//! backend is [`HfInferenceClient`]; tests substitute scripted generators.
//!
//! One call per request with a fixed timeout. Nothing is retried.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub mod extract;
pub mod literal;
pub mod prompts;
pub mod qa;
pub mod recovery;

pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Inference API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Inference response was not JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

/// A hosted text-generation backend. Returns the raw response envelope.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Value, InferenceError>;
}

/// Client for the Hugging Face style inference API (`POST <base>/<model>`).
#[derive(Clone)]
pub struct HfInferenceClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HfInferenceClient {
    pub fn new(base_url: impl Into<String>, api_key: String) -> Result<Self, InferenceError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/{}", self.base_url, model.trim_start_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for HfInferenceClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Value, InferenceError> {
        let request_body = InferenceRequest {
            inputs: prompt,
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let response = self
            .client
            .post(self.model_url(model))
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        debug!("Inference call to {model} returned {status}");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Pulls the generated text out of a response envelope.
///
/// Accepts `[{"generated_text": ..}]` or `{"generated_text": ..}`; anything
/// else is returned as the serialized envelope.
pub fn generated_text(envelope: &Value) -> String {
    let text = match envelope {
        Value::Array(items) => items.first().and_then(|first| first.get("generated_text")),
        Value::Object(map) => map.get("generated_text"),
        _ => None,
    };

    match text {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => envelope.to_string(),
    }
}
