//! Gemini `embedContent` REST client

use crate::error::EmbeddingError;
use crate::provider::{EmbeddingProvider, TaskType};
use serde::{Deserialize, Serialize};
use studysim_core::Vector;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-embedding-exp-03-07";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

pub struct GeminiClient {
    http: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client, reading the API key from `config.api_key_env`
    pub fn from_env(config: &GeminiConfig) -> Result<Self, EmbeddingError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| EmbeddingError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(config, api_key)
    }

    pub fn new(config: &GeminiConfig, api_key: String) -> Result<Self, EmbeddingError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            url: embed_url(&config.endpoint, &config.model),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn embed_url(endpoint: &str, model: &str) -> String {
    format!("{}/models/{}:embedContent", endpoint.trim_end_matches('/'), model)
}

impl EmbeddingProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn embed(&self, text: &str, task: TaskType) -> Result<Vector, EmbeddingError> {
        let request = EmbedRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: [Part { text }],
            },
            task_type: task,
        };

        debug!(model = %self.model, chars = text.len(), "Requesting embedding");
        let response = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbedResponse = response.json().await?;
        if parsed.embedding.values.is_empty() {
            return Err(EmbeddingError::EmptyEmbedding);
        }
        Ok(Vector::new(parsed.embedding.values))
    }
}
