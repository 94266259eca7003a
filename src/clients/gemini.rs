use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::clients::GenerationClient;
use crate::error::{GenerationError, ServiceError};

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: String,
}

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

impl GeminiConfig {
    pub fn new(api_key: String) -> Self {
        Self { api_key, model: DEFAULT_MODEL.to_string() }
    }
}

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        info!(model = %config.model, "Creating new Gemini client");
        Self { config, client: Client::new() }
    }

    /// Read `GEMINI_API_KEY` from the environment (or a `.env` file). A
    /// missing credential fails here, before any request can be issued.
    pub fn from_env() -> Result<Self, GenerationError> {
        let _ = dotenvy::dotenv();
        let api_key = env::var("GEMINI_API_KEY").map_err(|_| {
            error!("GEMINI_API_KEY is not set");
            GenerationError::Configuration
        })?;
        Ok(Self::new(GeminiConfig::new(api_key)))
    }

    pub fn with_model(mut self, model: String) -> Self {
        info!(model = %model, "Setting Gemini model");
        self.config.model = model;
        self
    }

    /// Swap in a pre-built `reqwest::Client`, e.g. one with timeouts
    /// configured by the embedding application.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len(), model = %self.config.model, structured))]
    async fn generate(&self, prompt: String, structured: bool) -> Result<String, ServiceError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent { parts: vec![GeminiPart { text: prompt }] }],
            generation_config: structured.then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };

        let url = format!("{API_BASE}/{}:generateContent", self.config.model);
        debug!("Sending request to Gemini API");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                ServiceError::Http(e.to_string())
            })?;

        debug!(status = %response.status(), "Received response from Gemini API");

        if response.status() == 429 {
            warn!("Gemini API rate limit exceeded");
            return Err(ServiceError::RateLimit);
        }

        if response.status() == 401 || response.status() == 403 {
            error!("Gemini API authentication failed");
            return Err(ServiceError::Authentication);
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Gemini API error");
            return Err(ServiceError::Api(error_text));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Gemini response envelope");
            ServiceError::Http(e.to_string())
        })?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|part| part.text.clone())
            .ok_or_else(|| {
                error!("No candidates in Gemini response");
                ServiceError::Api("No content in response".to_string())
            })?;

        info!(response_len = text.len(), "Successfully received Gemini response");
        Ok(text)
    }

    fn clone_box(&self) -> Box<dyn GenerationClient> {
        Box::new(self.clone())
    }
}
