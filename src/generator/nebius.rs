use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{Result, StudioError};
use crate::request::SettingsPayload;

pub const NEBIUS_BASE_URL: &str = "https://api.studio.nebius.com/v1";
const REQUEST_TIMEOUT_MS: u64 = 5 * 60 * 1_000;

async fn assert_ok_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(StudioError::remote(format!("Nebius request failed: {status} {text}")))
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    data: Option<Vec<ImageData>>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

/// Client for the Nebius Studio image generation endpoint. Holds the API key.
#[derive(Clone)]
pub struct NebiusClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for NebiusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NebiusClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl NebiusClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Generates one image and returns its decoded bytes.
    pub async fn generate_image(&self, prompt: &str, settings: &SettingsPayload) -> Result<Vec<u8>> {
        let mut extra_body = json!({
            "response_extension": settings.file_format.extension(),
            "width": settings.width,
            "height": settings.height,
            "num_inference_steps": settings.num_inference_steps,
            "seed": settings.seed,
        });
        if !settings.negative_prompt.trim().is_empty() {
            extra_body["negative_prompt"] = json!(settings.negative_prompt);
        }
        let body = json!({
            "model": settings.model,
            "response_format": "b64_json",
            "extra_body": extra_body,
            "prompt": prompt,
        });
        tracing::debug!(model = %settings.model, seed = settings.seed, "Sending Nebius image request");

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = assert_ok_response(response).await?;
        let response_text = response.text().await?;
        let payload: ImageGenerationResponse = serde_json::from_str(&response_text).map_err(|err| {
            StudioError::remote(format!("unreadable Nebius response: {err}, body: {response_text}"))
        })?;
        if let Some(error) = payload.error {
            return Err(StudioError::remote(format!("Nebius returned an error: {error}")));
        }
        let encoded = payload
            .data
            .and_then(|data| data.into_iter().next())
            .and_then(|image| image.b64_json)
            .ok_or_else(|| StudioError::remote("Nebius returned no image data"))?;
        STANDARD
            .decode(encoded.trim())
            .map_err(|err| StudioError::remote(format!("invalid base64 image data: {err}")))
    }
}
