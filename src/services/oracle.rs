use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{debug, error, info};
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::Config;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Client for the Gemini text-completion oracle.
///
/// The oracle is treated as an opaque collaborator: one prompt in, one
/// best-effort text completion out. No retries are attempted; a failed call
/// is terminal for the sub-step that issued it.
#[derive(Clone, Debug)]
pub struct GeminiOracle {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiOracle {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        info!(
            "🔮 Oracle client initialized for model {} (key prefix: {}...)",
            config.gemini_model,
            config.gemini_api_key.chars().take(3).collect::<String>()
        );

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
        })
    }

    /// Send one prompt and return the completion text.
    pub async fn generate_content(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        );

        let request_body = json!({
            "contents": [
                {
                    "parts": [
                        { "text": prompt }
                    ]
                }
            ],
            "generationConfig": {
                "temperature": 0.2
            }
        });

        debug!("Sending prompt to oracle ({} chars)", prompt.len());

        let response = match self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_timeout() {
                    error!("Oracle request timed out after 30 seconds");
                    return Err(anyhow!("Oracle request timed out after 30 seconds"));
                }
                error!("Failed to send request to oracle: {}", e);
                return Err(anyhow!("Failed to send request to oracle: {}", e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            error!("Oracle error: Status {}, Details: {}", status, error_text);
            return Err(anyhow!(
                "Oracle error: Status {}, Details: {}",
                status,
                error_text
            ));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse oracle response: {}", e))?;

        let content = response_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                error!(
                    "Could not extract completion text from oracle response: {:?}",
                    response_json
                );
                anyhow!("Could not extract completion text from oracle response")
            })?;

        debug!("Oracle returned {} chars", content.len());
        Ok(content.to_string())
    }
}
