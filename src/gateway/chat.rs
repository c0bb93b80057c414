use crate::gateway::{GatewayError, LanguageModelGateway};
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

/// OpenAI-compatible `/chat/completions` client (DeepSeek, OpenAI, local servers).
pub struct ChatCompletionGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionGateway {
    pub fn new(endpoint: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LanguageModelGateway for ChatCompletionGateway {
    async fn ask(&self, prompt: &str) -> Result<String, GatewayError> {
        let request_start = std::time::Instant::now();

        let request_body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": 0.7
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Status(response.status().as_u16()));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = response_json
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| GatewayError::InvalidResponse("No content in response".to_string()))?;

        debug!(
            "Chat completion from {} took {:?} ({} chars)",
            self.model,
            request_start.elapsed(),
            content.len()
        );

        Ok(content.to_string())
    }
}
