use crate::gateway::{GatewayError, TranslationGateway};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";

/// Google Cloud Translation (v2 REST, API key auth).
pub struct GoogleTranslateGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

impl GoogleTranslateGateway {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl TranslationGateway for GoogleTranslateGateway {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, GatewayError> {
        debug!("Translating {} chars {} -> {}", text.chars().count(), source, target);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "q": text,
                "source": source,
                "target": target,
                "format": "text"
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Status(response.status().as_u16()));
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        body.data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| GatewayError::InvalidResponse("No translations in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_language_pair_and_reads_translation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2"))
            .and(query_param("key", "k1"))
            .and(body_partial_json(serde_json::json!({ "q": "안녕", "source": "ko", "target": "en" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "translations": [{ "translatedText": "Hello" }] }
            })))
            .mount(&server)
            .await;

        let gateway = GoogleTranslateGateway::new(&format!("{}/v2", server.uri()), "k1");
        assert_eq!(gateway.translate("안녕", "ko", "en").await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let gateway = GoogleTranslateGateway::new(&server.uri(), "k1");
        let err = gateway.translate("x", "ko", "en").await.unwrap_err();
        assert!(matches!(err, GatewayError::Status(503)));
    }
}
