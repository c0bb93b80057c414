//! External AI services the guide pipeline talks to.

pub mod chat;
pub mod google;

use async_trait::async_trait;
use thiserror::Error;

pub use chat::ChatCompletionGateway;
pub use google::GoogleTranslateGateway;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("service responded with status {0}")]
    Status(u16),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Network(e.to_string())
    }
}

/// Machine translation between two language codes.
#[async_trait]
pub trait TranslationGateway: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, GatewayError>;
}

/// A language model answering a single prompt.
#[async_trait]
pub trait LanguageModelGateway: Send + Sync {
    async fn ask(&self, prompt: &str) -> Result<String, GatewayError>;
}
