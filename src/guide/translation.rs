use crate::gateway::TranslationGateway;
use crate::guide::chunker;
use log::warn;
use std::sync::Arc;

/// Longest chunk sent to the translation service in one call.
pub const MAX_CHUNK_SIZE: usize = 450;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Source language into the language model's language.
    ToPivot,
    /// Language model output back into the source language.
    FromPivot,
}

/// Translates text of any length through a gateway with a per-call size limit.
pub struct TranslationPipeline {
    gateway: Arc<dyn TranslationGateway>,
    source_lang: String,
    pivot_lang: String,
}

impl TranslationPipeline {
    pub fn new(gateway: Arc<dyn TranslationGateway>, source_lang: &str, pivot_lang: &str) -> Self {
        Self {
            gateway,
            source_lang: source_lang.to_string(),
            pivot_lang: pivot_lang.to_string(),
        }
    }

    fn languages(&self, direction: Direction) -> (&str, &str) {
        match direction {
            Direction::ToPivot => (&self.source_lang, &self.pivot_lang),
            Direction::FromPivot => (&self.pivot_lang, &self.source_lang),
        }
    }

    /// Best effort: a chunk the gateway fails on is passed through untranslated.
    pub async fn translate_long(&self, text: &str, direction: Direction) -> String {
        let (source, target) = self.languages(direction);
        let mut translated = String::new();

        for chunk in chunker::chunk(text, MAX_CHUNK_SIZE) {
            match self.gateway.translate(&chunk, source, target).await {
                Ok(result) => translated.push_str(&result),
                Err(e) => {
                    warn!("Translation {} -> {} failed, keeping original chunk: {}", source, target, e);
                    translated.push_str(&chunk);
                }
            }
            translated.push(' ');
        }

        translated.trim().to_string()
    }
}
