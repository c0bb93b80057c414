//! AI guide generation: turns a poll's results and follow-up answers into a
//! written guide through translation and a language model.
//!
//! A run registers with the [`RequestTracker`] under `"<poll id>-<guide type>"`
//! and checks for cancellation between every stage. A newer run for the same
//! key, an explicit cancel or shutdown stops it at its next stage boundary.

pub mod chunker;
pub mod error;
pub mod prompt;
pub mod tracker;
pub mod translation;

pub use error::{CancelReason, GuideError, GuideResult};
pub use tracker::{RequestTicket, RequestTracker};
pub use translation::{Direction, TranslationPipeline};

use crate::db::Storage;
use crate::gateway::LanguageModelGateway;
use crate::models::{GuideRecord, PollStatus, StatusChange};
use crate::voting;
use chrono::Utc;
use log::{error, info, warn};
use prompt::PromptContext;
use std::sync::Arc;

pub fn request_key(poll_id: &str, guide_type: &str) -> String {
    format!("{}-{}", poll_id, guide_type)
}

// Untracks the run on every exit path, including when the future is dropped
struct RequestGuard<'a> {
    tracker: &'a RequestTracker,
    ticket: RequestTicket,
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        self.tracker.end(&self.ticket);
    }
}

pub struct GuideGenerator {
    storage: Arc<dyn Storage>,
    translator: TranslationPipeline,
    model: Arc<dyn LanguageModelGateway>,
    tracker: Arc<RequestTracker>,
}

impl GuideGenerator {
    pub fn new(
        storage: Arc<dyn Storage>,
        translator: TranslationPipeline,
        model: Arc<dyn LanguageModelGateway>,
        tracker: Arc<RequestTracker>,
    ) -> Self {
        Self {
            storage,
            translator,
            model,
            tracker,
        }
    }

    pub fn tracker(&self) -> &Arc<RequestTracker> {
        &self.tracker
    }

    /// Generates, stores and returns a guide for `poll_id`, closing the poll
    /// in the same transaction.
    pub async fn generate_guide(&self, poll_id: &str, guide_type: &str) -> GuideResult<GuideRecord> {
        let guard = RequestGuard {
            tracker: &self.tracker,
            ticket: self.tracker.start(&request_key(poll_id, guide_type)),
        };
        let key = guard.ticket.key();

        let outcome = self.run(&guard.ticket, poll_id, guide_type).await;
        let elapsed_ms = (Utc::now() - guard.ticket.created_at()).num_milliseconds();

        match outcome {
            Ok(guide) => {
                info!("Guide {} generated for {} in {}ms", guide.id, key, elapsed_ms);
                Ok(guide)
            }
            Err(GuideError::Failed(cause)) => {
                error!("Guide generation for {} failed: {}", key, cause);
                Err(GuideError::Failed(cause))
            }
            Err(e) => {
                warn!("Guide generation for {} stopped after {}ms: {}", key, elapsed_ms, e);
                Err(e)
            }
        }
    }

    async fn run(&self, ticket: &RequestTicket, poll_id: &str, guide_type: &str) -> GuideResult<GuideRecord> {
        let key = ticket.key();

        self.tracker.check_cancelled(ticket)?;
        let mut poll = self
            .storage
            .find_by_id(poll_id)
            .await?
            .ok_or_else(|| GuideError::NotFound(format!("poll {}", poll_id)))?;
        // Written together with the guide
        poll.status = PollStatus::Closed;

        self.tracker.check_cancelled(ticket)?;
        let options = self.storage.find_options(poll_id).await?;
        if options.is_empty() {
            return Err(GuideError::NotFound(format!("options for poll {}", poll_id)));
        }
        let responses = self.storage.find_responses(poll_id).await?;
        let tallies = voting::aggregate(&options, &responses);
        let leading_option = voting::leading(&tallies)
            .map(|tally| tally.content.clone())
            .unwrap_or_default();
        let percentage_block = voting::percentage_block(&tallies);
        info!("Tallied {} response(s) across {} option(s) for {}", responses.len(), options.len(), key);

        self.tracker.check_cancelled(ticket)?;
        let question = self
            .storage
            .find_question(poll_id)
            .await?
            .ok_or_else(|| GuideError::NotFound(format!("follow-up question for poll {}", poll_id)))?;
        let answers = self.storage.find_answers(&question.id).await?;

        self.tracker.check_cancelled(ticket)?;
        let prompt_text = PromptContext {
            poll_title: poll.question.clone(),
            leading_option,
            percentage_block,
            follow_up_question: question.question,
            follow_up_answers: answers.join("\n"),
            guide_type: guide_type.to_string(),
        }
        .render();

        self.tracker.check_cancelled(ticket)?;
        info!("Translating prompt for {}", key);
        let translated_prompt = self.translator.translate_long(&prompt_text, Direction::ToPivot).await;

        self.tracker.check_cancelled(ticket)?;
        info!("Asking language model for {}", key);
        let reply = prompt::strip_reasoning(&self.model.ask(&translated_prompt).await?);
        info!("Language model answered for {}", key);

        self.tracker.check_cancelled(ticket)?;
        let (title, content) = prompt::parse_reply(&reply).inspect_err(|e| {
            if let GuideError::MalformedResponse { raw } = e {
                error!("Unexpected reply format for {}: {}", key, raw);
            }
        })?;

        self.tracker.check_cancelled(ticket)?;
        info!("Translating guide title for {}", key);
        let title = self.translator.translate_long(&title, Direction::FromPivot).await;

        self.tracker.check_cancelled(ticket)?;
        info!("Translating guide content for {}", key);
        let content = self.translator.translate_long(&content, Direction::FromPivot).await;

        self.tracker.check_cancelled(ticket)?;
        let guide = GuideRecord::new(&poll, title, content, guide_type);
        let status_change = StatusChange {
            poll_id: poll.id.clone(),
            status: poll.status,
        };
        Ok(self.storage.save(guide, status_change).await?)
    }
}
