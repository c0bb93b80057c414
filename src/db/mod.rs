//! Storage contracts the guide pipeline reads from and writes to, plus the
//! SQLite implementation used by the bot.

mod sqlite;

pub use sqlite::Database;

use crate::models::{FollowUpQuestion, GuideRecord, Poll, PollOption, PollResponse, StatusChange};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("missing record: {0}")]
    Missing(String),

    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PollStore: Send + Sync {
    async fn find_by_id(&self, poll_id: &str) -> StoreResult<Option<Poll>>;
}

#[async_trait]
pub trait OptionStore: Send + Sync {
    /// Options in display order.
    async fn find_options(&self, poll_id: &str) -> StoreResult<Vec<PollOption>>;
}

#[async_trait]
pub trait ResponseStore: Send + Sync {
    async fn find_responses(&self, poll_id: &str) -> StoreResult<Vec<PollResponse>>;
}

#[async_trait]
pub trait FollowUpStore: Send + Sync {
    /// The poll's first follow-up question, if it has one.
    async fn find_question(&self, poll_id: &str) -> StoreResult<Option<FollowUpQuestion>>;
    async fn find_answers(&self, question_id: &str) -> StoreResult<Vec<String>>;
}

#[async_trait]
pub trait GuideStore: Send + Sync {
    /// Inserts `guide` and applies `status_change` atomically: both commit or neither does.
    async fn save(&self, guide: GuideRecord, status_change: StatusChange) -> StoreResult<GuideRecord>;
}

/// Everything the guide pipeline needs from persistence.
pub trait Storage: PollStore + OptionStore + ResponseStore + FollowUpStore + GuideStore {}

impl<T> Storage for T where T: PollStore + OptionStore + ResponseStore + FollowUpStore + GuideStore {}
