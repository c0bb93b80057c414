use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub creator_id: String,
    pub question: String,
    pub category: String,
    pub status: PollStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollStatus {
    Open,
    Closed,
}

impl PollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollStatus::Open => "open",
            PollStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(PollStatus::Open),
            "closed" => Some(PollStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub id: String,
    pub poll_id: String,
    pub text: String,
}

/// A single user's pick on a poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResponse {
    pub user_id: String,
    pub poll_id: String,
    pub option_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Free-text question asked alongside a poll ("why did you pick that?").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpQuestion {
    pub id: String,
    pub poll_id: String,
    pub question: String,
}

/// Poll status transition applied together with a guide insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub poll_id: String,
    pub status: PollStatus,
}

/// AI-written summary of a poll's outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideRecord {
    pub id: String,
    pub poll_id: String,
    pub title: String,
    pub content: String,
    pub created_at: NaiveDate,
    pub category: String,
    pub guide_type: String,
    pub like_count: i64,
    pub revote_count: i64,
}

impl Poll {
    pub fn new(creator_id: String, question: String, category: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            creator_id,
            question,
            category,
            status: PollStatus::Open,
            created_at: Utc::now(),
        }
    }
}

impl PollOption {
    pub fn new(poll_id: &str, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            poll_id: poll_id.to_string(),
            text: text.into(),
        }
    }
}

impl PollResponse {
    pub fn new(user_id: impl Into<String>, option: &PollOption) -> Self {
        Self {
            user_id: user_id.into(),
            poll_id: option.poll_id.clone(),
            option_id: option.id.clone(),
            timestamp: Utc::now(),
        }
    }
}

impl FollowUpQuestion {
    pub fn new(poll_id: &str, question: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            poll_id: poll_id.to_string(),
            question: question.into(),
        }
    }
}

impl GuideRecord {
    /// Fresh guide for `poll`, dated today with zeroed counters.
    pub fn new(poll: &Poll, title: String, content: String, guide_type: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            poll_id: poll.id.clone(),
            title,
            content,
            created_at: Utc::now().date_naive(),
            category: poll.category.clone(),
            guide_type: guide_type.to_string(),
            like_count: 0,
            revote_count: 0,
        }
    }
}
