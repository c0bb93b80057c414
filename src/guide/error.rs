use crate::db::StoreError;
use crate::gateway::GatewayError;
use std::fmt;
use thiserror::Error;

pub type GuideResult<T> = Result<T, GuideError>;

/// Why a checkpoint refused to let a run continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    ShuttingDown,
    /// The run's entry is gone from the tracker.
    NotTracked,
    /// A newer run took over the key, or a caller cancelled it.
    Superseded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::ShuttingDown => write!(f, "server is shutting down"),
            CancelReason::NotTracked => write!(f, "request is no longer tracked"),
            CancelReason::Superseded => write!(f, "request was cancelled"),
        }
    }
}

#[derive(Error, Debug)]
pub enum GuideError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("guide generation cancelled: {0}")]
    Cancelled(CancelReason),

    #[error("language model reply did not follow the guide format")]
    MalformedResponse { raw: String },

    /// Anything unexpected; the cause is kept for logs but never displayed.
    #[error("guide generation failed")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<StoreError> for GuideError {
    fn from(e: StoreError) -> Self {
        GuideError::Failed(Box::new(e))
    }
}

impl From<GatewayError> for GuideError {
    fn from(e: GatewayError) -> Self {
        GuideError::Failed(Box::new(e))
    }
}
