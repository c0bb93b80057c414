pub mod tally;

pub use tally::{aggregate, leading, percentage_block};

// Per-option outcome of a poll
#[derive(Debug, Clone, PartialEq)]
pub struct OptionTally {
    pub option_id: String,
    pub content: String,
    pub response_count: usize,
    pub percentage: f64, // 0..=100, zero when nobody responded
}
