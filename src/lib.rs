//! Poll guide generation: poll statistics, translation and a language model
//! turned into a stored, human-readable guide.

pub mod config;
pub mod db;
pub mod gateway;
pub mod guide;
pub mod models;
pub mod voting;

pub use config::Config;
pub use guide::{GuideError, GuideGenerator, RequestTracker};
