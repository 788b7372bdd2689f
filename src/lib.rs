//! Serverless-style handler that records game scores in a top-10
//! leaderboard kept as a JSON file in a GitHub repository.

pub mod config;
pub mod contents;
pub mod error;
pub mod handler;
pub mod leaderboard;
pub mod logging;
pub mod server;

#[cfg(test)]
mod test_harness;

pub use config::{HandlerConfig, ServerConfig};
pub use error::{ConfigError, UpdateError, UpdateResult};
pub use handler::{HandlerRequest, HandlerResponse, ScoreHandler, UpdateResponse};
pub use leaderboard::{Leaderboard, ScoreEntry, ScoreSubmission, MAX_ENTRIES};
