//! ReviewLens - review regret analysis client library
//!
//! This library talks to the ReviewLens backend, which collects product
//! reviews, extracts regret factors from the negative ones and runs a short
//! question-and-answer conversation before summarizing whether the product
//! is worth buying.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: Backend trait, HTTP client, endpoint table and response normalizers
//! - `conversation`: Conversation orchestrator, transcript messages and loading state
//! - `presentation`: Markdown rendering and display labels
//! - `entry_mode`: Product-catalog versus URL entry
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Terminal front-end command handlers
//!
//! # Example
//!
//! ```no_run
//! use reviewlens::{Config, Conversation, HttpBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let backend = HttpBackend::new(&config.api)?;
//!     let mut conversation = Conversation::new(backend, config.chat.clone());
//!     conversation.initialize().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod entry_mode;
pub mod error;
pub mod presentation;

// Re-export commonly used types
pub use api::{HttpBackend, ReviewBackend};
pub use config::Config;
pub use conversation::{Conversation, ConversationState};
pub use entry_mode::EntryMode;
pub use error::{Result, ReviewLensError};

#[cfg(test)]
pub mod test_utils;
