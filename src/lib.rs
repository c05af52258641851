//! Vidask - Ask questions about YouTube videos
//!
//! Answers questions and writes summaries grounded in a video's transcript.
//!
//! # Overview
//!
//! Vidask allows you to:
//! - Ask questions about a video, keeping the conversation context between turns
//! - Get a formatted summary of a video, cached per video
//! - Read a video's transcript grouped into 30-second intervals
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings and prompt templates
//! - `transcript` - Transcript retrieval (YouTube captions)
//! - `chunking` - Splitting transcripts under a token budget
//! - `conversation` - Chat history normalization and formatting
//! - `completion` - Language model access, with retry
//! - `qa` - Per-chunk relevance probing and answer synthesis
//! - `summary` - Chunked summaries and the summary cache
//! - `assistant` - Request coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use vidask::assistant::VideoAssistant;
//! use vidask::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let assistant = VideoAssistant::new(&settings)?;
//!
//!     let answer = assistant
//!         .answer("dQw4w9WgXcQ", "What is this song about?", &[])
//!         .await?;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod assistant;
pub mod chunking;
pub mod cli;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod openai;
pub mod qa;
pub mod summary;
pub mod transcript;

pub use error::{Result, VidaskError};
