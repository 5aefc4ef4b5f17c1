//! # Snowfall
//!
//! Client core for an AI tutor that talks to an OpenAI-compatible chat
//! completions API (Groq by default).
//!
//! ## Overview
//!
//! - Streaming replies are consumed as server-sent events and assembled into
//!   text fragments as they arrive, independent of how the network chunks
//!   the body
//! - Study artifacts (flashcards, exercises, short-answer grading) are produced
//!   with JSON-mode completions over the space's conversation and sources
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snowfall::chat::{build_chat_request, stream_reply};
//! use snowfall::client::OpenAiCompatClient;
//! use snowfall::config::SnowfallConfig;
//! use snowfall::models::ChatMessage;
//!
//! # async fn run() -> snowfall::Result<()> {
//! let config = SnowfallConfig::from_env()?;
//! let client = OpenAiCompatClient::new(config.api.clone())?;
//!
//! let request = build_chat_request(
//!     None,
//!     &config.api.default_model,
//!     &[ChatMessage::user("Explain borrowing")],
//!     "You are a patient Rust tutor.",
//! );
//! let mut reply = stream_reply(&client, request).await?;
//! while let Some(fragment) = reply.next_fragment().await {
//!     print!("{}", fragment?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types and handling
//! - [`models`] - Chat completions wire types
//! - [`provider`] - Backend abstraction
//! - [`client`] - reqwest implementation of the backend
//! - [`streaming`] - UTF-8 stream decoding, SSE parsing and fragment assembly
//! - [`chat`] - Request building and reply streaming
//! - [`study`] - Flashcard, exercise and answer evaluation generators

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod streaming;
pub mod study;

pub use config::SnowfallConfig;
pub use error::{Result, TutorError};
pub use streaming::{AssemblerState, StreamingTextAssembler};
