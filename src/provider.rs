use bytes::Bytes;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::models::chat::{ChatCompletionRequest, ChatCompletionResponse, ModelList};

/// Raw response body of a streaming completion
pub type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Type alias for the future returned by stream_chat
pub type StreamFuture = Pin<Box<dyn Future<Output = Result<ByteStream>> + Send>>;

pub type CompletionFuture = Pin<Box<dyn Future<Output = Result<ChatCompletionResponse>> + Send>>;

pub type ModelsFuture = Pin<Box<dyn Future<Output = Result<ModelList>> + Send>>;

/// Trait for OpenAI-compatible chat backends
pub trait ChatProvider: Send + Sync {
    /// Start a streaming completion
    ///
    /// Resolves only after the upstream status is known: a non-success status
    /// is returned as a connection error and the body is never streamed.
    fn stream_chat(&self, request: ChatCompletionRequest) -> StreamFuture;

    /// Run a non-streaming completion and return the parsed body
    fn complete(&self, request: ChatCompletionRequest) -> CompletionFuture;

    fn list_models(&self) -> ModelsFuture;

    /// Get the provider name for logging
    fn name(&self) -> &str;
}
