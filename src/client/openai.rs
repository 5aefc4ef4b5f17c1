use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::error::{Result, TutorError};
use crate::models::chat::{ChatCompletionRequest, ChatCompletionResponse, ModelList};
use crate::provider::{ByteStream, ChatProvider, CompletionFuture, ModelsFuture, StreamFuture};

/// Client for any OpenAI-compatible chat completions API (Groq by default)
#[derive(Clone)]
pub struct OpenAiCompatClient {
    client: Client,
    config: ApiConfig,
}

impl OpenAiCompatClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        // Total timeouts are set per one-shot request; streamed bodies are
        // only bounded by the idle read timeout.
        let client = Client::builder()
            .connect_timeout(config.timeout())
            .read_timeout(config.timeout())
            .build()
            .map_err(|e| TutorError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn authorize(builder: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
        match api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send_chat(
        client: Client,
        url: String,
        api_key: Option<String>,
        request: ChatCompletionRequest,
        total_timeout: Option<Duration>,
    ) -> Result<Response> {
        info!(
            url = %url,
            model = %request.model,
            messages = request.messages.len(),
            stream = request.stream,
            "Sending chat completion request"
        );

        let mut builder = Self::authorize(client.post(&url), api_key.as_deref()).json(&request);
        if let Some(timeout) = total_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TutorError::Request(format!("Chat request failed: {}", e)))?;

        ensure_success(response).await
    }
}

/// Turn a non-success status into a connection error carrying the body text
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    info!("Upstream responded with status: {}", status);

    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    Err(TutorError::Connection {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        body,
    })
}

impl ChatProvider for OpenAiCompatClient {
    fn stream_chat(&self, mut request: ChatCompletionRequest) -> StreamFuture {
        request.stream = true;
        let url = self.config.endpoint("chat/completions");
        let client = self.client.clone();
        let api_key = self.config.api_key.clone();

        Box::pin(async move {
            let response = Self::send_chat(client, url, api_key, request, None).await?;
            let stream: ByteStream = Box::pin(response.bytes_stream());
            Ok(stream)
        })
    }

    fn complete(&self, mut request: ChatCompletionRequest) -> CompletionFuture {
        request.stream = false;
        let url = self.config.endpoint("chat/completions");
        let client = self.client.clone();
        let api_key = self.config.api_key.clone();
        let timeout = self.config.timeout();

        Box::pin(async move {
            let response = Self::send_chat(client, url, api_key, request, Some(timeout)).await?;
            let body = response
                .bytes()
                .await
                .map_err(|e| TutorError::StreamRead(format!("Failed to read body: {}", e)))?;
            debug!(size = body.len(), "Received completion body");

            serde_json::from_slice::<ChatCompletionResponse>(&body)
                .map_err(|e| TutorError::InvalidResponse(format!("Completion body: {}", e)))
        })
    }

    fn list_models(&self) -> ModelsFuture {
        let url = self.config.endpoint("models");
        let client = self.client.clone();
        let api_key = self.config.api_key.clone();
        let timeout = self.config.timeout();

        Box::pin(async move {
            debug!(url = %url, "Listing models");
            let response = Self::authorize(client.get(&url), api_key.as_deref())
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| TutorError::Request(format!("Models request failed: {}", e)))?;

            let response = ensure_success(response).await?;
            response
                .json::<ModelList>()
                .await
                .map_err(|e| TutorError::InvalidResponse(format!("Model list: {}", e)))
        })
    }

    fn name(&self) -> &str {
        "OpenAI-compatible"
    }
}
