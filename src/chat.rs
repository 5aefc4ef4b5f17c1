use tracing::{info, warn};

use crate::error::Result;
use crate::models::chat::{ChatCompletionRequest, ChatMessage, ModelInfo};
use crate::provider::{ByteStream, ChatProvider};
use crate::streaming::StreamingTextAssembler;

/// Build a streaming request: system prompt first, then the conversation
///
/// An absent or blank `model` falls back to `default_model`.
pub fn build_chat_request(
    model: Option<&str>,
    default_model: &str,
    conversation: &[ChatMessage],
    system_prompt: &str,
) -> ChatCompletionRequest {
    let model = model
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(default_model);

    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend_from_slice(conversation);

    ChatCompletionRequest {
        model: model.to_string(),
        messages,
        stream: true,
        temperature: None,
        response_format: None,
    }
}

/// Connect and wrap the reply body in a fresh assembler
///
/// Connection failures surface here, before any fragment can be pulled.
pub async fn stream_reply(
    provider: &dyn ChatProvider,
    request: ChatCompletionRequest,
) -> Result<StreamingTextAssembler<ByteStream>> {
    let model = request.model.clone();
    let body = provider.stream_chat(request).await?;
    let assembler = StreamingTextAssembler::new(body);
    info!(
        provider = provider.name(),
        model = %model,
        stream_id = %assembler.stream_id(),
        "Streaming reply"
    );
    Ok(assembler)
}

#[derive(Debug, Clone, Default)]
pub struct ProviderStatus {
    pub available: bool,
    pub models: Vec<ModelInfo>,
}

/// Query the model listing; any failure reads as unavailable
pub async fn check_status(provider: &dyn ChatProvider) -> ProviderStatus {
    match provider.list_models().await {
        Ok(list) => ProviderStatus {
            available: true,
            models: list.data,
        },
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "Provider unavailable");
            ProviderStatus::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;

    #[test]
    fn test_build_request_prepends_system_prompt() {
        let conversation = vec![
            ChatMessage::user("What is a monad?"),
            ChatMessage::assistant("A monoid in the category of endofunctors."),
            ChatMessage::user("Simpler please"),
        ];
        let req = build_chat_request(Some("mixtral"), "llama", &conversation, "You tutor Haskell");

        assert_eq!(req.model, "mixtral");
        assert!(req.stream);
        assert_eq!(req.messages.len(), 4);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[0].content, "You tutor Haskell");
        assert_eq!(&req.messages[1..], conversation.as_slice());
    }

    #[test]
    fn test_build_request_default_model() {
        let req = build_chat_request(None, "llama-3.3-70b-versatile", &[], "sys");
        assert_eq!(req.model, "llama-3.3-70b-versatile");

        let req = build_chat_request(Some("  "), "llama-3.3-70b-versatile", &[], "sys");
        assert_eq!(req.model, "llama-3.3-70b-versatile");
        assert_eq!(req.messages.len(), 1);
    }
}
