use serde::{Deserialize, Serialize};
use tracing::info;

use super::context::{StudyContext, sources_digest, transcript};
use super::{complete_json, lenient_string, parse_artifact};
use crate::error::Result;
use crate::models::chat::{ChatCompletionRequest, ChatMessage};
use crate::provider::ChatProvider;

const CONVERSATION_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Flashcard {
    #[serde(deserialize_with = "lenient_string")]
    pub front: String,
    #[serde(deserialize_with = "lenient_string")]
    pub back: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub topic: String,
}

#[derive(Debug, Deserialize)]
struct FlashcardDeck {
    #[serde(default)]
    flashcards: Vec<Flashcard>,
}

fn system_prompt(ctx: &StudyContext, count: usize) -> String {
    let conversation = transcript(&ctx.conversation, CONVERSATION_WINDOW);
    let sources = sources_digest(&ctx.sources);

    let mut prompt = format!(
        "You create study flashcards. From the material below, write {count} flashcards \
         covering its most important concepts.\n\n"
    );
    if !conversation.is_empty() {
        prompt.push_str(&format!("CONVERSATION CONTEXT:\n{conversation}\n\n"));
    }
    if !sources.is_empty() {
        prompt.push_str(&format!("LEARNING SOURCES:\n{sources}\n\n"));
    }
    if conversation.is_empty() && sources.is_empty() {
        prompt.push_str(&format!("The student is learning about {}.\n\n", ctx.space_name));
    }
    prompt.push_str(&format!(
        "Write exactly {count} cards. The front asks one focused question, the back gives a \
         concise complete answer, and questions test understanding rather than recall.\n\n\
         Return ONLY valid JSON in this format:\n\
         {{\"flashcards\": [{{\"front\": \"question or term\", \"back\": \"answer\", \
         \"topic\": \"short topic label\"}}]}}"
    ));
    prompt
}

/// Generate `count` flashcards from the space's conversation and sources
///
/// A reply without a `flashcards` array yields an empty deck.
pub async fn generate_flashcards(
    provider: &dyn ChatProvider,
    model: &str,
    ctx: &StudyContext,
    count: usize,
) -> Result<Vec<Flashcard>> {
    let request = ChatCompletionRequest::json_object(
        model,
        vec![
            ChatMessage::system(system_prompt(ctx, count)),
            ChatMessage::user(format!(
                "Generate {count} flashcards based on the learning materials provided."
            )),
        ],
    );

    let content = complete_json(provider, request).await?;
    let deck: FlashcardDeck = parse_artifact(content.as_deref(), "flashcard")?;
    info!(
        space = %ctx.space_name,
        requested = count,
        generated = deck.flashcards.len(),
        "Generated flashcards"
    );
    Ok(deck.flashcards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TutorError;
    use crate::models::chat::ResponseFormat;
    use crate::study::Source;
    use crate::study::testing::CannedProvider;

    #[tokio::test]
    async fn test_generate_flashcards() {
        let provider = CannedProvider::replying(
            r#"{"flashcards":[
                {"front":"2+2?","back":4,"topic":"math"},
                {"front":"Capital of France?","back":"Paris"}
            ]}"#,
        );
        let ctx = StudyContext::new("Trivia")
            .with_conversation(vec![ChatMessage::user("quiz me")])
            .with_sources(vec![Source {
                title: "Almanac".to_string(),
                ..Source::default()
            }]);

        let cards = generate_flashcards(&provider, "llama", &ctx, 2).await.unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].back, "4");
        assert_eq!(cards[1].topic, "");

        let request = provider.last_request();
        assert_eq!(request.model, "llama");
        assert!(!request.stream);
        assert_eq!(request.response_format, Some(ResponseFormat::JsonObject));
        let system = &request.messages[0].content;
        assert!(system.contains("CONVERSATION CONTEXT:\nuser: quiz me"));
        assert!(system.contains("Source 1: Almanac"));
        assert!(!system.contains("The student is learning about"));
    }

    #[tokio::test]
    async fn test_missing_deck_is_empty() {
        let provider = CannedProvider::replying(r#"{"cards":[]}"#);
        let cards = generate_flashcards(&provider, "m", &StudyContext::new("Rust"), 5)
            .await
            .unwrap();
        assert!(cards.is_empty());
        assert!(
            provider.last_request().messages[0]
                .content
                .contains("The student is learning about Rust.")
        );
    }

    #[tokio::test]
    async fn test_invalid_reply() {
        let provider = CannedProvider::replying("here are some cards!");
        let err = generate_flashcards(&provider, "m", &StudyContext::new("Rust"), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, TutorError::InvalidArtifact(_)));
        assert_eq!(err.to_string(), "Invalid flashcard format received");
    }

    #[tokio::test]
    async fn test_connection_failure_propagates() {
        let provider = CannedProvider::failing(500);
        let err = generate_flashcards(&provider, "m", &StudyContext::new("Rust"), 5)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }
}
