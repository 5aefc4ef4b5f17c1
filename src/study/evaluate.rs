use serde::{Deserialize, Serialize};
use tracing::debug;

use super::complete_json;
use crate::error::Result;
use crate::models::chat::{ChatCompletionRequest, ChatMessage};
use crate::provider::ChatProvider;

const EVALUATION_TEMPERATURE: f32 = 0.1;
const FALLBACK_FEEDBACK: &str = "Could not evaluate - used exact match";

const SYSTEM_PROMPT: &str = "You grade a student's short answer against the expected answer.\n\n\
Accept answers that convey the same meaning or key concepts, including synonyms, paraphrases, \
extra correct detail, minor misspellings and equivalent numeric forms \
(\"50%\" = \"0.5\" = \"half\").\n\n\
Return ONLY valid JSON in this format:\n\
{\"isCorrect\": true or false, \"feedback\": \"brief reason or what was missing\"}";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub is_correct: bool,
    #[serde(default)]
    pub feedback: String,
}

impl Evaluation {
    /// Case-insensitive comparison of the trimmed answers
    pub fn exact_match(expected: &str, given: &str) -> Self {
        Self {
            is_correct: expected.trim().to_lowercase() == given.trim().to_lowercase(),
            feedback: FALLBACK_FEEDBACK.to_string(),
        }
    }
}

/// Ask the model whether `given` is close enough to `expected`
///
/// A reply that is not an evaluation object falls back to
/// [`Evaluation::exact_match`]; connection failures are still returned.
pub async fn evaluate_short_answer(
    provider: &dyn ChatProvider,
    model: &str,
    question: &str,
    expected: &str,
    given: &str,
) -> Result<Evaluation> {
    let request = ChatCompletionRequest::json_object(
        model,
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Question: {question}\n\nExpected Answer: {expected}\n\n\
                 Student's Answer: {given}\n\n\
                 Is the student's answer correct or close enough to be considered correct?"
            )),
        ],
    )
    .with_temperature(EVALUATION_TEMPERATURE);

    let content = complete_json(provider, request).await?;
    let parsed = content
        .as_deref()
        .and_then(|c| serde_json::from_str::<Evaluation>(c).ok());

    Ok(parsed.unwrap_or_else(|| {
        debug!("Unparseable evaluation reply, using exact match");
        Evaluation::exact_match(expected, given)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::testing::CannedProvider;

    #[tokio::test]
    async fn test_model_evaluation() {
        let provider =
            CannedProvider::replying(r#"{"isCorrect":true,"feedback":"Same meaning."}"#);
        let eval = evaluate_short_answer(
            &provider,
            "m",
            "Define RAII",
            "scope-bound cleanup",
            "destructors run at scope end",
        )
        .await
        .unwrap();
        assert!(eval.is_correct);
        assert_eq!(eval.feedback, "Same meaning.");

        let request = provider.last_request();
        assert_eq!(request.temperature, Some(0.1));
        assert!(
            request.messages[1]
                .content
                .contains("Student's Answer: destructors run at scope end")
        );
    }

    #[tokio::test]
    async fn test_fallback_to_exact_match() {
        let provider = CannedProvider::replying("yes");
        let eval = evaluate_short_answer(&provider, "m", "Capital?", "Paris", "  paris ")
            .await
            .unwrap();
        assert!(eval.is_correct);
        assert_eq!(eval.feedback, FALLBACK_FEEDBACK);

        let eval = evaluate_short_answer(&provider, "m", "Capital?", "Paris", "Lyon")
            .await
            .unwrap();
        assert!(!eval.is_correct);
    }

    #[tokio::test]
    async fn test_connection_failure_is_not_masked() {
        let provider = CannedProvider::failing(503);
        let err = evaluate_short_answer(&provider, "m", "q", "a", "a")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }
}
