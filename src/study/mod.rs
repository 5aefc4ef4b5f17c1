//! Study artifacts generated from a space's conversation and sources
//!
//! Each generator sends one non-streaming, JSON-mode completion and parses the
//! model's reply into a typed artifact.

pub mod context;
pub mod evaluate;
pub mod exercise;
pub mod flashcards;
pub mod quiz;

pub use context::{
    Source, StudyContext, WrongAnswer, flashcards_digest, sources_digest, transcript,
    wrong_answers_digest,
};
pub use evaluate::{Evaluation, evaluate_short_answer};
pub use exercise::{Difficulty, Exercise, ExerciseKind, generate_exercise};
pub use flashcards::{Flashcard, generate_flashcards};
pub use quiz::{Quiz, QuizQuestion, generate_quiz};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::error::{Result, TutorError};
use crate::models::chat::ChatCompletionRequest;
use crate::provider::ChatProvider;

/// Model reply text of a JSON-mode completion
async fn complete_json(
    provider: &dyn ChatProvider,
    request: ChatCompletionRequest,
) -> Result<Option<String>> {
    let response = provider.complete(request).await?;
    Ok(response.content().map(str::to_owned))
}

/// Parse the JSON reply into `T`, naming the artifact on failure
fn parse_artifact<T: DeserializeOwned>(content: Option<&str>, kind: &str) -> Result<T> {
    let content = content.ok_or_else(|| TutorError::InvalidArtifact(kind.to_string()))?;
    serde_json::from_str(content).map_err(|e| {
        tracing::debug!(error = %e, kind, "Model reply did not match artifact shape");
        TutorError::InvalidArtifact(kind.to_string())
    })
}

/// Models sometimes answer `true` or `4` where a string is expected
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
