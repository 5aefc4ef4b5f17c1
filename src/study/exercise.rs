use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use super::context::{StudyContext, transcript};
use super::{complete_json, lenient_string, parse_artifact};
use crate::error::Result;
use crate::models::chat::{ChatCompletionRequest, ChatMessage};
use crate::provider::ChatProvider;

const CONVERSATION_WINDOW: usize = 10;
const EXERCISE_TEMPERATURE: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    MultipleChoice,
    ShortAnswer,
    TrueFalse,
    /// Any type the model invents, e.g. `fill_in_blank`; graded like a short answer
    #[default]
    #[serde(other)]
    Other,
}

impl ExerciseKind {
    const ROTATION: [ExerciseKind; 3] = [
        ExerciseKind::MultipleChoice,
        ExerciseKind::ShortAnswer,
        ExerciseKind::TrueFalse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::MultipleChoice => "multiple_choice",
            ExerciseKind::ShortAnswer => "short_answer",
            ExerciseKind::TrueFalse => "true_false",
            ExerciseKind::Other => "other",
        }
    }

    /// Kind to suggest after `asked` earlier exercises, so consecutive ones vary
    pub fn suggested(asked: usize) -> Self {
        Self::ROTATION[asked % Self::ROTATION.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Exercise {
    #[serde(default)]
    pub topic: String,
    #[serde(deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(rename = "type", default)]
    pub kind: ExerciseKind,
    /// Only populated for multiple choice
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub hint: String,
}

fn system_prompt(
    ctx: &StudyContext,
    difficulty: Difficulty,
    previous_questions: &[String],
) -> String {
    let conversation = transcript(&ctx.conversation, CONVERSATION_WINDOW);
    let context = if conversation.is_empty() {
        format!("The student is learning about {}.", ctx.space_name)
    } else {
        conversation
    };

    let mut prompt = format!(
        "You write practice exercises. Study the learning conversation below and produce one \
         new exercise.\n\nCONVERSATION CONTEXT:\n{context}\n"
    );

    if !previous_questions.is_empty() {
        prompt.push_str("\nPREVIOUSLY ASKED QUESTIONS (do not repeat these or close variants):\n");
        for (i, question) in previous_questions.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, question));
        }
    }

    let suggested = ExerciseKind::suggested(previous_questions.len());
    prompt.push_str(&format!(
        "\nINSTRUCTIONS:\n\
         - Difficulty: {difficulty}\n\
         - Approach the material from an angle not used by earlier questions\n\
         - Suggested type: {} (choose another if it suits the material better)\n\
         - If several topics were covered, pick a different one each time\n\n\
         Return ONLY valid JSON in this format:\n\
         {{\"topic\": \"...\", \"question\": \"...\", \
         \"type\": \"multiple_choice\" | \"short_answer\" | \"true_false\", \
         \"options\": [\"A\", \"B\", \"C\", \"D\"] (multiple_choice only), \
         \"answer\": \"...\", \"explanation\": \"...\", \"hint\": \"...\"}}",
        suggested.as_str()
    ));
    prompt
}

/// Generate one exercise that avoids `previous_questions`
pub async fn generate_exercise(
    provider: &dyn ChatProvider,
    model: &str,
    ctx: &StudyContext,
    difficulty: Difficulty,
    previous_questions: &[String],
) -> Result<Exercise> {
    let request = ChatCompletionRequest::json_object(
        model,
        vec![
            ChatMessage::system(system_prompt(ctx, difficulty, previous_questions)),
            ChatMessage::user(format!(
                "Generate a fresh {difficulty} practice exercise that repeats nothing above."
            )),
        ],
    )
    .with_temperature(EXERCISE_TEMPERATURE);

    let content = complete_json(provider, request).await?;
    let exercise: Exercise = parse_artifact(content.as_deref(), "exercise")?;
    info!(
        space = %ctx.space_name,
        kind = exercise.kind.as_str(),
        %difficulty,
        "Generated exercise"
    );
    Ok(exercise)
}
