use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use super::context::{
    StudyContext, flashcards_digest, sources_digest, transcript, wrong_answers_digest,
};
use super::exercise::{Difficulty, ExerciseKind};
use super::{complete_json, lenient_string, parse_artifact};
use crate::error::Result;
use crate::models::chat::{ChatCompletionRequest, ChatMessage};
use crate::provider::ChatProvider;

const CONVERSATION_WINDOW: usize = 20;
const QUIZ_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_QUESTION_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Quiz {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuizQuestion {
    /// Models number questions with either `1` or `"1"`
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: ExerciseKind,
    #[serde(deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default, deserialize_with = "lenient_difficulty")]
    pub difficulty: Difficulty,
}

/// Unknown or missing difficulty labels read as medium
fn lenient_difficulty<'de, D>(deserializer: D) -> std::result::Result<Difficulty, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let difficulty = match value.as_str().map(|s| s.trim().to_ascii_lowercase()) {
        Some(label) if label == "easy" => Difficulty::Easy,
        Some(label) if label == "hard" => Difficulty::Hard,
        _ => Difficulty::Medium,
    };
    Ok(difficulty)
}

fn system_prompt(ctx: &StudyContext, question_count: usize) -> String {
    let conversation = transcript(&ctx.conversation, CONVERSATION_WINDOW);
    let sources = sources_digest(&ctx.sources);
    let flashcards = flashcards_digest(&ctx.flashcards);

    let mut prompt = String::from(
        "You create quizzes. Build one comprehensive quiz from ALL of the learning material \
         below.\n\nLEARNING CONTEXT:\n",
    );
    if !conversation.is_empty() {
        prompt.push_str(&format!("\n--- CHAT HISTORY ---\n{conversation}\n"));
    }
    if !sources.is_empty() {
        prompt.push_str(&format!("\n--- SOURCES ---\n{sources}\n"));
    }
    if !flashcards.is_empty() {
        prompt.push_str(&format!("\n--- FLASHCARDS ---\n{flashcards}\n"));
    }
    if !ctx.wrong_answers.is_empty() {
        prompt.push_str(&format!(
            "\nAREAS THE STUDENT STRUGGLED WITH (prioritize these topics):\n{}\n",
            wrong_answers_digest(&ctx.wrong_answers)
        ));
    }
    if conversation.is_empty() && sources.is_empty() && flashcards.is_empty() {
        prompt.push_str(&format!("The student is learning about {}.\n", ctx.space_name));
    }

    prompt.push_str(&format!(
        "\nINSTRUCTIONS:\n\
         - Write exactly {question_count} questions\n\
         - Mix the types multiple_choice, true_false and short_answer\n\
         - Cover different topics from the material\n\
         - Include questions on topics the student got wrong, to reinforce them\n\
         - Order questions from easy to challenging\n\
         - Test understanding, not memorization, and do not repeat similar questions\n\n\
         Return ONLY valid JSON in this format:\n\
         {{\"title\": \"quiz title based on the topics covered\", \"questions\": [\
         {{\"id\": 1, \"type\": \"multiple_choice\", \"question\": \"...\", \
         \"options\": [\"A\", \"B\", \"C\", \"D\"], \"answer\": \"the correct option text\", \
         \"explanation\": \"...\", \"topic\": \"...\", \
         \"difficulty\": \"easy\" | \"medium\" | \"hard\"}}, \
         {{\"id\": 2, \"type\": \"true_false\", \"question\": \"a statement\", \
         \"answer\": \"True\" | \"False\", \"explanation\": \"...\", \"topic\": \"...\", \
         \"difficulty\": \"medium\"}}, \
         {{\"id\": 3, \"type\": \"short_answer\", \"question\": \"...\", \
         \"answer\": \"expected key points\", \"explanation\": \"...\", \"topic\": \"...\", \
         \"difficulty\": \"hard\"}}]}}"
    ));
    prompt
}

/// Generate a quiz over the whole space, weighted toward past mistakes
pub async fn generate_quiz(
    provider: &dyn ChatProvider,
    model: &str,
    ctx: &StudyContext,
    question_count: usize,
) -> Result<Quiz> {
    let request = ChatCompletionRequest::json_object(
        model,
        vec![
            ChatMessage::system(system_prompt(ctx, question_count)),
            ChatMessage::user(format!(
                "Create a {question_count}-question quiz covering the learning materials provided."
            )),
        ],
    )
    .with_temperature(QUIZ_TEMPERATURE);

    let content = complete_json(provider, request).await?;
    let mut quiz: Quiz = parse_artifact(content.as_deref(), "quiz")?;
    if quiz.title.trim().is_empty() {
        quiz.title = format!("{} quiz", ctx.space_name);
    }
    info!(
        space = %ctx.space_name,
        requested = question_count,
        generated = quiz.questions.len(),
        "Generated quiz"
    );
    Ok(quiz)
}
