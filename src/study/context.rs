use serde::{Deserialize, Serialize};

use super::flashcards::Flashcard;
use crate::models::chat::ChatMessage;

/// Reference material the learner attached to a space
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Source {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A question the learner got wrong, with its correct answer
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct WrongAnswer {
    pub question: String,
    pub answer: String,
}

/// Everything a generator may draw on for one space
#[derive(Debug, Clone, Default)]
pub struct StudyContext {
    pub space_name: String,
    pub conversation: Vec<ChatMessage>,
    pub sources: Vec<Source>,
    pub flashcards: Vec<Flashcard>,
    pub wrong_answers: Vec<WrongAnswer>,
}

impl StudyContext {
    pub fn new(space_name: impl Into<String>) -> Self {
        Self {
            space_name: space_name.into(),
            ..Self::default()
        }
    }

    pub fn with_conversation(mut self, conversation: Vec<ChatMessage>) -> Self {
        self.conversation = conversation;
        self
    }

    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_flashcards(mut self, flashcards: Vec<Flashcard>) -> Self {
        self.flashcards = flashcards;
        self
    }

    pub fn with_wrong_answers(mut self, wrong_answers: Vec<WrongAnswer>) -> Self {
        self.wrong_answers = wrong_answers;
        self
    }
}

/// Last `limit` messages rendered as `role: content` lines
pub fn transcript(conversation: &[ChatMessage], limit: usize) -> String {
    let start = conversation.len().saturating_sub(limit);
    conversation[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn sources_digest(sources: &[Source]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let mut text = format!("Source {}: {}", i + 1, source.title);
            if let Some(author) = source.author.as_deref().filter(|a| !a.is_empty()) {
                text.push_str(" by ");
                text.push_str(author);
            }
            if let Some(notes) = source.notes.as_deref().filter(|n| !n.is_empty()) {
                text.push_str("\nContent: ");
                text.push_str(notes);
            }
            text
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn flashcards_digest(flashcards: &[Flashcard]) -> String {
    flashcards
        .iter()
        .enumerate()
        .map(|(i, card)| format!("Flashcard {}: Q: {} A: {}", i + 1, card.front, card.back))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered `Question: .. - Correct answer: ..` lines
pub fn wrong_answers_digest(wrong_answers: &[WrongAnswer]) -> String {
    wrong_answers
        .iter()
        .enumerate()
        .map(|(i, w)| {
            format!("{}. Question: {} - Correct answer: {}", i + 1, w.question, w.answer)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
