pub mod chat;

pub use chat::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ModelInfo,
    ModelList, ResponseFormat, Role,
};
