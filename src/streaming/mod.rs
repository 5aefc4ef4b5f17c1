pub mod assembler;
pub mod parser;
pub mod utf8;

pub use assembler::{AssemblerState, StreamingTextAssembler, collect_reply};
pub use parser::{SseLine, SseTextParser};
pub use utf8::Utf8StreamDecoder;
