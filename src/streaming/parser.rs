use crate::models::chat::ChatCompletionChunk;
use crate::streaming::utf8::Utf8StreamDecoder;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Classification of one trimmed SSE line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    Blank,
    /// Comments, keep-alives, `event:` and other non-data fields
    Ignored,
    Done,
    Data(&'a str),
}

impl<'a> SseLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return SseLine::Blank;
        }

        match line.strip_prefix(DATA_PREFIX) {
            Some(DONE_SENTINEL) => SseLine::Done,
            Some(payload) => SseLine::Data(payload),
            None => SseLine::Ignored,
        }
    }
}

/// Stateful parser turning chat-completions SSE bytes into content fragments
///
/// Owns the UTF-8 decoder and the decode buffer for a single stream. Only
/// complete lines are interpreted; the trailing partial line waits in the
/// buffer for the next [`feed`](Self::feed) or for [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct SseTextParser {
    decoder: Utf8StreamDecoder,
    buffer: String,
    malformed_events: usize,
}

impl SseTextParser {
    pub fn new() -> Self {
        Self {
            decoder: Utf8StreamDecoder::new(),
            buffer: String::with_capacity(8192),
            malformed_events: 0,
        }
    }

    /// Feed a network chunk and extract fragments from every completed line
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decoder.decode_into(chunk, &mut self.buffer);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };

        let complete: String = self.buffer.drain(..=last_newline).collect();
        let mut fragments = Vec::new();
        for line in complete.split('\n') {
            if let Some(fragment) = self.process_line(line) {
                fragments.push(fragment);
            }
        }
        fragments
    }

    /// Treat whatever is left in the buffer as a final line
    ///
    /// Bytes still held by the decoder never formed a character and are dropped.
    pub fn finish(&mut self) -> Option<String> {
        let residual = std::mem::take(&mut self.buffer);
        if !residual.trim().is_empty() {
            tracing::debug!(len = residual.len(), "Flushing unterminated final line");
        }
        self.process_line(&residual)
    }

    /// Decoded text not yet part of a complete line
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Number of `data:` events discarded because their payload was not valid JSON
    pub fn malformed_events(&self) -> usize {
        self.malformed_events
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        match SseLine::classify(line) {
            SseLine::Blank | SseLine::Done => None,
            SseLine::Ignored => {
                tracing::trace!(line = line.trim(), "Ignoring non-data SSE line");
                None
            }
            SseLine::Data(payload) => match serde_json::from_str::<ChatCompletionChunk>(payload) {
                Ok(chunk) => chunk.content().map(str::to_owned),
                Err(e) => {
                    self.malformed_events += 1;
                    tracing::debug!(error = %e, payload, "Skipping malformed SSE event");
                    None
                }
            },
        }
    }
}
