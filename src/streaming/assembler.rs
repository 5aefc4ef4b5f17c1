use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, TutorError};
use crate::streaming::parser::SseTextParser;

/// Lifecycle of one streamed reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    Idle,
    Streaming,
    Completed,
    Failed,
}

impl AssemblerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssemblerState::Completed | AssemblerState::Failed)
    }
}

/// Pull-based assembler turning an SSE byte stream into text fragments
///
/// A chunk is only read when the caller asks for the next fragment and every
/// fragment from earlier chunks has been handed out. Once the assembler
/// reaches [`AssemblerState::Completed`] or [`AssemblerState::Failed`] it
/// yields nothing further.
pub struct StreamingTextAssembler<S> {
    source: S,
    parser: SseTextParser,
    ready: VecDeque<String>,
    state: AssemblerState,
    stream_id: Uuid,
    chunks_read: usize,
}

impl<S, E> StreamingTextAssembler<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Display,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            parser: SseTextParser::new(),
            ready: VecDeque::new(),
            state: AssemblerState::Idle,
            stream_id: Uuid::new_v4(),
            chunks_read: 0,
        }
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    /// Events dropped so far because their payload did not parse
    pub fn malformed_events(&self) -> usize {
        self.parser.malformed_events()
    }

    /// Pull the next fragment
    ///
    /// Returns `None` once the stream has completed or failed. A read failure
    /// is returned exactly once as [`TutorError::StreamRead`].
    pub async fn next_fragment(&mut self) -> Option<Result<String>> {
        loop {
            if let Some(fragment) = self.ready.pop_front() {
                return Some(Ok(fragment));
            }

            if self.state.is_terminal() {
                return None;
            }

            self.state = AssemblerState::Streaming;

            match self.source.next().await {
                Some(Ok(chunk)) => {
                    self.chunks_read += 1;
                    self.ready.extend(self.parser.feed(&chunk));
                }
                Some(Err(e)) => {
                    warn!(
                        stream_id = %self.stream_id,
                        chunks_read = self.chunks_read,
                        error = %e,
                        "Stream read failed"
                    );
                    self.state = AssemblerState::Failed;
                    return Some(Err(TutorError::StreamRead(e.to_string())));
                }
                None => {
                    self.ready.extend(self.parser.finish());
                    self.state = AssemblerState::Completed;
                    debug!(
                        stream_id = %self.stream_id,
                        chunks_read = self.chunks_read,
                        malformed = self.parser.malformed_events(),
                        "Stream completed"
                    );
                }
            }
        }
    }

    /// Convert into a `futures::Stream` of fragments
    pub fn into_stream(self) -> impl Stream<Item = Result<String>> {
        futures::stream::unfold(self, |mut assembler| async move {
            assembler
                .next_fragment()
                .await
                .map(|item| (item, assembler))
        })
    }
}

/// Drain an assembler into the full reply text
///
/// Fails on the first read error, discarding what was assembled so far.
/// Callers that need to keep partial text should pull fragments themselves.
pub async fn collect_reply<S, E>(mut assembler: StreamingTextAssembler<S>) -> Result<String>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Display,
{
    let mut reply = String::new();
    while let Some(fragment) = assembler.next_fragment().await {
        reply.push_str(&fragment?);
    }
    Ok(reply)
}
