use std::fmt;

use crate::error::CompletionError;

/// Monotonic token identifying one submitted turn.
///
/// Every event produced for a turn carries its token; the consumer drops
/// events whose token is not the turn it is currently waiting on.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TurnId(u64);

impl TurnId {
    pub fn first() -> Self {
        Self(1)
    }

    /// Token following the raw value `last`.
    pub fn after(last: u64) -> Self {
        Self(last.saturating_add(1))
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Incremental text, forwarded verbatim.
    Chunk(String),
    /// The server finished; carries the concatenation of all chunks.
    Completed(String),
    /// The stream was cancelled; carries the text delivered so far.
    Cancelled(String),
    Failed(CompletionError),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Chunk(_))
    }
}

#[derive(Debug, Clone)]
pub struct TurnEvent {
    pub turn: TurnId,
    pub event: StreamEvent,
}

impl TurnEvent {
    pub fn new(turn: TurnId, event: StreamEvent) -> Self {
        Self { turn, event }
    }
}
