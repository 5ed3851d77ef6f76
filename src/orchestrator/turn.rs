use crate::completion::TurnId;
use crate::error::CompletionError;

/// Where the orchestrator is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Streaming,
    /// Cancel requested; waiting for the stream's terminal event.
    Cancelling,
}

/// Transient state of the turn being streamed.
#[derive(Debug)]
pub(super) struct ActiveTurn {
    pub id: TurnId,
    pub accumulated: String,
    pub cancel_requested: bool,
}

impl ActiveTurn {
    pub fn new(id: TurnId) -> Self {
        Self {
            id,
            accumulated: String::new(),
            cancel_requested: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyMessage,
    NoModelSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Started(TurnId),
    Ignored(IgnoreReason),
}

/// How a turn ended, as accepted by the orchestrator.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    Completed { turn: TurnId, text: String },
    /// `text` is what was kept; empty means nothing was appended.
    Cancelled { turn: TurnId, text: String },
    Failed { turn: TurnId, error: CompletionError },
}

impl TurnOutcome {
    pub fn turn(&self) -> TurnId {
        match self {
            TurnOutcome::Completed { turn, .. }
            | TurnOutcome::Cancelled { turn, .. }
            | TurnOutcome::Failed { turn, .. } => *turn,
        }
    }
}
