use tokio::sync::mpsc;

use crate::completion::TurnId;
use crate::session::{RenderedBlock, SessionId};

/// What the presentation layer is asked to show.
#[derive(Debug, Clone)]
pub enum DisplayUpdate {
    UserMessage {
        turn: TurnId,
        text: String,
        html: String,
    },
    /// A raw reply stream for `turn` begins.
    AssistantStarted { turn: TurnId },
    /// Unformatted text to append to the raw stream of `turn`.
    Chunk { turn: TurnId, text: String },
    /// Formatted reply that replaces the raw stream with the same turn.
    AssistantFinal { block: RenderedBlock },
    /// The raw stream of `turn` produced nothing worth keeping.
    AssistantDiscarded { turn: TurnId },
    Diagnostic { message: String },
    /// The active session changed; redraw from `blocks`.
    SessionReset {
        id: SessionId,
        title: String,
        blocks: Vec<RenderedBlock>,
    },
}

/// Receives display updates from the orchestrator. Must not block.
pub trait DisplaySink: Send {
    fn show(&mut self, update: DisplayUpdate);
}

impl DisplaySink for mpsc::UnboundedSender<DisplayUpdate> {
    fn show(&mut self, update: DisplayUpdate) {
        let _ = self.send(update);
    }
}
