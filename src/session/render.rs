use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    User,
    /// A finished reply.
    Assistant,
    /// A reply cut short by the user.
    Stopped,
    Error,
}

/// One formatted block of the transcript as shown to the user.
///
/// Blocks are keyed by turn: the presentation layer shows the raw stream for
/// a turn and swaps it for the block with the same key once it arrives.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RenderedBlock {
    pub turn: u64,
    pub kind: BlockKind,
    pub html: String,
}
