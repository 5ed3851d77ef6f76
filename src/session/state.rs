use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::SessionId;
use super::message::{Message, Role};
use super::render::RenderedBlock;

const TITLE_MAX_CHARS: usize = 30;
pub const DEFAULT_TITLE: &str = "New chat";

/// A conversation: ordered messages plus the rendered transcript.
///
/// A session without messages is a draft and need not be persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "timestamp")]
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub rendered: Vec<RenderedBlock>,
    #[serde(skip)]
    pub dirty: bool,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            title: DEFAULT_TITLE.to_string(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            rendered: Vec::new(),
            dirty: false,
        }
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }

    pub fn push_block(&mut self, block: RenderedBlock) {
        self.rendered.push(block);
        self.touch();
    }

    pub fn is_draft(&self) -> bool {
        self.messages.is_empty()
    }

    /// Highest turn number present in the rendered transcript.
    pub fn last_turn(&self) -> u64 {
        self.rendered.iter().map(|b| b.turn).max().unwrap_or(0)
    }

    pub fn refresh_title(&mut self) {
        self.title = derive_title(&self.messages);
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.dirty = true;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Title shown in session lists: the first user message on one line,
/// cut to 30 characters plus an ellipsis.
pub fn derive_title(messages: &[Message]) -> String {
    let Some(first) = messages.iter().find(|m| m.role == Role::User) else {
        return DEFAULT_TITLE.to_string();
    };
    let flat = first.content.replace(['\r', '\n'], " ");
    let trimmed = flat.trim();
    if trimmed.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    let mut chars = trimmed.chars();
    let mut title = chars.by_ref().take(TITLE_MAX_CHARS).collect::<String>();
    if chars.next().is_some() {
        title.push_str("...");
    }
    title
}
