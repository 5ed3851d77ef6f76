mod id;
mod message;
mod render;
mod state;

pub use id::SessionId;
pub use message::{to_chat_messages, Message, Role};
pub use render::{BlockKind, RenderedBlock};
pub use state::{derive_title, Session, DEFAULT_TITLE};
