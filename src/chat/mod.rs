mod message;
mod sse;
mod stream;

pub use message::{ChatCompletionRequest, ChatMessage, ChatMessageBuilder, ChatRole};
pub use stream::{Frame, StreamChoice, StreamDelta, StreamResponse};

pub(crate) use sse::create_line_stream;
