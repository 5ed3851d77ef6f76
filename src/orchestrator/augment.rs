use crate::chat::ChatMessage;
use crate::session::{to_chat_messages, Message};

/// Builds the outgoing message list for a turn.
///
/// Only the content of the final message is rewritten to carry the retrieved
/// context; with no context the history is sent unchanged. `messages` itself
/// is never modified.
pub fn augment(messages: &[Message], context: &[String]) -> Vec<ChatMessage> {
    let mut chat = to_chat_messages(messages);
    if context.is_empty() {
        return chat;
    }
    if let Some(last) = chat.last_mut() {
        last.content = format!(
            "Relevant information:\n{}\n\nQuestion: {}",
            context.join("\n\n"),
            last.content
        );
    }
    chat
}
