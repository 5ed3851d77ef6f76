use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, ChatRole};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of a session transcript. Never edited once appended.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

pub fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages.iter().map(to_chat_message).collect()
}

fn to_chat_message(message: &Message) -> ChatMessage {
    match message.role {
        Role::User => ChatMessage::user().content(&message.content).build(),
        Role::Assistant => ChatMessage::assistant().content(&message.content).build(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_in_order() {
        let messages = vec![Message::user("q"), Message::assistant("a")];
        let chat = to_chat_messages(&messages);
        assert_eq!(chat.len(), 2);
        assert_eq!(chat[0].role, ChatRole::User);
        assert_eq!(chat[1].role, ChatRole::Assistant);
        assert_eq!(chat[1].content, "a");
    }
}
