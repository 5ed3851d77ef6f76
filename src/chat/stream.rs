use serde::{Deserialize, Serialize};

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Stream response chunk that mimics OpenAI's streaming response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamResponse {
    /// Array of choices in the response
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

/// Individual choice in a streaming response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    /// Delta containing the incremental content
    #[serde(default)]
    pub delta: StreamDelta,
}

/// Delta content in a streaming response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamDelta {
    /// The incremental content, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One line of the completion stream, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Incremental text to append to the reply.
    Delta(String),
    /// The `[DONE]` sentinel; the reply is complete.
    Done,
    /// Anything else: keep-alives, comments, malformed JSON, empty deltas.
    Skip,
}

impl Frame {
    pub fn parse(line: &str) -> Self {
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return Frame::Skip;
        };
        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            return Frame::Done;
        }
        match serde_json::from_str::<StreamResponse>(payload) {
            Ok(response) => response.into_frame(),
            Err(err) => {
                log::trace!("skipping malformed frame: {err}");
                Frame::Skip
            }
        }
    }
}

impl StreamResponse {
    fn into_frame(self) -> Frame {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(Frame::Delta)
            .unwrap_or(Frame::Skip)
    }
}
