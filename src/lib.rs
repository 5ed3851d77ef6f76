//! Streaming chat client for local OpenAI-compatible model servers.
//!
//! Prompts are optionally augmented with passages from a local knowledge
//! base, replies are streamed incrementally and can be cancelled mid-flight,
//! and conversations are persisted as JSON sessions.
//!
//! [`orchestrator::ConversationOrchestrator`] ties the pieces together; the
//! other modules can be used on their own.

/// OpenAI-compatible chat wire types and the streaming line splitter
pub mod chat;

/// Streaming completion client and the events it reports
pub mod completion;

/// Error types for talking to the model server
pub mod error;

/// Turn coordination between sessions, retrieval and the completion stream
pub mod orchestrator;

/// JSON files for saved sessions
pub mod persistence;

/// Knowledge base used to augment prompts
pub mod retrieval;

/// Conversation state
pub mod session;

pub use completion::{CompletionClient, CompletionConfig, StreamEvent, TurnEvent, TurnId};
pub use error::CompletionError;
pub use orchestrator::{ConversationOrchestrator, OrchestratorConfig, OrchestratorError};
