//! Streaming chat completions against an OpenAI-compatible server.
//!
//! [`CompletionClient::start`] posts the conversation with `stream: true`
//! and reports incremental text plus one terminal outcome as [`TurnEvent`]s
//! on a bounded channel.

mod client;
mod events;
mod runner;

pub use client::{CompletionClient, CompletionConfig};
pub use events::{StreamEvent, TurnEvent, TurnId};
