//! Coordinates one conversation: session state, retrieval, the completion
//! stream and persistence.
//!
//! The orchestrator is owned by a single task. Network I/O runs on the
//! stream task spawned by [`CompletionClient`]; its events come back through
//! [`ConversationOrchestrator::recv`] and are applied with
//! [`ConversationOrchestrator::handle_event`]. Events tagged with a turn other
//! than the one in flight are dropped, so nothing from an abandoned stream
//! can touch the session.

mod augment;
mod error;
mod format;
mod sink;
mod turn;


use tokio::sync::mpsc;

use crate::completion::{CompletionClient, StreamEvent, TurnEvent, TurnId};
use crate::error::CompletionError;
use crate::persistence::{JsonSessionStore, PersistenceError, SessionSummary};
use crate::retrieval::KnowledgeBase;
use crate::session::{BlockKind, Message, RenderedBlock, Session, SessionId};

pub use augment::augment;
pub use error::OrchestratorError;
pub use format::{escape_html, render_markdown};
pub use sink::{DisplaySink, DisplayUpdate};
pub use turn::{IgnoreReason, Phase, SubmitOutcome, TurnOutcome};

use turn::ActiveTurn;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Augment prompts with knowledge-base matches.
    pub retrieval_enabled: bool,
    /// Number of documents retrieved per turn.
    pub top_k: usize,
    /// Capacity of the stream event channel.
    pub event_buffer: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retrieval_enabled: true,
            top_k: 3,
            event_buffer: 64,
        }
    }
}

pub struct ConversationOrchestrator {
    session: Session,
    sessions: JsonSessionStore,
    knowledge: KnowledgeBase,
    client: CompletionClient,
    sink: Box<dyn DisplaySink>,
    config: OrchestratorConfig,
    model: Option<String>,
    sender: mpsc::Sender<TurnEvent>,
    receiver: mpsc::Receiver<TurnEvent>,
    active: Option<ActiveTurn>,
    last_turn: u64,
}

impl ConversationOrchestrator {
    pub fn new(
        client: CompletionClient,
        knowledge: KnowledgeBase,
        sessions: JsonSessionStore,
        sink: Box<dyn DisplaySink>,
        config: OrchestratorConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.event_buffer.max(1));
        Self {
            session: Session::new(),
            sessions,
            knowledge,
            client,
            sink,
            config,
            model: None,
            sender,
            receiver,
            active: None,
            last_turn: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn select_model(&mut self, model: impl Into<String>) {
        let model = model.into();
        log::info!("selected model {model}");
        self.model = Some(model);
    }

    pub fn set_retrieval_enabled(&mut self, enabled: bool) {
        self.config.retrieval_enabled = enabled;
    }

    pub fn retrieval_enabled(&self) -> bool {
        self.config.retrieval_enabled
    }

    pub fn phase(&self) -> Phase {
        match &self.active {
            None => Phase::Idle,
            Some(active) if active.cancel_requested => Phase::Cancelling,
            Some(_) => Phase::Streaming,
        }
    }

    /// Turn currently streaming or being cancelled.
    pub fn active_turn(&self) -> Option<TurnId> {
        self.active.as_ref().map(|active| active.id)
    }

    pub async fn list_models(&self) -> Result<Vec<String>, CompletionError> {
        self.client.list_models().await
    }

    /// Starts a turn for `text`.
    ///
    /// The user message is appended to the session before any network work.
    /// Retrieval failures degrade to an unaugmented prompt.
    pub async fn submit(&mut self, text: &str) -> Result<SubmitOutcome, OrchestratorError> {
        if self.active.is_some() {
            return Err(OrchestratorError::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Ok(SubmitOutcome::Ignored(IgnoreReason::EmptyMessage));
        }
        let Some(model) = self.model.clone() else {
            self.sink.show(DisplayUpdate::Diagnostic {
                message: "no model selected".to_string(),
            });
            return Ok(SubmitOutcome::Ignored(IgnoreReason::NoModelSelected));
        };

        let turn = self.mint_turn();
        let html = escape_html(text);
        self.session.push_message(Message::user(text));
        self.session.push_block(RenderedBlock {
            turn: turn.get(),
            kind: BlockKind::User,
            html: html.clone(),
        });
        self.sink.show(DisplayUpdate::UserMessage {
            turn,
            text: text.to_string(),
            html,
        });

        let context = if self.config.retrieval_enabled {
            self.knowledge.query(text, self.config.top_k).await
        } else {
            Vec::new()
        };
        log::debug!("turn {turn}: {} context documents", context.len());
        let messages = augment(&self.session.messages, &context);

        self.client
            .start(&model, messages, turn, self.sender.clone())?;
        self.active = Some(ActiveTurn::new(turn));
        self.sink.show(DisplayUpdate::AssistantStarted { turn });
        Ok(SubmitOutcome::Started(turn))
    }

    /// Requests cancellation of the turn in flight.
    ///
    /// Returns `false` when nothing is streaming or a cancel is already
    /// pending. The turn stays active until its terminal event is handled.
    pub fn cancel(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if active.cancel_requested {
            return false;
        }
        active.cancel_requested = true;
        self.client.cancel();
        log::info!("cancel requested for turn {}", active.id);
        true
    }

    /// Next stream event, in production order.
    pub async fn recv(&mut self) -> Option<TurnEvent> {
        self.receiver.recv().await
    }

    /// Applies one stream event and returns the outcome once the turn ends.
    pub fn handle_event(&mut self, event: TurnEvent) -> Option<TurnOutcome> {
        let Some(active) = self.active.as_mut() else {
            log::debug!("dropping event for finished turn {}", event.turn);
            return None;
        };
        if active.id != event.turn {
            log::debug!("dropping event for stale turn {} (active {})", event.turn, active.id);
            return None;
        }

        let turn = event.turn;
        match event.event {
            StreamEvent::Chunk(text) => {
                active.accumulated.push_str(&text);
                self.sink.show(DisplayUpdate::Chunk { turn, text });
                None
            }
            StreamEvent::Completed(text) => {
                let active = self.active.take()?;
                if active.cancel_requested {
                    // Finished before the cancel was observed; honour the cancel.
                    Some(self.finish_cancelled(turn, active.accumulated))
                } else {
                    Some(self.finish_completed(turn, text))
                }
            }
            StreamEvent::Cancelled(partial) => {
                self.active = None;
                Some(self.finish_cancelled(turn, partial))
            }
            StreamEvent::Failed(error) => {
                self.active = None;
                Some(self.finish_failed(turn, error))
            }
        }
    }

    /// Drives the turn in flight to its outcome.
    pub async fn run_turn(&mut self) -> Option<TurnOutcome> {
        while self.active.is_some() {
            let event = self.receiver.recv().await?;
            if let Some(outcome) = self.handle_event(event) {
                return Some(outcome);
            }
        }
        None
    }

    /// Cancels the turn in flight, if any, and waits for it to settle.
    pub async fn settle(&mut self) -> Option<TurnOutcome> {
        self.cancel();
        self.run_turn().await
    }

    /// Replaces the active session with a fresh draft, saving the old one.
    /// If the save fails the old session stays active.
    pub fn new_session(&mut self) -> Result<SessionId, OrchestratorError> {
        self.ensure_idle()?;
        self.persist()?;
        self.session = Session::new();
        self.announce_session();
        Ok(self.session.id)
    }

    /// Makes the stored session `id` active. The current session is saved
    /// first; on failure it stays active.
    pub fn load_session(&mut self, id: SessionId) -> Result<(), OrchestratorError> {
        self.ensure_idle()?;
        if self.session.id == id {
            return Ok(());
        }
        let loaded = self.sessions.load(id)?;
        self.persist()?;
        self.last_turn = self.last_turn.max(loaded.last_turn());
        self.session = loaded;
        log::info!("loaded session {id}");
        self.announce_session();
        Ok(())
    }

    /// Removes a stored session. Deleting the active one starts a new draft.
    pub fn delete_session(&mut self, id: SessionId) -> Result<(), OrchestratorError> {
        let is_current = self.session.id == id;
        if is_current {
            self.ensure_idle()?;
        }
        self.sessions.delete(id)?;
        if is_current {
            self.session = Session::new();
            self.announce_session();
        }
        Ok(())
    }

    /// Stored sessions, newest first.
    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>, OrchestratorError> {
        Ok(self.sessions.list()?)
    }

    /// Stops any stream and saves the active session.
    pub async fn shutdown(&mut self) {
        if let Some(outcome) = self.settle().await {
            log::debug!("turn {} settled on shutdown", outcome.turn());
        }
        self.persist_or_report();
    }

    fn ensure_idle(&self) -> Result<(), OrchestratorError> {
        if self.active.is_some() {
            return Err(OrchestratorError::Busy);
        }
        Ok(())
    }

    fn mint_turn(&mut self) -> TurnId {
        self.last_turn = self.last_turn.max(self.session.last_turn());
        let turn = TurnId::after(self.last_turn);
        self.last_turn = turn.get();
        turn
    }

    fn finish_completed(&mut self, turn: TurnId, text: String) -> TurnOutcome {
        let block = RenderedBlock {
            turn: turn.get(),
            kind: BlockKind::Assistant,
            html: render_markdown(&text),
        };
        self.session.push_message(Message::assistant(text.clone()));
        self.session.push_block(block.clone());
        self.sink.show(DisplayUpdate::AssistantFinal { block });
        self.persist_or_report();
        log::info!("turn {turn} completed ({} bytes)", text.len());
        TurnOutcome::Completed { turn, text }
    }

    fn finish_cancelled(&mut self, turn: TurnId, partial: String) -> TurnOutcome {
        if partial.is_empty() {
            self.sink.show(DisplayUpdate::AssistantDiscarded { turn });
            log::info!("turn {turn} cancelled before any text arrived");
            return TurnOutcome::Cancelled {
                turn,
                text: String::new(),
            };
        }
        let block = RenderedBlock {
            turn: turn.get(),
            kind: BlockKind::Stopped,
            html: render_markdown(&partial),
        };
        self.session.push_message(Message::assistant(partial.clone()));
        self.session.push_block(block.clone());
        self.sink.show(DisplayUpdate::AssistantFinal { block });
        self.persist_or_report();
        log::info!("turn {turn} cancelled, kept {} bytes", partial.len());
        TurnOutcome::Cancelled {
            turn,
            text: partial,
        }
    }

    fn finish_failed(&mut self, turn: TurnId, error: CompletionError) -> TurnOutcome {
        log::error!("turn {turn} failed: {error}");
        self.sink.show(DisplayUpdate::AssistantDiscarded { turn });
        self.sink.show(DisplayUpdate::Diagnostic {
            message: format!("request failed: {error}"),
        });
        TurnOutcome::Failed { turn, error }
    }

    /// Saves the active session if it has unsaved, non-empty content.
    ///
    /// On failure the session keeps its messages and stays dirty.
    fn persist(&mut self) -> Result<(), PersistenceError> {
        if self.session.is_draft() || !self.session.dirty {
            return Ok(());
        }
        self.sessions.save(&mut self.session)
    }

    fn persist_or_report(&mut self) {
        if let Err(err) = self.persist() {
            log::error!("failed to save session {}: {err}", self.session.id);
            self.sink.show(DisplayUpdate::Diagnostic {
                message: format!("could not save session: {err}"),
            });
        }
    }

    fn announce_session(&mut self) {
        self.sink.show(DisplayUpdate::SessionReset {
            id: self.session.id,
            title: self.session.title.clone(),
            blocks: self.session.rendered.clone(),
        });
    }
}
