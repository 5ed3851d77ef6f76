use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::chat::{ChatCompletionRequest, ChatMessage};
use crate::error::CompletionError;

use super::events::{TurnEvent, TurnId};
use super::runner::{run_stream, StreamRequest};

const MODEL_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for the completion endpoint.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Base URL of the OpenAI-compatible server, e.g. `http://localhost:1234`.
    pub endpoint: String,
    /// Sampling temperature for response randomness.
    pub temperature: f32,
    /// Maximum tokens to generate; `-1` lets the server decide.
    pub max_tokens: i32,
    /// Timeout for establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Longest silence tolerated between two reads of the response body.
    pub read_timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234".to_string(),
            temperature: 0.7,
            max_tokens: -1,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(120),
        }
    }
}

struct ActiveStream {
    turn: TurnId,
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
}

/// Streaming chat-completion client.
///
/// Each `start` spawns one background task that performs all network I/O and
/// reports through the supplied channel. At most one stream runs at a time.
pub struct CompletionClient {
    http: Client,
    config: Arc<CompletionConfig>,
    active: Option<ActiveStream>,
}

#[derive(Deserialize)]
struct ModelListResponse {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self::with_client(http, config))
    }

    /// Creates a client around an existing HTTP client.
    pub fn with_client(http: Client, config: CompletionConfig) -> Self {
        Self {
            http,
            config: Arc::new(config),
            active: None,
        }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.running.load(Ordering::Acquire))
    }

    /// Turn of the running stream, if any.
    pub fn active_turn(&self) -> Option<TurnId> {
        self.active
            .as_ref()
            .filter(|active| active.running.load(Ordering::Acquire))
            .map(|active| active.turn)
    }

    /// Starts streaming a completion for `messages`.
    ///
    /// Returns as soon as the background task is spawned. Chunks and exactly
    /// one terminal event tagged with `turn` are sent to `sender`, in order.
    pub fn start(
        &mut self,
        model: &str,
        messages: Vec<ChatMessage>,
        turn: TurnId,
        sender: mpsc::Sender<TurnEvent>,
    ) -> Result<(), CompletionError> {
        if self.is_active() {
            return Err(CompletionError::StreamActive);
        }
        let request = StreamRequest {
            turn,
            url: self.url("chat/completions"),
            body: ChatCompletionRequest {
                model: model.to_string(),
                messages,
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
                stream: true,
            },
            read_timeout: self.config.read_timeout,
        };
        let cancel = CancellationToken::new();
        let running = Arc::new(AtomicBool::new(true));
        log::debug!("starting stream {turn} with model {model}");
        tokio::spawn(run_stream(
            self.http.clone(),
            request,
            sender,
            cancel.clone(),
            running.clone(),
        ));
        self.active = Some(ActiveStream {
            turn,
            cancel,
            running,
        });
        Ok(())
    }

    /// Requests cancellation of the running stream without waiting for it.
    pub fn cancel(&self) {
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }

    /// Lists model ids from `GET {endpoint}/v1/models`.
    pub async fn list_models(&self) -> Result<Vec<String>, CompletionError> {
        let response = self
            .http
            .get(self.url("models"))
            .timeout(MODEL_LIST_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status { status, body });
        }
        let body = response.text().await?;
        let list: ModelListResponse = serde_json::from_str(&body)?;
        Ok(list.data.into_iter().map(|entry| entry.id).collect())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.config.endpoint.trim_end_matches('/'))
    }
}

impl Drop for CompletionClient {
    fn drop(&mut self) {
        self.cancel();
    }
}
