use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::Client;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::chat::{create_line_stream, ChatCompletionRequest, Frame};
use crate::error::CompletionError;

use super::events::{StreamEvent, TurnEvent, TurnId};

pub(super) struct StreamRequest {
    pub turn: TurnId,
    pub url: String,
    pub body: ChatCompletionRequest,
    pub read_timeout: Duration,
}

/// Drives one streaming request to its terminal event.
///
/// `running` is cleared before the terminal event is sent, so the terminal
/// event is always the last thing this task does.
pub(super) async fn run_stream(
    http: Client,
    request: StreamRequest,
    sender: mpsc::Sender<TurnEvent>,
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
) {
    let start_time = Instant::now();
    let outcome = drive(&http, &request, &sender, &cancel).await;
    log::debug!(
        "stream {} finished in {:?}: {}",
        request.turn,
        start_time.elapsed(),
        outcome_label(&outcome)
    );
    running.store(false, Ordering::Release);
    let _ = sender.send(TurnEvent::new(request.turn, outcome)).await;
}

async fn drive(
    http: &Client,
    request: &StreamRequest,
    sender: &mpsc::Sender<TurnEvent>,
    cancel: &CancellationToken,
) -> StreamEvent {
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return StreamEvent::Cancelled(String::new()),
        response = http.post(&request.url).json(&request.body).send() => response,
    };
    let response = match response {
        Ok(response) => response,
        Err(err) => return StreamEvent::Failed(err.into()),
    };
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return StreamEvent::Failed(CompletionError::Status { status, body });
    }

    let mut lines = create_line_stream(response);
    let mut text = String::new();
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return StreamEvent::Cancelled(text),
            next = tokio::time::timeout(request.read_timeout, lines.next()) => next,
        };
        let line = match next {
            Err(_) => return StreamEvent::Failed(CompletionError::Timeout(request.read_timeout)),
            Ok(None) => break,
            Ok(Some(Err(err))) => return StreamEvent::Failed(err),
            Ok(Some(Ok(line))) => line,
        };
        if cancel.is_cancelled() {
            return StreamEvent::Cancelled(text);
        }
        match Frame::parse(&line) {
            Frame::Delta(delta) => {
                let event = TurnEvent::new(request.turn, StreamEvent::Chunk(delta.clone()));
                if sender.send(event).await.is_err() {
                    return StreamEvent::Cancelled(text);
                }
                text.push_str(&delta);
            }
            Frame::Done => break,
            Frame::Skip => {}
        }
    }

    if cancel.is_cancelled() {
        StreamEvent::Cancelled(text)
    } else {
        StreamEvent::Completed(text)
    }
}

fn outcome_label(event: &StreamEvent) -> &'static str {
    match event {
        StreamEvent::Chunk(_) => "chunk",
        StreamEvent::Completed(_) => "completed",
        StreamEvent::Cancelled(_) => "cancelled",
        StreamEvent::Failed(_) => "failed",
    }
}
