use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use ragchat::completion::{CompletionClient, CompletionConfig, StreamEvent};
use ragchat::orchestrator::{
    ConversationOrchestrator, DisplayUpdate, OrchestratorConfig, SubmitOutcome, TurnOutcome,
};
use ragchat::persistence::JsonSessionStore;
use ragchat::retrieval::{KnowledgeBase, LocalIndex};
use ragchat::session::{BlockKind, Message};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

async fn orchestrator(
    endpoint: String,
    data_dir: &std::path::Path,
) -> (ConversationOrchestrator, mpsc::UnboundedReceiver<DisplayUpdate>) {
    let index = LocalIndex::open(&data_dir.join("knowledge"), "knowledge_base")
        .await
        .unwrap();
    let client = CompletionClient::new(CompletionConfig {
        endpoint,
        read_timeout: Duration::from_secs(10),
        ..CompletionConfig::default()
    })
    .unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut orchestrator = ConversationOrchestrator::new(
        client,
        KnowledgeBase::new(Arc::new(index)),
        JsonSessionStore::new(data_dir.join("sessions")),
        Box::new(tx),
        OrchestratorConfig::default(),
    );
    orchestrator.select_model("local-model");
    (orchestrator, rx)
}

/// Serves one streaming response that sends a single chunk and then stalls
/// until `release` fires or the client hangs up.
async fn stalling_server(chunk: &'static str) -> (String, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (release, released) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let frame = serde_json::json!({"choices": [{"delta": {"content": chunk}}]});
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\ndata: {frame}\n\n"
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();

        tokio::select! {
            _ = released => {}
            _ = socket.read(&mut buf) => {}
        }
    });

    (url, release)
}

#[tokio::test]
async fn cancelling_mid_stream_keeps_the_partial_reply() {
    let dir = tempfile::tempdir().unwrap();
    let (url, _release) = stalling_server("Par").await;
    let (mut orchestrator, mut updates) = orchestrator(url, dir.path()).await;

    let turn = match orchestrator.submit("Hello").await.unwrap() {
        SubmitOutcome::Started(turn) => turn,
        other => panic!("not started: {other:?}"),
    };

    // Wait for the first chunk to be applied.
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), orchestrator.recv())
            .await
            .expect("no chunk arrived")
            .unwrap();
        let is_chunk = matches!(event.event, StreamEvent::Chunk(_));
        assert!(orchestrator.handle_event(event).is_none());
        if is_chunk {
            break;
        }
    }

    assert!(orchestrator.cancel());
    let outcome = tokio::time::timeout(Duration::from_secs(5), orchestrator.run_turn())
        .await
        .expect("cancel did not settle")
        .unwrap();

    match outcome {
        TurnOutcome::Cancelled { turn: t, text } => {
            assert_eq!(t, turn);
            assert_eq!(text, "Par");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let session = orchestrator.session().clone();
    assert_eq!(
        session.messages,
        vec![Message::user("Hello"), Message::assistant("Par")]
    );

    let stored = JsonSessionStore::new(dir.path().join("sessions"))
        .load(session.id)
        .unwrap();
    assert_eq!(stored.messages, session.messages);
    assert_eq!(stored.rendered.last().unwrap().kind, BlockKind::Stopped);

    let mut saw_chunk = false;
    while let Ok(update) = updates.try_recv() {
        if let DisplayUpdate::Chunk { text, .. } = update {
            assert_eq!(text, "Par");
            saw_chunk = true;
        }
    }
    assert!(saw_chunk);
}

#[tokio::test]
async fn sessions_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Use `cargo`\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" to build.\"}}]}\n\n",
            "data: [DONE]\n\n"
        ))
        .create_async()
        .await;

    let first_id = {
        let (mut orchestrator, _updates) = orchestrator(server.url(), dir.path()).await;
        orchestrator
            .knowledge()
            .add("Rust projects are built with cargo.", BTreeMap::new())
            .await
            .unwrap();
        orchestrator
            .submit("How do I build a Rust project quickly and reliably?")
            .await
            .unwrap();
        let outcome = orchestrator.run_turn().await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Completed { ref text, .. } if text == "Use `cargo` to build."));
        let id = orchestrator.session().id;
        orchestrator.shutdown().await;
        id
    };

    let (mut orchestrator, _updates) = orchestrator(server.url(), dir.path()).await;
    let sessions = orchestrator.list_sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, first_id);
    assert_eq!(sessions[0].title, "How do I build a Rust project ...");

    orchestrator.load_session(first_id).unwrap();
    let session = orchestrator.session();
    assert_eq!(session.messages.len(), 2);
    assert!(session.rendered[1].html.contains("<code>cargo</code>"));

    let documents = orchestrator.knowledge().list().await.unwrap();
    assert_eq!(documents.len(), 1);
}
