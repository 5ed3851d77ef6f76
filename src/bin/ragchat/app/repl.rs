use std::io::{self, Write};

use ragchat::completion::TurnEvent;
use ragchat::orchestrator::{ConversationOrchestrator, IgnoreReason, SubmitOutcome, TurnOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::commands::{self, Flow, Input};

enum Action {
    Line(Option<String>),
    Event(TurnEvent),
    Interrupt,
}

/// Line-oriented chat loop. Stream events are applied between reads so a
/// reply can be stopped while it is still arriving.
pub async fn run_repl(mut orchestrator: ConversationOrchestrator) -> anyhow::Result<()> {
    println!(
        "model: {}  retrieval: {}  (/help for commands)",
        orchestrator.model().unwrap_or("none, use /model"),
        if orchestrator.retrieval_enabled() { "on" } else { "off" }
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    loop {
        let streaming = orchestrator.active_turn().is_some();
        let action = tokio::select! {
            line = lines.next_line() => Action::Line(line?),
            Some(event) = orchestrator.recv(), if streaming => Action::Event(event),
            result = tokio::signal::ctrl_c() => {
                result?;
                Action::Interrupt
            }
        };

        match action {
            Action::Line(None) => break,
            Action::Line(Some(line)) => {
                if handle_line(&mut orchestrator, &line).await == Flow::Quit {
                    break;
                }
                if orchestrator.active_turn().is_none() {
                    prompt()?;
                }
            }
            Action::Event(event) => {
                if let Some(outcome) = orchestrator.handle_event(event) {
                    report(&outcome);
                    prompt()?;
                }
            }
            Action::Interrupt => {
                if !orchestrator.cancel() && !streaming {
                    println!();
                    break;
                }
            }
        }
    }

    orchestrator.shutdown().await;
    Ok(())
}

async fn handle_line(orchestrator: &mut ConversationOrchestrator, line: &str) -> Flow {
    match commands::parse_input(line) {
        Input::Empty => {}
        Input::Message(text) => match orchestrator.submit(&text).await {
            Ok(SubmitOutcome::Started(turn)) => log::debug!("submitted turn {turn}"),
            Ok(SubmitOutcome::Ignored(IgnoreReason::NoModelSelected)) => {
                eprintln!("! pick a model first: /models, then /model <id>");
            }
            Ok(SubmitOutcome::Ignored(IgnoreReason::EmptyMessage)) => {}
            Err(err) => eprintln!("! {err}"),
        },
        Input::Command(command) => match commands::execute(orchestrator, command).await {
            Ok(flow) => return flow,
            Err(err) => eprintln!("! {err:#}"),
        },
        Input::Invalid(message) => eprintln!("! {message}"),
    }
    Flow::Continue
}

fn report(outcome: &TurnOutcome) {
    if let TurnOutcome::Cancelled { text, .. } = outcome {
        if text.is_empty() {
            println!("(stopped before any reply)");
        }
    }
}

fn prompt() -> io::Result<()> {
    let mut out = io::stdout();
    write!(out, "you> ")?;
    out.flush()
}
