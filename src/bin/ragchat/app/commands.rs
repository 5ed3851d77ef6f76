use std::collections::BTreeMap;

use anyhow::{anyhow, bail};
use chrono::Local;
use ragchat::orchestrator::ConversationOrchestrator;
use ragchat::retrieval::SHORT_ID_LEN;
use ragchat::session::{Role, SessionId};

const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New,
    List,
    Load(String),
    Delete(String),
    Model(String),
    Models,
    Stop,
    RagAdd(String),
    RagList,
    RagDelete(String),
    RagClear,
    RagEnable(bool),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Message(String),
    Command(Command),
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };
    let (name, arg) = split_word(rest);
    let command = match (name, arg) {
        ("new", "") => Command::New,
        ("list", "") => Command::List,
        ("load", id) if !id.is_empty() => Command::Load(id.to_string()),
        ("delete", id) if !id.is_empty() => Command::Delete(id.to_string()),
        ("model", id) if !id.is_empty() => Command::Model(id.to_string()),
        ("models", "") => Command::Models,
        ("stop", "") => Command::Stop,
        ("rag", sub) => return parse_rag(sub),
        ("help", _) => Command::Help,
        ("quit" | "exit", "") => Command::Quit,
        _ => return Input::Invalid(format!("unknown command /{rest}; try /help")),
    };
    Input::Command(command)
}

fn parse_rag(rest: &str) -> Input {
    let (sub, arg) = split_word(rest);
    let command = match (sub, arg) {
        ("add", text) if !text.is_empty() => Command::RagAdd(text.to_string()),
        ("list", "") => Command::RagList,
        ("delete", id) if !id.is_empty() => Command::RagDelete(id.to_string()),
        ("clear", "") => Command::RagClear,
        ("on", "") => Command::RagEnable(true),
        ("off", "") => Command::RagEnable(false),
        _ => {
            return Input::Invalid(
                "usage: /rag add <text> | list | delete <id> | clear | on | off".to_string(),
            )
        }
    };
    Input::Command(command)
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

pub async fn execute(
    orchestrator: &mut ConversationOrchestrator,
    command: Command,
) -> anyhow::Result<Flow> {
    match command {
        Command::New => {
            orchestrator.settle().await;
            orchestrator.new_session()?;
        }
        Command::List => list_sessions(orchestrator)?,
        Command::Load(prefix) => {
            let id = resolve_session(orchestrator, &prefix)?;
            orchestrator.settle().await;
            orchestrator.load_session(id)?;
            print_transcript(orchestrator);
        }
        Command::Delete(prefix) => {
            let id = resolve_session(orchestrator, &prefix)?;
            if orchestrator.session().id == id {
                orchestrator.settle().await;
            }
            orchestrator.delete_session(id)?;
            println!("deleted session {id}");
        }
        Command::Model(model) => {
            orchestrator.select_model(model.as_str());
            println!("using model {model}");
        }
        Command::Models => print_models(&orchestrator.list_models().await?, orchestrator.model()),
        Command::Stop => {
            if !orchestrator.cancel() {
                println!("nothing to stop");
            }
        }
        Command::RagAdd(text) => {
            let metadata = BTreeMap::from([("source".to_string(), "cli".to_string())]);
            let id = orchestrator.knowledge().add(&text, metadata).await?;
            println!("added document {}", short(&id));
        }
        Command::RagList => {
            let documents = orchestrator.knowledge().list().await?;
            if documents.is_empty() {
                println!("knowledge base is empty");
            }
            for (id, content) in documents {
                println!("{}  {}", short(&id), preview(&content));
            }
        }
        Command::RagDelete(prefix) => {
            let knowledge = orchestrator.knowledge();
            let id = knowledge.resolve_prefix(&prefix).await?;
            knowledge.delete(&id).await?;
            println!("deleted document {}", short(&id));
        }
        Command::RagClear => {
            orchestrator.knowledge().clear().await?;
            println!("knowledge base cleared");
        }
        Command::RagEnable(enabled) => {
            orchestrator.set_retrieval_enabled(enabled);
            println!("retrieval {}", if enabled { "on" } else { "off" });
        }
        Command::Help => print_help(),
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Finds the stored session whose id starts with `prefix`.
pub fn resolve_session(
    orchestrator: &ConversationOrchestrator,
    prefix: &str,
) -> anyhow::Result<SessionId> {
    let mut matches = orchestrator
        .list_sessions()?
        .into_iter()
        .filter(|summary| summary.id.to_string().starts_with(prefix));
    let first = matches
        .next()
        .ok_or_else(|| anyhow!("no saved session matches {prefix}"))?;
    if matches.next().is_some() {
        bail!("{prefix} matches more than one session");
    }
    Ok(first.id)
}

pub fn print_models(models: &[String], current: Option<&str>) {
    if models.is_empty() {
        println!("the server reports no models");
    }
    for model in models {
        let marker = if Some(model.as_str()) == current { "*" } else { " " };
        println!("{marker} {model}");
    }
}

fn list_sessions(orchestrator: &ConversationOrchestrator) -> anyhow::Result<()> {
    let sessions = orchestrator.list_sessions()?;
    if sessions.is_empty() {
        println!("no saved sessions");
    }
    let current = orchestrator.session().id;
    for summary in sessions {
        let marker = if summary.id == current { "*" } else { " " };
        println!(
            "{marker} {}  {}  {}",
            short(&summary.id.to_string()),
            summary.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            summary.title
        );
    }
    Ok(())
}

fn print_transcript(orchestrator: &ConversationOrchestrator) {
    for message in &orchestrator.session().messages {
        let who = match message.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        println!("{who}> {}", message.content);
    }
}

fn print_help() {
    println!(
        "\
/new                start a new session
/list               list saved sessions
/load <id>          switch to a saved session
/delete <id>        delete a saved session
/model <id>         choose the model
/models             list models served by the endpoint
/stop               stop the reply being streamed (or press Ctrl-C)
/rag add <text>     add a document to the knowledge base
/rag list           list knowledge-base documents
/rag delete <id>    delete a document
/rag clear          delete every document
/rag on|off         toggle prompt augmentation
/quit               save and exit"
    );
}

fn short(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

fn preview(content: &str) -> String {
    let flat = content.replace(['\r', '\n'], " ");
    let mut chars = flat.chars();
    let mut out: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        out.push_str("...");
    }
    out
}
