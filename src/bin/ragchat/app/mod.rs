mod commands;
mod non_interactive;
mod repl;
mod sink;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ragchat::completion::{CompletionClient, CompletionConfig};
use ragchat::orchestrator::{ConversationOrchestrator, OrchestratorConfig};
use ragchat::persistence::JsonSessionStore;
use ragchat::retrieval::{KnowledgeBase, LocalIndex};

use crate::args::CliArgs;
use crate::config::{load_config, AppConfig};
use crate::logging::init_logging;

use sink::TerminalSink;

pub async fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let loaded = load_config(args.config.clone())?;
    let _logger = init_logging(&loaded.config.logging, &loaded.paths)?;
    log::info!(
        "config {}, data in {}",
        loaded.paths.config_file.display(),
        loaded.paths.data_dir.display()
    );
    let config = loaded.config;

    let client = CompletionClient::new(completion_config(&args, &config))?;
    if args.list_models {
        commands::print_models(&client.list_models().await?, None);
        return Ok(());
    }
    let model = pick_model(&args, &config, &client).await;

    let index = LocalIndex::open(&loaded.paths.knowledge_dir(), &config.retrieval.collection).await?;
    let sessions = JsonSessionStore::new(loaded.paths.sessions_dir());
    let interactive = args.prompt.is_none();
    let mut orchestrator = ConversationOrchestrator::new(
        client,
        KnowledgeBase::new(Arc::new(index)),
        sessions,
        Box::new(TerminalSink::stdout(interactive)),
        OrchestratorConfig {
            retrieval_enabled: config.retrieval.enabled && !args.no_rag,
            top_k: config.retrieval.top_k,
            ..OrchestratorConfig::default()
        },
    );
    if let Some(model) = model {
        orchestrator.select_model(model);
    }
    if let Some(prefix) = &args.session {
        let id = commands::resolve_session(&orchestrator, prefix)?;
        orchestrator.load_session(id)?;
    }

    match args.prompt {
        Some(prompt) => non_interactive::run_once(orchestrator, prompt).await,
        None => repl::run_repl(orchestrator).await,
    }
}

fn completion_config(args: &CliArgs, config: &AppConfig) -> CompletionConfig {
    CompletionConfig {
        endpoint: args
            .endpoint
            .clone()
            .unwrap_or_else(|| config.server.endpoint.clone()),
        temperature: config.chat.temperature,
        max_tokens: config.chat.max_tokens,
        connect_timeout: Duration::from_secs(config.server.connect_timeout_secs),
        read_timeout: Duration::from_secs(config.server.read_timeout_secs),
    }
}

/// Explicit choice first, then the configured default, then the first
/// model the server reports.
async fn pick_model(args: &CliArgs, config: &AppConfig, client: &CompletionClient) -> Option<String> {
    if let Some(model) = args.model.clone().or_else(|| config.chat.default_model.clone()) {
        return Some(model);
    }
    match client.list_models().await {
        Ok(models) => models.into_iter().next(),
        Err(err) => {
            log::warn!("could not list models: {err}");
            eprintln!("! could not reach {}: {err}", client.config().endpoint);
            None
        }
    }
}
