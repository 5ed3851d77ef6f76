use anyhow::bail;
use ragchat::orchestrator::{ConversationOrchestrator, IgnoreReason, SubmitOutcome, TurnOutcome};

enum Finish {
    Settled(Option<TurnOutcome>),
    Interrupted,
}

/// Asks a single question, streams the reply to stdout and saves the session.
pub async fn run_once(
    mut orchestrator: ConversationOrchestrator,
    prompt: String,
) -> anyhow::Result<()> {
    match orchestrator.submit(&prompt).await? {
        SubmitOutcome::Started(_) => {}
        SubmitOutcome::Ignored(IgnoreReason::EmptyMessage) => bail!("prompt is empty"),
        SubmitOutcome::Ignored(IgnoreReason::NoModelSelected) => {
            bail!("no model available; pass --model or set chat.default_model")
        }
    }

    let finish = tokio::select! {
        outcome = orchestrator.run_turn() => Finish::Settled(outcome),
        _ = tokio::signal::ctrl_c() => Finish::Interrupted,
    };
    let outcome = match finish {
        Finish::Settled(outcome) => outcome,
        Finish::Interrupted => orchestrator.settle().await,
    };
    orchestrator.shutdown().await;

    match outcome {
        Some(TurnOutcome::Failed { error, .. }) => Err(error.into()),
        _ => Ok(()),
    }
}
