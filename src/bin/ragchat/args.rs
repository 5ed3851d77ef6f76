use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ragchat",
    about = "Chat with a local OpenAI-compatible model server, with answers grounded in your own notes"
)]
pub struct CliArgs {
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
    /// Base URL of the model server
    #[arg(long, short = 'e')]
    pub endpoint: Option<String>,
    #[arg(long, short = 'm')]
    pub model: Option<String>,
    /// Send prompts without knowledge-base context
    #[arg(long)]
    pub no_rag: bool,
    /// Ask one question, print the reply and exit
    #[arg(long, short = 'p')]
    pub prompt: Option<String>,
    /// Resume a saved session by id or id prefix
    #[arg(long, short = 's')]
    pub session: Option<String>,
    #[arg(long)]
    pub list_models: bool,
}
