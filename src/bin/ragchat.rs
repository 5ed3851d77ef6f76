#[path = "ragchat/app/mod.rs"]
mod app;
#[path = "ragchat/args.rs"]
mod args;
#[path = "ragchat/config/mod.rs"]
mod config;
#[path = "ragchat/logging.rs"]
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
