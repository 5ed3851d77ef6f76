mod app;
mod chat;
mod logging;
mod retrieval;
mod server;
mod storage;

const DEFAULT_ENDPOINT: &str = "http://localhost:1234";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 120;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TOP_K: usize = 3;
const DEFAULT_COLLECTION: &str = "knowledge_base";
const DEFAULT_LOG_LEVEL: &str = "ragchat=info";
const DEFAULT_LOG_ROTATE_SIZE: u64 = 2 * 1024 * 1024;
const DEFAULT_LOG_ROTATE_KEEP: usize = 3;

pub use app::AppConfig;
pub use chat::ChatConfig;
pub use logging::LoggingConfig;
pub use retrieval::RetrievalConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;
