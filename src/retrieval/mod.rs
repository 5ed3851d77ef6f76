//! Knowledge store used to augment prompts with related documents.

mod backend;
mod document;
mod embedding;
mod error;
mod knowledge;
mod local;

pub use backend::RetrievalBackend;
pub use document::RetrievalDocument;
pub use error::StoreError;
pub use knowledge::{KnowledgeBase, SHORT_ID_LEN};
pub use local::LocalIndex;
