use crate::error::CompletionError;
use crate::persistence::PersistenceError;
use crate::retrieval::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// A turn is still streaming or being cancelled.
    #[error("a reply is still streaming; stop it first")]
    Busy,
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
