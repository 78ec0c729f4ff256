use thiserror::Error;

/// Failure modes the engine exposes to its caller.
///
/// `InvalidInput` names the violated constraint and is never retried.
/// `EmbeddingUnavailable` / `IndexUnavailable` are transient external
/// dependency failures; retry policy belongs to the caller. `Internal`
/// marks defects in scoring or ranking, not expected conditions.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Recipe catalog not loaded")]
    CatalogNotLoaded,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
