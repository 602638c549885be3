use thiserror::Error;

/// Failure taxonomy surfaced across the connection boundary.
///
/// `search`/`add`/`finalize` on the core indices cannot fail and return
/// plain values — this type only covers protocol parsing and on-disk I/O.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed request, unknown command, or a JSON payload missing a
    /// required field. Never mutates searcher state.
    #[error("{0}")]
    Protocol(String),

    /// Save/load I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed request/response JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
