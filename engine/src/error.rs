use thiserror::Error;

/// Errors raised while loading positions, game records or configuration.
///
/// Analysis itself never fails: a legal position always yields a control map
/// and a full set of metrics.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid FEN string '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Invalid move '{san}' at ply {ply}: {reason}")]
    InvalidMove { ply: usize, san: String, reason: String },

    #[error("No game found in PGN input")]
    EmptyPgn,

    #[error("Game index {index} out of range ({available} games available)")]
    GameIndex { index: usize, available: usize },

    #[error("Plotting failed: {0}")]
    Plot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
