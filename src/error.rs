use std::path::PathBuf;

/// Errors surfaced at the crate boundary. Building the model and computing the
/// layout never fail; only reading input and writing output can.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("invalid config file {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("render failed: {message}")]
    Render { message: String },
}
