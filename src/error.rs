use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Schema unavailable: {0}")]
    SchemaUnavailable(String),

    #[error("Rejected unsafe SQL: {0}")]
    ValidationRejected(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
