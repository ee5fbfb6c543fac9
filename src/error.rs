use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Object '{key}' does not exist in bucket '{bucket}'")]
    NotFound { bucket: String, key: String },

    #[error("Malformed trigger event: {0}")]
    MalformedEvent(String),

    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, CleanerError>;
