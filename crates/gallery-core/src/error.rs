use thiserror::Error;

pub type Result<T> = std::result::Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    /// The input cannot form a media record at all.
    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    /// A catalog-only operation was asked of a locator-only record.
    #[error("Not available for external media: {0}")]
    ExternalOnly(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}
