use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] threadline_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("Report ID cannot be empty")]
    EmptyReportId,
    #[error("No comment text provided")]
    EmptyComment,
    #[error("Attachment URL must include http:// or https://: {0}")]
    InvalidUrl(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Timed out after {0}s waiting for the server")]
    Timeout(u64),
    #[error("A download of this attachment is already running")]
    DownloadInProgress,
    #[error("Comment was rejected: {0}")]
    CommentRejected(String),
}
