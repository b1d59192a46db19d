/// Errors that can occur while publishing events to the alert queue.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Connecting to or commanding the queue server failed.
    #[error("Sink: queue command failed: {0}")]
    Redis(#[from] redis::RedisError),

    /// The event could not be serialized to its wire form.
    #[error("Sink: event serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience `Result` alias for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;
