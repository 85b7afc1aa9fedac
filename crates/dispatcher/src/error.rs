//! Dispatcher error types

use contracts::Timestamp;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// A sink rejected a record; the run stops here
    #[error("sink '{sink_name}' failed at timestamp {timestamp}: {source}")]
    Sink {
        sink_name: String,
        timestamp: Timestamp,
        #[source]
        source: contracts::ContractError,
    },

    /// Error while flushing or closing a sink
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// Reading the input stream failed
    #[error(transparent)]
    Ingestion(#[from] ingestion::IngestionError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
