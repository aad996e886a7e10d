//! Error taxonomy for the review preparation pipeline.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Classification of a hosted NLP service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    /// Connection, DNS or timeout failure before a response arrived.
    Network,
    /// Missing or rejected credentials.
    Auth,
    /// Throttled by the service.
    RateLimited,
    /// Service-side internal error.
    Unavailable,
    /// A response arrived but lacked the fields we need.
    MalformedResponse,
    /// The service refused the input (size limit, unsupported language, ...).
    Rejected,
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceErrorKind::Network => "network",
            ServiceErrorKind::Auth => "auth",
            ServiceErrorKind::RateLimited => "rate-limited",
            ServiceErrorKind::Unavailable => "unavailable",
            ServiceErrorKind::MalformedResponse => "malformed-response",
            ServiceErrorKind::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Failure of a single sentiment or keyword annotation call.
#[derive(Debug, Clone, Error)]
#[error("{kind} annotation failure: {message}")]
pub struct AnnotationError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl AnnotationError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Main error type for the pipeline library.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A review chunk failed to parse or join.
    #[error("Source format error in chunk {chunk} (line {line}): {reason}")]
    SourceFormat {
        chunk: usize,
        line: usize,
        reason: String,
    },

    /// An expected column is missing after join or filter.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A hosted annotation call failed and retries were exhausted.
    #[error("Annotation service error: {0}")]
    Annotation(#[from] AnnotationError),

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding or decoding failed.
    #[error("CSV error on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Invalid run configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Publishing the final artifact failed.
    #[error("Upload error: {0}")]
    Upload(String),

    /// A stage failed; wraps the underlying cause with the stage name.
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        PipelineError::Csv {
            path: path.into(),
            source,
        }
    }

    pub fn in_stage(self, stage: &'static str) -> Self {
        PipelineError::Stage {
            stage,
            source: Box::new(self),
        }
    }
}

/// Convenience Result type using [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;
