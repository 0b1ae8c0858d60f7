//! Error types for Preprint Alert.
//!
//! Library crates use [`PreprintAlertError`] and the stage errors below via
//! `thiserror`. The CLI wraps these with `color-eyre` for rich diagnostics.
//!
//! Stage errors fall into two groups:
//! - run-fatal: [`PipelineError`] and the errors it wraps
//!   ([`ClassificationError`], [`SynthesisError`], discovery failures)
//! - item-soft: [`FetchError`] and [`AnalysisError`], which the pipeline folds
//!   into a status-tagged [`crate::Analysis`] and never propagates

use std::path::PathBuf;

/// General error type for configuration, I/O, feed and parsing operations.
#[derive(Debug, thiserror::Error)]
pub enum PreprintAlertError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error.
    #[error("network error: {0}")]
    Network(String),

    /// Feed, HTML, or report parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Page template registration or rendering error.
    #[error("template error: {message}")]
    Template { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PreprintAlertError>;

impl PreprintAlertError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a template error from any displayable message.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Language-model errors
// ---------------------------------------------------------------------------

/// Failure of a single language-model completion call.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The request could not be sent or the connection failed.
    #[error("model request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status.
    #[error("model provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider's response body could not be interpreted.
    #[error("model response parse error: {0}")]
    Response(String),

    /// Missing or rejected credentials.
    #[error("model authentication failed: {0}")]
    Auth(String),
}

// ---------------------------------------------------------------------------
// Item-soft errors
// ---------------------------------------------------------------------------

/// Failure to retrieve extended content for one paper.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure, timeout, or non-success HTTP status.
    #[error("fetch failed for {id}: {message}")]
    Network { id: String, message: String },

    /// The paper has no extended content (e.g. no HTML rendering).
    #[error("no extended content available for {id}")]
    Unavailable { id: String },

    /// Content was downloaded but nothing usable could be extracted.
    #[error("could not extract content for {id}: {message}")]
    Parse { id: String, message: String },
}

/// Failure of the per-paper analysis step.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("analysis model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("analysis model returned an empty response")]
    EmptyResponse,
}

// ---------------------------------------------------------------------------
// Run-fatal errors
// ---------------------------------------------------------------------------

/// Failure of the interest classification stage.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("classification model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("classification output could not be parsed: {0}")]
    Unparseable(String),
}

/// Failure of the report synthesis stage.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("synthesis model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("synthesis model returned an empty report")]
    EmptyResponse,
}

/// A run-fatal pipeline failure. The run produces no report.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("discovery failed: {0}")]
    Discovery(#[source] PreprintAlertError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = PreprintAlertError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = PreprintAlertError::validation("concurrency must be at least 1");
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn stage_errors_keep_their_category() {
        let err: PipelineError =
            ClassificationError::Model(ModelError::Request("timeout".into())).into();
        assert!(matches!(err, PipelineError::Classification(_)));
        assert!(err.to_string().contains("classification model call failed"));

        let err: PipelineError = SynthesisError::EmptyResponse.into();
        assert!(matches!(err, PipelineError::Synthesis(_)));
    }

    #[test]
    fn fetch_error_names_the_paper() {
        let err = FetchError::Unavailable {
            id: "2401.00001".into(),
        };
        assert_eq!(
            err.to_string(),
            "no extended content available for 2401.00001"
        );
    }
}
