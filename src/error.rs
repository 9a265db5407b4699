//! Error taxonomy for every user-triggered action.
//!
//! Each remote call or form edit returns an [`AppError`]; the session turns
//! it into a rendered message. Only [`ErrorKind::Configuration`] is fatal,
//! and only at startup.

/// Coarse classification used for logging and for deciding whether a
/// failure ends the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Connection,
    Schema,
    Write,
    Input,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Credentials or spreadsheet identifier missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The spreadsheet could not be reached or read.
    #[error("could not reach the spreadsheet: {0}")]
    Connection(String),

    /// The score log header lacks one or more required columns.
    #[error("score log is missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// A score log row holds a value that cannot be coerced.
    #[error("score log row {row}: {message}")]
    MalformedRow { row: usize, message: String },

    /// Appending a score failed.
    #[error("failed to record score: {0}")]
    Write(String),

    /// A form value the input surface does not accept.
    #[error("invalid input: {0}")]
    Input(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Configuration(_) => ErrorKind::Configuration,
            AppError::Connection(_) => ErrorKind::Connection,
            AppError::MissingColumns { .. } | AppError::MalformedRow { .. } => ErrorKind::Schema,
            AppError::Write(_) => ErrorKind::Write,
            AppError::Input(_) => ErrorKind::Input,
        }
    }

    /// Wraps an [`anyhow::Error`] chain as a connection failure, keeping
    /// every context layer in the message.
    pub fn connection(err: anyhow::Error) -> Self {
        AppError::Connection(format!("{err:#}"))
    }

    /// Wraps an [`anyhow::Error`] chain as a write failure.
    pub fn write(err: anyhow::Error) -> Self {
        AppError::Write(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_variants_share_kind() {
        let missing = AppError::MissingColumns {
            missing: vec!["score".into(), "weight".into()],
        };
        let malformed = AppError::MalformedRow {
            row: 3,
            message: "score is not a number".into(),
        };

        assert_eq!(missing.kind(), ErrorKind::Schema);
        assert_eq!(malformed.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_missing_columns_message_lists_columns() {
        let err = AppError::MissingColumns {
            missing: vec!["score".into(), "weight".into()],
        };
        assert_eq!(
            err.to_string(),
            "score log is missing required columns: score, weight"
        );
    }

    #[test]
    fn test_connection_keeps_context_chain() {
        let err = anyhow::anyhow!("timed out").context("Failed to read score log");
        let app = AppError::connection(err);

        assert_eq!(app.kind(), ErrorKind::Connection);
        assert!(app.to_string().contains("Failed to read score log: timed out"));
    }
}
