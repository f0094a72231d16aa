use thiserror::Error;

/// Recoverable failures of a module transform.
///
/// Invariant violations inside the pass are not represented here; they panic.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("Failed to parse {file}: {}", .messages.join("; "))]
    Parse { file: String, messages: Vec<String> },

    #[error("The `ast` option requires a snippet parser")]
    MissingParser,

    #[error("Generated code failed to re-parse ({message}): {snippet}")]
    SnippetParse { snippet: String, message: String },

    #[error("Invalid transform options: {0}")]
    InvalidOptions(String),
}

impl TransformError {
    pub fn parse(file: &str, messages: Vec<String>) -> Self {
        TransformError::Parse {
            file: file.to_string(),
            messages,
        }
    }
}

#[cfg(feature = "napi")]
impl From<TransformError> for napi::Error {
    fn from(err: TransformError) -> Self {
        napi::Error::from_reason(err.to_string())
    }
}
