use thiserror::Error;

pub type PreviewResult<T> = Result<T, PreviewError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreviewError {
    #[error("JSX syntax error at offset {offset}: {message}")]
    Jsx { offset: usize, message: String },

    #[error("Failed to start preflight realm: {0}")]
    Realm(String),

    #[error("Preflight report could not be read: {0}")]
    Report(String),
}

impl From<serde_json::Error> for PreviewError {
    fn from(err: serde_json::Error) -> Self {
        PreviewError::Report(err.to_string())
    }
}

impl From<std::io::Error> for PreviewError {
    fn from(err: std::io::Error) -> Self {
        PreviewError::Realm(err.to_string())
    }
}
