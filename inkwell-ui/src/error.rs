use thiserror::Error;

pub type UiResult<T> = Result<T, UiError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UiError {
    #[error("JSON parse error: {0}")]
    Json(String),

    #[error("Generated output must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("Output of kind '{kind}' is missing its '{field}' field")]
    MissingField { kind: String, field: &'static str },

    #[error("Unknown output kind '{0}'. Expected 'ui' or 'code'")]
    UnknownKind(String),

    #[error("Output carries neither a UI tree nor code")]
    UnrecognizedOutput,

    #[error("Failed to write document: {0}")]
    Format(String),
}

impl From<serde_json::Error> for UiError {
    fn from(err: serde_json::Error) -> Self {
        UiError::Json(err.to_string())
    }
}

impl From<std::fmt::Error> for UiError {
    fn from(err: std::fmt::Error) -> Self {
        UiError::Format(err.to_string())
    }
}

/// Name of a JSON value's type, for error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
