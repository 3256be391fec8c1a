use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type GenerationResult<T> = Result<T, GenerationError>;
pub type StoreResult<T> = Result<T, StoreError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a generation collaborator could not produce output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("No AI provider configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY.")]
    NotConfigured,

    #[error("{provider} is unreachable: {message}")]
    Unreachable { provider: &'static str, message: String },

    #[error("{provider} quota exceeded")]
    QuotaExceeded { provider: &'static str },

    #[error("{provider} rejected the API key")]
    InvalidCredential { provider: &'static str },

    #[error("{provider} returned {status}: {message}")]
    Upstream {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} returned unusable output: {message}")]
    MalformedOutput { provider: &'static str, message: String },
}

impl GenerationError {
    /// Stable code a client can switch on.
    pub fn reason(&self) -> &'static str {
        match self {
            GenerationError::NotConfigured => "not_configured",
            GenerationError::Unreachable { .. } => "unreachable",
            GenerationError::QuotaExceeded { .. } => "quota_exceeded",
            GenerationError::InvalidCredential { .. } => "invalid_credential",
            GenerationError::Upstream { .. } => "upstream_error",
            GenerationError::MalformedOutput { .. } => "malformed_output",
        }
    }

    pub(crate) fn from_status(provider: &'static str, status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => GenerationError::InvalidCredential { provider },
            429 => GenerationError::QuotaExceeded { provider },
            code => GenerationError::Upstream {
                provider,
                status: code,
                message: body.chars().take(200).collect(),
            },
        }
    }

    pub(crate) fn from_transport(provider: &'static str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            GenerationError::MalformedOutput {
                provider,
                message: err.to_string(),
            }
        } else {
            GenerationError::Unreachable {
                provider,
                message: err.to_string(),
            }
        }
    }

    pub(crate) fn malformed(provider: &'static str, message: impl ToString) -> Self {
        GenerationError::MalformedOutput {
            provider,
            message: message.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid INKWELL_ADDR '{0}'")]
    InvalidAddr(String),

    #[error("Invalid INKWELL_GENERATOR '{0}'. Expected 'rules' or 'live'")]
    InvalidMode(String),
}

/// Error side of every route.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Generation(err) => {
                tracing::warn!(reason = err.reason(), error = %err, "generation failed");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": err.to_string(), "reason": err.reason() })),
                )
                    .into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_reasons() {
        let auth = GenerationError::from_status("openai", reqwest::StatusCode::UNAUTHORIZED, "");
        assert_eq!(auth.reason(), "invalid_credential");
        let quota = GenerationError::from_status("openai", reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert_eq!(quota.reason(), "quota_exceeded");
        let other = GenerationError::from_status("gemini", reqwest::StatusCode::BAD_REQUEST, "bad model");
        assert_eq!(
            other,
            GenerationError::Upstream {
                provider: "gemini",
                status: 400,
                message: "bad model".into()
            }
        );
    }

    #[test]
    fn not_configured_message_is_actionable() {
        assert_eq!(
            GenerationError::NotConfigured.to_string(),
            "No AI provider configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY."
        );
    }
}
