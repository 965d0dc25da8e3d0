use std::collections::BTreeMap;

use thiserror::Error;

/// Failure of a single API call, classified for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server rejected the payload with per-field messages.
    #[error("{message}")]
    Validation {
        status: u16,
        message: String,
        errors: BTreeMap<String, String>,
    },

    /// Non-success status without field errors.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Rejected client-side before any request was issued.
    #[error("{resource} not found")]
    NotFound { resource: &'static str, id: String },

    /// A payload came back without its identifying field.
    #[error("Invalid {entity} data: missing {field}")]
    InvalidData {
        entity: &'static str,
        field: &'static str,
    },

    /// Network, encoding or decoding failure.
    #[error("{0}")]
    Transport(String),
}

impl ApiError {
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::Transport("Unknown error".to_string())
        } else {
            Self::Transport(message)
        }
    }

    /// Per-field messages of a validation error.
    pub fn errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// HTTP status that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Validation { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_transport_message_becomes_unknown() {
        assert_eq!(ApiError::transport("  ").to_string(), "Unknown error");
        assert_eq!(ApiError::transport("connection refused").to_string(), "connection refused");
    }

    #[test]
    fn field_errors_only_on_validation() {
        let mut errors = BTreeMap::new();
        errors.insert("content".to_string(), "required".to_string());
        let err = ApiError::Validation {
            status: 422,
            message: "The given data was invalid.".to_string(),
            errors,
        };
        assert_eq!(err.errors().and_then(|e| e.get("content")).map(String::as_str), Some("required"));
        assert_eq!(err.to_string(), "The given data was invalid.");

        let err = ApiError::Api { status: 500, message: "API error: 500".to_string() };
        assert!(err.errors().is_none());
        assert_eq!(err.status(), Some(500));
    }
}
