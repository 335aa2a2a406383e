///! Error types for the studio client
///!
///! Backend failures are normalized into `ApiError`, then rendered as
///! kind-qualified messages for the operator.

use plantd_common::{FieldError, ResourceKind};
use serde::Deserialize;
use std::fmt;

/// Normalized backend or transport failure; `status` is 0 when no response arrived
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Prefers a JSON `message`/`error` field, then the raw body, then the status text
    pub fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.is_empty());
        let message = match parsed {
            Some(message) => message,
            None if !body.trim().is_empty() => body.trim().to_string(),
            None => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        Self::new(status.as_u16(), message)
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self.status {
            0 => format!("Could not reach the server: {}", self.message),
            400 | 422 => format!("Invalid input: {}", self.message),
            401 => "The server rejected the request as unauthenticated.".to_string(),
            403 => "You don't have permission to perform this action.".to_string(),
            404 => "The requested resource was not found.".to_string(),
            409 if self.message.contains("already exists") => {
                "A resource with this name already exists. Please choose a different name.".to_string()
            }
            409 => format!("Operation conflict: {}", self.message),
            429 => "Too many requests. Please wait a moment and try again.".to_string(),
            503 => "The service is temporarily unavailable. Please try again later.".to_string(),
            _ => self.message.clone(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.status, 0 | 429 | 500..=599)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16()).unwrap_or(0);
        Self::new(status, err.to_string())
    }
}

impl From<plantd_common::Error> for ApiError {
    fn from(err: plantd_common::Error) -> Self {
        Self::new(0, format!("Malformed response: {}", err))
    }
}

/// What the operator was trying to do when a request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Get,
    List,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Action::Get => "get",
            Action::List => "list",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// `"Failed to {action} {Kind}: {message}"`
pub fn toast(action: Action, kind: ResourceKind, err: &ApiError) -> String {
    format!("Failed to {} {}: {}", action, kind, err.user_message())
}

/// Invalid editor parameters; not recoverable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("Unknown editor action '{0}', expected create, clone or edit")]
    UnknownAction(String),

    #[error("{action} requires a namespace and a name")]
    MissingIdentity { action: String },
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Form has {} invalid field(s): {}", .0.len(), join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Convert(#[from] plantd_common::Error),
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_error_body_parsing() {
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, r#"{"message":"name is taken"}"#);
        assert_eq!(err, ApiError::new(400, "name is taken"));

        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"boom"}"#);
        assert_eq!(err.message, "boom");

        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "upstream down\n");
        assert_eq!(err.message, "upstream down");

        let err = ApiError::from_response(StatusCode::NOT_FOUND, "");
        assert_eq!(err.message, "Not Found");
    }

    #[test]
    fn test_toast_is_kind_qualified() {
        let err = ApiError::new(404, "schemas.plantd.io \"orders\" not found");
        assert_eq!(
            toast(Action::Get, ResourceKind::Schema, &err),
            "Failed to get Schema: The requested resource was not found."
        );

        let err = ApiError::new(409, "pipeline already exists");
        assert!(toast(Action::Create, ResourceKind::Pipeline, &err)
            .starts_with("Failed to create Pipeline: A resource with this name"));
    }

    #[test]
    fn test_unauthenticated_message() {
        let err = ApiError::new(401, "Unauthorized");
        assert_eq!(
            toast(Action::List, ResourceKind::Pipeline, &err),
            "Failed to list Pipeline: The server rejected the request as unauthenticated."
        );
        assert!(!err.user_message().contains("log in"));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(ApiError::new(0, "connection refused").is_retryable());
        assert!(ApiError::new(503, "").is_retryable());
        assert!(!ApiError::new(404, "").is_retryable());
    }
}
