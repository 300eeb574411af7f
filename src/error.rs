//! Error kinds surfaced by game actions
//!
//! Every variant is recoverable: the action is aborted, nothing it touched
//! is committed, and the message is shown to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

pub type GameResult<T> = Result<T, GameError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Phase(String),

    #[error("Word '{word}' is on cooldown until {expiry}")]
    Cooldown { word: String, expiry: chrono::NaiveDate },

    #[error("{0}")]
    Conflict(String),

    #[error("Edit limit of {max_edits} changes per day reached")]
    EditLimit { max_edits: u32 },

    #[error("{0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Only admins can {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl GameError {
    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            GameError::Validation(_) => "VALIDATION_FAILED",
            GameError::Phase(_) => "WRONG_PHASE",
            GameError::Cooldown { .. } => "WORD_ON_COOLDOWN",
            GameError::Conflict(_) => "CONFLICT",
            GameError::EditLimit { .. } => "EDIT_LIMIT_REACHED",
            GameError::NotFound(_) => "NOT_FOUND",
            GameError::Configuration(_) => "CONFIGURATION_ERROR",
            GameError::Unauthorized => "UNAUTHORIZED",
            GameError::Forbidden(_) => "FORBIDDEN",
            GameError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GameError::Validation(_) => StatusCode::BAD_REQUEST,
            GameError::Phase(_)
            | GameError::Cooldown { .. }
            | GameError::Conflict(_)
            | GameError::EditLimit { .. } => StatusCode::CONFLICT,
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::Unauthorized => StatusCode::UNAUTHORIZED,
            GameError::Forbidden(_) => StatusCode::FORBIDDEN,
            GameError::Configuration(_) | GameError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.code(), self);
        }

        let body = serde_json::json!({
            "ok": false,
            "code": self.code(),
            "message": self.to_string(),
        });

        let mut response = (status, Json(body)).into_response();
        if matches!(self, GameError::Unauthorized) {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Basic realm=\"Dinner Bingo\""),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GameError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GameError::EditLimit { max_edits: 3 }.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GameError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GameError::Configuration("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = GameError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response
            .headers()
            .get(axum::http::header::WWW_AUTHENTICATE)
            .is_some());
    }

    #[test]
    fn test_cooldown_message_names_expiry() {
        let err = GameError::Cooldown {
            word: "banana".to_string(),
            expiry: chrono::NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
        };
        assert_eq!(err.to_string(), "Word 'banana' is on cooldown until 2024-01-20");
        assert_eq!(err.code(), "WORD_ON_COOLDOWN");
    }
}
