//! HTTP Basic Authentication against participant credentials

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

use crate::error::{GameError, GameResult};
use crate::state::AppState;
use crate::types::Participant;

/// The authenticated participant of the current request
#[derive(Debug, Clone)]
pub struct CurrentParticipant(pub Participant);

impl CurrentParticipant {
    /// Fail with Forbidden unless the participant is an admin
    pub fn require_admin(&self, action: &str) -> GameResult<&Participant> {
        if self.0.is_admin() {
            Ok(&self.0)
        } else {
            tracing::warn!("{} tried to {} without admin role", self.0.username, action);
            Err(GameError::Forbidden(action.to_string()))
        }
    }
}

/// Extract (username, password) from an `Authorization: Basic ...` header value
pub fn parse_basic_credentials(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Middleware resolving the participant for every `/api` request
pub async fn participant_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let credentials = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_basic_credentials);

    let Some((username, password)) = credentials else {
        return GameError::Unauthorized.into_response();
    };

    match state.authenticate(&username, &password).await {
        Some(participant) => {
            request
                .extensions_mut()
                .insert(CurrentParticipant(participant));
            next.run(request).await
        }
        None => {
            tracing::warn!("Failed login for '{}'", username);
            GameError::Unauthorized.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_parse_basic_credentials() {
        // "admin:secret" -> "YWRtaW46c2VjcmV0"
        assert_eq!(
            parse_basic_credentials("Basic YWRtaW46c2VjcmV0"),
            Some(("admin".to_string(), "secret".to_string()))
        );
        // "user:pa:ss" keeps colons in the password
        assert_eq!(
            parse_basic_credentials("Basic dXNlcjpwYTpzcw=="),
            Some(("user".to_string(), "pa:ss".to_string()))
        );
        assert!(parse_basic_credentials("Bearer abc").is_none());
        assert!(parse_basic_credentials("Basic !!!").is_none());
        // "nocolon"
        assert!(parse_basic_credentials("Basic bm9jb2xvbg==").is_none());
    }

    #[test]
    fn test_require_admin() {
        let mut participant = Participant {
            id: "p1".to_string(),
            username: "alice".to_string(),
            password_hash: String::new(),
            role: Role::Player,
            points: 0,
            created_at: chrono::NaiveDateTime::default(),
        };
        let err = CurrentParticipant(participant.clone())
            .require_admin("change settings")
            .unwrap_err();
        assert_eq!(err.to_string(), "Only admins can change settings");

        participant.role = Role::Admin;
        assert!(CurrentParticipant(participant)
            .require_admin("change settings")
            .is_ok());
    }
}
