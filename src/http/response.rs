//! Terminal client responses.
//!
//! # Responsibilities
//! - Map the request error taxonomy to HTTP responses
//! - Build the authentication challenge
//!
//! The client either gets a relayed backend response or one of these
//! terminals, never a partial/garbled mix.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::RequestError;

/// Realm announced in the authentication challenge.
pub const REALM: &str = "searchgate";

/// 401 challenge response asking the client to authenticate.
pub fn challenge() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(
            header::WWW_AUTHENTICATE,
            format!("Basic realm=\"{}\"", REALM),
        )],
        "Authentication required\n",
    )
        .into_response()
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        match self {
            RequestError::AuthenticationRequired => challenge(),
            RequestError::AccessDenied => {
                (StatusCode::FORBIDDEN, "Access denied\n").into_response()
            }
            RequestError::BackendExhausted | RequestError::NodeUnreachable { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Search backend unavailable\n",
            )
                .into_response(),
            RequestError::BodyTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large\n").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_carries_www_authenticate() {
        let response = challenge();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let value = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(value.starts_with("Basic realm="));
    }

    #[test]
    fn error_status_mapping() {
        assert_eq!(
            RequestError::AccessDenied.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            RequestError::AuthenticationRequired.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RequestError::BackendExhausted.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            RequestError::NodeUnreachable {
                node: "127.0.0.1:9200".into(),
                reason: "connection refused".into(),
            }
            .into_response()
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            RequestError::BodyTooLarge { limit: 1 }.into_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
