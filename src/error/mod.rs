use actix_web::{HttpResponse, error::ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Network failure or non-2xx HTTP status from the upstream.
    Transport(String),
    /// Upstream login rejected or returned no identity.
    Authentication(String),
    /// Upstream responded 2xx but the JSON payload carries an `error` field.
    Rpc(String),
    NotFound(String),
    Configuration(String),
    Internal(String),
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    detail: String,
}

impl AppError {
    /// Bare message without the kind prefix, used as the HTTP `detail` body.
    fn detail(&self) -> &str {
        match self {
            AppError::Transport(e)
            | AppError::Authentication(e)
            | AppError::Rpc(e)
            | AppError::NotFound(e)
            | AppError::Configuration(e)
            | AppError::Internal(e) => e,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Transport(e) => write!(f, "Transport error: {}", e),
            AppError::Authentication(e) => write!(f, "Authentication error: {}", e),
            AppError::Rpc(e) => write!(f, "RPC error: {}", e),
            AppError::NotFound(e) => write!(f, "{}", e),
            AppError::Configuration(e) => write!(f, "Configuration error: {}", e),
            AppError::Internal(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Transport(_)
            | AppError::Authentication(_)
            | AppError::Rpc(_)
            | AppError::Configuration(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            detail: self.detail().to_string(),
        })
    }
}

// Define AppResult type alias for Result<T, AppError>
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn not_found_maps_to_404_with_detail_body() {
        let err = AppError::NotFound("Contact with ID 42 not found".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let response = err.error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["detail"], "Contact with ID 42 not found");
    }

    #[actix_web::test]
    async fn upstream_failures_all_map_to_500() {
        for err in [
            AppError::Transport("connection refused".to_string()),
            AppError::Authentication("bad credentials".to_string()),
            AppError::Rpc("access denied".to_string()),
            AppError::Internal("Failed to get contacts: boom".to_string()),
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn display_includes_cause_text() {
        let err = AppError::Transport("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
