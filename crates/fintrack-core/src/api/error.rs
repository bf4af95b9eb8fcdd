use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized - session expired or invalid credentials")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    Validation(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Human message from a FastAPI error body.
    ///
    /// `{"detail": "..."}` yields the string; a validation list yields the first
    /// entry's `msg` prefixed with the offending field. Anything else falls back
    /// to the (truncated) raw body.
    pub fn detail_message(body: &str) -> String {
        let detail = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("detail").cloned());

        match detail {
            Some(Value::String(s)) => s,
            Some(Value::Array(items)) => items
                .first()
                .and_then(|item| {
                    let msg = item.get("msg")?.as_str()?;
                    let field = item
                        .get("loc")
                        .and_then(Value::as_array)
                        .and_then(|loc| loc.last())
                        .and_then(Value::as_str);
                    Some(match field {
                        Some(f) => format!("{}: {}", f, msg),
                        None => msg.to_string(),
                    })
                })
                .unwrap_or_else(|| Self::truncate_body(body)),
            _ => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = Self::detail_message(body);
        match status.as_u16() {
            400 => ApiError::BadRequest(detail),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(detail),
            404 => ApiError::NotFound(detail),
            422 => ApiError::Validation(detail),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(detail),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, detail)),
        }
    }

    /// True when the error chain carries a 401 from the backend
    pub fn is_unauthorized(err: &anyhow::Error) -> bool {
        err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<ApiError>(),
                Some(ApiError::Unauthorized)
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_detail_string() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"detail":"Email already registered"}"#,
        );
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[test]
    fn test_detail_validation_list() {
        let body = r#"{"detail":[{"loc":["body","amount"],"msg":"Input should be greater than 0","type":"greater_than"}]}"#;
        let err = ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, body);
        match err {
            ApiError::Validation(msg) => assert_eq!(msg, "amount: Input should be greater than 0"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, r#"{"detail":"Budget not found"}"#),
            ApiError::NotFound(ref m) if m == "Budget not found"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream down"),
            ApiError::ServerError(ref m) if m == "upstream down"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_long_body_truncated() {
        let body = "é".repeat(400);
        let msg = ApiError::detail_message(&body);
        assert!(msg.contains("truncated, 800 total bytes"));
        assert!(msg.len() < body.len());
    }

    #[test]
    fn test_is_unauthorized_through_context() {
        let err = anyhow::Error::from(ApiError::Unauthorized).context("Failed to load categories");
        assert!(ApiError::is_unauthorized(&err));

        let other = anyhow::Error::from(ApiError::RateLimited);
        assert!(!ApiError::is_unauthorized(&other));
    }
}
