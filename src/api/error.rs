use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::models::Envelope;

/// Every failure a route can answer with. The `Display` text is the envelope `msg`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid Type")]
    InvalidType,
    #[error("Missing ID parameter")]
    MissingId,
    #[error("Invalid Body")]
    InvalidBody,
    #[error("Component Not Found")]
    ComponentNotFound,
    #[error("Fetch Error")]
    FetchFailed,
    #[error("Not Found")]
    NotFound,
    #[error("Payload Too Large: limit is {0} bytes")]
    PayloadTooLarge(usize),
    #[error("Internal Error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidType | ApiError::MissingId | ApiError::InvalidBody => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ComponentNotFound | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::FetchFailed | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_envelope(&self) -> Envelope {
        Envelope::error(self.status_code(), self.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.to_envelope().into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        ApiError::Internal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::InvalidType.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingId.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::ComponentNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::FetchFailed.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::PayloadTooLarge(10).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_envelope_messages() {
        let envelope = ApiError::MissingId.to_envelope();
        assert_eq!(envelope.code, 400);
        assert_eq!(envelope.msg, "Missing ID parameter");
        assert!(envelope.data.is_null());

        let parse_failure = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let envelope = ApiError::from(parse_failure).to_envelope();
        assert_eq!(envelope.code, 500);
        assert!(envelope.msg.starts_with("Internal Error: "));
    }
}
