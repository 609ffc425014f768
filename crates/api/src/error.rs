//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use paysettle_core::ServiceError;
use paysettle_shared::AppError;
use serde_json::json;
use tracing::error;

/// Error returned by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Settlement failure.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Transport-level failure.
    #[error(transparent)]
    App(#[from] AppError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            Self::Service(e) => {
                let status = e.status();
                let code = StatusCode::from_u16(status.http_status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (code, e.error_code(), status_name(status))
            }
            Self::App(e) => {
                let code = StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let status = match e {
                    AppError::Unauthorized(_) => "unauthorized",
                    AppError::Config(_) => "system_error",
                };
                (code, e.error_code(), status)
            }
        }
    }
}

const fn status_name(status: paysettle_core::ResponseStatus) -> &'static str {
    use paysettle_core::ResponseStatus;
    match status {
        ResponseStatus::Ok => "ok",
        ResponseStatus::BadData => "bad_data",
        ResponseStatus::NotFound => "not_found",
        ResponseStatus::ExchangeFailure => "exchange_failure",
        ResponseStatus::Temporary => "temporary",
        ResponseStatus::SystemError => "system_error",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, error_code, status) = self.parts();

        let message = if code.is_server_error() {
            error!(error = %self, error_code, "Request failed");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        (
            code,
            Json(json!({
                "status": status,
                "error": error_code,
                "message": message
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paysettle_core::accounting::EntryError;

    #[test]
    fn test_service_errors_keep_their_code() {
        let err = ApiError::from(ServiceError::Entry(EntryError::UnknownEntry("x".into())));
        let (code, error_code, status) = err.parts();
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(error_code, "UNKNOWN_ENTRY");
        assert_eq!(status, "bad_data");

        let (code, _, status) = ApiError::from(ServiceError::OrderNotFound).parts();
        assert_eq!(code, StatusCode::NOT_FOUND);
        assert_eq!(status, "not_found");
    }

    #[test]
    fn test_app_errors() {
        let (code, error_code, _) =
            ApiError::from(AppError::Unauthorized("missing key".into())).parts();
        assert_eq!(code, StatusCode::UNAUTHORIZED);
        assert_eq!(error_code, "UNAUTHORIZED");

        let err = ApiError::from(AppError::from(config::ConfigError::NotFound("api".into())));
        let (code, error_code, status) = err.parts();
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_code, "CONFIG_ERROR");
        assert_eq!(status, "system_error");
    }
}
