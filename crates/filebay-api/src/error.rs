//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Domain errors
//! (`StoreError`, `ValidationError`) convert into `HttpAppError` so every
//! failure renders the same `{success: false, message}` body with the status
//! code of its taxonomy member, without leaking filesystem paths.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use filebay_core::{AppError, ErrorMetadata, LogLevel, ValidationError};
use filebay_storage::StoreError;
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from filebay-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<StoreError> for HttpAppError {
    fn from(err: StoreError) -> Self {
        let app = match err {
            StoreError::MissingName => AppError::MissingName,
            StoreError::InvalidName(msg) => AppError::InvalidName(msg),
            StoreError::NotFound(name) => AppError::NotFound(name),
            StoreError::Rejected(v) => v.into(),
            // Body-limit middleware surfaces as a mid-stream read error;
            // report it as the size rejection it really is.
            StoreError::BodyLimit => {
                AppError::PayloadTooLarge("File exceeds maximum allowed size".to_string())
            }
            StoreError::UploadFailed(msg) => AppError::Io(msg),
            StoreError::Io(e) => AppError::Io(e.to_string()),
            StoreError::Config(msg) => AppError::Io(msg),
        };
        HttpAppError(app)
    }
}

/// Convert JSON body deserialization failures into a 400 with our ErrorResponse
/// format. A missing or malformed body means no usable file name was supplied.
impl From<JsonRejection> for HttpAppError {
    fn from(_rejection: JsonRejection) -> Self {
        HttpAppError(AppError::MissingName)
    }
}

/// JSON body extractor that returns our ErrorResponse format (400 + JSON) on
/// deserialization failure, instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, code = code, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, code = code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, code = code, "Request failed");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = Json(ErrorResponse::new(app_error.client_message()));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_missing_name_maps_to_400() {
        let HttpAppError(app) = StoreError::MissingName.into();
        assert!(matches!(app, AppError::MissingName));
        assert_eq!(app.http_status_code(), 400);
    }

    #[test]
    fn store_error_not_found_maps_to_404() {
        let HttpAppError(app) = StoreError::NotFound("x.png".to_string()).into();
        assert!(matches!(app, AppError::NotFound(_)));
        assert_eq!(app.http_status_code(), 404);
        assert_eq!(app.client_message(), "File not found");
    }

    #[test]
    fn store_error_rejection_maps_to_taxonomy() {
        let err = StoreError::Rejected(ValidationError::TooLarge { size: 2, max: 1 });
        let HttpAppError(app) = err.into();
        assert_eq!(app.error_code(), "too_large");
        assert_eq!(app.http_status_code(), 400);
    }

    #[test]
    fn body_limit_reports_too_large() {
        let HttpAppError(app) = StoreError::BodyLimit.into();
        assert_eq!(app.error_code(), "too_large");
        assert_eq!(app.http_status_code(), 400);
    }

    #[test]
    fn io_error_hides_detail_from_client() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "/secret/path denied");
        let HttpAppError(app) = StoreError::Io(io).into();
        assert_eq!(app.http_status_code(), 500);
        assert_eq!(app.client_message(), "Internal server error");
    }

    /// Public error contract: body is exactly `{success: false, message}`.
    #[test]
    fn error_response_shape() {
        let json = serde_json::to_value(ErrorResponse::new("File not found")).expect("serialize");
        assert_eq!(json["success"], serde_json::Value::Bool(false));
        assert_eq!(json["message"], "File not found");
        assert_eq!(json.as_object().map(|o| o.len()), Some(2));
    }
}
