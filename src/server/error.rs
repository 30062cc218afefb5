//! HTTP mapping of delivery errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::warn;

use crate::delivery::DeliveryError;

/// Error returned by route handlers.
#[derive(Debug)]
pub struct ApiError(DeliveryError);

impl ApiError {
    /// HTTP status for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.0 {
            DeliveryError::UnknownClient { .. } => StatusCode::NOT_FOUND,
            DeliveryError::MalformedRequest { .. } | DeliveryError::MisalignedPayload { .. } => {
                StatusCode::BAD_REQUEST
            }
            DeliveryError::NoWork | DeliveryError::BlockLimitTooSmall { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DeliveryError> for ApiError {
    fn from(err: DeliveryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), error = %self.0, "request rejected");
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
