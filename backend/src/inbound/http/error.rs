//! HTTP mapping for failures that never reach a handler envelope.
//!
//! Handlers report domain failures inside a [`ResultEnvelope`]. The errors
//! here are the transport's own: a caller without the permission, a request
//! nobody can route, a request the caller abandoned, or a body that does not
//! parse.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::dispatcher::DispatchError;
use crate::domain::error::ErrorCode;
use crate::domain::ports::PermissionDenied;
use crate::domain::ResultEnvelope;

/// Title of permission rejections.
pub const FORBIDDEN_TITLE: &str = "Forbidden";

/// Result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, HttpError>;

/// Transport-level failure.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error(transparent)]
    Forbidden(#[from] PermissionDenied),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("{message}")]
    InvalidRequest { message: String },
}

impl HttpError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }
}

impl ResponseError for HttpError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Dispatch(DispatchError::Cancelled(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Dispatch(DispatchError::Unregistered { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            Self::Forbidden(denied) => {
                warn!(code = %denied.code, "request rejected by permission gate");
                let envelope = ResultEnvelope::<()>::error(
                    FORBIDDEN_TITLE,
                    format!("The caller lacks the {} permission.", denied.code),
                )
                .with_error_data(json!({
                    "code": ErrorCode::Forbidden.as_str(),
                    "permission": denied.code.as_str(),
                }));
                HttpResponse::build(status).json(envelope)
            }
            Self::Dispatch(DispatchError::Cancelled(_)) => HttpResponse::build(status).finish(),
            Self::Dispatch(err @ DispatchError::Unregistered { .. }) => {
                error!(error = %err, "request reached the dispatcher without a handler");
                let envelope = ResultEnvelope::<()>::failure("The request could not be routed.")
                    .with_error_data(json!({ "code": ErrorCode::Internal.as_str() }));
                HttpResponse::build(status).json(envelope)
            }
            Self::InvalidRequest { message } => {
                let envelope = ResultEnvelope::<()>::failure(message.clone())
                    .with_error_data(json!({ "code": ErrorCode::InvalidRequest.as_str() }));
                HttpResponse::build(status).json(envelope)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Status and body mapping.
    use actix_web::body::MessageBody;
    use rstest::rstest;
    use serde_json::Value;

    use super::*;
    use crate::domain::context::Cancelled;
    use crate::domain::entity::{EntityOperation, Table};
    use crate::domain::ports::PermissionCode;

    fn body_json(response: HttpResponse) -> Value {
        let bytes = response.into_body().try_into_bytes().expect("buffered body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[rstest]
    fn forbidden_is_a_titled_envelope() {
        let code = PermissionCode::for_entity(Table::Payments, EntityOperation::Delete);
        let response = HttpError::from(PermissionDenied { code }).error_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response);
        assert_eq!(body["title"], FORBIDDEN_TITLE);
        assert_eq!(body["operationStatus"], false);
        assert_eq!(body["errorData"]["permission"], "payment.delete");
    }

    #[rstest]
    fn cancellation_is_unavailable_without_body() {
        let response =
            HttpError::from(DispatchError::Cancelled(Cancelled)).error_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let bytes = response.into_body().try_into_bytes().expect("buffered body");
        assert!(bytes.is_empty());
    }

    #[rstest]
    fn unregistered_requests_are_internal_errors() {
        let response = HttpError::from(DispatchError::Unregistered {
            request_type: "Unknown",
        })
        .error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response)["errorData"]["code"], "internal");
    }

    #[rstest]
    fn malformed_bodies_are_bad_requests() {
        let response = HttpError::invalid_request("expected a JSON object").error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response)["message"], "expected a JSON object");
    }
}
