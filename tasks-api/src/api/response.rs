//! Response envelopes
//!
//! Success: `{"success":true,"result":...}`, plus `result_info` for lists.
//! Failure: `{"success":false,"errors":[{"code":<status>,"message":...}]}`.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tasks_cache::{CacheSource, OperationFailure, Outcome};

use crate::tasks::TaskPage;

pub const CACHE_HEADER: &str = "x-cache";

#[derive(Debug, Serialize)]
pub struct SuccessBody<T> {
    pub success: bool,
    pub result: T,
}

#[derive(Debug, Serialize)]
pub struct ListBody {
    pub success: bool,
    #[serde(flatten)]
    pub page: TaskPage,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub errors: Vec<ErrorDetail>,
}

/// Error response in the failure envelope
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }
}

impl From<OperationFailure> for ApiError {
    fn from(failure: OperationFailure) -> Self {
        let status = StatusCode::from_u16(failure.kind.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, failure.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            errors: vec![ErrorDetail {
                code: self.status.as_u16(),
                message: self.message,
            }],
        };
        (self.status, Json(body)).into_response()
    }
}

/// Render a single-record outcome with `status` on success
pub fn record_response<T: Serialize>(outcome: Outcome<T>, status: StatusCode) -> Response {
    match outcome {
        Outcome::Success(result) => (
            status,
            Json(SuccessBody {
                success: true,
                result,
            }),
        )
            .into_response(),
        Outcome::Failure(failure) => ApiError::from(failure).into_response(),
    }
}

pub fn page_response(outcome: Outcome<TaskPage>) -> Response {
    match outcome {
        Outcome::Success(page) => Json(ListBody {
            success: true,
            page,
        })
        .into_response(),
        Outcome::Failure(failure) => ApiError::from(failure).into_response(),
    }
}

/// Tag a response with where its payload came from
pub fn with_cache_source(mut response: Response, source: CacheSource) -> Response {
    response
        .headers_mut()
        .insert(CACHE_HEADER, HeaderValue::from_static(source.as_str()));
    response
}
