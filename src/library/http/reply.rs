use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::fmt::Display;
use thiserror::Error;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::reject::{MethodNotAllowed, Rejection};
use warp::reply::{self, Reply, Response};

/// Failure of an HTTP operation which is reported to the caller
///
/// Only the message is exposed in the `{"error": "<message>"}` body, internal details are logged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request is malformed or references invalid entities
    #[error("{0}")]
    BadRequest(&'static str),
    /// The requested entity does not exist
    #[error("not found")]
    NotFound,
    /// The request conflicts with the current state
    #[error("{0}")]
    Conflict(&'static str),
    /// A dependency required to fulfill the request is unavailable
    #[error("{0}")]
    Unavailable(&'static str),
    /// The request failed for reasons outside of the caller's control
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Logs an unexpected error and hides it behind a generic message
    pub fn internal(message: &'static str, error: impl Display) -> Self {
        error!(%error, "{}", message);
        ApiError::Internal(message)
    }

    /// Status code reported to the caller
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Reply for ApiError {
    fn into_response(self) -> Response {
        error_response(self.status(), &self.to_string())
    }
}

/// Serializes a value into a JSON response with the given status
pub fn json_response<T: Serialize>(value: &T, status: StatusCode) -> Response {
    reply::with_status(reply::json(value), status).into_response()
}

/// Converts the outcome of an operation into a response, successful results are sent with `status`
pub fn respond<T: Serialize>(
    result: Result<T, ApiError>,
    status: StatusCode,
) -> Result<Response, Infallible> {
    Ok(match result {
        Ok(value) => json_response(&value, status),
        Err(error) => error.into_response(),
    })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    json_response(&json!({ "error": message }), status)
}

/// Converts unmatched requests into JSON error responses
pub async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let response = if rejection.is_not_found() {
        ApiError::NotFound.into_response()
    } else if rejection.find::<MethodNotAllowed>().is_some() {
        error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
    } else {
        warn!(?rejection, "Unhandled rejection");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    };

    Ok(response)
}
