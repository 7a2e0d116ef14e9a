//! Response construction and error mapping.
//!
//! # Responsibilities
//! - Write backend replies as `text/plain; charset=utf-8` with 200
//! - Map bridge and decode errors to HTTP status codes
//!
//! # Design Decisions
//! - Decode failures → 400 Bad Request
//! - Session not open, or queue wait exceeded → 503 Service Unavailable
//! - Transport failure → 502 Bad Gateway
//! - Reply timeout → 504 Gateway Timeout

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::bridge::BridgeError;
use crate::http::decode::DecodeError;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Successful reply carrying the backend message verbatim.
pub fn reply_response(reply: String) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_PLAIN)], reply).into_response()
}

/// Status code for a bridge error.
pub fn status_for(err: &BridgeError) -> StatusCode {
    match err {
        BridgeError::Unavailable(_) | BridgeError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
        BridgeError::Transport(_) => StatusCode::BAD_GATEWAY,
        BridgeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let body = self.to_string();
        match self {
            BridgeError::Busy(_) => (status, [(header::RETRY_AFTER, "1")], body).into_response(),
            _ => (status, body).into_response(),
        }
    }
}

impl IntoResponse for DecodeError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}
