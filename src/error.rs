// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{keyring::KeyringError, keyring::KeyringType, transaction::TransactionError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
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

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Errors that turn a keyring call into a reject outcome.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Unsupported keyring type: {0}")]
    UnsupportedKeyring(String),

    #[error("Method `{method}` is not supported by the {keyring} keyring")]
    UnsupportedMethod {
        keyring: KeyringType,
        method: String,
    },

    #[error("Invalid arguments for `{method}`: {reason}")]
    InvalidArguments {
        method: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Keyring(#[from] KeyringError),

    #[error("Failed to encode response: {0}")]
    ResponseEncoding(#[from] serde_json::Error),
}

/// Text carried by a reject outcome.
///
/// Prefers the error's own message, then its cause, then its debug form.
pub fn reject_reason(error: &(dyn std::error::Error + 'static)) -> String {
    let message = error.to_string();
    if !message.trim().is_empty() {
        return message;
    }

    if let Some(cause) = error.source() {
        let cause = cause.to_string();
        if !cause.trim().is_empty() {
            return cause;
        }
    }

    format!("{error:?}")
}
