// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::ApiError, relay::CallRequest, state::AppState};

/// Acknowledgement for a queued keyring call.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallAccepted {
    pub promise_id: String,
    /// Id used to correlate relay logs for this submission.
    pub request_id: Uuid,
}

/// Queue a keyring call for the relay worker.
///
/// The outcome is not part of the response; it is delivered to the
/// background context through `closeBackgroundPromise`.
#[utoipa::path(
    post,
    path = "/v1/keyring/call",
    request_body = CallRequest,
    tag = "Keyring",
    responses(
        (status = 202, description = "Call queued", body = CallAccepted),
        (status = 400, description = "Missing promise id"),
        (status = 503, description = "Relay worker is not running")
    )
)]
pub async fn submit_call(
    State(state): State<AppState>,
    Json(request): Json<CallRequest>,
) -> Result<(StatusCode, Json<CallAccepted>), ApiError> {
    if request.promise_id.trim().is_empty() {
        return Err(ApiError::bad_request("promiseId must not be empty"));
    }

    let request_id = Uuid::new_v4();
    let promise_id = request.promise_id.clone();
    tracing::debug!(
        %request_id,
        promise_id = %promise_id,
        keyring = %request.keyring_type,
        method = %request.method,
        "Queueing keyring call"
    );

    state
        .calls
        .send(request)
        .await
        .map_err(|_| ApiError::service_unavailable("Keyring relay is not running"))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CallAccepted {
            promise_id,
            request_id,
        }),
    ))
}
