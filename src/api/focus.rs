// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct FocusStatus {
    pub focused: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FocusUpdate {
    pub focused: bool,
}

#[utoipa::path(
    get,
    path = "/v1/focus",
    tag = "Focus",
    responses((status = 200, body = FocusStatus))
)]
pub async fn get_focus(State(state): State<AppState>) -> Json<FocusStatus> {
    Json(FocusStatus {
        focused: state.focus.is_focused(),
    })
}

/// Report whether the hosting document holds input focus.
///
/// Only a focused instance answers keyring calls; the latest report wins.
#[utoipa::path(
    put,
    path = "/v1/focus",
    request_body = FocusUpdate,
    tag = "Focus",
    responses((status = 200, body = FocusStatus))
)]
pub async fn set_focus(
    State(state): State<AppState>,
    Json(update): Json<FocusUpdate>,
) -> Json<FocusStatus> {
    state.focus.set_focused(update.focused);
    Json(FocusStatus {
        focused: update.focused,
    })
}
