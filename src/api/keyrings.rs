// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{keyring::KeyringType, relay::dispatch::methods_for};

/// A supported keyring type and the methods it accepts.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyringInfo {
    #[serde(rename = "type")]
    pub keyring_type: String,
    pub name: String,
    pub default_hd_path: String,
    pub methods: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/v1/keyrings",
    tag = "Keyring",
    responses((status = 200, body = Vec<KeyringInfo>))
)]
pub async fn list_keyrings() -> Json<Vec<KeyringInfo>> {
    let keyrings = KeyringType::ALL
        .into_iter()
        .map(|kind| {
            let descriptor = kind.descriptor();
            KeyringInfo {
                keyring_type: kind.tag().to_string(),
                name: descriptor.display_name.to_string(),
                default_hd_path: descriptor.default_hd_path.to_string(),
                methods: methods_for(kind)
                    .iter()
                    .map(|m| m.name().to_string())
                    .collect(),
            }
        })
        .collect();
    Json(keyrings)
}
