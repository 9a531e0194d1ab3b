// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Serialized keyring state and HD path derivation.

use std::collections::BTreeMap;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Ledger Live root path. Accounts vary the account level, not the index.
pub const LEDGER_LIVE_HD_PATH: &str = "m/44'/60'/0'/0/0";
/// BIP-44 root path. Accounts vary the address index.
pub const BIP44_HD_PATH: &str = "m/44'/60'/0'/0";
/// Legacy MEW-style root path.
pub const LEGACY_HD_PATH: &str = "m/44'/60'/0'";

/// Derivation path of the account at `index` under `hd_path`.
pub fn account_path(hd_path: &str, index: usize) -> String {
    if hd_path == LEDGER_LIVE_HD_PATH {
        format!("m/44'/60'/{index}'/0/0")
    } else {
        format!("{}/{index}", hd_path.trim_end_matches('/'))
    }
}

/// Where a tracked account lives on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    pub hd_path: String,
    pub index: usize,
}

/// Keyring state exchanged with the background context on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyringState {
    pub hd_path: String,
    #[serde(default)]
    pub accounts: Vec<Address>,
    #[serde(default)]
    pub account_details: BTreeMap<Address, AccountDetails>,
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub unlocked_account: usize,
}

impl KeyringState {
    /// Empty state rooted at `hd_path`.
    pub fn new(hd_path: impl Into<String>) -> Self {
        Self {
            hd_path: hd_path.into(),
            accounts: Vec::new(),
            account_details: BTreeMap::new(),
            page: 0,
            unlocked_account: 0,
        }
    }

    /// Parse a serialized state, filling a missing `hdPath` with `default_hd_path`.
    pub fn from_value(
        value: serde_json::Value,
        default_hd_path: &str,
    ) -> Result<Self, serde_json::Error> {
        let mut value = value;
        if let serde_json::Value::Object(map) = &mut value {
            map.entry("hdPath")
                .or_insert_with(|| serde_json::Value::String(default_hd_path.to_string()));
        }
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.accounts.contains(address)
    }

    /// Derivation path recorded for `address`.
    pub fn path_of(&self, address: &Address) -> Option<&str> {
        self.account_details
            .get(address)
            .map(|details| details.hd_path.as_str())
    }
}
