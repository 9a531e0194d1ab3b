// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed dispatch of keyring calls.
//!
//! A call is accepted only when its `(type, method)` pair appears in the
//! table below. Accepted calls are converted into a [`KeyringCall`] whose
//! variants carry already-parsed arguments.

use alloy::primitives::{Address, Bytes};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::RelayError,
    keyring::{HardwareKeyring, KeyringType, PAGE_SIZE},
    transaction::{encode_signed, UnsignedTransaction},
};

/// Most accounts a single `addAccounts` call may derive.
pub const MAX_ADD_ACCOUNTS: usize = PAGE_SIZE * 20;

/// Keyring methods reachable through the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyringMethod {
    Serialize,
    Deserialize,
    IsUnlocked,
    Unlock,
    SetAccountToUnlock,
    AddAccounts,
    GetFirstPage,
    GetNextPage,
    GetPreviousPage,
    GetAccounts,
    RemoveAccount,
    SetHdPath,
    ForgetDevice,
    SignTransaction,
    SignPersonalMessage,
}

const HD_KEYRING_METHODS: &[KeyringMethod] = &[
    KeyringMethod::Serialize,
    KeyringMethod::Deserialize,
    KeyringMethod::IsUnlocked,
    KeyringMethod::Unlock,
    KeyringMethod::SetAccountToUnlock,
    KeyringMethod::AddAccounts,
    KeyringMethod::GetFirstPage,
    KeyringMethod::GetNextPage,
    KeyringMethod::GetPreviousPage,
    KeyringMethod::GetAccounts,
    KeyringMethod::RemoveAccount,
    KeyringMethod::SetHdPath,
    KeyringMethod::ForgetDevice,
    KeyringMethod::SignTransaction,
    KeyringMethod::SignPersonalMessage,
];

// Lattice devices pin their derivation path.
const LATTICE_METHODS: &[KeyringMethod] = &[
    KeyringMethod::Serialize,
    KeyringMethod::Deserialize,
    KeyringMethod::IsUnlocked,
    KeyringMethod::Unlock,
    KeyringMethod::SetAccountToUnlock,
    KeyringMethod::AddAccounts,
    KeyringMethod::GetFirstPage,
    KeyringMethod::GetNextPage,
    KeyringMethod::GetPreviousPage,
    KeyringMethod::GetAccounts,
    KeyringMethod::RemoveAccount,
    KeyringMethod::ForgetDevice,
    KeyringMethod::SignTransaction,
    KeyringMethod::SignPersonalMessage,
];

impl KeyringMethod {
    /// Wire name used in call requests.
    pub fn name(&self) -> &'static str {
        match self {
            KeyringMethod::Serialize => "serialize",
            KeyringMethod::Deserialize => "deserialize",
            KeyringMethod::IsUnlocked => "isUnlocked",
            KeyringMethod::Unlock => "unlock",
            KeyringMethod::SetAccountToUnlock => "setAccountToUnlock",
            KeyringMethod::AddAccounts => "addAccounts",
            KeyringMethod::GetFirstPage => "getFirstPage",
            KeyringMethod::GetNextPage => "getNextPage",
            KeyringMethod::GetPreviousPage => "getPreviousPage",
            KeyringMethod::GetAccounts => "getAccounts",
            KeyringMethod::RemoveAccount => "removeAccount",
            KeyringMethod::SetHdPath => "setHdPath",
            KeyringMethod::ForgetDevice => "forgetDevice",
            KeyringMethod::SignTransaction => "signTransaction",
            KeyringMethod::SignPersonalMessage => "signPersonalMessage",
        }
    }
}

/// Methods a keyring type accepts.
pub fn methods_for(keyring: KeyringType) -> &'static [KeyringMethod] {
    match keyring {
        KeyringType::Ledger | KeyringType::Trezor => HD_KEYRING_METHODS,
        KeyringType::Lattice => LATTICE_METHODS,
    }
}

/// Look up a `(type, method)` pair in the dispatch table.
pub fn resolve(keyring_type: &str, method: &str) -> Result<(KeyringType, KeyringMethod), RelayError> {
    let keyring: KeyringType = keyring_type
        .parse()
        .map_err(|_| RelayError::UnsupportedKeyring(keyring_type.to_string()))?;

    methods_for(keyring)
        .iter()
        .find(|m| m.name() == method)
        .map(|m| (keyring, *m))
        .ok_or_else(|| RelayError::UnsupportedMethod {
            keyring,
            method: method.to_string(),
        })
}

/// A keyring call with parsed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyringCall {
    Serialize,
    Deserialize { state: Value },
    IsUnlocked,
    Unlock { hd_path: Option<String> },
    SetAccountToUnlock { index: usize },
    AddAccounts { count: usize },
    GetFirstPage,
    GetNextPage,
    GetPreviousPage,
    GetAccounts,
    RemoveAccount { address: Address },
    SetHdPath { hd_path: String },
    ForgetDevice,
    SignTransaction {
        address: Address,
        transaction: UnsignedTransaction,
    },
    SignPersonalMessage { address: Address, message: Bytes },
}

impl KeyringCall {
    /// Convert positional wire arguments into a typed call.
    pub fn parse(method: KeyringMethod, args: &[Value]) -> Result<Self, RelayError> {
        let name = method.name();
        let call = match method {
            KeyringMethod::Serialize => KeyringCall::Serialize,
            KeyringMethod::Deserialize => KeyringCall::Deserialize {
                state: required(name, args, 0)?,
            },
            KeyringMethod::IsUnlocked => KeyringCall::IsUnlocked,
            KeyringMethod::Unlock => KeyringCall::Unlock {
                hd_path: optional(name, args, 0)?,
            },
            KeyringMethod::SetAccountToUnlock => KeyringCall::SetAccountToUnlock {
                index: required(name, args, 0)?,
            },
            KeyringMethod::AddAccounts => {
                let count = optional(name, args, 0)?.unwrap_or(1);
                if count > MAX_ADD_ACCOUNTS {
                    return Err(RelayError::InvalidArguments {
                        method: name,
                        reason: format!("cannot add more than {MAX_ADD_ACCOUNTS} accounts at once"),
                    });
                }
                KeyringCall::AddAccounts { count }
            }
            KeyringMethod::GetFirstPage => KeyringCall::GetFirstPage,
            KeyringMethod::GetNextPage => KeyringCall::GetNextPage,
            KeyringMethod::GetPreviousPage => KeyringCall::GetPreviousPage,
            KeyringMethod::GetAccounts => KeyringCall::GetAccounts,
            KeyringMethod::RemoveAccount => KeyringCall::RemoveAccount {
                address: required(name, args, 0)?,
            },
            KeyringMethod::SetHdPath => KeyringCall::SetHdPath {
                hd_path: required(name, args, 0)?,
            },
            KeyringMethod::ForgetDevice => KeyringCall::ForgetDevice,
            KeyringMethod::SignTransaction => {
                let raw: String = required(name, args, 1)?;
                KeyringCall::SignTransaction {
                    address: required(name, args, 0)?,
                    transaction: UnsignedTransaction::from_hex(&raw)?,
                }
            }
            KeyringMethod::SignPersonalMessage => {
                let raw: String = required(name, args, 1)?;
                let message = alloy::hex::decode(raw.trim()).map_err(|e| {
                    RelayError::InvalidArguments {
                        method: name,
                        reason: format!("message is not hex: {e}"),
                    }
                })?;
                KeyringCall::SignPersonalMessage {
                    address: required(name, args, 0)?,
                    message: Bytes::from(message),
                }
            }
        };
        Ok(call)
    }

    /// Run the call, returning its wire response.
    pub async fn invoke(self, keyring: &mut HardwareKeyring) -> Result<Value, RelayError> {
        let response = match self {
            KeyringCall::Serialize => keyring.serialize()?,
            KeyringCall::Deserialize { state } => {
                keyring.deserialize(state)?;
                Value::Null
            }
            KeyringCall::IsUnlocked => Value::Bool(keyring.is_unlocked().await),
            KeyringCall::Unlock { hd_path } => to_value(keyring.unlock(hd_path).await?)?,
            KeyringCall::SetAccountToUnlock { index } => {
                keyring.set_account_to_unlock(index);
                Value::Null
            }
            KeyringCall::AddAccounts { count } => to_value(keyring.add_accounts(count).await?)?,
            KeyringCall::GetFirstPage => to_value(keyring.get_first_page().await?)?,
            KeyringCall::GetNextPage => to_value(keyring.get_next_page().await?)?,
            KeyringCall::GetPreviousPage => to_value(keyring.get_previous_page().await?)?,
            KeyringCall::GetAccounts => to_value(keyring.get_accounts())?,
            KeyringCall::RemoveAccount { address } => {
                keyring.remove_account(address)?;
                Value::Null
            }
            KeyringCall::SetHdPath { hd_path } => {
                keyring.set_hd_path(hd_path);
                Value::Null
            }
            KeyringCall::ForgetDevice => {
                keyring.forget_device().await;
                Value::Null
            }
            KeyringCall::SignTransaction {
                address,
                transaction,
            } => {
                let signed = keyring.sign_transaction(address, transaction).await?;
                Value::String(encode_signed(&signed))
            }
            KeyringCall::SignPersonalMessage { address, message } => {
                let signature = keyring.sign_personal_message(address, &message).await?;
                Value::String(format!("0x{}", alloy::hex::encode(signature.as_bytes())))
            }
        };
        Ok(response)
    }
}

fn required<T: DeserializeOwned>(
    method: &'static str,
    args: &[Value],
    position: usize,
) -> Result<T, RelayError> {
    optional(method, args, position)?.ok_or_else(|| RelayError::InvalidArguments {
        method,
        reason: format!("missing argument {position}"),
    })
}

fn optional<T: DeserializeOwned>(
    method: &'static str,
    args: &[Value],
    position: usize,
) -> Result<Option<T>, RelayError> {
    match args.get(position) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| RelayError::InvalidArguments {
                method,
                reason: format!("argument {position}: {e}"),
            }),
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, RelayError> {
    Ok(serde_json::to_value(value)?)
}
