// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hardware keyrings.
//!
//! A keyring tracks which device accounts the wallet uses and signs on their
//! behalf. Its whole state is a [`KeyringState`] that the background context
//! owns and hands back on every call; the keyring itself keeps nothing
//! between calls apart from its device handle.

pub mod device;
pub mod state;

use std::{fmt, ops::Range, str::FromStr, sync::Arc};

use alloy::{
    consensus::TxEnvelope,
    primitives::{eip191_hash_message, Address, Signature, B256},
};
use serde::{Deserialize, Serialize};

pub use device::{DeviceError, DeviceRegistry, EmulatedDevice, HardwareDevice, UnavailableDevice};
pub use state::{account_path, AccountDetails, KeyringState, BIP44_HD_PATH, LEDGER_LIVE_HD_PATH};

use crate::transaction::UnsignedTransaction;

/// Accounts listed per page when browsing a device.
pub const PAGE_SIZE: usize = 5;

/// First hardened BIP-32 child index. Account indices stay below it.
pub const HARDENED_OFFSET: usize = 1 << 31;

/// Supported hardware keyring integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyringType {
    Ledger,
    Trezor,
    Lattice,
}

impl KeyringType {
    pub const ALL: [KeyringType; 3] = [KeyringType::Ledger, KeyringType::Trezor, KeyringType::Lattice];

    /// Wire tag used in call requests.
    pub fn tag(&self) -> &'static str {
        match self {
            KeyringType::Ledger => "ledger",
            KeyringType::Trezor => "trezor",
            KeyringType::Lattice => "lattice",
        }
    }

    pub fn descriptor(&self) -> KeyringDescriptor {
        match self {
            KeyringType::Ledger => KeyringDescriptor {
                keyring_type: *self,
                display_name: "Ledger Hardware",
                default_hd_path: LEDGER_LIVE_HD_PATH,
            },
            KeyringType::Trezor => KeyringDescriptor {
                keyring_type: *self,
                display_name: "Trezor Hardware",
                default_hd_path: BIP44_HD_PATH,
            },
            KeyringType::Lattice => KeyringDescriptor {
                keyring_type: *self,
                display_name: "Lattice Hardware",
                default_hd_path: BIP44_HD_PATH,
            },
        }
    }
}

impl fmt::Display for KeyringType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for KeyringType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        KeyringType::ALL
            .into_iter()
            .find(|kind| kind.tag() == raw || kind.descriptor().display_name == raw)
            .ok_or_else(|| format!("Unsupported keyring type: {raw}"))
    }
}

/// Static facts about a keyring type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyringDescriptor {
    pub keyring_type: KeyringType,
    pub display_name: &'static str,
    pub default_hd_path: &'static str,
}

/// One row of a device account page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub address: Address,
    pub balance: Option<String>,
    pub index: usize,
}

/// Errors raised by keyring operations.
#[derive(Debug, thiserror::Error)]
pub enum KeyringError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("Invalid keyring state: {0}")]
    InvalidState(#[source] serde_json::Error),

    #[error("Failed to encode keyring state: {0}")]
    StateEncoding(#[source] serde_json::Error),

    #[error("Account index {0} exceeds the derivation limit")]
    IndexOutOfRange(usize),

    #[error("Address {0} not found in this keyring")]
    UnknownAddress(Address),

    #[error("The signature for {0} is not valid")]
    SignatureMismatch(Address),
}

/// A hardware keyring bound to its device.
pub struct HardwareKeyring {
    descriptor: KeyringDescriptor,
    state: KeyringState,
    device: Arc<dyn HardwareDevice>,
}

impl HardwareKeyring {
    pub fn new(keyring_type: KeyringType, device: Arc<dyn HardwareDevice>) -> Self {
        let descriptor = keyring_type.descriptor();
        Self {
            state: KeyringState::new(descriptor.default_hd_path),
            descriptor,
            device,
        }
    }

    pub fn descriptor(&self) -> &KeyringDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> &KeyringState {
        &self.state
    }

    pub fn serialize(&self) -> Result<serde_json::Value, KeyringError> {
        self.state.to_value().map_err(KeyringError::StateEncoding)
    }

    /// Replace the in-memory state with a serialized one.
    pub fn deserialize(&mut self, value: serde_json::Value) -> Result<(), KeyringError> {
        self.state = KeyringState::from_value(value, self.descriptor.default_hd_path)
            .map_err(KeyringError::InvalidState)?;
        Ok(())
    }

    pub async fn is_unlocked(&self) -> bool {
        self.device.is_connected().await
    }

    /// Connect to the device and return the first account under `hd_path`.
    pub async fn unlock(&mut self, hd_path: Option<String>) -> Result<Address, KeyringError> {
        if let Some(path) = hd_path {
            self.set_hd_path(path);
        }
        let path = account_path(&self.state.hd_path, 0);
        Ok(self.device.address(&path).await?)
    }

    pub fn set_account_to_unlock(&mut self, index: usize) {
        self.state.unlocked_account = index;
    }

    /// Track `count` accounts starting at the unlock index.
    pub async fn add_accounts(&mut self, count: usize) -> Result<Vec<Address>, KeyringError> {
        for index in account_range(self.state.unlocked_account, count)? {
            let path = account_path(&self.state.hd_path, index);
            let address = self.device.address(&path).await?;
            if !self.state.contains(&address) {
                self.state.accounts.push(address);
                self.state.account_details.insert(
                    address,
                    AccountDetails {
                        hd_path: path,
                        index,
                    },
                );
            }
        }
        tracing::debug!(
            keyring = %self.descriptor.keyring_type,
            total = self.state.accounts.len(),
            "Accounts added"
        );
        Ok(self.state.accounts.clone())
    }

    pub async fn get_first_page(&mut self) -> Result<Vec<PageEntry>, KeyringError> {
        self.state.page = 0;
        self.page(1).await
    }

    pub async fn get_next_page(&mut self) -> Result<Vec<PageEntry>, KeyringError> {
        self.page(1).await
    }

    pub async fn get_previous_page(&mut self) -> Result<Vec<PageEntry>, KeyringError> {
        self.page(-1).await
    }

    async fn page(&mut self, step: isize) -> Result<Vec<PageEntry>, KeyringError> {
        let page = self.state.page.saturating_add_signed(step).max(1);
        let from = (page - 1).saturating_mul(PAGE_SIZE);

        let mut entries = Vec::with_capacity(PAGE_SIZE);
        for index in account_range(from, PAGE_SIZE)? {
            let address = self
                .device
                .address(&account_path(&self.state.hd_path, index))
                .await?;
            entries.push(PageEntry {
                address,
                balance: None,
                index,
            });
        }

        self.state.page = page;
        Ok(entries)
    }

    pub fn get_accounts(&self) -> Vec<Address> {
        self.state.accounts.clone()
    }

    pub fn remove_account(&mut self, address: Address) -> Result<(), KeyringError> {
        if !self.state.contains(&address) {
            return Err(KeyringError::UnknownAddress(address));
        }
        self.state.accounts.retain(|a| *a != address);
        self.state.account_details.remove(&address);
        Ok(())
    }

    pub fn set_hd_path(&mut self, hd_path: String) {
        if self.state.hd_path != hd_path {
            self.state.hd_path = hd_path;
            self.state.page = 0;
            self.state.unlocked_account = 0;
        }
    }

    pub async fn forget_device(&mut self) {
        self.device.forget().await;
        self.state = KeyringState::new(self.descriptor.default_hd_path);
    }

    /// Sign `transaction` for a tracked account.
    pub async fn sign_transaction(
        &self,
        address: Address,
        transaction: UnsignedTransaction,
    ) -> Result<TxEnvelope, KeyringError> {
        let path = self.path_of(&address)?;
        let signature = self.device.sign_transaction(path, &transaction).await?;
        verify_signer(&signature, &transaction.signature_hash(), address)?;
        Ok(transaction.into_signed(signature))
    }

    /// EIP-191 signature over `message` for a tracked account.
    pub async fn sign_personal_message(
        &self,
        address: Address,
        message: &[u8],
    ) -> Result<Signature, KeyringError> {
        let path = self.path_of(&address)?;
        let signature = self.device.sign_personal_message(path, message).await?;
        verify_signer(&signature, &eip191_hash_message(message), address)?;
        Ok(signature)
    }

    fn path_of(&self, address: &Address) -> Result<&str, KeyringError> {
        self.state
            .path_of(address)
            .ok_or(KeyringError::UnknownAddress(*address))
    }
}

/// Indices `from..from + count`, all below [`HARDENED_OFFSET`].
fn account_range(from: usize, count: usize) -> Result<Range<usize>, KeyringError> {
    match from.checked_add(count) {
        Some(end) if end <= HARDENED_OFFSET => Ok(from..end),
        _ => Err(KeyringError::IndexOutOfRange(from.max(HARDENED_OFFSET))),
    }
}

fn verify_signer(signature: &Signature, hash: &B256, expected: Address) -> Result<(), KeyringError> {
    match signature.recover_address_from_prehash(hash) {
        Ok(recovered) if recovered == expected => Ok(()),
        _ => Err(KeyringError::SignatureMismatch(expected)),
    }
}
