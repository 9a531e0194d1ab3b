// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hardware device abstraction.
//!
//! A keyring never holds private keys. Address derivation and signing go
//! through a [`HardwareDevice`]. The relay ships two implementations:
//!
//! - [`EmulatedDevice`] - derives keys from a BIP-39 mnemonic, used for
//!   development and tests.
//! - [`UnavailableDevice`] - reports that no device is attached.

use std::{collections::HashMap, sync::Arc};

use alloy::{
    primitives::{Address, Signature},
    signers::{
        local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner},
        SignerSync,
    },
};
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::KeyringType;
use crate::transaction::UnsignedTransaction;

/// Errors reported by a hardware device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("User rejected")]
    UserRejected,

    #[error("Device disconnected")]
    Disconnected,

    #[error("Device is locked")]
    Locked,

    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("Device communication failed: {0}")]
    Communication(String),
}

/// A hardware signer reachable by a keyring.
#[async_trait]
pub trait HardwareDevice: Send + Sync {
    /// Whether the device is attached and ready.
    async fn is_connected(&self) -> bool;

    /// Address at a derivation path.
    async fn address(&self, path: &str) -> Result<Address, DeviceError>;

    /// Sign a transaction with the key at `path`.
    async fn sign_transaction(
        &self,
        path: &str,
        transaction: &UnsignedTransaction,
    ) -> Result<Signature, DeviceError>;

    /// EIP-191 personal signature over `message` with the key at `path`.
    async fn sign_personal_message(
        &self,
        path: &str,
        message: &[u8],
    ) -> Result<Signature, DeviceError>;

    /// Drop any pairing or cached session.
    async fn forget(&self) {}
}

/// Software device backed by a BIP-39 mnemonic.
pub struct EmulatedDevice {
    phrase: String,
    signers: Mutex<HashMap<String, PrivateKeySigner>>,
}

impl EmulatedDevice {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            signers: Mutex::new(HashMap::new()),
        }
    }

    async fn signer(&self, path: &str) -> Result<PrivateKeySigner, DeviceError> {
        let mut signers = self.signers.lock().await;
        if let Some(signer) = signers.get(path) {
            return Ok(signer.clone());
        }

        let signer = MnemonicBuilder::<English>::default()
            .phrase(self.phrase.as_str())
            .derivation_path(path)
            .map_err(|e| DeviceError::InvalidPath(format!("{path}: {e}")))?
            .build()
            .map_err(|e| DeviceError::Communication(e.to_string()))?;

        tracing::debug!(path, address = %signer.address(), "Derived emulated device key");
        signers.insert(path.to_string(), signer.clone());
        Ok(signer)
    }
}

#[async_trait]
impl HardwareDevice for EmulatedDevice {
    async fn is_connected(&self) -> bool {
        true
    }

    async fn address(&self, path: &str) -> Result<Address, DeviceError> {
        Ok(self.signer(path).await?.address())
    }

    async fn sign_transaction(
        &self,
        path: &str,
        transaction: &UnsignedTransaction,
    ) -> Result<Signature, DeviceError> {
        let signer = self.signer(path).await?;
        signer
            .sign_hash_sync(&transaction.signature_hash())
            .map_err(|e| DeviceError::Communication(e.to_string()))
    }

    async fn sign_personal_message(
        &self,
        path: &str,
        message: &[u8],
    ) -> Result<Signature, DeviceError> {
        let signer = self.signer(path).await?;
        signer
            .sign_message_sync(message)
            .map_err(|e| DeviceError::Communication(e.to_string()))
    }

    async fn forget(&self) {
        self.signers.lock().await.clear();
    }
}

/// Placeholder for keyring types with no attached device.
#[derive(Debug, Default)]
pub struct UnavailableDevice;

#[async_trait]
impl HardwareDevice for UnavailableDevice {
    async fn is_connected(&self) -> bool {
        false
    }

    async fn address(&self, _path: &str) -> Result<Address, DeviceError> {
        Err(DeviceError::Disconnected)
    }

    async fn sign_transaction(
        &self,
        _path: &str,
        _transaction: &UnsignedTransaction,
    ) -> Result<Signature, DeviceError> {
        Err(DeviceError::Disconnected)
    }

    async fn sign_personal_message(
        &self,
        _path: &str,
        _message: &[u8],
    ) -> Result<Signature, DeviceError> {
        Err(DeviceError::Disconnected)
    }
}

/// Devices available to each keyring type.
#[derive(Clone, Default)]
pub struct DeviceRegistry {
    devices: HashMap<KeyringType, Arc<dyn HardwareDevice>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One emulated device per keyring type, all derived from `phrase`.
    pub fn emulated(phrase: &str) -> Self {
        KeyringType::ALL
            .into_iter()
            .fold(Self::new(), |registry, kind| {
                registry.with_device(kind, Arc::new(EmulatedDevice::new(phrase)))
            })
    }

    pub fn with_device(mut self, kind: KeyringType, device: Arc<dyn HardwareDevice>) -> Self {
        self.devices.insert(kind, device);
        self
    }

    /// Device for `kind`, or an [`UnavailableDevice`] when none is attached.
    pub fn device(&self, kind: KeyringType) -> Arc<dyn HardwareDevice> {
        self.devices
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::new(UnavailableDevice))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy::primitives::{address, eip191_hash_message};

    pub(crate) const TEST_MNEMONIC: &str =
        "test test test test test test test test test test test junk";
    pub(crate) const ACCOUNT_0: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    pub(crate) const ACCOUNT_1: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

    /// Device that fails every signature with a fixed error.
    pub(crate) struct FailingDevice {
        pub(crate) inner: EmulatedDevice,
        pub(crate) error: DeviceError,
    }

    impl FailingDevice {
        pub(crate) fn new(error: DeviceError) -> Self {
            Self {
                inner: EmulatedDevice::new(TEST_MNEMONIC),
                error,
            }
        }
    }

    #[async_trait]
    impl HardwareDevice for FailingDevice {
        async fn is_connected(&self) -> bool {
            true
        }

        async fn address(&self, path: &str) -> Result<Address, DeviceError> {
            self.inner.address(path).await
        }

        async fn sign_transaction(
            &self,
            _path: &str,
            _transaction: &UnsignedTransaction,
        ) -> Result<Signature, DeviceError> {
            Err(self.error.clone())
        }

        async fn sign_personal_message(
            &self,
            _path: &str,
            _message: &[u8],
        ) -> Result<Signature, DeviceError> {
            Err(self.error.clone())
        }
    }

    #[tokio::test]
    async fn emulated_device_derives_known_addresses() {
        let device = EmulatedDevice::new(TEST_MNEMONIC);
        assert!(device.is_connected().await);
        assert_eq!(device.address("m/44'/60'/0'/0/0").await.unwrap(), ACCOUNT_0);
        assert_eq!(device.address("m/44'/60'/0'/0/1").await.unwrap(), ACCOUNT_1);
        // Cached lookup returns the same key.
        assert_eq!(device.address("m/44'/60'/0'/0/0").await.unwrap(), ACCOUNT_0);
    }

    #[tokio::test]
    async fn emulated_device_rejects_bad_path() {
        let device = EmulatedDevice::new(TEST_MNEMONIC);
        assert!(matches!(
            device.address("not/a/path").await,
            Err(DeviceError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn emulated_device_signs_personal_messages() {
        let device = EmulatedDevice::new(TEST_MNEMONIC);
        let signature = device
            .sign_personal_message("m/44'/60'/0'/0/0", b"hello")
            .await
            .unwrap();
        let recovered = signature
            .recover_address_from_prehash(&eip191_hash_message(b"hello"))
            .unwrap();
        assert_eq!(recovered, ACCOUNT_0);
    }

    #[tokio::test]
    async fn registry_falls_back_to_unavailable_device() {
        let registry = DeviceRegistry::new()
            .with_device(KeyringType::Ledger, Arc::new(EmulatedDevice::new(TEST_MNEMONIC)));
        assert!(registry.device(KeyringType::Ledger).is_connected().await);
        assert!(!registry.device(KeyringType::Trezor).is_connected().await);

        let registry = DeviceRegistry::emulated(TEST_MNEMONIC);
        for kind in KeyringType::ALL {
            assert!(registry.device(kind).is_connected().await);
        }
    }

    #[tokio::test]
    async fn unavailable_device_is_disconnected() {
        let device = UnavailableDevice;
        assert!(!device.is_connected().await);
        assert_eq!(
            device.address("m/44'/60'/0'/0/0").await,
            Err(DeviceError::Disconnected)
        );
    }
}
