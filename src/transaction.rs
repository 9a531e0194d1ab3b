// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction wire codec.
//!
//! Keyring calls carry transactions as hex strings. Unsigned transactions
//! arrive as their signing payload: a legacy RLP list (optionally with the
//! EIP-155 `chainId, 0, 0` suffix) or an EIP-1559 payload prefixed with the
//! `0x02` type byte. Signed transactions leave as the hex of their EIP-2718
//! envelope, without a `0x` prefix.

use alloy::{
    consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy},
    eips::eip2718::Encodable2718,
    primitives::{ChainId, Signature, B256},
    rlp::{Decodable, Header},
};

const EIP1559_TX_TYPE: u8 = 0x02;

/// Errors raised while decoding or encoding transactions.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Invalid transaction hex: {0}")]
    InvalidHex(String),

    #[error("Empty transaction payload")]
    Empty,

    #[error("Unsupported transaction type: 0x{0:02x}")]
    UnsupportedType(u8),

    #[error("Malformed transaction: {0}")]
    Malformed(String),

    #[error("Transaction payload is already signed")]
    AlreadySigned,
}

impl From<alloy::rlp::Error> for TransactionError {
    fn from(e: alloy::rlp::Error) -> Self {
        TransactionError::Malformed(e.to_string())
    }
}

/// A transaction waiting for a hardware signature.
#[derive(Debug, Clone, PartialEq)]
pub enum UnsignedTransaction {
    Legacy(TxLegacy),
    Eip1559(TxEip1559),
}

impl UnsignedTransaction {
    /// Decode a transaction from its hex wire form (`0x` prefix optional).
    pub fn from_hex(raw: &str) -> Result<Self, TransactionError> {
        let bytes = alloy::hex::decode(raw.trim())
            .map_err(|e| TransactionError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }

    /// Decode a transaction from its signing payload bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, TransactionError> {
        let first = *bytes.first().ok_or(TransactionError::Empty)?;
        match first {
            EIP1559_TX_TYPE => decode_eip1559(&bytes[1..]).map(Self::Eip1559),
            0xc0..=0xff => decode_legacy(bytes).map(Self::Legacy),
            other => Err(TransactionError::UnsupportedType(other)),
        }
    }

    /// Signing payload bytes, the inverse of [`UnsignedTransaction::decode`].
    pub fn encode_for_signing(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Self::Legacy(tx) => tx.encode_for_signing(&mut out),
            Self::Eip1559(tx) => tx.encode_for_signing(&mut out),
        }
        out
    }

    /// Hex of the signing payload, without a `0x` prefix.
    pub fn to_hex(&self) -> String {
        alloy::hex::encode(self.encode_for_signing())
    }

    /// Hash the device signs.
    pub fn signature_hash(&self) -> B256 {
        match self {
            Self::Legacy(tx) => tx.signature_hash(),
            Self::Eip1559(tx) => tx.signature_hash(),
        }
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        match self {
            Self::Legacy(tx) => tx.chain_id,
            Self::Eip1559(tx) => Some(tx.chain_id),
        }
    }

    /// Attach a signature, producing the signed envelope.
    pub fn into_signed(self, signature: Signature) -> TxEnvelope {
        match self {
            Self::Legacy(tx) => TxEnvelope::from(tx.into_signed(signature)),
            Self::Eip1559(tx) => TxEnvelope::from(tx.into_signed(signature)),
        }
    }
}

/// Hex of a signed envelope, without a `0x` prefix.
pub fn encode_signed(envelope: &TxEnvelope) -> String {
    alloy::hex::encode(envelope.encoded_2718())
}

/// Split an RLP list header off `buf`, returning its payload.
fn list_payload<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], TransactionError> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(alloy::rlp::Error::UnexpectedString.into());
    }
    if buf.len() < header.payload_length {
        return Err(alloy::rlp::Error::InputTooShort.into());
    }
    let remaining: &'a [u8] = *buf;
    let (payload, rest) = remaining.split_at(header.payload_length);
    if !rest.is_empty() {
        return Err(TransactionError::Malformed(
            "trailing bytes after transaction".to_string(),
        ));
    }
    *buf = rest;
    Ok(payload)
}

fn decode_legacy(mut bytes: &[u8]) -> Result<TxLegacy, TransactionError> {
    let mut payload = list_payload(&mut bytes)?;
    let buf = &mut payload;

    let nonce = Decodable::decode(buf)?;
    let gas_price = Decodable::decode(buf)?;
    let gas_limit = Decodable::decode(buf)?;
    let to = Decodable::decode(buf)?;
    let value = Decodable::decode(buf)?;
    let input = Decodable::decode(buf)?;

    // EIP-155 signing payloads append `chainId, 0, 0`.
    let chain_id = if buf.is_empty() {
        None
    } else {
        let chain_id = u64::decode(buf)?;
        let r = u8::decode(buf)?;
        let s = u8::decode(buf)?;
        if r != 0 || s != 0 {
            return Err(TransactionError::AlreadySigned);
        }
        Some(chain_id)
    };

    if !buf.is_empty() {
        return Err(alloy::rlp::Error::UnexpectedLength.into());
    }

    Ok(TxLegacy {
        chain_id,
        nonce,
        gas_price,
        gas_limit,
        to,
        value,
        input,
        ..Default::default()
    })
}

fn decode_eip1559(mut bytes: &[u8]) -> Result<TxEip1559, TransactionError> {
    let mut payload = list_payload(&mut bytes)?;
    let buf = &mut payload;

    let chain_id = Decodable::decode(buf)?;
    let nonce = Decodable::decode(buf)?;
    let max_priority_fee_per_gas = Decodable::decode(buf)?;
    let max_fee_per_gas = Decodable::decode(buf)?;
    let gas_limit = Decodable::decode(buf)?;
    let to = Decodable::decode(buf)?;
    let value = Decodable::decode(buf)?;
    let input = Decodable::decode(buf)?;
    let access_list = Decodable::decode(buf)?;

    if !buf.is_empty() {
        // Signed EIP-1559 payloads carry `yParity, r, s` after the access list.
        return Err(TransactionError::AlreadySigned);
    }

    Ok(TxEip1559 {
        chain_id,
        nonce,
        gas_limit,
        max_fee_per_gas,
        max_priority_fee_per_gas,
        to,
        value,
        access_list,
        input,
        ..Default::default()
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy::{
        eips::eip2718::Decodable2718,
        primitives::{address, Bytes, TxKind, U256},
        signers::{local::PrivateKeySigner, SignerSync},
    };

    pub(crate) fn sample_legacy() -> TxLegacy {
        TxLegacy {
            chain_id: Some(1),
            nonce: 7,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: TxKind::Call(address!("0x3535353535353535353535353535353535353535")),
            value: U256::from(1_000_000_000_000_000_000u64),
            input: Bytes::new(),
            ..Default::default()
        }
    }

    pub(crate) fn sample_eip1559() -> TxEip1559 {
        TxEip1559 {
            chain_id: 43113,
            nonce: 3,
            gas_limit: 60_000,
            max_fee_per_gas: 51_500_000_000,
            max_priority_fee_per_gas: 1_500_000_000,
            to: TxKind::Call(address!("0x76568BEd5Acf1A5Cd888773C8cAe9ea2a9131A63")),
            value: U256::ZERO,
            input: Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb]),
            ..Default::default()
        }
    }

    #[test]
    fn decodes_eip155_legacy_payload() {
        let tx = UnsignedTransaction::Legacy(sample_legacy());
        let decoded = UnsignedTransaction::from_hex(&tx.to_hex()).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.chain_id(), Some(1));
    }

    #[test]
    fn decodes_pre_eip155_legacy_payload() {
        let tx = UnsignedTransaction::Legacy(TxLegacy {
            chain_id: None,
            ..sample_legacy()
        });
        let decoded = UnsignedTransaction::from_hex(&format!("0x{}", tx.to_hex())).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.chain_id(), None);
    }

    #[test]
    fn decodes_eip1559_payload() {
        let tx = UnsignedTransaction::Eip1559(sample_eip1559());
        let hex = tx.to_hex();
        assert!(hex.starts_with("02"));
        assert_eq!(UnsignedTransaction::from_hex(&hex).unwrap(), tx);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            UnsignedTransaction::from_hex("zz"),
            Err(TransactionError::InvalidHex(_))
        ));
        assert!(matches!(
            UnsignedTransaction::from_hex(""),
            Err(TransactionError::Empty)
        ));
        assert!(matches!(
            UnsignedTransaction::from_hex("01c0"),
            Err(TransactionError::UnsupportedType(0x01))
        ));
        assert!(matches!(
            UnsignedTransaction::from_hex("02c3010203"),
            Err(TransactionError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut hex = UnsignedTransaction::Legacy(sample_legacy()).to_hex();
        hex.push_str("00");
        assert!(matches!(
            UnsignedTransaction::from_hex(&hex),
            Err(TransactionError::Malformed(_))
        ));
    }

    #[test]
    fn signed_envelope_encodes_as_eip2718() {
        let signer = PrivateKeySigner::random();
        let tx = UnsignedTransaction::Eip1559(sample_eip1559());
        let hash = tx.signature_hash();
        let signature = signer.sign_hash_sync(&hash).unwrap();
        assert_eq!(
            signature.recover_address_from_prehash(&hash).unwrap(),
            signer.address()
        );

        let envelope = tx.into_signed(signature);
        let hex = encode_signed(&envelope);
        assert!(hex.starts_with("02"));

        let bytes = alloy::hex::decode(&hex).unwrap();
        let decoded = TxEnvelope::decode_2718(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn signed_legacy_envelope_round_trips() {
        let signer = PrivateKeySigner::random();
        let tx = UnsignedTransaction::Legacy(sample_legacy());
        let signature = signer.sign_hash_sync(&tx.signature_hash()).unwrap();
        let envelope = tx.into_signed(signature);

        let bytes = alloy::hex::decode(encode_signed(&envelope)).unwrap();
        let decoded = TxEnvelope::decode_2718(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded, envelope);
    }
}
