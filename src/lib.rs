// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Keyring Relay - Hardware Keyring Call Relay
//!
//! This crate forwards keyring method calls from a wallet background context
//! to hardware keyrings and reports each outcome back to the caller through
//! `closeBackgroundPromise`.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `background` - Outcome delivery to the background context
//! - `keyring` - Hardware keyrings, their state and devices
//! - `relay` - Call dispatch, focus gating and the relay worker
//! - `transaction` - Transaction wire codec

pub mod api;
pub mod background;
pub mod config;
pub mod error;
pub mod keyring;
pub mod relay;
pub mod state;
pub mod telemetry;
pub mod transaction;
