// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Keyring Call Relay
//!
//! The relay receives keyring method calls from the background context,
//! runs them against the matching [`HardwareKeyring`] and reports the
//! outcome back through a [`BackgroundSink`].
//!
//! ## Call Lifecycle
//!
//! 1. Ignore the call unless this instance holds focus.
//! 2. Resolve `(type, method)` against the dispatch table.
//! 3. Overwrite the keyring state with `prevState`.
//! 4. Parse arguments (`signTransaction` decodes its hex transaction).
//! 5. Invoke the method and read back the keyring state.
//! 6. Emit one resolve or reject outcome carrying the caller's `promiseId`.
//!
//! No error escapes the relay; every failure becomes a reject outcome.

pub mod dispatch;
pub mod focus;
pub mod message;
pub mod worker;

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info, warn};

pub use dispatch::{KeyringCall, KeyringMethod};
pub use focus::FocusGate;
pub use message::{CallOutcome, CallRequest, OutcomeKind};
pub use worker::RelayWorker;

use crate::{
    background::BackgroundSink,
    error::{reject_reason, RelayError},
    keyring::{DeviceRegistry, HardwareKeyring, KeyringType},
};

/// Routes keyring calls to lazily created keyring instances.
pub struct KeyringRelay {
    devices: DeviceRegistry,
    keyrings: HashMap<KeyringType, HardwareKeyring>,
    focus: FocusGate,
}

impl KeyringRelay {
    pub fn new(devices: DeviceRegistry, focus: FocusGate) -> Self {
        Self {
            devices,
            keyrings: HashMap::new(),
            focus,
        }
    }

    /// Keyring instance for `kind`, if one has been created.
    pub fn keyring(&self, kind: KeyringType) -> Option<&HardwareKeyring> {
        self.keyrings.get(&kind)
    }

    /// Handle a call and deliver its outcome to `sink`.
    pub async fn handle(&mut self, request: CallRequest, sink: &dyn BackgroundSink) {
        let Some(outcome) = self.process(request).await else {
            return;
        };

        let promise_id = outcome.promise_id.clone();
        if let Err(e) = sink.close_background_promise(outcome).await {
            warn!(promise_id = %promise_id, error = %e, "Failed to deliver keyring call outcome");
        }
    }

    /// Handle a call and return its outcome. `None` when this instance lacks focus.
    pub async fn process(&mut self, request: CallRequest) -> Option<CallOutcome> {
        if !self.focus.is_focused() {
            debug!(
                promise_id = %request.promise_id,
                method = %request.method,
                "Ignoring keyring call while unfocused"
            );
            return None;
        }

        let promise_id = request.promise_id.clone();
        let keyring_type = request.keyring_type.clone();
        let method = request.method.clone();

        let outcome = match self.execute(request).await {
            Ok((new_state, response)) => {
                info!(
                    promise_id = %promise_id,
                    keyring = %keyring_type,
                    method = %method,
                    "Keyring call resolved"
                );
                CallOutcome::resolve(promise_id, new_state, response)
            }
            Err(e) => {
                let reason = reject_reason(&e);
                warn!(
                    promise_id = %promise_id,
                    keyring = %keyring_type,
                    method = %method,
                    error = %reason,
                    "Keyring call rejected"
                );
                CallOutcome::reject(promise_id, reason)
            }
        };
        Some(outcome)
    }

    async fn execute(&mut self, request: CallRequest) -> Result<(Value, Value), RelayError> {
        let (kind, method) = dispatch::resolve(&request.keyring_type, &request.method)?;
        let keyring = self.keyring_mut(kind);

        if !request.prev_state.is_null() {
            keyring.deserialize(request.prev_state)?;
        }

        let call = KeyringCall::parse(method, &request.args)?;
        let response = call.invoke(keyring).await?;
        Ok((keyring.serialize()?, response))
    }

    fn keyring_mut(&mut self, kind: KeyringType) -> &mut HardwareKeyring {
        let devices = &self.devices;
        self.keyrings.entry(kind).or_insert_with(|| {
            debug!(keyring = %kind, "Creating keyring instance");
            HardwareKeyring::new(kind, devices.device(kind))
        })
    }
}
