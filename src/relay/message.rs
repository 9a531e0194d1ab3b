// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Messages exchanged with the background context.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

/// A keyring method call forwarded by the background context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    /// Keyring type tag (e.g. "ledger").
    #[serde(rename = "type")]
    pub keyring_type: String,
    /// Keyring method name (e.g. "signTransaction").
    pub method: String,
    /// Positional method arguments.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub args: Vec<Value>,
    /// Keyring state to apply before the call. `null` keeps the current state.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub prev_state: Value,
    /// Correlation id echoed in the outcome.
    pub promise_id: String,
}

/// Whether the pending background promise resolves or rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Resolve,
    Reject,
}

/// Result of a keyring call, delivered through `closeBackgroundPromise`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallOutcome {
    pub promise_id: String,
    pub result: OutcomeKind,
    /// `{ newState, response }` on resolve, the error text on reject.
    #[schema(value_type = Object)]
    pub data: Value,
}

impl CallOutcome {
    pub fn resolve(promise_id: impl Into<String>, new_state: Value, response: Value) -> Self {
        Self {
            promise_id: promise_id.into(),
            result: OutcomeKind::Resolve,
            data: json!({
                "newState": new_state,
                "response": response,
            }),
        }
    }

    pub fn reject(promise_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            promise_id: promise_id.into(),
            result: OutcomeKind::Reject,
            data: Value::String(reason.into()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.result == OutcomeKind::Resolve
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_wire_field_names() {
        let request: CallRequest = serde_json::from_value(json!({
            "type": "ledger",
            "method": "signTransaction",
            "args": ["0xabc", "02c0"],
            "prevState": { "hdPath": "m/44'/60'/0'/0/0" },
            "promiseId": "p1"
        }))
        .unwrap();

        assert_eq!(request.keyring_type, "ledger");
        assert_eq!(request.method, "signTransaction");
        assert_eq!(request.args.len(), 2);
        assert_eq!(request.prev_state["hdPath"], "m/44'/60'/0'/0/0");
        assert_eq!(request.promise_id, "p1");
    }

    #[test]
    fn request_args_and_state_are_optional() {
        let request: CallRequest = serde_json::from_value(json!({
            "type": "trezor",
            "method": "getAccounts",
            "promiseId": "p2"
        }))
        .unwrap();
        assert!(request.args.is_empty());
        assert!(request.prev_state.is_null());
    }

    #[test]
    fn outcomes_serialize_in_wire_shape() {
        let resolved = CallOutcome::resolve("p1", json!({ "page": 0 }), json!("f86c"));
        assert!(resolved.is_resolved());
        assert_eq!(
            serde_json::to_value(&resolved).unwrap(),
            json!({
                "promiseId": "p1",
                "result": "resolve",
                "data": { "newState": { "page": 0 }, "response": "f86c" }
            })
        );

        let rejected = CallOutcome::reject("p1", "User rejected");
        assert!(!rejected.is_resolved());
        assert_eq!(
            serde_json::to_value(&rejected).unwrap(),
            json!({ "promiseId": "p1", "result": "reject", "data": "User rejected" })
        );
    }
}
