// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use tokio::sync::mpsc;

use crate::relay::{CallRequest, FocusGate};

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Queue feeding the relay worker.
    pub calls: mpsc::Sender<CallRequest>,
    pub focus: FocusGate,
}

impl AppState {
    pub fn new(calls: mpsc::Sender<CallRequest>, focus: FocusGate) -> Self {
        Self { calls, focus }
    }
}
