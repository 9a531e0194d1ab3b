// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Focus gating.
//!
//! Several wallet UI instances may run a relay at the same time. Only the
//! instance whose document holds input focus answers keyring calls. Focus is
//! last-writer-wins: whichever instance reported focus most recently is
//! considered active, with no fencing between instances.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Debug, Clone)]
pub struct FocusGate {
    focused: Arc<AtomicBool>,
}

impl FocusGate {
    pub fn new(focused: bool) -> Self {
        Self {
            focused: Arc::new(AtomicBool::new(focused)),
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }

    /// Record a focus change, returning the previous value.
    pub fn set_focused(&self, focused: bool) -> bool {
        let previous = self.focused.swap(focused, Ordering::SeqCst);
        if previous != focused {
            tracing::info!(focused, "Relay focus changed");
        }
        previous
    }
}

impl Default for FocusGate {
    fn default() -> Self {
        Self::new(true)
    }
}
