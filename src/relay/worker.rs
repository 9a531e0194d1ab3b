// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sequential relay worker.
//!
//! The worker owns the relay and drains the call queue one request at a
//! time, so a call always runs to completion before the next one touches
//! keyring state.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown. The
//! worker also stops once every queue sender has been dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{CallRequest, KeyringRelay};
use crate::background::BackgroundSink;

pub struct RelayWorker {
    relay: KeyringRelay,
    calls: mpsc::Receiver<CallRequest>,
    sink: Arc<dyn BackgroundSink>,
}

impl RelayWorker {
    pub fn new(
        relay: KeyringRelay,
        calls: mpsc::Receiver<CallRequest>,
        sink: Arc<dyn BackgroundSink>,
    ) -> Self {
        Self { relay, calls, sink }
    }

    /// Run until cancelled or until the queue closes.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(worker.run(shutdown.clone()));
    /// ```
    pub async fn run(mut self, shutdown: CancellationToken) -> KeyringRelay {
        info!("Keyring relay worker starting");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Keyring relay worker shutting down");
                    break;
                }
                call = self.calls.recv() => match call {
                    Some(request) => self.relay.handle(request, self.sink.as_ref()).await,
                    None => {
                        info!("Keyring call queue closed; relay worker stopping");
                        break;
                    }
                },
            }
        }

        self.relay
    }
}
