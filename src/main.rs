// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process::ExitCode, sync::Arc};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use keyring_relay::{
    api::router,
    background::{BackgroundSink, ChannelBackground, HttpBackground},
    config::RelayConfig,
    keyring::DeviceRegistry,
    relay::{FocusGate, KeyringRelay, RelayWorker},
    state::AppState,
    telemetry,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    telemetry::init(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Keyring relay failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: RelayConfig) -> std::io::Result<()> {
    let shutdown = CancellationToken::new();

    let devices = match config.device_mnemonic.as_deref() {
        Some(phrase) => {
            warn!("DEVICE_MNEMONIC is set; keyrings use emulated devices");
            DeviceRegistry::emulated(phrase)
        }
        None => DeviceRegistry::new(),
    };

    let sink: Arc<dyn BackgroundSink> = match config.background_url.clone() {
        Some(url) => {
            let background = HttpBackground::new(url).map_err(std::io::Error::other)?;
            info!(
                endpoint = %background.endpoint(),
                "Delivering outcomes via closeBackgroundPromise"
            );
            Arc::new(background)
        }
        None => {
            warn!("BACKGROUND_URL is not set; outcomes are only logged");
            let (sink, mut outcomes) = ChannelBackground::new();
            tokio::spawn(async move {
                while let Some(outcome) = outcomes.recv().await {
                    info!(
                        promise_id = %outcome.promise_id,
                        result = ?outcome.result,
                        data = %outcome.data,
                        "Keyring call outcome"
                    );
                }
            });
            Arc::new(sink)
        }
    };

    let focus = FocusGate::new(config.start_focused);
    let (calls, queue) = mpsc::channel(config.queue_capacity);
    let relay = KeyringRelay::new(devices, focus.clone());
    let worker = tokio::spawn(RelayWorker::new(relay, queue, sink).run(shutdown.clone()));

    let app = router(AppState::new(calls, focus));
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %listener.local_addr()?, "Keyring relay listening (docs at /docs)");

    let server_shutdown = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
                _ = server_shutdown.cancelled() => {}
            }
        })
        .await;

    shutdown.cancel();
    if let Err(e) = worker.await {
        error!(error = %e, "Relay worker task failed");
    }

    served
}
