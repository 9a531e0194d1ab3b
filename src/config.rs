// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the relay. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `BACKGROUND_URL` | JSON-RPC endpoint receiving `closeBackgroundPromise` | Outcomes are only logged |
//! | `DEVICE_MNEMONIC` | BIP-39 phrase for the emulated hardware device | Devices report disconnected |
//! | `START_FOCUSED` | Whether this instance holds focus at startup | `true` |
//! | `RELAY_QUEUE_CAPACITY` | Pending calls buffered for the relay worker | `64` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;

use url::Url;

use crate::telemetry::LogFormat;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the background JSON-RPC endpoint.
///
/// Every call outcome is delivered there as a `closeBackgroundPromise`
/// request. When unset, outcomes are written to the log instead.
pub const BACKGROUND_URL_ENV: &str = "BACKGROUND_URL";

/// Environment variable name for the emulated device mnemonic.
///
/// Must never be set in a deployment that talks to real hardware.
pub const DEVICE_MNEMONIC_ENV: &str = "DEVICE_MNEMONIC";

pub const START_FOCUSED_ENV: &str = "START_FOCUSED";
pub const QUEUE_CAPACITY_ENV: &str = "RELAY_QUEUE_CAPACITY";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Relay runtime configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub background_url: Option<Url>,
    pub device_mnemonic: Option<String>,
    pub start_focused: bool,
    pub queue_capacity: usize,
    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            background_url: None,
            device_mnemonic: None,
            start_focused: true,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            log_format: LogFormat::Pretty,
        }
    }
}

impl RelayConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match value(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                name: PORT_ENV,
                reason: format!("{e}"),
            })?,
            None => defaults.port,
        };

        let background_url = value(BACKGROUND_URL_ENV)
            .map(|raw| {
                Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
                    name: BACKGROUND_URL_ENV,
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let start_focused = match value(START_FOCUSED_ENV) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                name: START_FOCUSED_ENV,
                reason: format!("expected true/false, got `{raw}`"),
            })?,
            None => defaults.start_focused,
        };

        let queue_capacity = match value(QUEUE_CAPACITY_ENV) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        name: QUEUE_CAPACITY_ENV,
                        reason: format!("expected a positive integer, got `{raw}`"),
                    })
                }
                Ok(n) => n,
            },
            None => defaults.queue_capacity,
        };

        let log_format = value(LOG_FORMAT_ENV)
            .map(|raw| LogFormat::parse(&raw))
            .unwrap_or(defaults.log_format);

        Ok(Self {
            host: value(HOST_ENV).unwrap_or(defaults.host),
            port,
            background_url,
            device_mnemonic: value(DEVICE_MNEMONIC_ENV),
            start_focused,
            queue_capacity,
            log_format,
        })
    }

    /// Socket address string the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
