//! Relay configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::infrastructure::relay::RelaySettings;

/// Relay environment configuration
#[derive(Debug, Clone)]
pub struct RelayEnvConfig {
    pub bind_address: String,
    pub port: u16,
    pub tick_interval_ms: u64,
    pub broadcast_symbols: Vec<String>,
    pub client_queue_size: usize,
}

impl RelayEnvConfig {
    pub fn from_env() -> Result<Self> {
        let port = env::var("RELAY_PORT")
            .unwrap_or_else(|_| "8765".to_string())
            .parse::<u16>()
            .context("Failed to parse RELAY_PORT")?;

        let tick_interval_ms = env::var("TICK_INTERVAL_MS")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<u64>()
            .context("Failed to parse TICK_INTERVAL_MS")?;
        if tick_interval_ms == 0 {
            anyhow::bail!("TICK_INTERVAL_MS must be greater than zero");
        }

        let broadcast_symbols = env::var("BROADCAST_SYMBOLS")
            .unwrap_or_else(|_| "XAUUSDc".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            bind_address: env::var("RELAY_BIND_ADDRESS")
                .unwrap_or_else(|_| "localhost".to_string()),
            port,
            tick_interval_ms,
            broadcast_symbols,
            client_queue_size: env::var("CLIENT_QUEUE_SIZE")
                .unwrap_or_else(|_| "256".to_string())
                .parse::<usize>()
                .unwrap_or(256)
                .max(1),
        })
    }

    pub fn settings(&self) -> RelaySettings {
        RelaySettings {
            bind_address: self.bind_address.clone(),
            port: self.port,
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            broadcast_symbols: self.broadcast_symbols.clone(),
            client_queue_size: self.client_queue_size,
        }
    }
}
