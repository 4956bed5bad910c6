// MIT License - Copyright (c) 2026 The kb-link Authors

use std::sync::Arc;

use crate::constants::RELAY_PORTS;
use crate::error::Result;
use crate::protocol::relay_port_index;
use crate::relay::RelayController;

/// A single switchable port of the relay board.
#[derive(Debug, Clone)]
pub struct RelayPort {
    relay: Arc<RelayController>,
    port: u8,
}

impl RelayPort {
    /// Fails with `InvalidPort` unless `port` is in 1..=8.
    pub fn new(relay: Arc<RelayController>, port: u8) -> Result<Self> {
        relay_port_index(port)?;
        Ok(Self { relay, port })
    }

    /// Ports 1 through 8 of `relay`.
    pub fn all(relay: &Arc<RelayController>) -> Vec<Self> {
        (1..=RELAY_PORTS)
            .map(|port| Self {
                relay: relay.clone(),
                port,
            })
            .collect()
    }

    pub fn port(&self) -> u8 {
        self.port
    }

    /// Display name, e.g. "Relay 3".
    pub fn name(&self) -> String {
        format!("Relay {}", self.port)
    }

    pub async fn is_on(&self) -> Result<bool> {
        self.relay.status(self.port).await
    }

    pub async fn turn_on(&self) -> Result<()> {
        self.relay.on(self.port).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.relay.off(self.port).await
    }
}
