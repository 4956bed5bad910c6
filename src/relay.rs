// MIT License - Copyright (c) 2026 The kb-link Authors

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::RelayConfig;
use crate::constants::RELAY_PORTS;
use crate::error::Result;
use crate::protocol::{relay_port_index, RelayCommand};
use crate::transport::socket;

/// Controller for an 8-port relay board behind a TCP serial bridge.
///
/// The board never answers, so port state is whatever was last commanded
/// successfully from this controller. Every command uses its own short-lived
/// connection.
#[derive(Debug)]
pub struct RelayController {
    config: RelayConfig,
    states: RwLock<[bool; RELAY_PORTS as usize]>,
}

impl RelayController {
    pub fn new(config: RelayConfig) -> Self {
        info!(
            "Relay board at {} (device id {})",
            config.address(),
            config.device_id
        );
        Self {
            config,
            states: RwLock::new([false; RELAY_PORTS as usize]),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Last commanded state of `port` (1..=8). No traffic is generated.
    pub async fn status(&self, port: u8) -> Result<bool> {
        let index = relay_port_index(port)?;
        Ok(self.states.read().await[index])
    }

    /// Snapshot of all eight ports, index 0 being port 1.
    pub async fn states(&self) -> [bool; RELAY_PORTS as usize] {
        *self.states.read().await
    }

    pub async fn on(&self, port: u8) -> Result<()> {
        self.set(port, true).await
    }

    pub async fn off(&self, port: u8) -> Result<()> {
        self.set(port, false).await
    }

    /// Switch `port` and record the new state once the frame has been written.
    ///
    /// On a transport error the cached state is left untouched.
    pub async fn set(&self, port: u8, on: bool) -> Result<()> {
        let index = relay_port_index(port)?;
        let command = RelayCommand::new(self.config.device_id, port, on)?;
        debug!("Relay port {} -> {}", port, if on { "on" } else { "off" });

        socket::send_once(
            &self.config.address(),
            &command.to_frame(),
            self.config.timeout(),
        )
        .await?;

        self.states.write().await[index] = on;
        Ok(())
    }

    /// Check that the relay board's bridge accepts connections.
    pub async fn probe(&self) -> Result<()> {
        socket::connect(&self.config.address(), self.config.timeout()).await?;
        debug!("Relay board at {} is reachable", self.config.address());
        Ok(())
    }
}
