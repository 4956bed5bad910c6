// MIT License - Copyright (c) 2026 The kb-link Authors

use std::time::Duration;

use crate::constants::{DEFAULT_RELAY_DEVICE_ID, PANEL_BAUD_RATE, RELAY_TCP_PORT, RELAY_TIMEOUT};

/// Configuration for the serial panel link.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Serial device path (e.g. `/dev/ttyUSB0`, `COM3`)
    pub serial_port: String,
    /// Line speed (default: 19200)
    pub baud_rate: u32,
    /// Capacity of the broadcast channel behind `subscribe()`
    pub event_capacity: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            serial_port: "/dev/ttyUSB0".to_string(),
            baud_rate: PANEL_BAUD_RATE,
            event_capacity: 64,
        }
    }
}

impl PanelConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> PanelConfigBuilder {
        PanelConfigBuilder::default()
    }
}

/// Builder for PanelConfig.
#[derive(Debug, Clone, Default)]
pub struct PanelConfigBuilder {
    config: PanelConfig,
}

impl PanelConfigBuilder {
    pub fn serial_port(mut self, port: impl Into<String>) -> Self {
        self.config.serial_port = port.into();
        self
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.config.baud_rate = baud_rate;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> PanelConfig {
        self.config
    }
}

/// Configuration for the networked relay board.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Relay board IP address or host name
    pub ip_address: String,
    /// TCP port of the serial bridge (default: 2000)
    pub tcp_port: u16,
    /// Device id placed in every command frame (default: 1)
    pub device_id: u8,
    /// Connect and write deadline per command in milliseconds (default: 1000)
    pub timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ip_address: "192.168.1.2".to_string(),
            tcp_port: RELAY_TCP_PORT,
            device_id: DEFAULT_RELAY_DEVICE_ID,
            timeout_ms: RELAY_TIMEOUT.as_millis() as u64,
        }
    }
}

impl RelayConfig {
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::default()
    }

    /// `host:port` of the relay board's serial bridge.
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip_address, self.tcp_port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Builder for RelayConfig.
#[derive(Debug, Clone, Default)]
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl RelayConfigBuilder {
    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.config.ip_address = ip.into();
        self
    }

    pub fn tcp_port(mut self, port: u16) -> Self {
        self.config.tcp_port = port;
        self
    }

    pub fn device_id(mut self, id: u8) -> Self {
        self.config.device_id = id;
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    pub fn build(self) -> RelayConfig {
        self.config
    }
}
