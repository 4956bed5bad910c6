// MIT License - Copyright (c) 2026 The kb-link Authors

use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, error};

use crate::config::PanelConfig;
use crate::error::{KbError, Result};

/// Open the panel's serial port (8N1, no flow control).
///
/// Must be called from inside a tokio runtime.
pub fn open(config: &PanelConfig) -> Result<SerialStream> {
    debug!(
        "Opening serial port {} at {} baud",
        config.serial_port, config.baud_rate
    );
    tokio_serial::new(&config.serial_port, config.baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| {
            error!("Cannot open serial port {}: {}", config.serial_port, e);
            KbError::connection(&config.serial_port, e.into())
        })
}
