// MIT License - Copyright (c) 2026 The kb-link Authors
//
//! # kb-link
//!
//! Device communication for KB access-control hardware:
//!
//! - **Panel**: a serial (RS-232/RS-485) keypad panel with green, orange and
//!   red LEDs, a buzzer and an RFID card reader. Frames are delimited by
//!   STX/ETX; card scans arrive asynchronously.
//! - **Relay board**: eight relays behind a TCP serial bridge, switched with
//!   checksummed fixed-size frames. The board never replies.
//!
//! Built on tokio, thiserror and tracing.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use kb_link::{LedColor, LedMode, PanelConfig, PanelController, RelayConfig, RelayController};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let panel = PanelController::connect(
//!         PanelConfig::builder().serial_port("/dev/ttyUSB0").build(),
//!     )
//!     .await?;
//!     let relay = Arc::new(RelayController::new(
//!         RelayConfig::builder().ip_address("192.168.1.2").build(),
//!     ));
//!
//!     let door = relay.clone();
//!     panel.add_listener(Arc::new(move |card_id: &str| {
//!         println!("Card {card_id}");
//!         let door = door.clone();
//!         tokio::spawn(async move { door.on(1).await });
//!     }));
//!
//!     panel.set_led_mode(LedColor::Green, LedMode::On).await?;
//!     tokio::signal::ctrl_c().await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod constants;
pub mod devices;
pub mod error;
pub mod event;
pub mod panel;
pub mod protocol;
pub mod relay;
pub mod transport;

// Re-exports for convenience
pub use codec::{FrameCodec, PanelMessage};
pub use config::{PanelConfig, PanelConfigBuilder, RelayConfig, RelayConfigBuilder};
pub use devices::buzzer::PanelBuzzer;
pub use devices::led::PanelLed;
pub use devices::relay_port::RelayPort;
pub use error::{KbError, Result};
pub use event::{EventReceiver, Listener, ListenerId, PanelEvent};
pub use panel::PanelController;
pub use protocol::{BuzzerMode, LedColor, LedMode, PanelCommand, RelayCommand, StatusVector};
pub use relay::RelayController;
