// MIT License - Copyright (c) 2026 The kb-link Authors

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::codec::{FrameCodec, PanelMessage};
use crate::config::PanelConfig;
use crate::error::{KbError, Result};
use crate::event::{
    event_channel, EventReceiver, EventSender, Listener, ListenerId, ListenerRegistry, PanelEvent,
};
use crate::protocol::{BuzzerMode, LedColor, LedMode, PanelCommand, StatusVector};
use crate::transport::{serial, PanelStream};

const READ_BUF_LEN: usize = 256;

/// State shared between the controller and its read task.
struct Shared {
    status: RwLock<StatusVector>,
    listeners: ListenerRegistry,
    event_tx: EventSender,
    link_up: AtomicBool,
}

/// Controller for one KB panel: three LEDs, a buzzer and a card reader.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use kb_link::{LedColor, LedMode, PanelConfig, PanelController};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = PanelConfig::builder().serial_port("/dev/ttyUSB0").build();
///     let panel = PanelController::connect(config).await?;
///
///     panel.add_listener(Arc::new(|card_id: &str| println!("Card: {card_id}")));
///     panel.set_led_mode(LedColor::Green, LedMode::Blink).await?;
///
///     tokio::signal::ctrl_c().await?;
///     Ok(())
/// }
/// ```
pub struct PanelController {
    shared: Arc<Shared>,
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
    reader_handle: Option<JoinHandle<()>>,
}

impl PanelController {
    /// Open the configured serial port and start talking to the panel.
    pub async fn connect(config: PanelConfig) -> Result<Self> {
        info!(
            "Connecting to panel on {} ({} baud)",
            config.serial_port, config.baud_rate
        );
        let stream = serial::open(&config)?;
        Self::from_stream(stream, &config).await
    }

    /// Run the panel protocol over an already open stream.
    ///
    /// Spawns the read task and asks the panel for its current status.
    pub async fn from_stream<S: PanelStream>(stream: S, config: &PanelConfig) -> Result<Self> {
        let (reader, writer) = tokio::io::split(stream);
        let (event_tx, _event_rx) = event_channel(config.event_capacity.max(1));

        let shared = Arc::new(Shared {
            status: RwLock::new(StatusVector::unknown()),
            listeners: ListenerRegistry::new(),
            event_tx,
            link_up: AtomicBool::new(true),
        });

        let reader_handle = spawn_reader_task(reader, shared.clone());

        let panel = Self {
            shared,
            writer: Mutex::new(Box::new(writer)),
            reader_handle: Some(reader_handle),
        };

        panel.request_status().await?;
        info!("Panel link established");
        Ok(panel)
    }

    /// Set the mode of one LED.
    ///
    /// The local status is updated immediately; the panel does not acknowledge.
    pub async fn set_led_mode(&self, color: LedColor, mode: LedMode) -> Result<()> {
        debug!("Setting {} LED to {}", color.as_str(), mode.as_str());
        self.change_state(PanelCommand::SetLed { color, mode }).await
    }

    /// Set the buzzer mode. Same optimistic semantics as [`Self::set_led_mode`].
    pub async fn set_buzzer_mode(&self, mode: BuzzerMode) -> Result<()> {
        debug!("Setting buzzer to {}", mode.as_str());
        self.change_state(PanelCommand::SetBuzzer { mode }).await
    }

    /// Last known mode of one LED.
    pub async fn get_led_mode(&self, color: LedColor) -> Result<LedMode> {
        self.shared.status.read().await.led(color)
    }

    /// Last known buzzer mode.
    pub async fn get_buzzer_mode(&self) -> Result<BuzzerMode> {
        self.shared.status.read().await.buzzer()
    }

    /// Snapshot of the raw status vector.
    pub async fn status(&self) -> StatusVector {
        *self.shared.status.read().await
    }

    /// Ask the panel to report its status vector (`STX S ETX`).
    pub async fn request_status(&self) -> Result<()> {
        self.send(PanelCommand::QueryStatus).await
    }

    /// Register a card-scan listener.
    ///
    /// Listeners run on the read task, in registration order, before the
    /// matching [`PanelEvent::CardScanned`] is broadcast. A slow listener
    /// delays every following frame, so hand real work off to another task.
    pub fn add_listener(&self, listener: Listener) -> ListenerId {
        self.shared.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    /// Subscribe to panel events.
    pub fn subscribe(&self) -> EventReceiver {
        self.shared.event_tx.subscribe()
    }

    /// Whether the read task is still running.
    pub fn is_link_up(&self) -> bool {
        self.shared.link_up.load(Ordering::SeqCst)
    }

    /// Stop the read task and close the write side.
    pub async fn close(&mut self) -> Result<()> {
        info!("Closing panel link");
        if let Some(handle) = self.reader_handle.take() {
            handle.abort();
        }
        self.shared.link_up.store(false, Ordering::SeqCst);
        self.writer.lock().await.shutdown().await?;
        Ok(())
    }

    async fn change_state(&self, command: PanelCommand) -> Result<()> {
        command.apply(&mut *self.shared.status.write().await);
        self.send(command).await
    }

    async fn send(&self, command: PanelCommand) -> Result<()> {
        let frame = command.to_frame();
        let mut writer = self.writer.lock().await;
        let result = async {
            writer.write_all(&frame).await?;
            writer.flush().await
        }
        .await;

        match result {
            Ok(()) => {
                debug!("Sent panel frame: {:02X?}", frame);
                Ok(())
            }
            Err(e) => {
                error!("Failed to write panel frame: {}", e);
                Err(KbError::TransportIo(e))
            }
        }
    }
}

impl Drop for PanelController {
    fn drop(&mut self) {
        if let Some(handle) = self.reader_handle.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for PanelController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelController")
            .field("listeners", &self.shared.listeners)
            .finish_non_exhaustive()
    }
}

/// Spawn the task that reads the panel's byte stream until it fails.
fn spawn_reader_task<R>(mut reader: R, shared: Arc<Shared>) -> JoinHandle<()>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut codec = FrameCodec::new();
        let mut buf = [0u8; READ_BUF_LEN];

        let reason = loop {
            match reader.read(&mut buf).await {
                Ok(0) => {
                    debug!("Reader: connection closed");
                    break "connection closed".to_string();
                }
                Ok(n) => {
                    for msg in codec.push(&buf[..n]) {
                        process_message(msg, &shared).await;
                    }
                }
                Err(e) => {
                    error!("Reader: read error: {}", e);
                    break format!("read error: {e}");
                }
            }
        };

        shared.link_up.store(false, Ordering::SeqCst);
        warn!("Panel link down: {}", reason);
        let _ = shared.event_tx.send(PanelEvent::LinkDown { reason });
    })
}

async fn process_message(msg: PanelMessage, shared: &Shared) {
    match msg {
        PanelMessage::StatusSync(status) => {
            debug!("Status sync: {:02X?}", status.as_bytes());
            *shared.status.write().await = status;
            let _ = shared.event_tx.send(PanelEvent::StatusSynced(status));
        }
        PanelMessage::CardScan(card_id) => {
            info!("Card scanned: {}", card_id);
            shared.listeners.dispatch(&card_id);
            let _ = shared.event_tx.send(PanelEvent::CardScanned { card_id });
        }
    }
}
