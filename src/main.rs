// MIT License - Copyright (c) 2026 The kb-link Authors
// Command-line tool for KB panels and relay boards

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use kb_link::constants::{
    DEFAULT_RELAY_DEVICE_ID, PANEL_BAUD_RATE, RELAY_TCP_PORT, RELAY_TIMEOUT,
};
use kb_link::{
    BuzzerMode, KbError, LedColor, LedMode, PanelConfig, PanelController, PanelEvent, RelayConfig,
    RelayController,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "kbctl")]
#[command(about = "Drive a KB panel and relay board from the command line")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "kbctl.toml")]
    config: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print status syncs and card scans until Ctrl+C
    Watch,
    /// Query and print the panel's LED and buzzer modes
    Status,
    /// Set an LED: GREEN|ORANGE|RED to OFF|ON|BLINK
    Led {
        #[arg(value_parser = parse_led_color)]
        color: LedColor,
        #[arg(value_parser = parse_led_mode)]
        mode: LedMode,
    },
    /// Set the buzzer: OFF|ON|SHORT|LONG|CONTINUOUS_PULSE
    Buzzer {
        #[arg(value_parser = parse_buzzer_mode)]
        mode: BuzzerMode,
    },
    /// Switch the relay board
    Relay {
        #[command(subcommand)]
        action: RelayAction,
    },
}

#[derive(Subcommand)]
enum RelayAction {
    /// Switch a port (1-8) on
    On { port: u8 },
    /// Switch a port (1-8) off
    Off { port: u8 },
    /// Check that the relay board accepts connections
    Probe,
}

fn parse_led_color(s: &str) -> Result<LedColor, String> {
    LedColor::from_name(s).ok_or_else(|| format!("unknown LED color: {s}"))
}

fn parse_led_mode(s: &str) -> Result<LedMode, String> {
    LedMode::from_name(s).ok_or_else(|| format!("unknown LED mode: {s}"))
}

fn parse_buzzer_mode(s: &str) -> Result<BuzzerMode, String> {
    BuzzerMode::from_name(s).ok_or_else(|| format!("unknown buzzer mode: {s}"))
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    panel: Option<PanelToml>,
    relay: Option<RelayToml>,
}

#[derive(Debug, Deserialize)]
struct PanelToml {
    serial_port: String,
    #[serde(default = "default_baud_rate")]
    baud_rate: u32,
}

fn default_baud_rate() -> u32 {
    PANEL_BAUD_RATE
}

#[derive(Debug, Deserialize)]
struct RelayToml {
    ip_address: String,
    #[serde(default = "default_relay_port")]
    tcp_port: u16,
    #[serde(default = "default_device_id")]
    device_id: u8,
    #[serde(default = "default_relay_timeout")]
    timeout_ms: u64,
}

fn default_relay_port() -> u16 {
    RELAY_TCP_PORT
}
fn default_device_id() -> u8 {
    DEFAULT_RELAY_DEVICE_ID
}
fn default_relay_timeout() -> u64 {
    RELAY_TIMEOUT.as_millis() as u64
}

fn build_panel_config(config: &Config) -> Result<PanelConfig> {
    let toml = config
        .panel
        .as_ref()
        .context("No [panel] section in config file")?;
    Ok(PanelConfig::builder()
        .serial_port(&toml.serial_port)
        .baud_rate(toml.baud_rate)
        .build())
}

fn build_relay_config(config: &Config) -> Result<RelayConfig> {
    let toml = config
        .relay
        .as_ref()
        .context("No [relay] section in config file")?;
    Ok(RelayConfig::builder()
        .ip_address(&toml.ip_address)
        .tcp_port(toml.tcp_port)
        .device_id(toml.device_id)
        .timeout_ms(toml.timeout_ms)
        .build())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn describe<T>(mode: kb_link::Result<T>, name: impl Fn(&T) -> &'static str) -> String {
    match mode {
        Ok(m) => name(&m).to_string(),
        Err(KbError::UnknownMode { byte }) => format!("unknown (0x{byte:02X})"),
        Err(e) => format!("error: {e}"),
    }
}

async fn print_status(panel: &PanelController) {
    for color in LedColor::ALL {
        let mode = panel.get_led_mode(color).await;
        println!("{:<7} {}", color.as_str(), describe(mode, LedMode::as_str));
    }
    let buzzer = panel.get_buzzer_mode().await;
    println!("{:<7} {}", "BUZZER", describe(buzzer, BuzzerMode::as_str));
}

async fn open_panel(config: &Config) -> Result<PanelController> {
    PanelController::connect(build_panel_config(config)?)
        .await
        .context("Failed to open panel")
}

async fn run_watch(panel: PanelController) -> Result<()> {
    let mut events = panel.subscribe();
    panel.add_listener(Arc::new(|card_id: &str| println!("CARD    {card_id}")));

    info!("Watching panel, press Ctrl+C to stop");
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(PanelEvent::StatusSynced(_)) => print_status(&panel).await,
                Ok(PanelEvent::CardScanned { card_id }) => debug!("Card event {card_id}"),
                Ok(PanelEvent::LinkDown { reason }) => anyhow::bail!("Panel link down: {reason}"),
                Err(RecvError::Lagged(n)) => warn!("Dropped {n} panel events"),
                Err(RecvError::Closed) => anyhow::bail!("Panel event channel closed"),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                return Ok(());
            }
        }
    }
}

async fn run_status(panel: PanelController) -> Result<()> {
    let mut events = panel.subscribe();
    // The status request sent on connect may already have been answered.
    panel.request_status().await?;

    let synced = timeout(Duration::from_secs(2), async {
        loop {
            match events.recv().await {
                Ok(PanelEvent::StatusSynced(_)) => return true,
                Ok(PanelEvent::LinkDown { .. }) | Err(RecvError::Closed) => return false,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
            }
        }
    })
    .await
    .unwrap_or(false);

    if !synced {
        warn!("Panel did not report its status; showing last known values");
    }
    print_status(&panel).await;
    Ok(())
}

async fn run_relay(relay: RelayController, action: RelayAction) -> Result<()> {
    match action {
        RelayAction::On { port } => {
            relay.on(port).await?;
            println!("Relay {port} on");
        }
        RelayAction::Off { port } => {
            relay.off(port).await?;
            println!("Relay {port} off");
        }
        RelayAction::Probe => {
            relay
                .probe()
                .await
                .with_context(|| format!("Relay board at {} unreachable", relay.config().address()))?;
            println!("Relay board at {} is reachable", relay.config().address());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=kb_link=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();

    let config_text =
        std::fs::read_to_string(&cli.config).context("Failed to read config file")?;
    let config: Config = toml::from_str(&config_text).context("Failed to parse config file")?;

    match cli.command {
        Cmd::Watch => run_watch(open_panel(&config).await?).await,
        Cmd::Status => run_status(open_panel(&config).await?).await,
        Cmd::Led { color, mode } => {
            let panel = open_panel(&config).await?;
            panel.set_led_mode(color, mode).await?;
            println!("{} LED {}", color.as_str(), mode.as_str());
            Ok(())
        }
        Cmd::Buzzer { mode } => {
            let panel = open_panel(&config).await?;
            panel.set_buzzer_mode(mode).await?;
            println!("Buzzer {}", mode.as_str());
            Ok(())
        }
        Cmd::Relay { action } => {
            let relay = RelayController::new(build_relay_config(&config)?);
            run_relay(relay, action).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
            [panel]
            serial_port = "/dev/ttyUSB1"

            [relay]
            ip_address = "10.0.0.5"
            device_id = 2
            "#,
        )
        .unwrap();

        let panel = build_panel_config(&config).unwrap();
        assert_eq!(panel.serial_port, "/dev/ttyUSB1");
        assert_eq!(panel.baud_rate, 19200);

        let relay = build_relay_config(&config).unwrap();
        assert_eq!(relay.address(), "10.0.0.5:2000");
        assert_eq!(relay.device_id, 2);
        assert_eq!(relay.timeout_ms, 1000);
    }

    #[test]
    fn test_missing_section() {
        let config: Config = toml::from_str("[relay]\nip_address = \"10.0.0.5\"\n").unwrap();
        assert!(build_panel_config(&config).is_err());
        assert!(build_relay_config(&config).is_ok());
    }

    #[test]
    fn test_value_parsers() {
        assert_eq!(parse_led_color("red"), Ok(LedColor::Red));
        assert_eq!(parse_led_mode("BLINK"), Ok(LedMode::Blink));
        assert_eq!(parse_buzzer_mode("long"), Ok(BuzzerMode::Long));
        assert!(parse_led_mode("dim").is_err());
    }

    #[test]
    fn test_describe_unknown_mode() {
        let unknown: kb_link::Result<LedMode> = Err(KbError::UnknownMode { byte: 0 });
        assert_eq!(describe(unknown, LedMode::as_str), "unknown (0x00)");
        assert_eq!(describe(Ok(LedMode::On), LedMode::as_str), "ON");
    }
}
