// MIT License - Copyright (c) 2026 The kb-link Authors

use crate::constants::{
    BUZZER_INDEX, ETX, RELAY_FRAME_LEN, RELAY_PORTS, RELAY_PREAMBLE, RELAY_SET_PORT, STATUS_LEN,
    STX, TAG_STATUS, UNCHANGED,
};
use crate::error::{KbError, Result};

/// The three LEDs on the panel, in status-vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedColor {
    Green,
    Orange,
    Red,
}

impl LedColor {
    pub const ALL: [LedColor; 3] = [LedColor::Green, LedColor::Orange, LedColor::Red];

    /// Position of this LED in the status vector and in set commands.
    pub fn index(&self) -> usize {
        match self {
            Self::Green => 0,
            Self::Orange => 1,
            Self::Red => 2,
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GREEN" => Some(Self::Green),
            "ORANGE" => Some(Self::Orange),
            "RED" => Some(Self::Red),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Orange => "ORANGE",
            Self::Red => "RED",
        }
    }
}

/// LED mode, wire-encoded as an ASCII digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LedMode {
    Off = b'0',
    On = b'1',
    Blink = b'2',
}

impl LedMode {
    pub const ALL: [LedMode; 3] = [LedMode::Off, LedMode::On, LedMode::Blink];

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn is_on(self) -> bool {
        self != Self::Off
    }

    /// Parse a mode name (`OFF`, `ON`, `BLINK`), case-insensitive.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OFF" => Some(Self::Off),
            "ON" => Some(Self::On),
            "BLINK" => Some(Self::Blink),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
            Self::Blink => "BLINK",
        }
    }
}

impl TryFrom<u8> for LedMode {
    type Error = KbError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            b'0' => Ok(Self::Off),
            b'1' => Ok(Self::On),
            b'2' => Ok(Self::Blink),
            _ => Err(KbError::UnknownMode { byte }),
        }
    }
}

/// Buzzer mode, wire-encoded as an ASCII digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BuzzerMode {
    Off = b'0',
    On = b'1',
    Short = b'2',
    Long = b'3',
    ContinuousPulse = b'4',
}

impl BuzzerMode {
    pub const ALL: [BuzzerMode; 5] = [
        BuzzerMode::Off,
        BuzzerMode::On,
        BuzzerMode::Short,
        BuzzerMode::Long,
        BuzzerMode::ContinuousPulse,
    ];

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn is_on(self) -> bool {
        self != Self::Off
    }

    /// Parse a mode name (`OFF`, `ON`, `SHORT`, `LONG`, `CONTINUOUS_PULSE`), case-insensitive.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OFF" => Some(Self::Off),
            "ON" => Some(Self::On),
            "SHORT" => Some(Self::Short),
            "LONG" => Some(Self::Long),
            "CONTINUOUS_PULSE" => Some(Self::ContinuousPulse),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
            Self::Short => "SHORT",
            Self::Long => "LONG",
            Self::ContinuousPulse => "CONTINUOUS_PULSE",
        }
    }
}

impl TryFrom<u8> for BuzzerMode {
    type Error = KbError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            b'0' => Ok(Self::Off),
            b'1' => Ok(Self::On),
            b'2' => Ok(Self::Short),
            b'3' => Ok(Self::Long),
            b'4' => Ok(Self::ContinuousPulse),
            _ => Err(KbError::UnknownMode { byte }),
        }
    }
}

/// Client-side copy of the panel's `[green, orange, red, buzzer]` mode bytes.
///
/// Starts out unknown (all zero bytes), so every query fails with
/// [`KbError::UnknownMode`] until the first status reply arrives or a
/// command overwrites the corresponding byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusVector([u8; STATUS_LEN]);

impl StatusVector {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: [u8; STATUS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; STATUS_LEN] {
        &self.0
    }

    pub fn led(&self, color: LedColor) -> Result<LedMode> {
        LedMode::try_from(self.0[color.index()])
    }

    pub fn buzzer(&self) -> Result<BuzzerMode> {
        BuzzerMode::try_from(self.0[BUZZER_INDEX])
    }

    pub fn set_led(&mut self, color: LedColor, mode: LedMode) {
        self.0[color.index()] = mode.as_byte();
    }

    pub fn set_buzzer(&mut self, mode: BuzzerMode) {
        self.0[BUZZER_INDEX] = mode.as_byte();
    }
}

/// Commands that can be sent to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    /// `STX S ETX` — ask the panel to report its status vector.
    QueryStatus,
    /// `STX <4 bytes> ETX` with the LED's byte set and the rest left as `X`.
    SetLed { color: LedColor, mode: LedMode },
    /// `STX XXX<mode> ETX`
    SetBuzzer { mode: BuzzerMode },
}

impl PanelCommand {
    /// The bytes between STX and ETX.
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Self::QueryStatus => vec![TAG_STATUS],
            Self::SetLed { color, mode } => {
                let mut cmd = [UNCHANGED; STATUS_LEN];
                cmd[color.index()] = mode.as_byte();
                cmd.to_vec()
            }
            Self::SetBuzzer { mode } => {
                let mut cmd = [UNCHANGED; STATUS_LEN];
                cmd[BUZZER_INDEX] = mode.as_byte();
                cmd.to_vec()
            }
        }
    }

    /// The complete frame as written to the serial line.
    pub fn to_frame(&self) -> Vec<u8> {
        let payload = self.payload();
        let mut frame = Vec::with_capacity(payload.len() + 2);
        frame.push(STX);
        frame.extend_from_slice(&payload);
        frame.push(ETX);
        frame
    }

    /// Apply the optimistic local effect of this command to a status vector.
    pub fn apply(&self, status: &mut StatusVector) {
        match *self {
            Self::QueryStatus => {}
            Self::SetLed { color, mode } => status.set_led(color, mode),
            Self::SetBuzzer { mode } => status.set_buzzer(mode),
        }
    }
}

/// Check a 1-based relay port number and return its 0-based index.
pub fn relay_port_index(port: u8) -> Result<usize> {
    if port == 0 || port > RELAY_PORTS {
        return Err(KbError::InvalidPort {
            port,
            max: RELAY_PORTS,
        });
    }
    Ok((port - 1) as usize)
}

/// Unsigned 8-bit sum of all bytes.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// A "set port" command for the relay board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayCommand {
    pub device_id: u8,
    pub port: u8,
    pub on: bool,
}

impl RelayCommand {
    pub fn new(device_id: u8, port: u8, on: bool) -> Result<Self> {
        relay_port_index(port)?;
        Ok(Self { device_id, port, on })
    }

    /// `55 AA <device_id> 02 00 <port> <state> <checksum>`
    pub fn to_frame(&self) -> [u8; RELAY_FRAME_LEN] {
        let mut frame = [0u8; RELAY_FRAME_LEN];
        frame[..2].copy_from_slice(&RELAY_PREAMBLE);
        frame[2] = self.device_id;
        frame[3..5].copy_from_slice(&RELAY_SET_PORT);
        frame[5] = self.port;
        frame[6] = u8::from(self.on);
        frame[7] = checksum(&frame[..7]);
        frame
    }
}
