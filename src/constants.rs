// MIT License - Copyright (c) 2026 The kb-link Authors
// Wire constants for the KB panel and KB relay board

use std::time::Duration;

/// Panel framing bytes.
pub const STX: u8 = 0x02; // Start of frame
pub const ETX: u8 = 0x03; // End of frame

/// Tag byte of a status request/reply frame (`S`).
pub const TAG_STATUS: u8 = b'S';
/// Tag byte of a card-scan frame (`C`).
pub const TAG_CARD: u8 = b'C';

/// Total length of a status-sync frame: STX, 'S', 4 status bytes, ETX.
pub const STATUS_FRAME_LEN: usize = 7;
/// Total length of a card-scan frame: STX, 'C', 8 card-id bytes, ETX.
pub const CARD_FRAME_LEN: usize = 11;

/// Number of bytes in the panel status vector (3 LEDs + buzzer).
pub const STATUS_LEN: usize = 4;
/// Number of characters in a card identifier.
pub const CARD_ID_LEN: usize = 8;

/// Pending bytes the frame codec keeps before discarding them as noise.
/// Far above any valid frame, so only a stream with no usable framing hits it.
pub const FRAME_BUFFER_LIMIT: usize = 1024;

/// Placeholder byte meaning "leave this channel unchanged" in a set command.
pub const UNCHANGED: u8 = b'X';

/// Index of the buzzer byte inside the status vector.
pub const BUZZER_INDEX: usize = 3;

/// Serial line speed of the panel.
pub const PANEL_BAUD_RATE: u32 = 19_200;

/// Relay frame preamble.
pub const RELAY_PREAMBLE: [u8; 2] = [0x55, 0xAA];
/// Relay "set port" opcode, followed by a reserved zero byte.
pub const RELAY_SET_PORT: [u8; 2] = [0x02, 0x00];
/// Total length of a relay command frame including the checksum.
pub const RELAY_FRAME_LEN: usize = 8;

/// Number of relay ports on the board (numbered 1..=8).
pub const RELAY_PORTS: u8 = 8;
/// Device id used when none is configured.
pub const DEFAULT_RELAY_DEVICE_ID: u8 = 1;
/// TCP port of the serial-over-socket bridge on the relay board.
pub const RELAY_TCP_PORT: u16 = 2000;
/// Connect/IO deadline for one relay command.
pub const RELAY_TIMEOUT: Duration = Duration::from_secs(1);
