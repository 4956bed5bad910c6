// MIT License - Copyright (c) 2026 The kb-link Authors

use tracing::{debug, trace, warn};

use crate::constants::{
    CARD_FRAME_LEN, CARD_ID_LEN, ETX, FRAME_BUFFER_LIMIT, STATUS_FRAME_LEN, STATUS_LEN, STX,
    TAG_CARD, TAG_STATUS,
};
use crate::protocol::StatusVector;

/// A decoded inbound panel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelMessage {
    /// Full status vector reported by the panel.
    StatusSync(StatusVector),
    /// A card was presented to the reader.
    CardScan(String),
}

/// Reassembles the panel's STX/ETX framed byte stream.
///
/// The buffer belongs to one connection; create a new codec (or call
/// [`FrameCodec::reset`]) when the link is reopened.
#[derive(Debug, Default)]
pub struct FrameCodec {
    buffer: Vec<u8>,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk read from the transport and return every message that is now complete.
    ///
    /// Leftover bytes beyond [`FRAME_BUFFER_LIMIT`] (noise without STX, or an
    /// STX never followed by ETX) are discarded.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<PanelMessage> {
        self.buffer.extend_from_slice(chunk);

        let mut messages = Vec::new();
        while let Some(frame) = self.next_frame() {
            match classify(&frame) {
                Some(msg) => messages.push(msg),
                None => debug!("Dropping unrecognised panel frame: {:02X?}", frame),
            }
        }

        if self.buffer.len() > FRAME_BUFFER_LIMIT {
            warn!(
                "Discarding {} buffered bytes with no complete frame",
                self.buffer.len()
            );
            self.buffer.clear();
        }
        messages
    }

    /// Split the next complete frame off the front of the buffer.
    ///
    /// Bytes before the first STX are discarded. An ETX sitting at position 0
    /// does not terminate a frame: it is only removed once a later STX trims it.
    fn next_frame(&mut self) -> Option<Vec<u8>> {
        if let Some(stx_pos) = self.buffer.iter().position(|&b| b == STX)
            && stx_pos > 0
        {
            trace!("Resync: discarding {} bytes before STX", stx_pos);
            self.buffer.drain(..stx_pos);
        }

        match self.buffer.iter().position(|&b| b == ETX) {
            Some(etx_pos) if etx_pos > 0 => Some(self.buffer.drain(..=etx_pos).collect()),
            _ => None,
        }
    }

    /// Number of bytes waiting for a frame to complete.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

/// Turn a complete frame (STX..=ETX) into a message.
///
/// Only two shapes are recognised: `S` with 7 bytes total and `C` with 11
/// bytes total. Everything else yields `None`.
pub fn classify(frame: &[u8]) -> Option<PanelMessage> {
    match (frame.get(1).copied(), frame.len()) {
        (Some(TAG_STATUS), STATUS_FRAME_LEN) => {
            let mut status = [0u8; STATUS_LEN];
            status.copy_from_slice(&frame[2..2 + STATUS_LEN]);
            Some(PanelMessage::StatusSync(StatusVector::from_bytes(status)))
        }
        (Some(TAG_CARD), CARD_FRAME_LEN) => Some(PanelMessage::CardScan(
            String::from_utf8_lossy(&frame[2..2 + CARD_ID_LEN]).into_owned(),
        )),
        _ => None,
    }
}
