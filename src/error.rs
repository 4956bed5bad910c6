// MIT License - Copyright (c) 2026 The kb-link Authors

/// All errors that can occur in the kb-link library.
#[derive(Debug, thiserror::Error)]
pub enum KbError {
    #[error("Cannot open {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport I/O error: {0}")]
    TransportIo(#[from] std::io::Error),

    #[error("Timed out during {operation}")]
    Timeout { operation: &'static str },

    #[error("Unknown mode byte: 0x{byte:02X}")]
    UnknownMode { byte: u8 },

    #[error("Invalid relay port: {port} (valid: 1..={max})")]
    InvalidPort { port: u8, max: u8 },
}

impl KbError {
    /// Whether this error came from the transport rather than from the caller's input
    /// or stored device state.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            KbError::Connection { .. } | KbError::TransportIo(_) | KbError::Timeout { .. }
        )
    }

    pub(crate) fn connection(target: impl Into<String>, source: std::io::Error) -> Self {
        KbError::Connection {
            target: target.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, KbError>;
