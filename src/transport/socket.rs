// MIT License - Copyright (c) 2026 The kb-link Authors

use std::io;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, error};

use crate::error::{KbError, Result};

/// Connect to `address`, bounded by `deadline`.
///
/// A refused or timed out connect is reported as [`KbError::Connection`].
pub async fn connect(address: &str, deadline: Duration) -> Result<TcpStream> {
    match timeout(deadline, TcpStream::connect(address)).await {
        Ok(Ok(stream)) => {
            debug!("Connected to {}", address);
            Ok(stream)
        }
        Ok(Err(e)) => {
            error!("TCP connect to {} failed: {}", address, e);
            Err(KbError::connection(address, e))
        }
        Err(_) => {
            error!("TCP connect to {} timed out", address);
            Err(KbError::connection(
                address,
                io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
            ))
        }
    }
}

/// Open a fresh connection, write `frame`, and close it again.
///
/// Nothing is read back; the relay board does not answer.
pub async fn send_once(address: &str, frame: &[u8], deadline: Duration) -> Result<()> {
    let mut stream = connect(address, deadline).await?;

    let write = async {
        stream.write_all(frame).await?;
        stream.flush().await?;
        stream.shutdown().await
    };

    match timeout(deadline, write).await {
        Ok(Ok(())) => {
            debug!("Sent {} bytes to {}: {:02X?}", frame.len(), address, frame);
            Ok(())
        }
        Ok(Err(e)) => {
            error!("Write to {} failed: {}", address, e);
            Err(KbError::TransportIo(e))
        }
        Err(_) => {
            error!("Write to {} timed out", address);
            Err(KbError::Timeout {
                operation: "socket write",
            })
        }
    }
}
