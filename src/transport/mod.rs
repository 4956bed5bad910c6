// MIT License - Copyright (c) 2026 The kb-link Authors

pub mod serial;
pub mod socket;

use tokio::io::{AsyncRead, AsyncWrite};

/// Byte stream a panel controller can run on.
///
/// Implemented for every tokio stream: the native serial port, a TCP
/// socket to a serial server, or an in-memory duplex pipe in tests.
pub trait PanelStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> PanelStream for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}
