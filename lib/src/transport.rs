// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Generic transport abstraction for hiding underlying transport types
//!
//! The core exchanges framed APDU commands over an opaque bidirectional byte
//! channel; HID / TCP / speculos transports are provided by the embedding
//! application. The core imposes no timeouts and never retries — the
//! transport owns its own policy.

use async_trait::async_trait;

/// Byte-exchange channel to a connected device
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Exchange a framed request for a raw response.
    ///
    /// The request is a complete framed APDU of at most 512 bytes; the
    /// response includes the trailing status word.
    async fn exchange(&self, command: &[u8]) -> Result<Vec<u8>, TransportError>;
}

/// Opaque transport failure
#[derive(Debug, thiserror::Error)]
#[error("transport error: {0}")]
pub struct TransportError(#[from] pub anyhow::Error);

impl TransportError {
    /// Wrap a transport-specific failure
    pub fn new(e: impl Into<anyhow::Error>) -> Self {
        Self(e.into())
    }
}
