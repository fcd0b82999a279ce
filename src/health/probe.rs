// src/health/probe.rs

//! One-byte TCP health protocol.
//!
//! Connect, read exactly one byte, disconnect. There is no request payload.
//! The byte is [`STATUS_OK`](super::STATUS_OK) when the last run succeeded
//! (or none has run yet) and [`STATUS_FAILED`](super::STATUS_FAILED)
//! otherwise.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::HealthMode;
use crate::errors::{Result, TickerdError};
use crate::fs::FileSystem;
use crate::health::{HealthFile, HealthReader};

/// How long the probe client waits for the connection and the status byte.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Background listener serving the status byte.
///
/// Dropping the server stops accepting connections.
#[derive(Debug)]
pub struct ProbeServer {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl ProbeServer {
    /// Bind `addr` and start answering probes from `reader`.
    pub async fn bind(addr: SocketAddr, reader: HealthReader) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TickerdError::HealthBind { addr, source })?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "health probe listener started");

        let task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        let byte = reader.status_byte();
                        tokio::spawn(answer(stream, peer, byte));
                    }
                    Err(e) => {
                        warn!(error = %e, "accepting health probe connection failed");
                        // Back off so a persistent error (e.g. EMFILE) does not spin.
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
        });

        Ok(Self { local_addr, task })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for ProbeServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn answer(mut stream: TcpStream, peer: SocketAddr, byte: u8) {
    debug!(%peer, status = byte, "answering health probe");
    if let Err(e) = stream.write_all(&[byte]).await {
        debug!(%peer, error = %e, "writing health status failed");
        return;
    }
    let _ = stream.shutdown().await;
}

/// Query a health endpoint over TCP and return its status byte.
pub async fn probe_tcp(addr: SocketAddr, limit: Duration) -> anyhow::Result<u8> {
    let mut stream = timeout(limit, TcpStream::connect(addr))
        .await
        .with_context(|| format!("connecting to {addr} timed out"))?
        .with_context(|| format!("connecting to {addr}"))?;

    let mut buf = [0u8; 1];
    timeout(limit, stream.read_exact(&mut buf))
        .await
        .with_context(|| format!("reading status from {addr} timed out"))?
        .with_context(|| format!("reading status from {addr}"))?;

    Ok(buf[0])
}

/// Run the `--healthcheck` probe for the configured mode.
///
/// File mode never fails: a missing sentinel means healthy. TCP mode
/// returns an error when the endpoint cannot be reached.
pub async fn probe(mode: &HealthMode, fs: Arc<dyn FileSystem>) -> Result<u8> {
    match mode {
        HealthMode::Disabled => Err(TickerdError::Usage(
            "--healthcheck requires --healthcheck-file or --healthcheck-addr".to_string(),
        )),
        HealthMode::File(path) => Ok(HealthFile::new(path.clone(), fs).status_byte()),
        HealthMode::Tcp(addr) => Ok(probe_tcp(addr.dial_addr(), PROBE_TIMEOUT).await?),
    }
}
