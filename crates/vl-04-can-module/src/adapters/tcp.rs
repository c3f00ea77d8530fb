//! Newline-delimited JSON over TCP.

use crate::error::TransportError;
use crate::ports::{BusConnector, FrameReader, FrameWriter};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info};

const DELIMITER: u8 = b'\n';

/// TCP bus connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpBusConfig {
    pub address: SocketAddr,
    pub connect_timeout: Duration,
    /// Largest accepted frame, excluding the delimiter.
    pub max_frame_len: usize,
}

impl TcpBusConfig {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            connect_timeout: Duration::from_secs(5),
            max_frame_len: 64 * 1024,
        }
    }
}

pub struct TcpBusConnector {
    config: TcpBusConfig,
}

impl TcpBusConnector {
    pub fn new(config: TcpBusConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BusConnector for TcpBusConnector {
    async fn connect(
        &self,
    ) -> Result<(Box<dyn FrameReader>, Box<dyn FrameWriter>), TransportError> {
        let stream = tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(self.config.address),
        )
        .await
        .map_err(|_| TransportError::Timeout)??;
        stream.set_nodelay(true)?;

        info!(address = %self.config.address, "Connected to CAN bus");
        let (read_half, write_half) = stream.into_split();
        let reader = TcpFrameReader {
            inner: BufReader::new(read_half),
            max_frame_len: self.config.max_frame_len,
        };
        let writer = TcpFrameWriter {
            inner: write_half,
            max_frame_len: self.config.max_frame_len,
        };
        Ok((Box::new(reader), Box::new(writer)))
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.config.address)
    }
}

struct TcpFrameReader {
    inner: BufReader<OwnedReadHalf>,
    max_frame_len: usize,
}

#[async_trait]
impl FrameReader for TcpFrameReader {
    async fn read_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            let mut frame = Vec::new();
            // Room for a full-size frame plus "\r\n".
            let limit = self.max_frame_len as u64 + 2;
            let read = (&mut self.inner)
                .take(limit)
                .read_until(DELIMITER, &mut frame)
                .await?;
            if read == 0 {
                return Ok(None);
            }

            if frame.last() == Some(&DELIMITER) {
                frame.pop();
                if frame.last() == Some(&b'\r') {
                    frame.pop();
                }
            }
            if frame.len() > self.max_frame_len {
                return Err(TransportError::FrameTooLarge {
                    len: frame.len(),
                    max: self.max_frame_len,
                });
            }

            if frame.is_empty() {
                debug!("Skipping empty line");
                continue;
            }
            return Ok(Some(frame));
        }
    }
}

struct TcpFrameWriter {
    inner: OwnedWriteHalf,
    max_frame_len: usize,
}

#[async_trait]
impl FrameWriter for TcpFrameWriter {
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if frame.len() > self.max_frame_len {
            return Err(TransportError::FrameTooLarge {
                len: frame.len(),
                max: self.max_frame_len,
            });
        }
        self.inner.write_all(frame).await?;
        self.inner.write_all(&[DELIMITER]).await?;
        self.inner.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}
