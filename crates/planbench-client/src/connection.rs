//! Connection management for the planbench client
//!
//! Handles establishing and maintaining a plain TCP connection to the
//! document store.

use std::time::Duration;

use bytes::BytesMut;
use planbench_common::{
    BenchError, Result,
    protocol::{ProtocolDecoder, ProtocolEncoder, Request, Response},
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A connection to a document store server.
pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    encoder: ProtocolEncoder,
    decoder: ProtocolDecoder,
}

impl Connection {
    /// Establish a new plain TCP connection to the server.
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| BenchError::Network("Connection timeout".into()))?
            .map_err(|e| BenchError::Network(format!("Failed to connect: {e}")))?;

        stream.set_nodelay(true)?;

        let mut conn = Self {
            stream,
            buffer: BytesMut::with_capacity(8192),
            encoder: ProtocolEncoder::new(),
            decoder: ProtocolDecoder::new(),
        };

        // Perform handshake
        conn.handshake().await?;

        Ok(conn)
    }

    async fn handshake(&mut self) -> Result<()> {
        let request = Request::Hello {
            client_name: format!("planbench/{}", env!("CARGO_PKG_VERSION")),
        };

        let response = self.send_request(request).await?;

        match response {
            Response::Welcome { server_version, .. } => {
                tracing::debug!(%server_version, "connected to document store");
                Ok(())
            }
            Response::Error { message, .. } => {
                Err(BenchError::Network(format!("Handshake failed: {message}")))
            }
            _ => Err(BenchError::Network("Unexpected handshake response".into())),
        }
    }

    pub(crate) async fn send_request(&mut self, request: Request) -> Result<Response> {
        // Encode and send
        let bytes = self.encoder.encode_request(&request)?;
        self.stream
            .write_all(&bytes)
            .await
            .map_err(|e| BenchError::Network(format!("Write failed: {e}")))?;

        // Read response
        loop {
            if let Some(response) = self.decoder.decode_response(&mut self.buffer)? {
                return Ok(response);
            }

            let n = self
                .stream
                .read_buf(&mut self.buffer)
                .await
                .map_err(|e| BenchError::Network(format!("Read failed: {e}")))?;

            if n == 0 {
                return Err(BenchError::Network("Connection closed".into()));
            }
        }
    }

    /// Ping the server, returning its timestamp.
    pub async fn ping(&mut self) -> Result<u64> {
        let response = self.send_request(Request::Ping).await?;

        match response {
            Response::Pong { timestamp } => Ok(timestamp),
            Response::Error { message, .. } => Err(BenchError::Network(message)),
            _ => Err(BenchError::Network("Unexpected ping response".into())),
        }
    }

    /// Send a graceful disconnect. Errors are ignored; the stream is
    /// dropped either way.
    pub async fn close(&mut self) {
        let _ = self.send_request(Request::Disconnect).await;
    }
}
