//! Wire protocol between planbench and the document store.
//!
//! Messages are JSON documents framed as a 4-byte big-endian length
//! prefix followed by the body.

use bytes::{Buf, BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BenchError, Result};
use crate::model::{IndexModel, IndexSpec, SortSpec};

/// Hard cap on a single frame; anything larger is a corrupt stream.
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Wire protocol request messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Initial handshake
    Hello {
        client_name: String,
    },

    /// Health check
    Ping,

    /// Graceful disconnect
    Disconnect,

    /// Explain a find-style query with execution statistics
    ExplainFind {
        collection: String,
        filter: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sort: Option<SortSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        projection: Option<Value>,
    },

    /// Explain an aggregation pipeline with execution statistics
    ExplainAggregate {
        collection: String,
        pipeline: Vec<Value>,
    },

    /// Enumerate the collection's index catalog
    ListIndexes {
        collection: String,
    },

    /// Create an index with the given field specification
    CreateIndex {
        collection: String,
        key: IndexSpec,
    },

    /// Drop an index by name
    DropIndex {
        collection: String,
        name: String,
    },
}

/// Wire protocol response messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Welcome {
        server_version: String,
        server_timestamp: u64,
    },

    Pong {
        timestamp: u64,
    },

    /// The raw explain report for an ExplainFind/ExplainAggregate request
    Explain {
        payload: Value,
    },

    IndexList {
        indexes: Vec<IndexModel>,
    },

    IndexCreated {
        name: String,
    },

    IndexDropped {
        name: String,
    },

    // Generic success acknowledgment
    Ok,

    Error {
        code: u16,
        message: String,
    },
}

/// Encodes protocol messages into length-prefixed frames.
#[derive(Debug, Default)]
pub struct ProtocolEncoder;

impl ProtocolEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode_request(&self, request: &Request) -> Result<BytesMut> {
        encode_frame(request)
    }

    pub fn encode_response(&self, response: &Response) -> Result<BytesMut> {
        encode_frame(response)
    }
}

/// Decodes length-prefixed frames into protocol messages.
///
/// Returns `Ok(None)` while the buffer holds an incomplete frame; the
/// caller reads more bytes and retries.
#[derive(Debug, Default)]
pub struct ProtocolDecoder;

impl ProtocolDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode_request(&self, buf: &mut BytesMut) -> Result<Option<Request>> {
        decode_frame(buf)
    }

    pub fn decode_response(&self, buf: &mut BytesMut) -> Result<Option<Response>> {
        decode_frame(buf)
    }
}

fn encode_frame<T: Serialize>(message: &T) -> Result<BytesMut> {
    let body = serde_json::to_vec(message)
        .map_err(|e| BenchError::Protocol(format!("encode failed: {e}")))?;
    if body.len() > MAX_FRAME_SIZE {
        return Err(BenchError::Protocol(format!(
            "frame of {} bytes exceeds the {MAX_FRAME_SIZE} byte limit",
            body.len()
        )));
    }

    let mut buf = BytesMut::with_capacity(4 + body.len());
    buf.put_u32(body.len() as u32);
    buf.put_slice(&body);
    Ok(buf)
}

fn decode_frame<T: DeserializeOwned>(buf: &mut BytesMut) -> Result<Option<T>> {
    if buf.len() < 4 {
        return Ok(None);
    }

    let mut header = &buf[..4];
    let len = header.get_u32() as usize;
    if len > MAX_FRAME_SIZE {
        return Err(BenchError::Protocol(format!(
            "frame of {len} bytes exceeds the {MAX_FRAME_SIZE} byte limit"
        )));
    }

    if buf.len() < 4 + len {
        return Ok(None);
    }

    buf.advance(4);
    let body = buf.split_to(len);
    let message = serde_json::from_slice(&body)
        .map_err(|e| BenchError::Protocol(format!("decode failed: {e}")))?;
    Ok(Some(message))
}
