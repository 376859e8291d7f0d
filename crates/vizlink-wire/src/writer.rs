//! Mirror encoder for the wire format
//!
//! Production code only ever encodes requests (a 4-byte kind, optionally one
//! f64). The full writer exists so test servers can compose every inbound
//! message the client decodes.

use bytes::{BufMut, Bytes, BytesMut};
use vizlink_core::ClientRequest;

/// Little-endian encoder over a growable buffer.
#[derive(Default)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    pub fn new() -> Self {
        WireWriter {
            buf: BytesMut::new(),
        }
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn put_i32(&mut self, v: i32) {
        self.buf.put_i32_le(v);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.put_u32_le(v);
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.put_u64_le(v);
    }

    pub fn put_i64(&mut self, v: i64) {
        self.buf.put_i64_le(v);
    }

    pub fn put_f32(&mut self, v: f32) {
        self.buf.put_f32_le(v);
    }

    pub fn put_f64(&mut self, v: f64) {
        self.buf.put_f64_le(v);
    }

    pub fn put_bool(&mut self, v: bool) {
        self.buf.put_u8(v as u8);
    }

    /// u64 length prefix + UTF-8 bytes, no terminator.
    pub fn put_str(&mut self, s: &str) {
        self.buf.put_u64_le(s.len() as u64);
        self.buf.put_slice(s.as_bytes());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Encode an outbound request. Every request is its 4-byte kind;
/// `ChangeRealtimeFactor` carries the factor as one trailing f64.
pub fn encode_request(request: ClientRequest) -> Bytes {
    let mut w = WireWriter::new();
    w.put_i32(request.to_i32());
    w.into_bytes()
}

/// Encode the realtime-factor change request with its payload.
pub fn encode_realtime_factor(factor: f64) -> Bytes {
    let mut w = WireWriter::new();
    w.put_i32(ClientRequest::ChangeRealtimeFactor.to_i32());
    w.put_f64(factor);
    w.into_bytes()
}
