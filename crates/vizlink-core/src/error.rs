//! Error types for the vizlink client

use thiserror::Error;

/// Client errors, grouped into the three protocol-level categories:
/// connection failures, protocol violations, and decode failures.
#[derive(Error, Debug)]
pub enum VizError {
    // Connection errors
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("Not connected")]
    NotConnected,

    #[error("No reply from server within the read timeout")]
    ReplyTimeout,

    // Protocol errors
    #[error("Server is terminating")]
    ServerTerminating,

    #[error("Unexpected message: expected {expected}, got {got}")]
    UnexpectedMessage {
        expected: &'static str,
        got: &'static str,
    },

    #[error("Unknown object in scene update: {0}")]
    UnknownObject(String),

    #[error("Bad shape parameter count for {shape}: expected {expected}, got {got}")]
    BadShapeParams {
        shape: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Unsupported {what} kind on the wire: {kind}")]
    UnsupportedKind { what: &'static str, kind: &'static str },

    #[error("Object count mismatch: server announced {announced}, client holds {held}")]
    ObjectCountMismatch { announced: u64, held: u64 },

    #[error("Height map sample count mismatch: {total} != {x} x {y}")]
    HeightMapSampleMismatch { total: u64, x: u64, y: u64 },

    #[error("Renderer rejected {name}: {reason}")]
    RendererRejected { name: String, reason: String },

    // Decode errors
    #[error("Buffer underrun at offset {offset}: need {needed} more bytes, {available} available")]
    BufferUnderrun {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Malformed length prefix at offset {offset}: {length} exceeds remaining buffer")]
    MalformedLength { offset: usize, length: u64 },

    #[error("Invalid UTF-8 in text field at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("Unknown {what} discriminant: {value}")]
    UnknownDiscriminant { what: &'static str, value: i32 },
}

impl VizError {
    /// True for errors in the decode category. Decode errors are always
    /// fatal to the current frame; partially decoded messages are never
    /// applied to the scene.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            VizError::BufferUnderrun { .. }
                | VizError::MalformedLength { .. }
                | VizError::InvalidUtf8 { .. }
                | VizError::UnknownDiscriminant { .. }
        )
    }

    /// True for socket-level failures.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            VizError::Connection(_)
                | VizError::ConnectionClosed
                | VizError::NotConnected
                | VizError::ReplyTimeout
        )
    }
}

/// Result type for vizlink operations
pub type VizResult<T> = Result<T, VizError>;
