//! Vizlink Wire - byte-level decode and typed protocol records
//!
//! Layering, bottom up:
//! - [`reader`]: cursor-tracked little-endian primitive decode over a byte
//!   buffer, with hard bounds checks
//! - [`writer`]: the mirror encoder, used for outbound requests and by test
//!   servers
//! - [`records`]: variable-size protocol records (object/visual/pose/contact)
//! - [`message`]: the tagged-union server message decode

pub mod message;
pub mod records;
pub mod reader;
pub mod writer;

pub use message::*;
pub use records::*;
pub use reader::WireReader;
pub use writer::{encode_realtime_factor, encode_request, WireWriter};
