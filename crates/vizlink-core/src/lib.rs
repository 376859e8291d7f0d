//! Vizlink Core - Fundamental types shared across the client
//!
//! This crate defines the vocabulary of the remote visualization protocol:
//! - Request, message, and status enumerations with their wire discriminants
//! - Object, shape, and visual-marker kind enumerations
//! - The error taxonomy (connection / protocol / decode)

pub mod error;
pub mod protocol;

pub use error::*;
pub use protocol::*;
