//! Vizlink Transport - blocking TCP link to the simulation server
//!
//! One connection, synchronous request/response. Outbound requests are raw
//! byte writes; inbound frames arrive as fixed-size packets whose trailing
//! byte says whether more packets belong to the current frame.

pub mod tcp;

pub use tcp::{
    packetize, TcpTransport, TransportConfig, CONTINUATION_MARKER, FINAL_MARKER, MAX_PACKET_SIZE,
    PACKET_PAYLOAD_SIZE,
};
