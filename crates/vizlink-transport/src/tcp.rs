//! TCP transport implementation
//!
//! Wire framing: the server sends every frame as a sequence of fixed-size
//! packets. The last byte of each packet is a marker; `CONTINUATION_MARKER`
//! means more packets follow for this frame, any other value closes it. The
//! payload of a frame is the concatenation of the packets' first
//! `PACKET_PAYLOAD_SIZE` bytes; the final packet is zero-padded.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use vizlink_core::{VizError, VizResult};

/// Fixed on-wire packet size, marker included.
pub const MAX_PACKET_SIZE: usize = 4096;

/// Size of the trailing marker byte.
const FOOTER_SIZE: usize = 1;

/// Payload bytes per packet.
pub const PACKET_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - FOOTER_SIZE;

/// Marker value meaning "more packets follow for this frame".
pub const CONTINUATION_MARKER: u8 = b'c';

/// Conventional marker for a frame's final packet. Any value other than
/// `CONTINUATION_MARKER` terminates the frame.
pub const FINAL_MARKER: u8 = 0;

/// Transport configuration. Address and port are mutable before
/// `connect()` only; changing them afterwards has no effect on the open
/// connection.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub address: String,
    pub port: u16,
    /// Wall-clock bound on waiting for a frame's first packet.
    pub read_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            address: "127.0.0.1".to_owned(),
            port: 8080,
            read_timeout: Duration::from_secs(5),
        }
    }
}

/// Blocking TCP transport with frame reassembly.
pub struct TcpTransport {
    config: TransportConfig,
    stream: Option<TcpStream>,
    packet: Box<[u8; MAX_PACKET_SIZE]>,
    assembly: BytesMut,
}

impl TcpTransport {
    pub fn new(config: TransportConfig) -> Self {
        TcpTransport {
            config,
            stream: None,
            packet: Box::new([0u8; MAX_PACKET_SIZE]),
            assembly: BytesMut::new(),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the connection. Idempotent if already connected.
    pub fn connect(&mut self) -> VizResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = TcpStream::connect((self.config.address.as_str(), self.config.port))
            .map_err(|e| VizError::Connection(e.to_string()))?;
        stream
            .set_read_timeout(Some(self.config.read_timeout))
            .map_err(|e| VizError::Connection(e.to_string()))?;
        stream.set_nodelay(true).ok();
        debug!(address = %self.config.address, port = self.config.port, "connected");
        self.stream = Some(stream);
        Ok(())
    }

    /// Release the connection. Best-effort; never fails.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.shutdown(Shutdown::Both).ok();
            debug!("connection closed");
        }
    }

    /// Non-blocking liveness probe. Peeks the socket without consuming data;
    /// a zero-length read signals an orderly remote close.
    pub fn is_alive(&self) -> bool {
        let Some(stream) = &self.stream else {
            return false;
        };
        if stream.set_nonblocking(true).is_err() {
            return false;
        }
        let mut byte = [0u8; 1];
        let alive = match stream.peek(&mut byte) {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::WouldBlock => true,
            Err(_) => false,
        };
        if stream.set_nonblocking(false).is_err() {
            return false;
        }
        alive
    }

    /// Write all request bytes. Blocks until the stream accepts them; there
    /// is no partial-write recovery beyond the OS's own retry and no bound on
    /// the stall (known limitation).
    pub fn write_request(&mut self, bytes: &[u8]) -> VizResult<()> {
        let stream = self.stream.as_mut().ok_or(VizError::NotConnected)?;
        stream
            .write_all(bytes)
            .map_err(|e| VizError::Connection(e.to_string()))
    }

    /// Reassemble one logical frame. Returns `Ok(None)` when no packet
    /// arrives within the configured timeout, so the caller can tell "nothing
    /// sent yet" apart from a failure.
    pub fn read_frame(&mut self) -> VizResult<Option<Bytes>> {
        // Fresh buffers every frame; a shorter frame must never expose bytes
        // of the previous one.
        self.packet.fill(0);
        self.assembly.clear();

        let mut first = true;
        loop {
            if !self.read_packet(first)? {
                return Ok(None);
            }
            first = false;
            let marker = self.packet[MAX_PACKET_SIZE - FOOTER_SIZE];
            self.assembly
                .extend_from_slice(&self.packet[..PACKET_PAYLOAD_SIZE]);
            if marker != CONTINUATION_MARKER {
                break;
            }
        }
        Ok(Some(self.assembly.split().freeze()))
    }

    /// Fill one full packet. `Ok(false)` only when the first packet timed
    /// out; a timeout mid-frame leaves the stream desynchronized and is an
    /// error.
    fn read_packet(&mut self, first: bool) -> VizResult<bool> {
        let stream = self.stream.as_mut().ok_or(VizError::NotConnected)?;
        let mut filled = 0;
        while filled < MAX_PACKET_SIZE {
            match stream.read(&mut self.packet[filled..]) {
                Ok(0) => return Err(VizError::ConnectionClosed),
                Ok(n) => filled += n,
                Err(e)
                    if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut =>
                {
                    if first && filled == 0 {
                        return Ok(false);
                    }
                    return Err(VizError::Connection(
                        "timed out inside a partially received frame".to_owned(),
                    ));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(VizError::Connection(e.to_string())),
            }
        }
        Ok(true)
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Split a payload into marker-terminated packets, the format `read_frame`
/// reassembles. Used by test servers.
pub fn packetize(payload: &[u8]) -> Vec<u8> {
    let packets = payload.len().div_ceil(PACKET_PAYLOAD_SIZE).max(1);
    let mut out = Vec::with_capacity(packets * MAX_PACKET_SIZE);
    for i in 0..packets {
        let chunk_start = i * PACKET_PAYLOAD_SIZE;
        let chunk_end = (chunk_start + PACKET_PAYLOAD_SIZE).min(payload.len());
        out.extend_from_slice(&payload[chunk_start..chunk_end]);
        out.resize((i + 1) * MAX_PACKET_SIZE - FOOTER_SIZE, 0);
        out.push(if i + 1 < packets {
            CONTINUATION_MARKER
        } else {
            FINAL_MARKER
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    fn transport_for(port: u16, timeout: Duration) -> TcpTransport {
        TcpTransport::new(TransportConfig {
            address: "127.0.0.1".to_owned(),
            port,
            read_timeout: timeout,
        })
    }

    fn serve_payloads(payloads: Vec<Vec<u8>>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            for payload in payloads {
                socket.write_all(&packetize(&payload)).unwrap();
            }
            // keep the socket open long enough for the client to read
            thread::sleep(Duration::from_millis(500));
        });
        port
    }

    #[test]
    fn packetize_layout() {
        let single = packetize(&[1, 2, 3]);
        assert_eq!(single.len(), MAX_PACKET_SIZE);
        assert_eq!(&single[..3], &[1, 2, 3]);
        assert_eq!(single[MAX_PACKET_SIZE - 1], FINAL_MARKER);

        let double = packetize(&vec![7u8; PACKET_PAYLOAD_SIZE + 1]);
        assert_eq!(double.len(), 2 * MAX_PACKET_SIZE);
        assert_eq!(double[MAX_PACKET_SIZE - 1], CONTINUATION_MARKER);
        assert_eq!(double[2 * MAX_PACKET_SIZE - 1], FINAL_MARKER);
    }

    #[test]
    fn single_packet_roundtrip() {
        let payload = vec![0xabu8; PACKET_PAYLOAD_SIZE];
        let port = serve_payloads(vec![payload.clone()]);

        let mut transport = transport_for(port, Duration::from_secs(2));
        transport.connect().unwrap();
        let frame = transport.read_frame().unwrap().unwrap();
        assert_eq!(&frame[..], &payload[..]);
    }

    #[test]
    fn two_packet_roundtrip_byte_identical() {
        let payload: Vec<u8> = (0..(PACKET_PAYLOAD_SIZE + 100))
            .map(|i| (i % 251) as u8)
            .collect();
        let port = serve_payloads(vec![payload.clone()]);

        let mut transport = transport_for(port, Duration::from_secs(2));
        transport.connect().unwrap();
        let frame = transport.read_frame().unwrap().unwrap();
        // second packet is zero-padded past the payload
        assert_eq!(frame.len(), 2 * PACKET_PAYLOAD_SIZE);
        assert_eq!(&frame[..payload.len()], &payload[..]);
        assert!(frame[payload.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_length_payload() {
        let port = serve_payloads(vec![Vec::new()]);

        let mut transport = transport_for(port, Duration::from_secs(2));
        transport.connect().unwrap();
        let frame = transport.read_frame().unwrap().unwrap();
        assert_eq!(frame.len(), PACKET_PAYLOAD_SIZE);
        assert!(frame.iter().all(|&b| b == 0));
    }

    #[test]
    fn shorter_frame_has_no_stale_bytes() {
        let first = vec![0xffu8; PACKET_PAYLOAD_SIZE];
        let second = vec![1u8, 2, 3];
        let port = serve_payloads(vec![first, second.clone()]);

        let mut transport = transport_for(port, Duration::from_secs(2));
        transport.connect().unwrap();
        transport.read_frame().unwrap().unwrap();
        let frame = transport.read_frame().unwrap().unwrap();
        assert_eq!(&frame[..3], &second[..]);
        assert!(frame[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn timeout_returns_no_data_sentinel() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let guard = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(800));
            drop(socket);
        });

        let timeout = Duration::from_millis(200);
        let mut transport = transport_for(port, timeout);
        transport.connect().unwrap();

        let started = Instant::now();
        let result = transport.read_frame().unwrap();
        assert!(result.is_none());
        assert!(started.elapsed() < timeout + Duration::from_millis(300));
        guard.join().unwrap();
    }

    #[test]
    fn connect_is_idempotent() {
        let port = serve_payloads(vec![Vec::new()]);
        let mut transport = transport_for(port, Duration::from_secs(1));
        transport.connect().unwrap();
        transport.connect().unwrap();
        assert!(transport.is_connected());
        transport.close();
        assert!(!transport.is_connected());
        transport.close(); // close never fails, repeated or not
    }

    #[test]
    fn is_alive_detects_remote_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let guard = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            drop(socket);
        });

        let mut transport = transport_for(port, Duration::from_secs(1));
        transport.connect().unwrap();
        guard.join().unwrap();
        // the FIN may take a moment to arrive
        let deadline = Instant::now() + Duration::from_secs(2);
        while transport.is_alive() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!transport.is_alive());
    }
}
