//! Tagged-union decode of inbound frames
//!
//! Every frame opens with the server status and the message kind, both i32.
//! The discriminant is read once and the variant carries exactly the fields
//! defined for that kind, so call sites match exhaustively and a new kind
//! cannot be silently ignored.
//!
//! Two kinds are only partially decoded here by design: `Initialization` and
//! `VisualInitialization` announce their record counts, then the records
//! stream through the caller's time-boxed loop. `ObjectPositionUpdate` stops
//! after the configuration number because the remainder must not be decoded
//! when the configuration has changed.

use vizlink_core::{
    unknown_discriminant, ServerMessageKind, ServerStatus, VizError, VizResult,
};

use crate::reader::WireReader;
use crate::records::{ContactEvent, NamedPose};

/// A decoded inbound message prefix.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerMessage {
    /// Configuration generation and announced object count; object records
    /// follow in the frame.
    Initialization {
        configuration: u64,
        object_count: u64,
    },
    /// Configuration generation only; pose groups follow in the frame and
    /// are decoded by the caller once the generation is known to match.
    ObjectPositionUpdate { configuration: u64 },
    Status,
    NoMessage,
    ContactInfoUpdate {
        /// Informational; contact updates never trigger re-initialization.
        configuration: u64,
        contacts: Vec<ContactEvent>,
    },
    ConfigXml { document: String },
    /// Announced marker count; visual records follow in the frame.
    VisualInitialization { visual_count: u64 },
    VisualPositionUpdate { poses: Vec<NamedPose> },
}

impl ServerMessage {
    /// Decode the status word and the message prefix. A `Terminating` status
    /// is rejected here; every protocol step treats it as fatal.
    pub fn decode(r: &mut WireReader<'_>) -> VizResult<Self> {
        let raw = r.i32()?;
        let status =
            ServerStatus::from_i32(raw).ok_or(unknown_discriminant("server status", raw))?;
        if status == ServerStatus::Terminating {
            return Err(VizError::ServerTerminating);
        }

        let raw = r.i32()?;
        let kind =
            ServerMessageKind::from_i32(raw).ok_or(unknown_discriminant("message kind", raw))?;

        Ok(match kind {
            ServerMessageKind::Initialization => ServerMessage::Initialization {
                configuration: r.u64()?,
                object_count: r.u64()?,
            },
            ServerMessageKind::ObjectPositionUpdate => ServerMessage::ObjectPositionUpdate {
                configuration: r.u64()?,
            },
            ServerMessageKind::Status => ServerMessage::Status,
            ServerMessageKind::NoMessage => ServerMessage::NoMessage,
            ServerMessageKind::ContactInfoUpdate => {
                let configuration = r.u64()?;
                let count = r.u64()?;
                let mut contacts = Vec::with_capacity(count.min(1 << 20) as usize);
                for _ in 0..count {
                    contacts.push(ContactEvent::decode(r)?);
                }
                ServerMessage::ContactInfoUpdate {
                    configuration,
                    contacts,
                }
            }
            ServerMessageKind::ConfigXml => ServerMessage::ConfigXml {
                document: r.string()?,
            },
            ServerMessageKind::VisualInitialization => ServerMessage::VisualInitialization {
                visual_count: r.u64()?,
            },
            ServerMessageKind::VisualPositionUpdate => {
                let count = r.u64()?;
                let mut poses = Vec::with_capacity(count.min(1 << 20) as usize);
                for _ in 0..count {
                    poses.push(NamedPose::decode(r)?);
                }
                ServerMessage::VisualPositionUpdate { poses }
            }
        })
    }

    /// Kind name for error reporting.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ServerMessage::Initialization { .. } => ServerMessageKind::Initialization.name(),
            ServerMessage::ObjectPositionUpdate { .. } => {
                ServerMessageKind::ObjectPositionUpdate.name()
            }
            ServerMessage::Status => ServerMessageKind::Status.name(),
            ServerMessage::NoMessage => ServerMessageKind::NoMessage.name(),
            ServerMessage::ContactInfoUpdate { .. } => ServerMessageKind::ContactInfoUpdate.name(),
            ServerMessage::ConfigXml { .. } => ServerMessageKind::ConfigXml.name(),
            ServerMessage::VisualInitialization { .. } => {
                ServerMessageKind::VisualInitialization.name()
            }
            ServerMessage::VisualPositionUpdate { .. } => {
                ServerMessageKind::VisualPositionUpdate.name()
            }
        }
    }

    /// The mismatch error for a step that required a different kind.
    pub fn unexpected(&self, expected: &'static str) -> VizError {
        VizError::UnexpectedMessage {
            expected,
            got: self.kind_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::WireWriter;

    fn header(w: &mut WireWriter, status: ServerStatus, kind: ServerMessageKind) {
        w.put_i32(status.to_i32());
        w.put_i32(kind.to_i32());
    }

    #[test]
    fn initialization_prefix() {
        let mut w = WireWriter::new();
        header(&mut w, ServerStatus::Rendering, ServerMessageKind::Initialization);
        w.put_u64(4);
        w.put_u64(12);
        let buf = w.into_bytes();

        let msg = ServerMessage::decode(&mut WireReader::new(&buf)).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Initialization {
                configuration: 4,
                object_count: 12
            }
        );
    }

    #[test]
    fn terminating_status_is_fatal() {
        let mut w = WireWriter::new();
        header(&mut w, ServerStatus::Terminating, ServerMessageKind::Status);
        let buf = w.into_bytes();

        assert!(matches!(
            ServerMessage::decode(&mut WireReader::new(&buf)).unwrap_err(),
            VizError::ServerTerminating
        ));
    }

    #[test]
    fn hibernating_status_is_accepted() {
        let mut w = WireWriter::new();
        header(&mut w, ServerStatus::Hibernating, ServerMessageKind::NoMessage);
        let buf = w.into_bytes();

        assert_eq!(
            ServerMessage::decode(&mut WireReader::new(&buf)).unwrap(),
            ServerMessage::NoMessage
        );
    }

    #[test]
    fn unknown_kind_rejected() {
        let mut w = WireWriter::new();
        w.put_i32(ServerStatus::Rendering.to_i32());
        w.put_i32(99);
        let buf = w.into_bytes();

        assert!(matches!(
            ServerMessage::decode(&mut WireReader::new(&buf)).unwrap_err(),
            VizError::UnknownDiscriminant {
                what: "message kind",
                value: 99
            }
        ));
    }

    #[test]
    fn contact_update_decodes_fully() {
        let mut w = WireWriter::new();
        header(
            &mut w,
            ServerStatus::Rendering,
            ServerMessageKind::ContactInfoUpdate,
        );
        w.put_u64(9); // configuration, informational
        w.put_u64(2);
        for c in 0..2 {
            for v in 0..3 {
                w.put_f64((c * 3 + v) as f64);
            }
            for _ in 0..3 {
                w.put_f64(1.0);
            }
        }
        let buf = w.into_bytes();

        let mut r = WireReader::new(&buf);
        let msg = ServerMessage::decode(&mut r).unwrap();
        match msg {
            ServerMessage::ContactInfoUpdate {
                configuration,
                contacts,
            } => {
                assert_eq!(configuration, 9);
                assert_eq!(contacts.len(), 2);
                assert_eq!(contacts[1].position.x, 3.0);
            }
            other => panic!("wrong message: {other:?}"),
        }
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn object_position_update_stops_at_configuration() {
        let mut w = WireWriter::new();
        header(
            &mut w,
            ServerStatus::Rendering,
            ServerMessageKind::ObjectPositionUpdate,
        );
        w.put_u64(3);
        w.put_u64(0); // group count, not consumed by the prefix decode
        let buf = w.into_bytes();

        let mut r = WireReader::new(&buf);
        let msg = ServerMessage::decode(&mut r).unwrap();
        assert_eq!(msg, ServerMessage::ObjectPositionUpdate { configuration: 3 });
        assert_eq!(r.remaining(), 8);
    }
}
