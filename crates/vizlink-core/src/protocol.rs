//! Protocol enumerations and their wire discriminants
//!
//! Every enumeration here travels as a little-endian i32. Discriminants are
//! fixed by protocol version, not negotiated; an unknown value on the wire is
//! a decode error, never a silent default.

use crate::VizError;

/// Requests the client can issue. The request itself is the whole outbound
/// message for every kind except `ChangeRealtimeFactor`, which carries one f64.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ClientRequest {
    ObjectPosition = 0,
    Initialization = 1,
    /// Mesh, texture and other file retrieval
    Resource = 2,
    ChangeRealtimeFactor = 3,
    ContactSolverDetails = 4,
    Pause = 5,
    Resume = 6,
    ContactInfos = 7,
    ConfigXml = 8,
    InitializeVisuals = 9,
    VisualPosition = 10,
}

impl ClientRequest {
    #[inline]
    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

/// Message kinds the server can answer with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ServerMessageKind {
    Initialization = 0,
    ObjectPositionUpdate = 1,
    Status = 2,
    NoMessage = 3,
    ContactInfoUpdate = 4,
    ConfigXml = 5,
    VisualInitialization = 6,
    VisualPositionUpdate = 7,
}

impl ServerMessageKind {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(ServerMessageKind::Initialization),
            1 => Some(ServerMessageKind::ObjectPositionUpdate),
            2 => Some(ServerMessageKind::Status),
            3 => Some(ServerMessageKind::NoMessage),
            4 => Some(ServerMessageKind::ContactInfoUpdate),
            5 => Some(ServerMessageKind::ConfigXml),
            6 => Some(ServerMessageKind::VisualInitialization),
            7 => Some(ServerMessageKind::VisualPositionUpdate),
            _ => None,
        }
    }

    #[inline]
    pub fn to_i32(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            ServerMessageKind::Initialization => "Initialization",
            ServerMessageKind::ObjectPositionUpdate => "ObjectPositionUpdate",
            ServerMessageKind::Status => "Status",
            ServerMessageKind::NoMessage => "NoMessage",
            ServerMessageKind::ContactInfoUpdate => "ContactInfoUpdate",
            ServerMessageKind::ConfigXml => "ConfigXml",
            ServerMessageKind::VisualInitialization => "VisualInitialization",
            ServerMessageKind::VisualPositionUpdate => "VisualPositionUpdate",
        }
    }
}

/// Server lifecycle status, leading every inbound frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ServerStatus {
    Rendering = 0,
    Hibernating = 1,
    Terminating = 2,
}

impl ServerStatus {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(ServerStatus::Rendering),
            1 => Some(ServerStatus::Hibernating),
            2 => Some(ServerStatus::Terminating),
            _ => None,
        }
    }

    #[inline]
    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

/// Simulated body kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ObjectKind {
    Sphere = 0,
    Box = 1,
    Cylinder = 2,
    Cone = 3,
    Capsule = 4,
    Mesh = 5,
    HalfSpace = 6,
    Compound = 7,
    HeightMap = 8,
    ArticulatedSystem = 9,
}

impl ObjectKind {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(ObjectKind::Sphere),
            1 => Some(ObjectKind::Box),
            2 => Some(ObjectKind::Cylinder),
            3 => Some(ObjectKind::Cone),
            4 => Some(ObjectKind::Capsule),
            5 => Some(ObjectKind::Mesh),
            6 => Some(ObjectKind::HalfSpace),
            7 => Some(ObjectKind::Compound),
            8 => Some(ObjectKind::HeightMap),
            9 => Some(ObjectKind::ArticulatedSystem),
            _ => None,
        }
    }

    #[inline]
    pub fn to_i32(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Sphere => "Sphere",
            ObjectKind::Box => "Box",
            ObjectKind::Cylinder => "Cylinder",
            ObjectKind::Cone => "Cone",
            ObjectKind::Capsule => "Capsule",
            ObjectKind::Mesh => "Mesh",
            ObjectKind::HalfSpace => "HalfSpace",
            ObjectKind::Compound => "Compound",
            ObjectKind::HeightMap => "HeightMap",
            ObjectKind::ArticulatedSystem => "ArticulatedSystem",
        }
    }
}

/// Shape kinds inside an articulated system's visual/collision lists
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ShapeKind {
    Box = 0,
    Cylinder = 1,
    Sphere = 2,
    Mesh = 3,
    Capsule = 4,
    Cone = 5,
}

impl ShapeKind {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(ShapeKind::Box),
            1 => Some(ShapeKind::Cylinder),
            2 => Some(ShapeKind::Sphere),
            3 => Some(ShapeKind::Mesh),
            4 => Some(ShapeKind::Capsule),
            5 => Some(ShapeKind::Cone),
            _ => None,
        }
    }

    #[inline]
    pub fn to_i32(self) -> i32 {
        self as i32
    }

    /// Expected parameter count for the non-mesh shapes
    pub fn param_count(self) -> Option<usize> {
        match self {
            ShapeKind::Sphere => Some(1),
            ShapeKind::Box => Some(3),
            ShapeKind::Cylinder => Some(2),
            ShapeKind::Capsule => Some(2),
            ShapeKind::Cone => Some(2),
            ShapeKind::Mesh => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Box => "Box",
            ShapeKind::Cylinder => "Cylinder",
            ShapeKind::Sphere => "Sphere",
            ShapeKind::Mesh => "Mesh",
            ShapeKind::Capsule => "Capsule",
            ShapeKind::Cone => "Cone",
        }
    }
}

/// Visual marker kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum VisualKind {
    Sphere = 0,
    Box = 1,
    Cylinder = 2,
    Capsule = 3,
    Mesh = 4,
}

impl VisualKind {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(VisualKind::Sphere),
            1 => Some(VisualKind::Box),
            2 => Some(VisualKind::Cylinder),
            3 => Some(VisualKind::Capsule),
            4 => Some(VisualKind::Mesh),
            _ => None,
        }
    }

    #[inline]
    pub fn to_i32(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            VisualKind::Sphere => "Sphere",
            VisualKind::Box => "Box",
            VisualKind::Cylinder => "Cylinder",
            VisualKind::Capsule => "Capsule",
            VisualKind::Mesh => "Mesh",
        }
    }
}

/// Helper for decode sites: turn an unknown discriminant into the typed error
pub fn unknown_discriminant(what: &'static str, value: i32) -> VizError {
    VizError::UnknownDiscriminant { what, value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_kind_roundtrip() {
        for v in 0..8 {
            let kind = ServerMessageKind::from_i32(v).unwrap();
            assert_eq!(kind.to_i32(), v);
        }
        assert!(ServerMessageKind::from_i32(8).is_none());
        assert!(ServerMessageKind::from_i32(-1).is_none());
    }

    #[test]
    fn object_kind_roundtrip() {
        for v in 0..10 {
            let kind = ObjectKind::from_i32(v).unwrap();
            assert_eq!(kind.to_i32(), v);
        }
        assert!(ObjectKind::from_i32(10).is_none());
    }

    #[test]
    fn shape_param_counts() {
        assert_eq!(ShapeKind::Sphere.param_count(), Some(1));
        assert_eq!(ShapeKind::Box.param_count(), Some(3));
        assert_eq!(ShapeKind::Mesh.param_count(), None);
    }
}
