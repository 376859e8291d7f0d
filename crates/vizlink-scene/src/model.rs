//! In-memory representation of the synchronized world
//!
//! Lookup is by explicit name maps populated at creation and emptied at
//! destruction; nothing scans. Part names are derived deterministically from
//! the server-assigned object index, so position updates resolve without any
//! additional handshake.

use std::collections::HashMap;

use nalgebra::{UnitQuaternion, Vector3};
use tracing::debug;

use vizlink_core::{ObjectKind, VisualKind, VizError, VizResult};
use vizlink_wire::{ContactEvent, ObjectRecord, PartTag, ShapeDescriptor, VisualRecord};

/// Frame name of a non-articulated object.
pub fn object_frame_name(index: u64) -> String {
    index.to_string()
}

/// Frame name of one shape of an articulated system: `index/list/ordinal`
/// where the visual list is 0 and the collision list is 1.
pub fn part_frame_name(index: u64, tag: PartTag, ordinal: u64) -> String {
    let list = match tag {
        PartTag::Visual => 0,
        PartTag::Collision => 1,
    };
    format!("{index}/{list}/{ordinal}")
}

/// Position and orientation in the simulator frame (right-handed, Z-up).
#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Pose {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }
}

/// One simulated body held by the client.
#[derive(Clone, Debug)]
pub struct WorldObject {
    pub index: u64,
    pub kind: ObjectKind,
    /// Server-side object name, the appearance-resolver key.
    pub name: String,
    /// Frame names owned by this object, in creation order.
    pub frames: Vec<String>,
}

/// One free-standing visual marker.
#[derive(Clone, Debug)]
pub struct VisualMarker {
    pub kind: VisualKind,
    pub name: String,
    pub color: [f32; 4],
    pub material: String,
    pub glow: bool,
    pub shadow: bool,
    pub shape: ShapeDescriptor,
    pub pose: Pose,
}

impl From<VisualRecord> for VisualMarker {
    fn from(rec: VisualRecord) -> Self {
        VisualMarker {
            kind: rec.kind,
            name: rec.name,
            color: rec.color,
            material: rec.material,
            glow: rec.glow,
            shadow: rec.shadow,
            shape: rec.shape,
            pose: Pose::default(),
        }
    }
}

/// Exclusive owner of world objects, visual markers, and contact events.
#[derive(Default)]
pub struct SceneModel {
    generation: u64,
    objects: HashMap<u64, WorldObject>,
    frames: HashMap<String, Pose>,
    visuals: HashMap<String, VisualMarker>,
    contacts: Vec<ContactEvent>,
}

impl SceneModel {
    pub fn new() -> Self {
        SceneModel::default()
    }

    /// Configuration generation the held object set belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn object_count(&self) -> u64 {
        self.objects.len() as u64
    }

    pub fn visual_count(&self) -> u64 {
        self.visuals.len() as u64
    }

    pub fn contacts(&self) -> &[ContactEvent] {
        &self.contacts
    }

    pub fn object(&self, index: u64) -> Option<&WorldObject> {
        self.objects.get(&index)
    }

    pub fn frame_pose(&self, name: &str) -> Option<&Pose> {
        self.frames.get(name)
    }

    pub fn visual(&self, name: &str) -> Option<&VisualMarker> {
        self.visuals.get(name)
    }

    /// Register a fully decoded object record and its frames. Returns the
    /// frame names created, in the order the renderer should create them.
    pub fn insert_object(&mut self, record: &ObjectRecord) -> Vec<String> {
        let mut frames = Vec::new();
        match record.kind {
            ObjectKind::ArticulatedSystem => {
                for entry in &record.entries {
                    frames.push(part_frame_name(record.index, entry.tag, entry.ordinal));
                }
            }
            _ => frames.push(object_frame_name(record.index)),
        }

        for frame in &frames {
            self.frames.insert(frame.clone(), Pose::default());
        }
        self.objects.insert(
            record.index,
            WorldObject {
                index: record.index,
                kind: record.kind,
                name: record.name.clone(),
                frames: frames.clone(),
            },
        );
        frames
    }

    /// Register a visual marker.
    pub fn insert_visual(&mut self, marker: VisualMarker) {
        self.visuals.insert(marker.name.clone(), marker);
    }

    /// Apply a pose to an object frame. An unknown frame name is a protocol
    /// error; the server and client object sets must agree exactly.
    pub fn apply_frame_pose(&mut self, name: &str, pose: Pose) -> VizResult<()> {
        match self.frames.get_mut(name) {
            Some(slot) => {
                *slot = pose;
                Ok(())
            }
            None => Err(VizError::UnknownObject(name.to_owned())),
        }
    }

    /// Apply a pose to a visual marker, same contract as object frames.
    pub fn apply_visual_pose(&mut self, name: &str, pose: Pose) -> VizResult<()> {
        match self.visuals.get_mut(name) {
            Some(marker) => {
                marker.pose = pose;
                Ok(())
            }
            None => Err(VizError::UnknownObject(name.to_owned())),
        }
    }

    /// Replace the whole contact set; contacts never persist across ticks.
    pub fn replace_contacts(&mut self, contacts: Vec<ContactEvent>) {
        self.contacts = contacts;
    }

    /// Drop every world object, keeping visuals and contacts. Returns the
    /// destroyed frame names so the driver can mirror the destruction in the
    /// renderer. Used when the server's configuration generation moves on.
    pub fn clear_objects(&mut self) -> Vec<String> {
        debug!(objects = self.objects.len(), "clearing object set");
        let mut destroyed: Vec<String> = self.frames.keys().cloned().collect();
        destroyed.sort();
        self.objects.clear();
        self.frames.clear();
        destroyed
    }

    /// Drop everything, including markers and contacts. Used on disconnect.
    pub fn clear_all(&mut self) -> Vec<String> {
        let mut destroyed = self.clear_objects();
        destroyed.extend(self.visuals.keys().cloned());
        self.visuals.clear();
        self.contacts.clear();
        destroyed
    }
}
