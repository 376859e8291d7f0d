//! Variable-size protocol records
//!
//! Records decode atomically: a record either decodes completely or fails
//! with a typed error, and the cursor only advances past complete records.
//! Shape parameter counts are validated against the shape kind; a mismatch
//! is a protocol error, never a guess or a truncation.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use vizlink_core::{
    unknown_discriminant, ObjectKind, ShapeKind, VisualKind, VizError, VizResult,
};

use crate::reader::WireReader;

/// Whether a shape entry belongs to the rendered visual set or the collision
/// set of its object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartTag {
    Visual,
    Collision,
}

impl PartTag {
    pub fn as_str(self) -> &'static str {
        match self {
            PartTag::Visual => "visual",
            PartTag::Collision => "collision",
        }
    }
}

/// Height field payload of a height-map object.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightMapData {
    pub center_x: f32,
    pub center_y: f32,
    pub size_x: f32,
    pub size_y: f32,
    pub samples_x: u64,
    pub samples_y: u64,
    /// Row-major, `samples_y` rows of `samples_x` values.
    pub heights: Vec<f32>,
}

/// Geometry of one renderable part.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeDescriptor {
    Sphere { radius: f32 },
    Box { x: f32, y: f32, z: f32 },
    Cylinder { radius: f32, height: f32 },
    Capsule { radius: f32, height: f32 },
    Cone { radius: f32, height: f32 },
    Mesh { file: String, scale: [f64; 3] },
    HalfSpace { height: f32 },
    HeightMap(HeightMapData),
}

/// One shape of an object, tagged visual or collision.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeEntry {
    pub tag: PartTag,
    /// Ordinal within the object's list for this tag; part of the part name
    /// for articulated systems.
    pub ordinal: u64,
    /// Server-side collision/visual group.
    pub group: u64,
    pub shape: ShapeDescriptor,
}

/// One world object as transmitted during initialization.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRecord {
    pub index: u64,
    pub kind: ObjectKind,
    /// Server-side object name; the appearance resolver is keyed by it.
    pub name: String,
    /// Resource directory for articulated systems' mesh files.
    pub resource_dir: Option<String>,
    pub entries: Vec<ShapeEntry>,
}

impl ObjectRecord {
    pub fn decode(r: &mut WireReader<'_>) -> VizResult<Self> {
        let index = r.u64()?;
        let raw = r.i32()?;
        let kind = ObjectKind::from_i32(raw).ok_or(unknown_discriminant("object kind", raw))?;
        let name = r.string()?;

        let mut resource_dir = None;
        let mut entries = Vec::new();

        match kind {
            ObjectKind::ArticulatedSystem => {
                resource_dir = Some(r.string()?);
                for tag in [PartTag::Visual, PartTag::Collision] {
                    let count = r.u64()?;
                    for ordinal in 0..count {
                        entries.push(decode_articulated_entry(r, tag, ordinal)?);
                    }
                }
            }
            ObjectKind::HalfSpace => {
                let height = r.f32()?;
                entries.push(collision_entry(ShapeDescriptor::HalfSpace { height }));
            }
            ObjectKind::HeightMap => {
                entries.push(collision_entry(ShapeDescriptor::HeightMap(
                    decode_height_map(r)?,
                )));
            }
            ObjectKind::Sphere => {
                let radius = r.f32()?;
                entries.push(collision_entry(ShapeDescriptor::Sphere { radius }));
            }
            ObjectKind::Box => {
                let (x, y, z) = (r.f32()?, r.f32()?, r.f32()?);
                entries.push(collision_entry(ShapeDescriptor::Box { x, y, z }));
            }
            ObjectKind::Cylinder => {
                let (radius, height) = (r.f32()?, r.f32()?);
                entries.push(collision_entry(ShapeDescriptor::Cylinder { radius, height }));
            }
            ObjectKind::Capsule => {
                let (radius, height) = (r.f32()?, r.f32()?);
                entries.push(collision_entry(ShapeDescriptor::Capsule { radius, height }));
            }
            ObjectKind::Cone => {
                let (radius, height) = (r.f32()?, r.f32()?);
                entries.push(collision_entry(ShapeDescriptor::Cone { radius, height }));
            }
            ObjectKind::Mesh => {
                let file = r.string()?;
                let scale = r.f32()? as f64;
                entries.push(collision_entry(ShapeDescriptor::Mesh {
                    file,
                    scale: [scale, scale, scale],
                }));
            }
            // No known server transmits compounds; decoding one would
            // desynchronize the stream, so fail fast.
            ObjectKind::Compound => {
                return Err(VizError::UnsupportedKind {
                    what: "object",
                    kind: kind.name(),
                });
            }
        }

        Ok(ObjectRecord {
            index,
            kind,
            name,
            resource_dir,
            entries,
        })
    }
}

fn collision_entry(shape: ShapeDescriptor) -> ShapeEntry {
    ShapeEntry {
        tag: PartTag::Collision,
        ordinal: 0,
        group: 0,
        shape,
    }
}

fn decode_articulated_entry(
    r: &mut WireReader<'_>,
    tag: PartTag,
    ordinal: u64,
) -> VizResult<ShapeEntry> {
    let raw = r.i32()?;
    let kind = ShapeKind::from_i32(raw).ok_or(unknown_discriminant("shape kind", raw))?;
    let group = r.u64()?;

    let shape = if kind == ShapeKind::Mesh {
        let file = r.string()?;
        let scale = [r.f64()?, r.f64()?, r.f64()?];
        ShapeDescriptor::Mesh { file, scale }
    } else {
        let at = r.position();
        let count = r.u64()?;
        // a corrupted count must fail typed before any allocation sized by it
        if count > (r.remaining() / 8) as u64 {
            return Err(VizError::MalformedLength {
                offset: at,
                length: count,
            });
        }
        let mut params = Vec::with_capacity(count as usize);
        for _ in 0..count {
            params.push(r.f64()?);
        }
        shape_from_params(kind, &params)?
    };

    Ok(ShapeEntry {
        tag,
        ordinal,
        group,
        shape,
    })
}

fn shape_from_params(kind: ShapeKind, params: &[f64]) -> VizResult<ShapeDescriptor> {
    let expected = kind.param_count().unwrap_or(0);
    if params.len() != expected {
        return Err(VizError::BadShapeParams {
            shape: kind.name(),
            expected,
            got: params.len(),
        });
    }
    Ok(match kind {
        ShapeKind::Sphere => ShapeDescriptor::Sphere {
            radius: params[0] as f32,
        },
        ShapeKind::Box => ShapeDescriptor::Box {
            x: params[0] as f32,
            y: params[1] as f32,
            z: params[2] as f32,
        },
        ShapeKind::Cylinder => ShapeDescriptor::Cylinder {
            radius: params[0] as f32,
            height: params[1] as f32,
        },
        ShapeKind::Capsule => ShapeDescriptor::Capsule {
            radius: params[0] as f32,
            height: params[1] as f32,
        },
        ShapeKind::Cone => ShapeDescriptor::Cone {
            radius: params[0] as f32,
            height: params[1] as f32,
        },
        ShapeKind::Mesh => unreachable!("mesh shapes carry a file, not params"),
    })
}

fn decode_height_map(r: &mut WireReader<'_>) -> VizResult<HeightMapData> {
    let center_x = r.f32()?;
    let center_y = r.f32()?;
    let size_x = r.f32()?;
    let size_y = r.f32()?;
    let samples_x = r.u64()?;
    let samples_y = r.u64()?;
    let at = r.position();
    let total = r.u64()?;
    if samples_x.checked_mul(samples_y) != Some(total) {
        return Err(VizError::HeightMapSampleMismatch {
            total,
            x: samples_x,
            y: samples_y,
        });
    }
    if total > (r.remaining() / 4) as u64 {
        return Err(VizError::MalformedLength {
            offset: at,
            length: total,
        });
    }
    let mut heights = Vec::with_capacity(total as usize);
    for _ in 0..total {
        heights.push(r.f32()?);
    }
    Ok(HeightMapData {
        center_x,
        center_y,
        size_x,
        size_y,
        samples_x,
        samples_y,
        heights,
    })
}

/// One visual marker as transmitted during visual initialization.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualRecord {
    pub kind: VisualKind,
    pub name: String,
    /// RGBA, used when `material` is empty.
    pub color: [f32; 4],
    pub material: String,
    pub glow: bool,
    pub shadow: bool,
    pub shape: ShapeDescriptor,
}

impl VisualRecord {
    pub fn decode(r: &mut WireReader<'_>) -> VizResult<Self> {
        let raw = r.i32()?;
        let kind = VisualKind::from_i32(raw).ok_or(unknown_discriminant("visual kind", raw))?;
        let name = r.string()?;
        let color = [r.f32()?, r.f32()?, r.f32()?, r.f32()?];
        let material = r.string()?;
        let glow = r.bool()?;
        let shadow = r.bool()?;

        let shape = match kind {
            VisualKind::Sphere => ShapeDescriptor::Sphere { radius: r.f32()? },
            VisualKind::Box => ShapeDescriptor::Box {
                x: r.f32()?,
                y: r.f32()?,
                z: r.f32()?,
            },
            VisualKind::Cylinder => ShapeDescriptor::Cylinder {
                radius: r.f32()?,
                height: r.f32()?,
            },
            VisualKind::Capsule => ShapeDescriptor::Capsule {
                radius: r.f32()?,
                height: r.f32()?,
            },
            // Mesh markers have no defined wire layout.
            VisualKind::Mesh => {
                return Err(VizError::UnsupportedKind {
                    what: "visual marker",
                    kind: kind.name(),
                });
            }
        };

        Ok(VisualRecord {
            kind,
            name,
            color,
            material,
            glow,
            shadow,
            shape,
        })
    }
}

/// A named pose in the simulator frame (right-handed, Z-up).
#[derive(Clone, Debug, PartialEq)]
pub struct NamedPose {
    pub name: String,
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl NamedPose {
    /// Name, position (3 x f64), quaternion in (w, x, y, z) order.
    pub fn decode(r: &mut WireReader<'_>) -> VizResult<Self> {
        let name = r.string()?;
        let position = Vector3::new(r.f64()?, r.f64()?, r.f64()?);
        let (w, x, y, z) = (r.f64()?, r.f64()?, r.f64()?, r.f64()?);
        let orientation = UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z));
        Ok(NamedPose {
            name,
            position,
            orientation,
        })
    }
}

/// One transient contact sample.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactEvent {
    pub position: Vector3<f64>,
    pub force: Vector3<f64>,
}

impl ContactEvent {
    pub fn decode(r: &mut WireReader<'_>) -> VizResult<Self> {
        let position = Vector3::new(r.f64()?, r.f64()?, r.f64()?);
        let force = Vector3::new(r.f64()?, r.f64()?, r.f64()?);
        Ok(ContactEvent { position, force })
    }
}

/// Decode the body of an object position update after its configuration
/// number has been checked: a count of groups, each a count of named poses.
/// The grouping has no client-side meaning, so the result is flattened.
pub fn decode_pose_groups(r: &mut WireReader<'_>) -> VizResult<Vec<NamedPose>> {
    let groups = r.u64()?;
    let mut poses = Vec::new();
    for _ in 0..groups {
        let parts = r.u64()?;
        for _ in 0..parts {
            poses.push(NamedPose::decode(r)?);
        }
    }
    Ok(poses)
}
