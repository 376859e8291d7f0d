//! Renderer collaborator interface
//!
//! The core never builds geometry or materials; it issues create, update,
//! and destroy calls against this trait. All poses handed to the renderer
//! are already converted to the render frame.

use nalgebra::Vector3;

use vizlink_core::VizResult;
use vizlink_wire::{PartTag, ShapeDescriptor};

use crate::model::{Pose, VisualMarker};

/// Which entity families the renderer should currently draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibilityFlags {
    pub visual_bodies: bool,
    pub collision_bodies: bool,
    pub contact_points: bool,
    pub contact_forces: bool,
}

impl Default for VisibilityFlags {
    fn default() -> Self {
        VisibilityFlags {
            visual_bodies: true,
            collision_bodies: false,
            contact_points: false,
            contact_forces: false,
        }
    }
}

/// External scene-graph collaborator. Implementations own primitive/mesh
/// construction and material assignment; the core owns everything else.
pub trait SceneRenderer {
    /// Create one shape under the frame `name`. A frame may receive several
    /// parts (a collision shape and its visual mirror, for instance).
    fn create_part(
        &mut self,
        name: &str,
        shape: &ShapeDescriptor,
        tag: PartTag,
        material: Option<&str>,
    ) -> VizResult<()>;

    /// Create a free-standing visual marker.
    fn create_marker(&mut self, marker: &VisualMarker) -> VizResult<()>;

    /// Move a frame or marker. `pose` is in the render frame. Only names
    /// previously created are passed here.
    fn set_pose(&mut self, name: &str, pose: &Pose);

    /// Destroy a frame or marker and everything under it.
    fn destroy(&mut self, name: &str);

    /// Drop all contact markers; called before each contact batch.
    fn clear_contact_markers(&mut self);

    /// Draw a contact point. `position` is in the render frame.
    fn contact_point(&mut self, ordinal: usize, position: Vector3<f64>);

    /// Draw a contact force arrow. `force` is pre-normalized by the batch
    /// maximum, so its magnitude is in (0, 1].
    fn contact_force(&mut self, ordinal: usize, position: Vector3<f64>, force: Vector3<f64>);

    /// Re-apply the visibility toggles to everything currently drawn.
    fn apply_visibility(&mut self, flags: VisibilityFlags);
}
