//! Vizlink Scene - authoritative client-side mirror of the simulated world
//!
//! The scene model exclusively owns the synchronized entities (world objects,
//! visual markers, contact events). The renderer never holds authoritative
//! copies; it receives create/update/destroy calls keyed by part name and
//! keeps only rendered derivatives.

pub mod appearance;
pub mod convert;
pub mod model;
pub mod renderer;

pub use appearance::{Appearance, AppearanceResolver, AppearanceShape, ShapeOverride, StaticAppearances};
pub use convert::{pose_to_render, position_to_render, orientation_to_render};
pub use model::{object_frame_name, part_frame_name, Pose, SceneModel, VisualMarker, WorldObject};
pub use renderer::{SceneRenderer, VisibilityFlags};
