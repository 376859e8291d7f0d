//! Appearance resolver interface
//!
//! The server can publish a descriptor document mapping object names to
//! material and shape overrides. Parsing that document is a collaborator's
//! job; the core only feeds it in and looks names up.

use std::collections::HashMap;

use vizlink_wire::ShapeDescriptor;

/// Override shape vocabulary. Deliberately smaller than the wire's shape
/// kinds; the descriptor document cannot express cones or height maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppearanceShape {
    Sphere,
    Box,
    Cylinder,
    Capsule,
    Mesh,
}

/// One visual shape override.
#[derive(Clone, Debug)]
pub struct ShapeOverride {
    pub shape: AppearanceShape,
    /// Interpretation depends on `shape`: radius / extents / radius+length /
    /// mesh scale.
    pub dimensions: [f32; 3],
    /// Mesh file reference; empty for primitive shapes.
    pub file: String,
    pub material: Option<String>,
}

impl ShapeOverride {
    /// The renderable geometry this override describes.
    pub fn to_descriptor(&self) -> ShapeDescriptor {
        let [a, b, c] = self.dimensions;
        match self.shape {
            AppearanceShape::Sphere => ShapeDescriptor::Sphere { radius: a },
            AppearanceShape::Box => ShapeDescriptor::Box { x: a, y: b, z: c },
            AppearanceShape::Cylinder => ShapeDescriptor::Cylinder {
                radius: a,
                height: b,
            },
            AppearanceShape::Capsule => ShapeDescriptor::Capsule {
                radius: a,
                height: b,
            },
            AppearanceShape::Mesh => ShapeDescriptor::Mesh {
                file: self.file.clone(),
                scale: [a as f64, b as f64, c as f64],
            },
        }
    }
}

/// Appearance of one object: an optional object-wide material and zero or
/// more visual shape overrides replacing the default collision mirror.
#[derive(Clone, Debug, Default)]
pub struct Appearance {
    pub material: Option<String>,
    pub overrides: Vec<ShapeOverride>,
}

/// External resolver keyed by server-side object name.
pub trait AppearanceResolver {
    /// Feed the descriptor document received from the server.
    fn ingest(&mut self, document: &str);

    /// Drop all held appearances; called when the connection closes.
    fn clear(&mut self);

    fn lookup(&self, name: &str) -> Option<Appearance>;
}

/// Map-backed resolver. The production parser lives outside the core; this
/// implementation backs tests and deployments without a descriptor document.
#[derive(Default)]
pub struct StaticAppearances {
    table: HashMap<String, Appearance>,
}

impl StaticAppearances {
    pub fn new() -> Self {
        StaticAppearances::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, appearance: Appearance) {
        self.table.insert(name.into(), appearance);
    }
}

impl AppearanceResolver for StaticAppearances {
    fn ingest(&mut self, _document: &str) {
        // static table; documents are ignored
    }

    fn clear(&mut self) {
        self.table.clear();
    }

    fn lookup(&self, name: &str) -> Option<Appearance> {
        self.table.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_descriptors() {
        let sphere = ShapeOverride {
            shape: AppearanceShape::Sphere,
            dimensions: [0.5, 0.0, 0.0],
            file: String::new(),
            material: None,
        };
        assert_eq!(
            sphere.to_descriptor(),
            ShapeDescriptor::Sphere { radius: 0.5 }
        );

        let mesh = ShapeOverride {
            shape: AppearanceShape::Mesh,
            dimensions: [2.0, 2.0, 2.0],
            file: "hull.obj".to_owned(),
            material: Some("Steel".to_owned()),
        };
        assert!(matches!(
            mesh.to_descriptor(),
            ShapeDescriptor::Mesh { ref file, scale } if file == "hull.obj" && scale == [2.0; 3]
        ));
    }

    #[test]
    fn static_lookup() {
        let mut table = StaticAppearances::new();
        table.insert(
            "floor",
            Appearance {
                material: Some("Tiles".to_owned()),
                overrides: Vec::new(),
            },
        );
        assert_eq!(
            table.lookup("floor").unwrap().material.as_deref(),
            Some("Tiles")
        );
        assert!(table.lookup("ceiling").is_none());
        table.clear();
        assert!(table.lookup("floor").is_none());
    }
}
