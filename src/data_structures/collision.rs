//! Collision descriptors. Shapes are in target space (meters, Y-up); no
//! simulation state is kept here.

use crate::data_structures::transform::Transform;

#[derive(Clone, Debug, PartialEq)]
pub enum CollisionShape {
    Box {
        half_extents: [f32; 3],
    },
    Sphere {
        radius: f32,
    },
    Capsule {
        start: [f32; 3],
        end: [f32; 3],
        radius: f32,
    },
    ConvexHull {
        points: Vec<[f32; 3]>,
        radius: f32,
    },
    TriangleMesh {
        positions: Vec<[f32; 3]>,
        indices: Vec<u32>,
    },
}

impl CollisionShape {
    pub fn kind(&self) -> &'static str {
        match self {
            CollisionShape::Box { .. } => "box",
            CollisionShape::Sphere { .. } => "sphere",
            CollisionShape::Capsule { .. } => "capsule",
            CollisionShape::ConvexHull { .. } => "convex hull",
            CollisionShape::TriangleMesh { .. } => "triangle mesh",
        }
    }
}

/// Physical parameters of the rigid body that owned a shape.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RigidBodyInfo {
    pub layer: u8,
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_factor: f32,
    pub center_of_mass: [f32; 3],
    pub motion_system: u8,
    pub quality: u8,
}

/// One node of a collision subtree. List shapes become a node without a
/// shape of its own and one child per sub-shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionNode {
    pub name: String,
    pub transform: Transform,
    pub shape: Option<CollisionShape>,
    pub body: Option<RigidBodyInfo>,
    pub children: Vec<CollisionNode>,
}

impl CollisionNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_shape(name: impl Into<String>, shape: CollisionShape) -> Self {
        Self {
            shape: Some(shape),
            ..Self::new(name)
        }
    }

    /// Every shape in the subtree, depth first.
    pub fn shapes(&self) -> Vec<&CollisionShape> {
        let mut shapes: Vec<&CollisionShape> = self.shape.iter().collect();
        for child in &self.children {
            shapes.extend(child.shapes());
        }
        shapes
    }
}
