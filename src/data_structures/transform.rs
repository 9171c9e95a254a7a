//! Local transforms of scene and collision nodes.
//!
//! Position, rotation and scale are kept apart rather than folded into a
//! matrix so that backends can map them onto whatever node representation
//! they use. Scale is per axis: compressed collision meshes carry a
//! non-uniform one.

use std::ops::Mul;

use cgmath::{ElementWise, One, Quaternion, Vector3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::new()
    }
}

impl<'a, 'b> Mul<&'b Transform> for &'a Transform {
    type Output = Transform;

    /// `parent * child`: the child placed in the parent's space.
    fn mul(self, child: &'b Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * self.scale.mul_element_wise(child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale.mul_element_wise(child.scale),
        }
    }
}

impl Mul<Transform> for Transform {
    type Output = Self;

    fn mul(self, child: Transform) -> Self {
        &self * &child
    }
}

impl From<Vector3<f32>> for Transform {
    fn from(position: Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
