//! Source to target coordinate conversion.
//!
//! Source files are Z-up and measured in game units. The output is Y-up and
//! measured in meters. Every position leaving the builders has had Y and Z
//! swapped and has been divided by [`SOURCE_UNITS_PER_METER`]; directions are
//! only swapped. Rotation matrices get the matching basis permutation, and
//! because the swap mirrors the space, triangle winding flips too.

use cgmath::{InnerSpace, Matrix3, Quaternion, Vector3, Zero};

use crate::{
    data_structures::transform::Transform,
    format::{blocks::AvObject, version::Versions},
};

pub const SOURCE_UNITS_PER_METER: f32 = 70.0;

/// Swaps Y and Z. Its own inverse.
pub fn swap_yz(v: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(v.x, v.z, v.y)
}

pub fn position(v: Vector3<f32>) -> Vector3<f32> {
    swap_yz(v) / SOURCE_UNITS_PER_METER
}

/// Inverse of [`position`].
pub fn source_position(v: Vector3<f32>) -> Vector3<f32> {
    swap_yz(v * SOURCE_UNITS_PER_METER)
}

pub fn direction(v: Vector3<f32>) -> Vector3<f32> {
    swap_yz(v)
}

pub fn length(value: f32) -> f32 {
    value / SOURCE_UNITS_PER_METER
}

/// The permutation matrix exchanging the Y and Z axes.
fn basis() -> Matrix3<f32> {
    Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0)
}

/// Re-expresses a source rotation matrix in target axes: `P * R * P`.
pub fn rotation_matrix(m: Matrix3<f32>) -> Matrix3<f32> {
    basis() * m * basis()
}

pub fn rotation(m: Matrix3<f32>) -> Quaternion<f32> {
    let q = Quaternion::from(rotation_matrix(m));
    let magnitude = q.magnitude();
    if magnitude.is_finite() && magnitude > f32::EPSILON {
        q / magnitude
    } else {
        Quaternion::new(1.0, 0.0, 0.0, 0.0)
    }
}

/// Converts a source quaternion by way of its matrix.
pub fn quaternion(q: Quaternion<f32>) -> Quaternion<f32> {
    if q.magnitude2().is_zero() {
        return Quaternion::new(1.0, 0.0, 0.0, 0.0);
    }
    rotation(Matrix3::from(q.normalize()))
}

/// Front faces wind the other way once the space is mirrored.
pub fn winding<T: Copy>([a, b, c]: [T; 3]) -> [T; 3] {
    [a, c, b]
}

/// Havok positions are in Havok units, a fixed multiple of source units.
pub fn havok_position(v: Vector3<f32>, versions: &Versions) -> Vector3<f32> {
    position(v * versions.havok_scale())
}

pub fn havok_length(value: f32, versions: &Versions) -> f32 {
    length(value * versions.havok_scale())
}

/// Local transform of a scene object in target space.
pub fn transform(av: &AvObject) -> Transform {
    Transform {
        position: position(av.translation),
        rotation: rotation(av.rotation),
        scale: Vector3::new(av.scale, av.scale, av.scale),
    }
}
