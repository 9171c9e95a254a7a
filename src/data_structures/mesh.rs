//! Triangle mesh buffers in target space.

use cgmath::{InnerSpace, Vector3, Zero};

/// Axis aligned box plus bounding sphere.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub center: [f32; 3],
    pub radius: f32,
}

impl Bounds {
    pub fn from_points(points: &[[f32; 3]]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let mut min = *first;
        let mut max = *first;
        for p in points {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        let center = Vector3::new(
            (min[0] + max[0]) * 0.5,
            (min[1] + max[1]) * 0.5,
            (min[2] + max[2]) * 0.5,
        );
        let radius = points
            .iter()
            .map(|p| (Vector3::from(*p) - center).magnitude())
            .fold(0.0, f32::max);
        Self {
            min,
            max,
            center: center.into(),
            radius,
        }
    }
}

/**
 * Interleaved vertex as most backends want it in a vertex buffer.
 */
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

/// Converted geometry of one mesh. Attribute vectors are either empty or
/// exactly as long as `positions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tangents: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
    pub bounds: Bounds,
}

impl MeshGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Area weighted vertex normals from the current triangles.
    pub fn recompute_normals(&mut self) {
        let mut normals = vec![Vector3::zero(); self.positions.len()];
        for [a, b, c] in self.triangles() {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            let pa = Vector3::from(self.positions[a]);
            let pb = Vector3::from(self.positions[b]);
            let pc = Vector3::from(self.positions[c]);
            let face = (pb - pa).cross(pc - pa);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        self.normals = normals
            .into_iter()
            .map(|n| {
                if n.magnitude2() > f32::EPSILON * f32::EPSILON {
                    n.normalize().into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect();
    }

    pub fn recompute_bounds(&mut self) {
        self.bounds = Bounds::from_points(&self.positions);
    }

    /// Interleaved vertices; missing attributes are zero (colour white).
    pub fn vertices(&self) -> Vec<MeshVertex> {
        (0..self.positions.len())
            .map(|i| MeshVertex {
                position: self.positions[i],
                normal: self.normals.get(i).copied().unwrap_or_default(),
                tex_coords: self.uvs.get(i).copied().unwrap_or_default(),
                color: self.colors.get(i).copied().unwrap_or([1.0; 4]),
            })
            .collect()
    }

    pub fn vertex_bytes(vertices: &[MeshVertex]) -> &[u8] {
        bytemuck::cast_slice(vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshGeometry {
        MeshGeometry {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 0.0, 1.0],
                [0.0, 0.0, 1.0],
            ],
            indices: vec![0, 2, 1, 0, 3, 2],
            ..Default::default()
        }
    }

    #[test]
    fn normals_follow_winding() {
        let mut mesh = quad();
        mesh.recompute_normals();
        for n in &mesh.normals {
            assert!((n[1] - 1.0).abs() < 1e-6, "{n:?}");
        }
    }

    #[test]
    fn bounds_cover_all_points() {
        let mut mesh = quad();
        mesh.recompute_bounds();
        assert_eq!(mesh.bounds.min, [0.0, 0.0, 0.0]);
        assert_eq!(mesh.bounds.max, [1.0, 0.0, 1.0]);
        assert_eq!(mesh.bounds.center, [0.5, 0.0, 0.5]);
        assert!((mesh.bounds.radius - 0.5f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn interleaved_vertices_are_pod() {
        let mesh = quad();
        let vertices = mesh.vertices();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[0].color, [1.0; 4]);
        assert_eq!(
            MeshGeometry::vertex_bytes(&vertices).len(),
            4 * std::mem::size_of::<MeshVertex>()
        );
    }
}
