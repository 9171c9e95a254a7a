//! Collision graph builder.
//!
//! Collision blocks hang off scene objects through their collision reference
//! and are dispatched through their own table, disjoint from the scene
//! builders. Wrappers (collision object, rigid body, MOPP tree) unwrap to the
//! block they hold, list shapes become a parent node and leaf shapes are
//! converted into [`CollisionShape`]s in target space.

use cgmath::{Rotation, Vector3};
use futures::{FutureExt, future::LocalBoxFuture};
use log::{debug, warn};

use crate::{
    builder::{BuilderEntry, SceneBuilder, dispatch, strip_triangles},
    convert,
    data_structures::{
        collision::{CollisionNode, CollisionShape, RigidBodyInfo},
        transform::Transform,
    },
    flow::checkpoint,
    format::{
        blocks::{
            Block, BoxShape, CapsuleShape, Chunk, CompressedMeshData, CompressedMeshShape,
            ConvexVerticesShape, ListShape, RigidBody, SphereShape,
        },
        file::BlockEntry,
        refs::BlockRef,
        version::Versions,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CollisionKind {
    Object,
    RigidBody,
    Mopp,
    List,
    CompressedMesh,
    CompressedMeshData,
    Convex,
    Box,
    Sphere,
    Capsule,
}

macro_rules! collision_builders {
    ($($name:literal => $variant:ident : $kind:ident),* $(,)?) => {
        const COLLISION_BUILDERS: &[BuilderEntry<CollisionKind>] = &[
            $(BuilderEntry {
                name: $name,
                applies: |entry: &BlockEntry| matches!(entry.block, Block::$variant(_)),
                kind: CollisionKind::$kind,
            }),*
        ];
    };
}

collision_builders! {
    "collision object" => CollisionObject: Object,
    "rigid body" => RigidBody: RigidBody,
    "bounding volume tree" => MoppBvTree: Mopp,
    "list shape" => ListShape: List,
    "compressed mesh shape" => CompressedMesh: CompressedMesh,
    "compressed mesh data" => CompressedMeshData: CompressedMeshData,
    "convex vertices" => ConvexVertices: Convex,
    "box" => BoxShape: Box,
    "sphere" => SphereShape: Sphere,
    "capsule" => CapsuleShape: Capsule,
}

fn body_info(body: &RigidBody, versions: &Versions) -> RigidBodyInfo {
    RigidBodyInfo {
        layer: body.filter.layer,
        mass: body.mass,
        friction: body.friction,
        restitution: body.restitution,
        linear_damping: body.linear_damping,
        angular_damping: body.angular_damping,
        gravity_factor: body.gravity_factor,
        center_of_mass: convert::havok_position(body.center.truncate(), versions).into(),
        motion_system: body.motion_system,
        quality: body.quality,
    }
}

/// Placement carried by bhkRigidBodyT.
fn body_transform(body: &RigidBody, versions: &Versions) -> Transform {
    Transform {
        position: convert::havok_position(body.translation.truncate(), versions),
        rotation: convert::quaternion(body.rotation),
        ..Default::default()
    }
}

fn box_shape(shape: &BoxShape, versions: &Versions) -> CollisionShape {
    let extents = convert::havok_position(shape.dimensions, versions);
    CollisionShape::Box {
        half_extents: [extents.x.abs(), extents.y.abs(), extents.z.abs()],
    }
}

fn sphere_shape(shape: &SphereShape, versions: &Versions) -> CollisionShape {
    CollisionShape::Sphere {
        radius: convert::havok_length(shape.radius, versions),
    }
}

fn capsule_shape(shape: &CapsuleShape, versions: &Versions) -> CollisionShape {
    CollisionShape::Capsule {
        start: convert::havok_position(shape.first_point, versions).into(),
        end: convert::havok_position(shape.second_point, versions).into(),
        radius: convert::havok_length(shape.radius, versions),
    }
}

fn convex_shape(shape: &ConvexVerticesShape, versions: &Versions) -> CollisionShape {
    CollisionShape::ConvexHull {
        points: shape
            .vertices
            .iter()
            .map(|v| convert::havok_position(v.truncate(), versions).into())
            .collect(),
        radius: convert::havok_length(shape.radius, versions),
    }
}

/// Triangles of a chunk in chunk-local indices: strips first, then the
/// remaining indices as a plain list.
fn chunk_triangles(chunk: &Chunk) -> Vec<[u16; 3]> {
    let mut triangles = Vec::new();
    let mut start = 0usize;
    for length in &chunk.strips {
        let end = (start + *length as usize).min(chunk.indices.len());
        triangles.extend(strip_triangles(&chunk.indices[start..end]));
        start = end;
    }
    triangles.extend(
        chunk.indices[start..]
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]]),
    );
    triangles
}

/// Chunk vertices in Havok space: quantized offsets from the chunk origin,
/// then the chunk transform if it names one.
fn chunk_vertices(chunk: &Chunk, data: &CompressedMeshData) -> Vec<Vector3<f32>> {
    let origin = chunk.translation.truncate();
    let transform = data.transforms.get(chunk.transform_index as usize);
    chunk
        .vertices
        .chunks_exact(3)
        .map(|q| {
            let local = origin
                + Vector3::new(q[0] as f32, q[1] as f32, q[2] as f32) * data.error;
            match transform {
                Some(t) => t.rotation.rotate_vector(local) + t.translation.truncate(),
                None => local,
            }
        })
        .collect()
}

impl<'f> SceneBuilder<'f> {
    /// Dispatches one collision block. `None` for absent or dangling
    /// references, back edges and blocks no collision builder accepts.
    pub(crate) fn build_collision(&mut self, reference: BlockRef) -> LocalBoxFuture<'_, Option<CollisionNode>> {
        async move {
            let (index, entry) = self.enter(reference)?;
            let versions = self.file.header.versions;
            let name = entry.type_name.as_str();
            let built = match dispatch(COLLISION_BUILDERS, entry) {
                Some((builder, kind)) => {
                    debug!(
                        "{}: building collision block {} (`{}`) with the {} builder",
                        self.file_name(),
                        index,
                        name,
                        builder
                    );
                    match (kind, &entry.block) {
                        (CollisionKind::Object, Block::CollisionObject(object)) => {
                            self.build_collision(object.body).await
                        }
                        (CollisionKind::RigidBody, Block::RigidBody(body)) => {
                            self.build_rigid_body(body).await
                        }
                        (CollisionKind::Mopp, Block::MoppBvTree(tree)) => {
                            self.build_collision(tree.shape).await
                        }
                        (CollisionKind::List, Block::ListShape(list)) => {
                            Some(self.build_list(name, list).await)
                        }
                        (CollisionKind::CompressedMesh, Block::CompressedMesh(shape)) => {
                            self.build_compressed_mesh(shape).await
                        }
                        (CollisionKind::CompressedMeshData, Block::CompressedMeshData(data)) => {
                            Some(CollisionNode::with_shape(
                                name,
                                self.compressed_mesh_shape(data, &versions).await,
                            ))
                        }
                        (CollisionKind::Convex, Block::ConvexVertices(shape)) => {
                            Some(CollisionNode::with_shape(name, convex_shape(shape, &versions)))
                        }
                        (CollisionKind::Box, Block::BoxShape(shape)) => {
                            Some(CollisionNode::with_shape(name, box_shape(shape, &versions)))
                        }
                        (CollisionKind::Sphere, Block::SphereShape(shape)) => {
                            Some(CollisionNode::with_shape(name, sphere_shape(shape, &versions)))
                        }
                        (CollisionKind::Capsule, Block::CapsuleShape(shape)) => {
                            Some(CollisionNode::with_shape(name, capsule_shape(shape, &versions)))
                        }
                        _ => None,
                    }
                }
                None => {
                    debug!(
                        "{}: no collision builder for block {} (`{}`)",
                        self.file_name(),
                        index,
                        name
                    );
                    None
                }
            };
            self.leave(index);
            checkpoint().await;
            built
        }
        .boxed_local()
    }

    async fn build_rigid_body(&mut self, body: &'f RigidBody) -> Option<CollisionNode> {
        let versions = self.file.header.versions;
        let mut node = self.build_collision(body.shape).await?;
        node.body = Some(body_info(body, &versions));
        if body.transformed {
            node.transform = &body_transform(body, &versions) * &node.transform;
        }
        Some(node)
    }

    async fn build_list(&mut self, name: &str, list: &'f ListShape) -> CollisionNode {
        let mut node = CollisionNode::new(name);
        for shape in &list.shapes {
            if shape.is_none() {
                continue;
            }
            if let Some(child) = self.build_collision(*shape).await {
                node.children.push(child);
            }
        }
        node
    }

    /// Builds the data block, then applies the shape scale in target axes.
    async fn build_compressed_mesh(&mut self, shape: &'f CompressedMeshShape) -> Option<CollisionNode> {
        let mut node = self.build_collision(shape.data).await?;
        let scale = convert::direction(shape.scale.truncate());
        node.transform.scale = Vector3::new(
            node.transform.scale.x * scale.x,
            node.transform.scale.y * scale.y,
            node.transform.scale.z * scale.z,
        );
        Some(node)
    }

    async fn compressed_mesh_shape(&self, data: &CompressedMeshData, versions: &Versions) -> CollisionShape {
        let batch = self.context.vertex_batch.max(1);
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        let mut dropped = 0usize;
        let mut emitted = 0usize;

        for chunk in &data.chunks {
            let base = positions.len() as u32;
            let vertices = chunk_vertices(chunk, data);
            let count = vertices.len();
            positions.extend(vertices.into_iter().map(|v| -> [f32; 3] {
                convert::havok_position(v, versions).into()
            }));
            for triangle in chunk_triangles(chunk) {
                if triangle.iter().any(|i| *i as usize >= count) {
                    dropped += 1;
                    continue;
                }
                indices.extend(convert::winding(triangle).map(|i| base + u32::from(i)));
                emitted += 1;
                if emitted % batch == 0 {
                    checkpoint().await;
                }
            }
            checkpoint().await;
        }

        let base = positions.len() as u32;
        let count = data.big_vertices.len();
        positions.extend(data.big_vertices.iter().map(|v| -> [f32; 3] {
            convert::havok_position(v.truncate(), versions).into()
        }));
        for big in &data.big_triangles {
            if big.triangle.iter().any(|i| *i as usize >= count) {
                dropped += 1;
                continue;
            }
            indices.extend(convert::winding(big.triangle).map(|i| base + u32::from(i)));
        }

        if dropped > 0 {
            warn!(
                "{}: compressed mesh dropped {} triangles indexing past their vertices",
                self.file_name(),
                dropped
            );
        }
        CollisionShape::TriangleMesh { positions, indices }
    }
}
