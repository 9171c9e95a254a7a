//! Havok collision blocks.
//!
//! Positions in these blocks are in Havok units; the collision builder
//! scales them by [`Versions::havok_scale`](crate::format::version::Versions::havok_scale)
//! before the usual coordinate conversion.

use cgmath::{Quaternion, Vector3, Vector4};

use crate::{
    error::Result,
    format::{cursor::BinaryReader, header::Header, refs::BlockRef},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HavokFilter {
    pub layer: u8,
    pub flags: u8,
    pub group: u16,
}

impl HavokFilter {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            layer: reader.read_u8()?,
            flags: reader.read_u8()?,
            group: reader.read_u16()?,
        })
    }
}

/// Data, size and capacity words of an hkArray-backed property.
fn skip_property(reader: &mut BinaryReader) -> Result<()> {
    reader.skip(12)
}

/// bhkCollisionObject.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollisionObject {
    pub target: BlockRef,
    pub flags: u16,
    pub body: BlockRef,
}

impl CollisionObject {
    pub fn read(reader: &mut BinaryReader, _header: &Header) -> Result<Self> {
        Ok(Self {
            target: reader.read_ref()?,
            flags: reader.read_u16()?,
            body: reader.read_ref()?,
        })
    }
}

/// bhkRigidBody and bhkRigidBodyT.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidBody {
    /// Set for bhkRigidBodyT, whose translation and rotation place the shape.
    pub transformed: bool,
    pub shape: BlockRef,
    pub filter: HavokFilter,
    pub broad_phase: u8,
    pub collision_response: u8,
    pub callback_delay: u16,
    pub translation: Vector4<f32>,
    pub rotation: Quaternion<f32>,
    pub linear_velocity: Vector4<f32>,
    pub angular_velocity: Vector4<f32>,
    pub inertia: [f32; 12],
    pub center: Vector4<f32>,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub time_factor: f32,
    pub gravity_factor: f32,
    pub friction: f32,
    pub rolling_friction: f32,
    pub restitution: f32,
    pub max_linear_velocity: f32,
    pub max_angular_velocity: f32,
    pub penetration_depth: f32,
    pub motion_system: u8,
    pub deactivator: u8,
    pub enable_deactivation: bool,
    pub solver_deactivation: u8,
    pub quality: u8,
    pub constraints: Vec<BlockRef>,
    pub body_flags: u32,
}

impl RigidBody {
    pub fn read(reader: &mut BinaryReader, header: &Header, transformed: bool) -> Result<Self> {
        let versions = &header.versions;
        let shape = reader.read_ref()?;
        let filter = HavokFilter::read(reader)?;
        reader.skip(4)?;
        let broad_phase = reader.read_u8()?;
        reader.skip(3)?;
        skip_property(reader)?;

        // construction info
        reader.skip(4)?;
        HavokFilter::read(reader)?;
        reader.skip(4)?;
        let collision_response = reader.read_u8()?;
        reader.read_u8()?;
        let callback_delay = reader.read_u16()?;
        let translation = reader.read_vec4()?;
        let rotation = reader.read_quat_xyzw()?;
        let linear_velocity = reader.read_vec4()?;
        let angular_velocity = reader.read_vec4()?;
        let mut inertia = [0f32; 12];
        for value in inertia.iter_mut() {
            *value = reader.read_f32()?;
        }
        let center = reader.read_vec4()?;
        let mass = reader.read_f32()?;
        let linear_damping = reader.read_f32()?;
        let angular_damping = reader.read_f32()?;
        let (time_factor, gravity_factor) = if versions.has_skyrim_body_params() {
            (reader.read_f32()?, reader.read_f32()?)
        } else {
            (1.0, 1.0)
        };
        let friction = reader.read_f32()?;
        let rolling_friction = if versions.has_skyrim_body_params() {
            reader.read_f32()?
        } else {
            0.0
        };
        let restitution = reader.read_f32()?;
        let max_linear_velocity = reader.read_f32()?;
        let max_angular_velocity = reader.read_f32()?;
        let penetration_depth = reader.read_f32()?;
        let motion_system = reader.read_u8()?;
        let deactivator = reader.read_u8()?;
        let enable_deactivation = reader.read_u8()? != 0;
        let solver_deactivation = reader.read_u8()?;
        let quality = reader.read_u8()?;
        if versions.has_skyrim_body_params() {
            // auto remove level, response modifiers, shape keys, force collide
            reader.skip(4)?;
        }
        reader.skip(12)?;

        let constraints = reader.read_refs()?;
        let body_flags = if versions.body_flags_are_u16() {
            reader.read_u16()? as u32
        } else {
            reader.read_u32()?
        };

        Ok(Self {
            transformed,
            shape,
            filter,
            broad_phase,
            collision_response,
            callback_delay,
            translation,
            rotation,
            linear_velocity,
            angular_velocity,
            inertia,
            center,
            mass,
            linear_damping,
            angular_damping,
            time_factor,
            gravity_factor,
            friction,
            rolling_friction,
            restitution,
            max_linear_velocity,
            max_angular_velocity,
            penetration_depth,
            motion_system,
            deactivator,
            enable_deactivation,
            solver_deactivation,
            quality,
            constraints,
            body_flags,
        })
    }
}

/// bhkMoppBvTreeShape. The MOPP code is kept but never interpreted.
#[derive(Clone, Debug, PartialEq)]
pub struct MoppBvTree {
    pub shape: BlockRef,
    pub shape_scale: f32,
    pub origin: Vector3<f32>,
    pub scale: f32,
    pub build_type: Option<u8>,
    pub data: Vec<u8>,
}

impl MoppBvTree {
    pub fn read(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let shape = reader.read_ref()?;
        reader.skip(12)?;
        let shape_scale = reader.read_f32()?;
        let size = reader.read_count(1)?;
        let origin = reader.read_vec3()?;
        let scale = reader.read_f32()?;
        let build_type = if header.versions.has_mopp_build_type() {
            Some(reader.read_u8()?)
        } else {
            None
        };
        let data = reader.read_bytes(size)?;
        Ok(Self {
            shape,
            shape_scale,
            origin,
            scale,
            build_type,
            data,
        })
    }
}

/// bhkListShape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListShape {
    pub shapes: Vec<BlockRef>,
    pub material: u32,
    pub unknown_ints: Vec<u32>,
}

impl ListShape {
    pub fn read(reader: &mut BinaryReader, _header: &Header) -> Result<Self> {
        let shapes = reader.read_refs()?;
        let material = reader.read_u32()?;
        skip_property(reader)?;
        skip_property(reader)?;
        let count = reader.read_count(4)?;
        let unknown_ints = reader.read_u32s(count)?;
        Ok(Self {
            shapes,
            material,
            unknown_ints,
        })
    }
}

/// bhkConvexVerticesShape.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexVerticesShape {
    pub material: u32,
    pub radius: f32,
    pub vertices: Vec<Vector4<f32>>,
    /// Face planes: normal in xyz, distance in w.
    pub normals: Vec<Vector4<f32>>,
}

impl ConvexVerticesShape {
    pub fn read(reader: &mut BinaryReader, _header: &Header) -> Result<Self> {
        let material = reader.read_u32()?;
        let radius = reader.read_f32()?;
        skip_property(reader)?;
        skip_property(reader)?;
        let vertices = read_vec4s(reader)?;
        let normals = read_vec4s(reader)?;
        Ok(Self {
            material,
            radius,
            vertices,
            normals,
        })
    }
}

/// bhkBoxShape. Dimensions are half extents.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxShape {
    pub material: u32,
    pub radius: f32,
    pub dimensions: Vector3<f32>,
}

impl BoxShape {
    pub fn read(reader: &mut BinaryReader, _header: &Header) -> Result<Self> {
        let material = reader.read_u32()?;
        let radius = reader.read_f32()?;
        reader.skip(8)?;
        let dimensions = reader.read_vec3()?;
        reader.read_f32()?;
        Ok(Self {
            material,
            radius,
            dimensions,
        })
    }
}

/// bhkSphereShape.
#[derive(Clone, Debug, PartialEq)]
pub struct SphereShape {
    pub material: u32,
    pub radius: f32,
}

impl SphereShape {
    pub fn read(reader: &mut BinaryReader, _header: &Header) -> Result<Self> {
        Ok(Self {
            material: reader.read_u32()?,
            radius: reader.read_f32()?,
        })
    }
}

/// bhkCapsuleShape.
#[derive(Clone, Debug, PartialEq)]
pub struct CapsuleShape {
    pub material: u32,
    pub radius: f32,
    pub first_point: Vector3<f32>,
    pub first_radius: f32,
    pub second_point: Vector3<f32>,
    pub second_radius: f32,
}

impl CapsuleShape {
    pub fn read(reader: &mut BinaryReader, _header: &Header) -> Result<Self> {
        let material = reader.read_u32()?;
        let radius = reader.read_f32()?;
        reader.skip(8)?;
        Ok(Self {
            material,
            radius,
            first_point: reader.read_vec3()?,
            first_radius: reader.read_f32()?,
            second_point: reader.read_vec3()?,
            second_radius: reader.read_f32()?,
        })
    }
}

/// bhkCompressedMeshShape.
#[derive(Clone, Debug, PartialEq)]
pub struct CompressedMeshShape {
    pub target: BlockRef,
    pub user_data: u32,
    pub radius: f32,
    pub scale: Vector4<f32>,
    pub data: BlockRef,
}

impl CompressedMeshShape {
    pub fn read(reader: &mut BinaryReader, _header: &Header) -> Result<Self> {
        let target = reader.read_ref()?;
        let user_data = reader.read_u32()?;
        let radius = reader.read_f32()?;
        reader.read_f32()?;
        let scale = reader.read_vec4()?;
        // radius and scale copies
        reader.read_f32()?;
        reader.read_vec4()?;
        let data = reader.read_ref()?;
        Ok(Self {
            target,
            user_data,
            radius,
            scale,
            data,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkMaterial {
    pub material: u32,
    pub filter: HavokFilter,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkTransform {
    pub translation: Vector4<f32>,
    pub rotation: Quaternion<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BigTriangle {
    pub triangle: [u16; 3],
    pub material: u32,
    pub welding: u16,
}

/// A quantised piece of a compressed mesh. Vertices are stored as u16
/// triples offset from `translation` in steps of the data's `error`.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    pub translation: Vector4<f32>,
    pub material_index: u32,
    pub reference: u16,
    pub transform_index: u16,
    pub vertices: Vec<u16>,
    pub indices: Vec<u16>,
    pub strips: Vec<u16>,
    pub welding: Vec<u16>,
}

impl Chunk {
    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let translation = reader.read_vec4()?;
        let material_index = reader.read_u32()?;
        let reference = reader.read_u16()?;
        let transform_index = reader.read_u16()?;
        let mut lists: [Vec<u16>; 4] = Default::default();
        for list in lists.iter_mut() {
            let count = reader.read_count(2)?;
            *list = reader.read_u16s(count)?;
        }
        let [vertices, indices, strips, welding] = lists;
        Ok(Self {
            translation,
            material_index,
            reference,
            transform_index,
            vertices,
            indices,
            strips,
            welding,
        })
    }
}

/// bhkCompressedMeshShapeData.
#[derive(Clone, Debug, PartialEq)]
pub struct CompressedMeshData {
    pub bits_per_index: u32,
    pub bits_per_w_index: u32,
    pub w_index_mask: u32,
    pub index_mask: u32,
    pub error: f32,
    pub bounds_min: Vector4<f32>,
    pub bounds_max: Vector4<f32>,
    pub welding_type: u8,
    pub material_type: u8,
    pub chunk_materials: Vec<ChunkMaterial>,
    pub transforms: Vec<ChunkTransform>,
    pub big_vertices: Vec<Vector4<f32>>,
    pub big_triangles: Vec<BigTriangle>,
    pub chunks: Vec<Chunk>,
}

impl CompressedMeshData {
    pub fn read(reader: &mut BinaryReader, _header: &Header) -> Result<Self> {
        let bits_per_index = reader.read_u32()?;
        let bits_per_w_index = reader.read_u32()?;
        let w_index_mask = reader.read_u32()?;
        let index_mask = reader.read_u32()?;
        let error = reader.read_f32()?;
        let bounds_min = reader.read_vec4()?;
        let bounds_max = reader.read_vec4()?;
        let welding_type = reader.read_u8()?;
        let material_type = reader.read_u8()?;

        // 32, 16 and 8 bit material lists, unused by the games
        for width in [4, 2, 1] {
            let count = reader.read_count(width)?;
            reader.skip(count as u64 * width)?;
        }

        let count = reader.read_count(8)?;
        let mut chunk_materials = Vec::with_capacity(count);
        for _ in 0..count {
            chunk_materials.push(ChunkMaterial {
                material: reader.read_u32()?,
                filter: HavokFilter::read(reader)?,
            });
        }
        let _named_materials = reader.read_u32()?;

        let count = reader.read_count(32)?;
        let mut transforms = Vec::with_capacity(count);
        for _ in 0..count {
            transforms.push(ChunkTransform {
                translation: reader.read_vec4()?,
                rotation: reader.read_quat_xyzw()?,
            });
        }

        let big_vertices = read_vec4s(reader)?;

        let count = reader.read_count(12)?;
        let mut big_triangles = Vec::with_capacity(count);
        for _ in 0..count {
            big_triangles.push(BigTriangle {
                triangle: [reader.read_u16()?, reader.read_u16()?, reader.read_u16()?],
                material: reader.read_u32()?,
                welding: reader.read_u16()?,
            });
        }

        let count = reader.read_count(36)?;
        let mut chunks = Vec::with_capacity(count);
        for _ in 0..count {
            chunks.push(Chunk::read(reader)?);
        }
        let _convex_pieces = reader.read_u32()?;

        Ok(Self {
            bits_per_index,
            bits_per_w_index,
            w_index_mask,
            index_mask,
            error,
            bounds_min,
            bounds_max,
            welding_type,
            material_type,
            chunk_materials,
            transforms,
            big_vertices,
            big_triangles,
            chunks,
        })
    }
}

fn read_vec4s(reader: &mut BinaryReader) -> Result<Vec<Vector4<f32>>> {
    let count = reader.read_count(16)?;
    (0..count).map(|_| reader.read_vec4()).collect()
}
