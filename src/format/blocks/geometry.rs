//! Triangle geometry: the shape blocks and their vertex data.

use cgmath::Vector3;

use crate::{
    error::Result,
    format::{blocks::node::AvObject, cursor::BinaryReader, header::Header, refs::BlockRef},
};

/// Vector flag bit announcing tangents and bitangents after the normals.
pub const HAS_TANGENTS: u16 = 0x1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryKind {
    TriShape,
    LodTriShape,
    TriStrips,
}

/// Per geometry material list of 20.2.0.5+ streams, or the inline shader name
/// of older ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialData {
    pub names: Vec<Option<String>>,
    pub extra_data: Vec<u32>,
    pub active: i32,
    pub needs_update: bool,
    pub shader_name: Option<String>,
}

impl MaterialData {
    fn read(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let versions = &header.versions;
        let mut data = MaterialData::default();
        if versions.has_material_data() {
            let count = reader.read_count(8)?;
            for _ in 0..count {
                data.names.push(reader.read_string(header)?);
            }
            data.extra_data = reader.read_u32s(count)?;
            data.active = reader.read_i32()?;
            if versions.has_material_needs_update() {
                data.needs_update = reader.read_u8()? != 0;
            }
        } else if versions.has_legacy_shader_name() && reader.read_bool(versions)? {
            data.shader_name = reader.read_string(header)?;
            reader.read_i32()?;
        }
        Ok(data)
    }
}

/// NiTriShape, BSLODTriShape and NiTriStrips.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub av: AvObject,
    pub data: BlockRef,
    pub skin: BlockRef,
    pub material: MaterialData,
    pub shader: BlockRef,
    pub alpha: BlockRef,
    pub lod_sizes: Option<[u32; 3]>,
}

impl Geometry {
    pub fn read(reader: &mut BinaryReader, header: &Header, kind: GeometryKind) -> Result<Self> {
        let av = AvObject::read(reader, header)?;
        let data = reader.read_ref()?;
        let skin = reader.read_ref()?;
        let material = MaterialData::read(reader, header)?;
        let (shader, alpha) = if header.versions.has_shader_alpha_refs() {
            (reader.read_ref()?, reader.read_ref()?)
        } else {
            (BlockRef::NONE, BlockRef::NONE)
        };
        let lod_sizes = match kind {
            GeometryKind::LodTriShape => {
                Some([reader.read_u32()?, reader.read_u32()?, reader.read_u32()?])
            }
            _ => None,
        };
        Ok(Self {
            kind,
            av,
            data,
            skin,
            material,
            shader,
            alpha,
            lod_sizes,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitives {
    Triangles(Vec<[u16; 3]>),
    Strips(Vec<Vec<u16>>),
}

/// NiTriShapeData and NiTriStripsData.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryData {
    pub group_id: i32,
    pub vertices: Vec<Vector3<f32>>,
    pub vector_flags: u16,
    pub normals: Vec<Vector3<f32>>,
    pub tangents: Vec<Vector3<f32>>,
    pub bitangents: Vec<Vector3<f32>>,
    pub center: Vector3<f32>,
    pub radius: f32,
    pub colors: Vec<[f32; 4]>,
    pub uv_sets: Vec<Vec<[f32; 2]>>,
    pub consistency: u16,
    pub additional_data: BlockRef,
    pub primitives: Primitives,
    pub match_groups: Vec<Vec<u16>>,
}

impl GeometryData {
    pub fn read_tri_shape(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let mut data = Self::read_common(reader, header)?;
        let versions = &header.versions;
        let num_triangles = reader.read_u16()? as usize;
        let _num_points = reader.read_u32()?;
        let has_triangles = if versions.has_triangles_flag() {
            reader.read_bool(versions)?
        } else {
            true
        };
        let mut triangles = Vec::new();
        if has_triangles {
            reader.check_count(num_triangles as u64, 6)?;
            triangles.reserve(num_triangles);
            for _ in 0..num_triangles {
                triangles.push([reader.read_u16()?, reader.read_u16()?, reader.read_u16()?]);
            }
        }
        let num_groups = reader.read_u16()? as usize;
        reader.check_count(num_groups as u64, 2)?;
        for _ in 0..num_groups {
            let count = reader.read_u16()? as usize;
            data.match_groups.push(reader.read_u16s(count)?);
        }
        data.primitives = Primitives::Triangles(triangles);
        Ok(data)
    }

    pub fn read_tri_strips(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let mut data = Self::read_common(reader, header)?;
        let versions = &header.versions;
        let _num_triangles = reader.read_u16()?;
        let num_strips = reader.read_u16()? as usize;
        let lengths = reader.read_u16s(num_strips)?;
        let has_points = if versions.has_strip_points_flag() {
            reader.read_bool(versions)?
        } else {
            true
        };
        let mut strips = Vec::with_capacity(num_strips);
        if has_points {
            for length in lengths {
                strips.push(reader.read_u16s(length as usize)?);
            }
        }
        data.primitives = Primitives::Strips(strips);
        Ok(data)
    }

    fn read_common(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let versions = &header.versions;
        let group_id = if versions.has_data_group_id() {
            reader.read_i32()?
        } else {
            0
        };
        let num_vertices = reader.read_u16()? as usize;
        if versions.has_keep_compress_flags() {
            reader.read_u8()?;
            reader.read_u8()?;
        }

        let vertices = if reader.read_bool(versions)? {
            read_vectors(reader, num_vertices)?
        } else {
            Vec::new()
        };

        let (vector_flags, legacy_uv_sets) = if versions.has_vector_flags() {
            (reader.read_u16()?, None)
        } else {
            (0, Some(reader.read_u16()? as usize))
        };

        let mut normals = Vec::new();
        let mut tangents = Vec::new();
        let mut bitangents = Vec::new();
        if reader.read_bool(versions)? {
            normals = read_vectors(reader, num_vertices)?;
            if vector_flags & HAS_TANGENTS != 0 {
                tangents = read_vectors(reader, num_vertices)?;
                bitangents = read_vectors(reader, num_vertices)?;
            }
        }

        let center = reader.read_vec3()?;
        let radius = reader.read_f32()?;

        let colors = if reader.read_bool(versions)? {
            reader.check_count(num_vertices as u64, 16)?;
            (0..num_vertices)
                .map(|_| reader.read_color4())
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        let num_uv_sets = legacy_uv_sets.unwrap_or_else(|| versions.uv_set_count(vector_flags));
        reader.check_count((num_uv_sets * num_vertices) as u64, 8)?;
        let mut uv_sets = Vec::with_capacity(num_uv_sets);
        for _ in 0..num_uv_sets {
            uv_sets.push(
                (0..num_vertices)
                    .map(|_| reader.read_vec2())
                    .collect::<Result<Vec<_>>>()?,
            );
        }

        let consistency = if versions.has_consistency_flags() {
            reader.read_u16()?
        } else {
            0
        };
        let additional_data = if versions.has_additional_data() {
            reader.read_ref()?
        } else {
            BlockRef::NONE
        };

        Ok(Self {
            group_id,
            vertices,
            vector_flags,
            normals,
            tangents,
            bitangents,
            center,
            radius,
            colors,
            uv_sets,
            consistency,
            additional_data,
            primitives: Primitives::Triangles(Vec::new()),
            match_groups: Vec::new(),
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }
}

fn read_vectors(reader: &mut BinaryReader, count: usize) -> Result<Vec<Vector3<f32>>> {
    reader.check_count(count as u64, 12)?;
    (0..count).map(|_| reader.read_vec3()).collect()
}
