//! Writes small synthetic `.nif` streams with exactly the layout the decoders
//! expect, block sizes included. Only what the tests need is covered.

use byteorder::{LittleEndian, WriteBytesExt};
use flow_nif::format::version::{V20_0_0_5, V20_2_0_7, Versions};

pub const NONE: i32 = -1;

/// Little endian block body under construction.
pub struct Bytes<'a> {
    pub buf: Vec<u8>,
    versions: Versions,
    strings: &'a mut Vec<String>,
}

impl Bytes<'_> {
    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.write_u16::<LittleEndian>(value).unwrap();
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.write_u32::<LittleEndian>(value).unwrap();
        self
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.buf.write_i32::<LittleEndian>(value).unwrap();
        self
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.buf.write_f32::<LittleEndian>(value).unwrap();
        self
    }

    pub fn floats(&mut self, values: &[f32]) -> &mut Self {
        for value in values {
            self.f32(*value);
        }
        self
    }

    pub fn zeros(&mut self, count: usize) -> &mut Self {
        self.buf.extend(std::iter::repeat_n(0u8, count));
        self
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        if self.versions.bool_is_byte() {
            self.u8(value as u8)
        } else {
            self.u32(value as u32)
        }
    }

    pub fn sized_string(&mut self, text: &str) -> &mut Self {
        self.u32(text.len() as u32);
        self.buf.extend_from_slice(text.as_bytes());
        self
    }

    /// String table index, or inline text before the table existed.
    pub fn string(&mut self, text: Option<&str>) -> &mut Self {
        if !self.versions.has_string_table() {
            return self.sized_string(text.unwrap_or_default());
        }
        match text {
            None => self.u32(u32::MAX),
            Some(text) => {
                let index = match self.strings.iter().position(|s| s == text) {
                    Some(index) => index,
                    None => {
                        self.strings.push(text.to_string());
                        self.strings.len() - 1
                    }
                };
                self.u32(index as u32)
            }
        }
    }

    pub fn refs(&mut self, refs: &[i32]) -> &mut Self {
        self.u32(refs.len() as u32);
        for reference in refs {
            self.i32(*reference);
        }
        self
    }

    pub fn u16s(&mut self, values: &[u16]) -> &mut Self {
        for value in values {
            self.u16(*value);
        }
        self
    }

    pub fn versions(&self) -> Versions {
        self.versions
    }
}

struct RawBlock {
    type_name: String,
    body: Vec<u8>,
    declared_size: Option<u32>,
}

pub struct NifWriter {
    versions: Versions,
    strings: Vec<String>,
    blocks: Vec<RawBlock>,
    roots: Vec<i32>,
}

impl NifWriter {
    pub fn new(versions: Versions) -> Self {
        Self {
            versions,
            strings: Vec::new(),
            blocks: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// 20.2.0.7, user version 12, Bethesda 83.
    pub fn skyrim() -> Self {
        Self::new(Versions::new(V20_2_0_7, 12, 83))
    }

    /// 20.0.0.5, user version 11, Bethesda 11: inline strings, no size table.
    pub fn oblivion() -> Self {
        Self::new(Versions::new(V20_0_0_5, 11, 11))
    }

    pub fn versions(&self) -> Versions {
        self.versions
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Appends a block and returns its index.
    pub fn block(&mut self, type_name: &str, write: impl FnOnce(&mut Bytes)) -> i32 {
        let mut bytes = Bytes {
            buf: Vec::new(),
            versions: self.versions,
            strings: &mut self.strings,
        };
        write(&mut bytes);
        let body = bytes.buf;
        self.push(type_name, body, None)
    }

    /// Appends opaque bytes, optionally declaring a size other than their length.
    pub fn raw_block(&mut self, type_name: &str, body: Vec<u8>, declared_size: Option<u32>) -> i32 {
        self.push(type_name, body, declared_size)
    }

    fn push(&mut self, type_name: &str, body: Vec<u8>, declared_size: Option<u32>) -> i32 {
        self.blocks.push(RawBlock {
            type_name: type_name.to_string(),
            body,
            declared_size,
        });
        self.blocks.len() as i32 - 1
    }

    pub fn root(&mut self, index: i32) -> &mut Self {
        self.roots.push(index);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let v = self.versions;
        let mut out = Bytes {
            buf: Vec::new(),
            versions: v,
            strings: &mut Vec::new(),
        };
        let dotted = v.dotted();
        out.buf
            .extend_from_slice(format!("Gamebryo File Format, Version {dotted}\n").as_bytes());
        out.u32(v.version);
        if v.has_endian_byte() {
            out.u8(1);
        }
        if v.has_user_version() {
            out.u32(v.user_version);
        }
        out.u32(self.blocks.len() as u32);
        if v.has_bs_header() {
            out.u32(v.bs_version);
            short_string(&mut out, "flow-nif tests");
            if v.has_unknown_export_int() {
                out.u32(0);
            }
            if v.has_process_script() {
                short_string(&mut out, "");
            }
            short_string(&mut out, "");
            if v.has_max_file_path() {
                short_string(&mut out, "");
            }
        }

        let mut types: Vec<&str> = Vec::new();
        let mut type_index = Vec::new();
        for block in &self.blocks {
            let index = match types.iter().position(|t| *t == block.type_name) {
                Some(index) => index,
                None => {
                    types.push(&block.type_name);
                    types.len() - 1
                }
            };
            type_index.push(index as u16);
        }
        out.u16(types.len() as u16);
        for name in &types {
            out.sized_string(name);
        }
        out.u16s(&type_index);
        if v.has_block_sizes() {
            for block in &self.blocks {
                out.u32(block.declared_size.unwrap_or(block.body.len() as u32));
            }
        }
        if v.has_string_table() {
            out.u32(self.strings.len() as u32);
            out.u32(self.strings.iter().map(String::len).max().unwrap_or(0) as u32);
            for text in &self.strings {
                out.sized_string(text);
            }
        }
        if v.has_groups() {
            out.u32(0);
        }

        for block in &self.blocks {
            out.buf.extend_from_slice(&block.body);
        }
        out.refs(&self.roots);
        out.buf
    }
}

fn short_string(out: &mut Bytes, text: &str) {
    out.u8(text.len() as u8 + 1);
    out.buf.extend_from_slice(text.as_bytes());
    out.u8(0);
}

/// The NiObjectNET / NiAVObject prefix.
pub struct Av<'a> {
    pub name: Option<&'a str>,
    pub extra_data: Vec<i32>,
    pub translation: [f32; 3],
    pub scale: f32,
    pub properties: Vec<i32>,
    pub collision: i32,
}

impl<'a> Av<'a> {
    pub fn named(name: &'a str) -> Self {
        Self {
            name: Some(name),
            ..Default::default()
        }
    }
}

impl Default for Av<'_> {
    fn default() -> Self {
        Self {
            name: None,
            extra_data: Vec::new(),
            translation: [0.0; 3],
            scale: 1.0,
            properties: Vec::new(),
            collision: NONE,
        }
    }
}

pub fn object_net(b: &mut Bytes, name: Option<&str>, extra_data: &[i32]) {
    b.string(name);
    if b.versions().has_extra_data_list() {
        b.refs(extra_data);
    } else {
        b.i32(extra_data.first().copied().unwrap_or(NONE));
    }
    if b.versions().has_controller() {
        b.i32(NONE);
    }
}

pub fn av_object(b: &mut Bytes, av: &Av) {
    object_net(b, av.name, &av.extra_data);
    if b.versions().av_flags_are_u32() {
        b.u32(14);
    } else {
        b.u16(14);
    }
    b.floats(&av.translation);
    b.floats(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    b.f32(av.scale);
    if b.versions().has_property_list() {
        b.refs(&av.properties);
    }
    if b.versions().has_collision_ref() {
        b.i32(av.collision);
    }
}

pub fn node(w: &mut NifWriter, type_name: &str, av: Av, children: &[i32]) -> i32 {
    w.block(type_name, |b| {
        av_object(b, &av);
        b.refs(children);
        if b.versions().has_effect_list() {
            b.refs(&[]);
        }
    })
}

/// NiTriShape or BSLODTriShape (when `lod_sizes` is given).
pub fn tri_shape(
    w: &mut NifWriter,
    av: Av,
    data: i32,
    shader: i32,
    alpha: i32,
    lod_sizes: Option<[u32; 3]>,
) -> i32 {
    let type_name = if lod_sizes.is_some() { "BSLODTriShape" } else { "NiTriShape" };
    w.block(type_name, |b| {
        geometry_prefix(b, &av, data, shader, alpha);
        if let Some(sizes) = lod_sizes {
            b.u32(sizes[0]).u32(sizes[1]).u32(sizes[2]);
        }
    })
}

pub fn tri_strips(w: &mut NifWriter, av: Av, data: i32, shader: i32) -> i32 {
    w.block("NiTriStrips", |b| geometry_prefix(b, &av, data, shader, NONE))
}

fn geometry_prefix(b: &mut Bytes, av: &Av, data: i32, shader: i32, alpha: i32) {
    av_object(b, av);
    b.i32(data).i32(NONE);
    let v = b.versions();
    if v.has_material_data() {
        b.u32(0).i32(-1);
        if v.has_material_needs_update() {
            b.u8(0);
        }
    } else if v.has_legacy_shader_name() {
        b.bool(false);
    }
    if v.has_shader_alpha_refs() {
        b.i32(shader).i32(alpha);
    }
}

fn geometry_common(b: &mut Bytes, vertices: &[[f32; 3]], normals: Option<&[[f32; 3]]>, uvs: Option<&[[f32; 2]]>) {
    let v = b.versions();
    if v.has_data_group_id() {
        b.i32(0);
    }
    b.u16(vertices.len() as u16);
    if v.has_keep_compress_flags() {
        b.u8(0).u8(0);
    }
    b.bool(true);
    for vertex in vertices {
        b.floats(vertex);
    }
    // vector flags, or the plain UV set count in old streams
    b.u16(uvs.is_some() as u16);
    b.bool(normals.is_some());
    for normal in normals.unwrap_or_default() {
        b.floats(normal);
    }
    b.floats(&[0.0, 0.0, 0.0]).f32(1.0);
    b.bool(false);
    for uv in uvs.unwrap_or_default() {
        b.floats(uv);
    }
    if v.has_consistency_flags() {
        b.u16(0);
    }
    if v.has_additional_data() {
        b.i32(NONE);
    }
}

pub fn tri_shape_data(
    w: &mut NifWriter,
    vertices: &[[f32; 3]],
    normals: Option<&[[f32; 3]]>,
    uvs: Option<&[[f32; 2]]>,
    triangles: &[[u16; 3]],
) -> i32 {
    w.block("NiTriShapeData", |b| {
        geometry_common(b, vertices, normals, uvs);
        b.u16(triangles.len() as u16).u32(triangles.len() as u32 * 3);
        if b.versions().has_triangles_flag() {
            b.bool(true);
        }
        for triangle in triangles {
            b.u16s(triangle);
        }
        b.u16(0);
    })
}

pub fn tri_strips_data(w: &mut NifWriter, vertices: &[[f32; 3]], strips: &[Vec<u16>]) -> i32 {
    w.block("NiTriStripsData", |b| {
        geometry_common(b, vertices, None, None);
        let triangles: usize = strips.iter().map(|s| s.len().saturating_sub(2)).sum();
        b.u16(triangles as u16).u16(strips.len() as u16);
        for strip in strips {
            b.u16(strip.len() as u16);
        }
        if b.versions().has_strip_points_flag() {
            b.bool(true);
        }
        for strip in strips {
            b.u16s(strip);
        }
    })
}

pub fn lighting_shader(w: &mut NifWriter, name: &str, flags1: u32, flags2: u32, texture_set: i32) -> i32 {
    w.block("BSLightingShaderProperty", |b| {
        if b.versions().has_lighting_shader_type() {
            b.u32(0);
        }
        object_net(b, Some(name), &[]);
        b.u32(flags1).u32(flags2);
        b.floats(&[0.0, 0.0, 1.0, 1.0]);
        b.i32(texture_set);
        b.floats(&[0.0, 0.0, 0.0]).f32(1.0);
        b.u32(3);
        b.f32(1.0).f32(1.0).f32(80.0);
        b.floats(&[1.0, 1.0, 1.0]).f32(1.0);
        b.f32(0.3).f32(2.0);
    })
}

pub fn effect_shader(w: &mut NifWriter, name: &str, source: &str, greyscale: &str) -> i32 {
    w.block("BSEffectShaderProperty", |b| {
        object_net(b, Some(name), &[]);
        b.u32(0).u32(0);
        b.floats(&[0.0, 0.0, 1.0, 1.0]);
        b.sized_string(source);
        b.u8(3).u8(0).u8(0).u8(0);
        b.floats(&[1.0, 0.0, 1.0, 0.0]);
        b.floats(&[1.0, 1.0, 1.0, 1.0]).f32(1.0).f32(100.0);
        b.sized_string(greyscale);
    })
}

pub fn texture_set(w: &mut NifWriter, paths: &[&str]) -> i32 {
    w.block("BSShaderTextureSet", |b| {
        b.u32(paths.len() as u32);
        for path in paths {
            b.sized_string(path);
        }
    })
}

pub fn alpha_property(w: &mut NifWriter, flags: u16, threshold: u8) -> i32 {
    w.block("NiAlphaProperty", |b| {
        object_net(b, None, &[]);
        b.u16(flags).u8(threshold);
    })
}

pub fn string_extra(w: &mut NifWriter, name: &str, value: &str) -> i32 {
    w.block("NiStringExtraData", |b| {
        b.string(Some(name)).string(Some(value));
    })
}

pub fn bsx_flags(w: &mut NifWriter, value: u32) -> i32 {
    w.block("BSXFlags", |b| {
        b.string(Some("BSX")).u32(value);
    })
}

pub fn collision_object(w: &mut NifWriter, target: i32, body: i32) -> i32 {
    w.block("bhkCollisionObject", |b| {
        b.i32(target).u16(1).i32(body);
    })
}

/// Rigid body placement and the parameters the builder carries over.
pub struct Body {
    pub layer: u8,
    pub translation: [f32; 4],
    /// x, y, z, w
    pub rotation: [f32; 4],
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            layer: 1,
            translation: [0.0; 4],
            rotation: [0.0, 0.0, 0.0, 1.0],
            mass: 0.0,
            friction: 0.5,
            restitution: 0.4,
        }
    }
}

pub fn rigid_body(w: &mut NifWriter, transformed: bool, shape: i32, body: Body) -> i32 {
    let type_name = if transformed { "bhkRigidBodyT" } else { "bhkRigidBody" };
    w.block(type_name, |b| {
        let v = b.versions();
        b.i32(shape);
        b.u8(body.layer).u8(0).u16(0);
        b.zeros(4);
        b.u8(1).zeros(3);
        b.zeros(12);

        b.zeros(4);
        b.u8(body.layer).u8(0).u16(0);
        b.zeros(4);
        b.u8(0).u8(0).u16(0xFFFF);
        b.floats(&body.translation);
        b.floats(&body.rotation);
        b.floats(&[0.0; 8]);
        b.floats(&[0.0; 12]);
        b.floats(&[0.0; 4]);
        b.f32(body.mass).f32(0.1).f32(0.05);
        if v.has_skyrim_body_params() {
            b.f32(1.0).f32(1.0);
        }
        b.f32(body.friction);
        if v.has_skyrim_body_params() {
            b.f32(0.0);
        }
        b.f32(body.restitution).f32(104.4).f32(31.57).f32(0.15);
        b.u8(7).u8(1).u8(0).u8(1).u8(1);
        if v.has_skyrim_body_params() {
            b.zeros(4);
        }
        b.zeros(12);
        b.refs(&[]);
        if v.body_flags_are_u16() {
            b.u16(0);
        } else {
            b.u32(0);
        }
    })
}

pub fn mopp(w: &mut NifWriter, shape: i32) -> i32 {
    w.block("bhkMoppBvTreeShape", |b| {
        b.i32(shape).zeros(12).f32(1.0);
        let code = [0x28u8, 0x00, 0xFF, 0x01];
        b.u32(code.len() as u32);
        b.floats(&[0.0, 0.0, 0.0]).f32(1.0);
        if b.versions().has_mopp_build_type() {
            b.u8(1);
        }
        b.buf.extend_from_slice(&code);
    })
}

pub fn list_shape(w: &mut NifWriter, shapes: &[i32]) -> i32 {
    w.block("bhkListShape", |b| {
        b.refs(shapes).u32(0).zeros(24).u32(0);
    })
}

pub fn convex_shape(w: &mut NifWriter, radius: f32, vertices: &[[f32; 4]]) -> i32 {
    w.block("bhkConvexVerticesShape", |b| {
        b.u32(0).f32(radius).zeros(24);
        b.u32(vertices.len() as u32);
        for vertex in vertices {
            b.floats(vertex);
        }
        b.u32(0);
    })
}

pub fn box_shape(w: &mut NifWriter, dimensions: [f32; 3]) -> i32 {
    w.block("bhkBoxShape", |b| {
        b.u32(0).f32(0.05).zeros(8).floats(&dimensions).f32(0.0);
    })
}

pub fn sphere_shape(w: &mut NifWriter, radius: f32) -> i32 {
    w.block("bhkSphereShape", |b| {
        b.u32(0).f32(radius);
    })
}

pub fn capsule_shape(w: &mut NifWriter, radius: f32, first: [f32; 3], second: [f32; 3]) -> i32 {
    w.block("bhkCapsuleShape", |b| {
        b.u32(0).f32(radius).zeros(8);
        b.floats(&first).f32(radius).floats(&second).f32(radius);
    })
}

pub fn compressed_mesh(w: &mut NifWriter, data: i32, scale: [f32; 4]) -> i32 {
    w.block("bhkCompressedMeshShape", |b| {
        b.i32(NONE).u32(0).f32(0.005).f32(0.0);
        b.floats(&scale);
        b.f32(0.005).floats(&scale);
        b.i32(data);
    })
}

/// One quantized chunk of a compressed mesh.
pub struct TestChunk {
    pub translation: [f32; 4],
    pub transform_index: u16,
    pub vertices: Vec<u16>,
    pub indices: Vec<u16>,
    pub strips: Vec<u16>,
}

pub fn compressed_mesh_data(
    w: &mut NifWriter,
    error: f32,
    chunks: &[TestChunk],
    big_vertices: &[[f32; 4]],
    big_triangles: &[[u16; 3]],
) -> i32 {
    compressed_mesh_data_with_materials(w, error, chunks, big_vertices, big_triangles, [0; 3])
}

/// Same, with `materials` entries in the 32, 16 and 8 bit material lists.
pub fn compressed_mesh_data_with_materials(
    w: &mut NifWriter,
    error: f32,
    chunks: &[TestChunk],
    big_vertices: &[[f32; 4]],
    big_triangles: &[[u16; 3]],
    materials: [usize; 3],
) -> i32 {
    w.block("bhkCompressedMeshShapeData", |b| {
        b.u32(17).u32(18).u32(0x3FFFF).u32(0x1FFFF);
        b.f32(error);
        b.floats(&[0.0; 4]).floats(&[0.0; 4]);
        b.u8(0).u8(1);
        b.u32(materials[0] as u32);
        for i in 0..materials[0] {
            b.u32(i as u32);
        }
        b.u32(materials[1] as u32);
        for i in 0..materials[1] {
            b.u16(i as u16);
        }
        b.u32(materials[2] as u32);
        for i in 0..materials[2] {
            b.u8(i as u8);
        }
        b.u32(0);
        b.u32(0);
        // one identity transform
        b.u32(1).floats(&[0.0; 4]).floats(&[0.0, 0.0, 0.0, 1.0]);
        b.u32(big_vertices.len() as u32);
        for vertex in big_vertices {
            b.floats(vertex);
        }
        b.u32(big_triangles.len() as u32);
        for triangle in big_triangles {
            b.u16s(triangle).u32(0).u16(0);
        }
        b.u32(chunks.len() as u32);
        for chunk in chunks {
            b.floats(&chunk.translation).u32(0).u16(0).u16(chunk.transform_index);
            for list in [&chunk.vertices, &chunk.indices, &chunk.strips] {
                b.u32(list.len() as u32).u16s(list);
            }
            b.u32(0);
        }
        b.u32(0);
    })
}
