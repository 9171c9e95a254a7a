//! Typed block records and the registry that decodes them.
//!
//! - [`Block`] is the closed set of block kinds this crate understands plus
//!   an opaque placeholder for everything else.
//! - [`BlockRegistry`] maps a block type name to its decode function. New
//!   types can be registered without touching the decoding loop.

use std::{collections::HashMap, fmt};

use crate::{
    error::Result,
    format::{cursor::BinaryReader, header::Header},
};

pub mod collision;
pub mod extra;
pub mod geometry;
pub mod node;
pub mod shader;

pub use collision::{
    BigTriangle, BoxShape, CapsuleShape, Chunk, ChunkMaterial, ChunkTransform, CollisionObject,
    CompressedMeshData, CompressedMeshShape, ConvexVerticesShape, HavokFilter, ListShape,
    MoppBvTree, RigidBody, SphereShape,
};
pub use extra::{ExtraData, ExtraValue};
pub use geometry::{Geometry, GeometryData, GeometryKind, MaterialData, Primitives};
pub use node::{AvObject, Node, ObjectNet};
pub use shader::{AlphaProperty, EffectShader, LightingShader, ShaderTypeData, TextureSet};

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Node(Node),
    Geometry(Geometry),
    GeometryData(GeometryData),
    LightingShader(LightingShader),
    EffectShader(EffectShader),
    TextureSet(TextureSet),
    Alpha(AlphaProperty),
    ExtraData(ExtraData),
    CollisionObject(CollisionObject),
    RigidBody(RigidBody),
    MoppBvTree(MoppBvTree),
    ListShape(ListShape),
    ConvexVertices(ConvexVerticesShape),
    BoxShape(BoxShape),
    SphereShape(SphereShape),
    CapsuleShape(CapsuleShape),
    CompressedMesh(CompressedMeshShape),
    CompressedMeshData(CompressedMeshData),
    /// A block of an unregistered type, skipped by its declared size.
    Unsupported { type_name: String },
}

impl Block {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Block::Unsupported { .. })
    }
}

pub type DecodeFn = fn(&mut BinaryReader, &Header) -> Result<Block>;

#[derive(Clone)]
pub struct BlockRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl BlockRegistry {
    /// A registry that knows no types at all.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Registers (or replaces) the decoder for `type_name`.
    pub fn register(&mut self, type_name: &str, decode: DecodeFn) -> Option<DecodeFn> {
        self.decoders.insert(type_name.to_string(), decode)
    }

    pub fn unregister(&mut self, type_name: &str) -> Option<DecodeFn> {
        self.decoders.remove(type_name)
    }

    pub fn get(&self, type_name: &str) -> Option<DecodeFn> {
        self.decoders.get(type_name).copied()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.decoders.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for node_type in [
            "NiNode",
            "BSFadeNode",
            "BSLeafAnimNode",
            "RootCollisionNode",
            "AvoidNode",
        ] {
            registry.register(node_type, |r, h| Ok(Block::Node(Node::read(r, h)?)));
        }
        registry.register("NiBillboardNode", |r, h| {
            Ok(Block::Node(Node::read_billboard(r, h)?))
        });

        registry.register("NiTriShape", |r, h| {
            Ok(Block::Geometry(Geometry::read(r, h, GeometryKind::TriShape)?))
        });
        registry.register("BSLODTriShape", |r, h| {
            Ok(Block::Geometry(Geometry::read(r, h, GeometryKind::LodTriShape)?))
        });
        registry.register("NiTriStrips", |r, h| {
            Ok(Block::Geometry(Geometry::read(r, h, GeometryKind::TriStrips)?))
        });
        registry.register("NiTriShapeData", |r, h| {
            Ok(Block::GeometryData(GeometryData::read_tri_shape(r, h)?))
        });
        registry.register("NiTriStripsData", |r, h| {
            Ok(Block::GeometryData(GeometryData::read_tri_strips(r, h)?))
        });

        registry.register("BSLightingShaderProperty", |r, h| {
            Ok(Block::LightingShader(LightingShader::read(r, h)?))
        });
        registry.register("BSEffectShaderProperty", |r, h| {
            Ok(Block::EffectShader(EffectShader::read(r, h)?))
        });
        registry.register("BSShaderTextureSet", |r, h| {
            Ok(Block::TextureSet(TextureSet::read(r, h)?))
        });
        registry.register("NiAlphaProperty", |r, h| {
            Ok(Block::Alpha(AlphaProperty::read(r, h)?))
        });

        registry.register("NiStringExtraData", |r, h| {
            Ok(Block::ExtraData(ExtraData::read_string(r, h)?))
        });
        registry.register("NiIntegerExtraData", |r, h| {
            Ok(Block::ExtraData(ExtraData::read_integer(r, h)?))
        });
        registry.register("BSXFlags", |r, h| {
            Ok(Block::ExtraData(ExtraData::read_bsx_flags(r, h)?))
        });

        registry.register("bhkCollisionObject", |r, h| {
            Ok(Block::CollisionObject(CollisionObject::read(r, h)?))
        });
        registry.register("bhkRigidBody", |r, h| {
            Ok(Block::RigidBody(RigidBody::read(r, h, false)?))
        });
        registry.register("bhkRigidBodyT", |r, h| {
            Ok(Block::RigidBody(RigidBody::read(r, h, true)?))
        });
        registry.register("bhkMoppBvTreeShape", |r, h| {
            Ok(Block::MoppBvTree(MoppBvTree::read(r, h)?))
        });
        registry.register("bhkListShape", |r, h| {
            Ok(Block::ListShape(ListShape::read(r, h)?))
        });
        registry.register("bhkConvexVerticesShape", |r, h| {
            Ok(Block::ConvexVertices(ConvexVerticesShape::read(r, h)?))
        });
        registry.register("bhkBoxShape", |r, h| {
            Ok(Block::BoxShape(BoxShape::read(r, h)?))
        });
        registry.register("bhkSphereShape", |r, h| {
            Ok(Block::SphereShape(SphereShape::read(r, h)?))
        });
        registry.register("bhkCapsuleShape", |r, h| {
            Ok(Block::CapsuleShape(CapsuleShape::read(r, h)?))
        });
        registry.register("bhkCompressedMeshShape", |r, h| {
            Ok(Block::CompressedMesh(CompressedMeshShape::read(r, h)?))
        });
        registry.register("bhkCompressedMeshShapeData", |r, h| {
            Ok(Block::CompressedMeshData(CompressedMeshData::read(r, h)?))
        });
        registry
    }
}

impl fmt::Debug for BlockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.type_names().collect();
        names.sort_unstable();
        f.debug_struct("BlockRegistry").field("types", &names).finish()
    }
}
