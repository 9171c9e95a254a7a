//! Block references.
//!
//! A reference is the position of another block in the same file. Negative
//! values mean "no reference". Nothing owns what it references: the block list
//! owns every block and any number of blocks may point at the same target.
//! Lookups are bounds checked and typed through [`FromBlock`].

use std::fmt;

use crate::{
    error::{NifError, Result},
    format::{
        blocks::{
            AlphaProperty, Block, BoxShape, CapsuleShape, CollisionObject, CompressedMeshData,
            CompressedMeshShape, ConvexVerticesShape, EffectShader, ExtraData, Geometry,
            GeometryData, LightingShader, ListShape, MoppBvTree, Node, RigidBody, SphereShape,
            TextureSet,
        },
        file::{BlockEntry, NifFile},
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockRef(pub i32);

impl BlockRef {
    pub const NONE: BlockRef = BlockRef(-1);

    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    pub fn is_none(self) -> bool {
        self.0 < 0
    }
}

impl Default for BlockRef {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<usize> for BlockRef {
    fn from(index: usize) -> Self {
        BlockRef(index as i32)
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(index) => write!(f, "#{index}"),
            None => f.write_str("none"),
        }
    }
}

/// Typed view of a [`Block`] variant.
pub trait FromBlock {
    /// Human readable name of what the reference should point at.
    const EXPECTED: &'static str;

    fn from_block(block: &Block) -> Option<&Self>;
}

macro_rules! from_block {
    ($ty:ty, $variant:ident, $expected:literal) => {
        impl FromBlock for $ty {
            const EXPECTED: &'static str = $expected;

            fn from_block(block: &Block) -> Option<&Self> {
                match block {
                    Block::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

from_block!(Node, Node, "node");
from_block!(Geometry, Geometry, "geometry");
from_block!(GeometryData, GeometryData, "geometry data");
from_block!(LightingShader, LightingShader, "lighting shader property");
from_block!(EffectShader, EffectShader, "effect shader property");
from_block!(TextureSet, TextureSet, "texture set");
from_block!(AlphaProperty, Alpha, "alpha property");
from_block!(ExtraData, ExtraData, "extra data");
from_block!(CollisionObject, CollisionObject, "collision object");
from_block!(RigidBody, RigidBody, "rigid body");
from_block!(MoppBvTree, MoppBvTree, "MOPP bounding volume tree");
from_block!(ListShape, ListShape, "list shape");
from_block!(ConvexVerticesShape, ConvexVertices, "convex vertices shape");
from_block!(BoxShape, BoxShape, "box shape");
from_block!(SphereShape, SphereShape, "sphere shape");
from_block!(CapsuleShape, CapsuleShape, "capsule shape");
from_block!(CompressedMeshShape, CompressedMesh, "compressed mesh shape");
from_block!(CompressedMeshData, CompressedMeshData, "compressed mesh data");

impl NifFile {
    /// Bounds checked lookup of the entry a reference points at.
    /// `Ok(None)` for the "no reference" sentinel.
    pub fn entry_at(&self, reference: BlockRef) -> Result<Option<&BlockEntry>> {
        let Some(index) = reference.index() else {
            return Ok(None);
        };
        self.blocks
            .get(index)
            .map(Some)
            .ok_or(NifError::DanglingReference {
                reference: reference.0,
                expected: "block",
            })
    }

    /// Resolves a reference to a block of a specific kind. Out of range
    /// references and references to a different kind are dangling.
    pub fn resolve<T: FromBlock>(&self, reference: BlockRef) -> Result<Option<&T>> {
        let Some(entry) = self.entry_at(reference).map_err(|_| NifError::DanglingReference {
            reference: reference.0,
            expected: T::EXPECTED,
        })?
        else {
            return Ok(None);
        };
        T::from_block(&entry.block)
            .map(Some)
            .ok_or(NifError::DanglingReference {
                reference: reference.0,
                expected: T::EXPECTED,
            })
    }
}
