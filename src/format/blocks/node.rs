//! Scene graph blocks: the NiObjectNET / NiAVObject prefix and NiNode.

use cgmath::{Matrix3, SquareMatrix, Vector3};

use crate::{
    error::Result,
    format::{cursor::BinaryReader, header::Header, refs::BlockRef},
};

/// Name, extra data and controller shared by every named block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectNet {
    pub name: Option<String>,
    pub extra_data: Vec<BlockRef>,
    pub controller: BlockRef,
}

impl ObjectNet {
    pub fn read(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let versions = &header.versions;
        let name = reader.read_string(header)?;
        let extra_data = if versions.has_extra_data_list() {
            reader.read_refs()?
        } else {
            // a single head of a linked extra data chain
            let head = reader.read_ref()?;
            if head.is_none() { Vec::new() } else { vec![head] }
        };
        let controller = if versions.has_controller() {
            reader.read_ref()?
        } else {
            BlockRef::NONE
        };
        Ok(Self {
            name,
            extra_data,
            controller,
        })
    }
}

/// Placement of an object in its parent's space.
#[derive(Clone, Debug, PartialEq)]
pub struct AvObject {
    pub net: ObjectNet,
    pub flags: u32,
    pub translation: Vector3<f32>,
    pub rotation: Matrix3<f32>,
    pub scale: f32,
    pub properties: Vec<BlockRef>,
    pub collision: BlockRef,
}

impl Default for AvObject {
    fn default() -> Self {
        Self {
            net: ObjectNet::default(),
            flags: 0,
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation: Matrix3::identity(),
            scale: 1.0,
            properties: Vec::new(),
            collision: BlockRef::NONE,
        }
    }
}

impl AvObject {
    pub fn read(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let versions = &header.versions;
        let net = ObjectNet::read(reader, header)?;
        let flags = if versions.av_flags_are_u32() {
            reader.read_u32()?
        } else {
            reader.read_u16()? as u32
        };
        let translation = reader.read_vec3()?;
        let rotation = reader.read_matrix33()?;
        let scale = reader.read_f32()?;
        let properties = if versions.has_property_list() {
            reader.read_refs()?
        } else {
            Vec::new()
        };
        let collision = if versions.has_collision_ref() {
            reader.read_ref()?
        } else {
            BlockRef::NONE
        };
        Ok(Self {
            net,
            flags,
            translation,
            rotation,
            scale,
            properties,
            collision,
        })
    }

    pub fn name(&self) -> &str {
        self.net.name.as_deref().unwrap_or_default()
    }
}

/// NiNode and the node types that share its layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub av: AvObject,
    pub children: Vec<BlockRef>,
    pub effects: Vec<BlockRef>,
    /// Only set for billboard nodes.
    pub billboard_mode: Option<u16>,
}

impl Node {
    pub fn read(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let av = AvObject::read(reader, header)?;
        let children = reader.read_refs()?;
        let effects = if header.versions.has_effect_list() {
            reader.read_refs()?
        } else {
            Vec::new()
        };
        Ok(Self {
            av,
            children,
            effects,
            billboard_mode: None,
        })
    }

    pub fn read_billboard(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let mut node = Self::read(reader, header)?;
        if header.versions.has_billboard_mode() {
            node.billboard_mode = Some(reader.read_u16()?);
        }
        Ok(node)
    }
}
