//! Material descriptions and the cross-file material cache.
//!
//! A [`MaterialDescription`] is the resolved set of texture paths, blend state
//! and shader parameters of a renderable. Descriptions are immutable once
//! built and shared as `Arc`s; [`MaterialCache`] interns them by content so
//! that identical materials from different files share one allocation.

use std::{
    hash::{Hash, Hasher},
    sync::Arc,
};

use dashmap::DashMap;

use crate::error::NifError;

/// The six texture slots of a Bethesda texture set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Diffuse = 0,
    Normal = 1,
    Glow = 2,
    Parallax = 3,
    Environment = 4,
    EnvironmentMask = 5,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 6] = [
        TextureSlot::Diffuse,
        TextureSlot::Normal,
        TextureSlot::Glow,
        TextureSlot::Parallax,
        TextureSlot::Environment,
        TextureSlot::EnvironmentMask,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    One,
    Zero,
    SrcColor,
    InvSrcColor,
    DestColor,
    InvDestColor,
    SrcAlpha,
    InvSrcAlpha,
    DestAlpha,
    InvDestAlpha,
    SrcAlphaSaturate,
}

impl TryFrom<u16> for BlendFactor {
    type Error = NifError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => BlendFactor::One,
            1 => BlendFactor::Zero,
            2 => BlendFactor::SrcColor,
            3 => BlendFactor::InvSrcColor,
            4 => BlendFactor::DestColor,
            5 => BlendFactor::InvDestColor,
            6 => BlendFactor::SrcAlpha,
            7 => BlendFactor::InvSrcAlpha,
            8 => BlendFactor::DestAlpha,
            9 => BlendFactor::InvDestAlpha,
            10 => BlendFactor::SrcAlphaSaturate,
            other => {
                return Err(NifError::UnsupportedEncoding {
                    what: "blend factor",
                    value: other as u32,
                });
            }
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TestFunction {
    Always,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Never,
}

impl TryFrom<u16> for TestFunction {
    type Error = NifError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => TestFunction::Always,
            1 => TestFunction::Less,
            2 => TestFunction::Equal,
            3 => TestFunction::LessEqual,
            4 => TestFunction::Greater,
            5 => TestFunction::NotEqual,
            6 => TestFunction::GreaterEqual,
            7 => TestFunction::Never,
            other => {
                return Err(NifError::UnsupportedEncoding {
                    what: "alpha test function",
                    value: other as u32,
                });
            }
        })
    }
}

/// Transparency settings. The default is what a mesh without an alpha
/// property gets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlendState {
    pub blend_enabled: bool,
    pub source: BlendFactor,
    pub destination: BlendFactor,
    pub test_enabled: bool,
    pub test_function: TestFunction,
    pub threshold: u8,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            blend_enabled: false,
            source: BlendFactor::SrcAlpha,
            destination: BlendFactor::InvSrcAlpha,
            test_enabled: false,
            test_function: TestFunction::Greater,
            threshold: 128,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    #[default]
    Lighting,
    Effect,
}

/// Scalar shader inputs carried over from the shader property.
#[derive(Clone, Copy, Debug)]
pub struct ShaderParams {
    pub kind: ShaderKind,
    pub shader_type: u32,
    pub uv_offset: [f32; 2],
    pub uv_scale: [f32; 2],
    pub emissive_color: [f32; 4],
    pub emissive_multiple: f32,
    pub alpha: f32,
    pub glossiness: f32,
    pub specular_color: [f32; 3],
    pub specular_strength: f32,
    pub double_sided: bool,
    pub vertex_colors: bool,
}

impl Default for ShaderParams {
    fn default() -> Self {
        Self {
            kind: ShaderKind::Lighting,
            shader_type: 0,
            uv_offset: [0.0, 0.0],
            uv_scale: [1.0, 1.0],
            emissive_color: [0.0, 0.0, 0.0, 1.0],
            emissive_multiple: 1.0,
            alpha: 1.0,
            glossiness: 1.0,
            specular_color: [1.0, 1.0, 1.0],
            specular_strength: 1.0,
            double_sided: false,
            vertex_colors: false,
        }
    }
}

impl ShaderParams {
    fn floats(&self) -> impl Iterator<Item = f32> + '_ {
        self.uv_offset
            .iter()
            .chain(&self.uv_scale)
            .chain(&self.emissive_color)
            .chain([&self.emissive_multiple, &self.alpha, &self.glossiness])
            .chain(&self.specular_color)
            .chain([&self.specular_strength])
            .copied()
    }
}

// Floats compare by bit pattern so that equal descriptions hash equally.
impl PartialEq for ShaderParams {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.shader_type == other.shader_type
            && self.double_sided == other.double_sided
            && self.vertex_colors == other.vertex_colors
            && self
                .floats()
                .zip(other.floats())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for ShaderParams {}

impl Hash for ShaderParams {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.shader_type.hash(state);
        for value in self.floats() {
            value.to_bits().hash(state);
        }
        self.double_sided.hash(state);
        self.vertex_colors.hash(state);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaterialDescription {
    pub name: String,
    pub textures: [Option<String>; 6],
    pub blend: BlendState,
    pub shader: ShaderParams,
}

impl MaterialDescription {
    pub fn texture(&self, slot: TextureSlot) -> Option<&str> {
        self.textures[slot.index()].as_deref()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.iter().filter(|t| t.is_some()).count()
    }
}

/// Content keyed, thread safe intern table of material descriptions.
#[derive(Debug, Default)]
pub struct MaterialCache {
    entries: DashMap<MaterialDescription, Arc<MaterialDescription>>,
}

impl MaterialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared copy of `description`, publishing it if it is new.
    pub fn intern(&self, description: MaterialDescription) -> Arc<MaterialDescription> {
        if let Some(existing) = self.entries.get(&description) {
            return existing.value().clone();
        }
        let shared = Arc::new(description.clone());
        self.entries
            .entry(description)
            .or_insert(shared)
            .value()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
