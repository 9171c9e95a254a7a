//! Shader, texture set and alpha properties.

use crate::{
    error::Result,
    format::{blocks::node::ObjectNet, cursor::BinaryReader, header::Header, refs::BlockRef},
};

/// Shader flag bits the material builder looks at.
pub mod flags {
    pub const SLSF1_ENVIRONMENT_MAPPING: u32 = 1 << 7;
    pub const SLSF1_PARALLAX: u32 = 1 << 11;
    pub const SLSF2_DOUBLE_SIDED: u32 = 1 << 4;
    pub const SLSF2_VERTEX_COLORS: u32 = 1 << 5;
    pub const SLSF2_GLOW_MAP: u32 = 1 << 6;
}

/// Fields that only exist for some lighting shader types.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ShaderTypeData {
    #[default]
    None,
    EnvironmentMap {
        scale: f32,
    },
    SkinTint([f32; 3]),
    HairTint([f32; 3]),
    ParallaxOcclusion {
        max_passes: f32,
        scale: f32,
    },
    MultiLayerParallax {
        inner_thickness: f32,
        refraction_scale: f32,
        inner_texture_scale: [f32; 2],
        environment_strength: f32,
    },
    SparkleSnow([f32; 4]),
    EyeEnvironmentMap {
        scale: f32,
        left_reflection_center: [f32; 3],
        right_reflection_center: [f32; 3],
    },
}

/// BSLightingShaderProperty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightingShader {
    pub shader_type: u32,
    pub net: ObjectNet,
    pub flags1: u32,
    pub flags2: u32,
    pub uv_offset: [f32; 2],
    pub uv_scale: [f32; 2],
    pub texture_set: BlockRef,
    pub emissive_color: [f32; 3],
    pub emissive_multiple: f32,
    pub texture_clamp_mode: u32,
    pub alpha: f32,
    pub refraction_strength: f32,
    pub glossiness: f32,
    pub specular_color: [f32; 3],
    pub specular_strength: f32,
    pub lighting_effect_1: f32,
    pub lighting_effect_2: f32,
    pub type_data: ShaderTypeData,
}

impl LightingShader {
    pub fn read(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let shader_type = if header.versions.has_lighting_shader_type() {
            reader.read_u32()?
        } else {
            0
        };
        let net = ObjectNet::read(reader, header)?;
        let flags1 = reader.read_u32()?;
        let flags2 = reader.read_u32()?;
        let uv_offset = reader.read_vec2()?;
        let uv_scale = reader.read_vec2()?;
        let texture_set = reader.read_ref()?;
        let emissive_color = reader.read_color3()?;
        let emissive_multiple = reader.read_f32()?;
        let texture_clamp_mode = reader.read_u32()?;
        let alpha = reader.read_f32()?;
        let refraction_strength = reader.read_f32()?;
        let glossiness = reader.read_f32()?;
        let specular_color = reader.read_color3()?;
        let specular_strength = reader.read_f32()?;
        let lighting_effect_1 = reader.read_f32()?;
        let lighting_effect_2 = reader.read_f32()?;

        let type_data = match shader_type {
            1 => ShaderTypeData::EnvironmentMap {
                scale: reader.read_f32()?,
            },
            5 => ShaderTypeData::SkinTint(reader.read_color3()?),
            6 => ShaderTypeData::HairTint(reader.read_color3()?),
            7 => ShaderTypeData::ParallaxOcclusion {
                max_passes: reader.read_f32()?,
                scale: reader.read_f32()?,
            },
            11 => ShaderTypeData::MultiLayerParallax {
                inner_thickness: reader.read_f32()?,
                refraction_scale: reader.read_f32()?,
                inner_texture_scale: reader.read_vec2()?,
                environment_strength: reader.read_f32()?,
            },
            14 => ShaderTypeData::SparkleSnow(reader.read_color4()?),
            16 => ShaderTypeData::EyeEnvironmentMap {
                scale: reader.read_f32()?,
                left_reflection_center: reader.read_color3()?,
                right_reflection_center: reader.read_color3()?,
            },
            _ => ShaderTypeData::None,
        };

        Ok(Self {
            shader_type,
            net,
            flags1,
            flags2,
            uv_offset,
            uv_scale,
            texture_set,
            emissive_color,
            emissive_multiple,
            texture_clamp_mode,
            alpha,
            refraction_strength,
            glossiness,
            specular_color,
            specular_strength,
            lighting_effect_1,
            lighting_effect_2,
            type_data,
        })
    }
}

/// BSEffectShaderProperty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectShader {
    pub net: ObjectNet,
    pub flags1: u32,
    pub flags2: u32,
    pub uv_offset: [f32; 2],
    pub uv_scale: [f32; 2],
    pub source_texture: String,
    pub texture_clamp_mode: u8,
    pub lighting_influence: u8,
    pub env_map_min_lod: u8,
    pub falloff_start_angle: f32,
    pub falloff_stop_angle: f32,
    pub falloff_start_opacity: f32,
    pub falloff_stop_opacity: f32,
    pub emissive_color: [f32; 4],
    pub emissive_multiple: f32,
    pub soft_falloff_depth: f32,
    pub greyscale_texture: String,
}

impl EffectShader {
    pub fn read(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let net = ObjectNet::read(reader, header)?;
        let flags1 = reader.read_u32()?;
        let flags2 = reader.read_u32()?;
        let uv_offset = reader.read_vec2()?;
        let uv_scale = reader.read_vec2()?;
        let source_texture = reader.read_sized_string()?;
        let texture_clamp_mode = reader.read_u8()?;
        let lighting_influence = reader.read_u8()?;
        let env_map_min_lod = reader.read_u8()?;
        reader.read_u8()?;
        Ok(Self {
            net,
            flags1,
            flags2,
            uv_offset,
            uv_scale,
            source_texture,
            texture_clamp_mode,
            lighting_influence,
            env_map_min_lod,
            falloff_start_angle: reader.read_f32()?,
            falloff_stop_angle: reader.read_f32()?,
            falloff_start_opacity: reader.read_f32()?,
            falloff_stop_opacity: reader.read_f32()?,
            emissive_color: reader.read_color4()?,
            emissive_multiple: reader.read_f32()?,
            soft_falloff_depth: reader.read_f32()?,
            greyscale_texture: reader.read_sized_string()?,
        })
    }
}

/// BSShaderTextureSet. Paths are always stored inline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextureSet {
    pub textures: Vec<String>,
}

impl TextureSet {
    pub fn read(reader: &mut BinaryReader, _header: &Header) -> Result<Self> {
        let count = reader.read_count(4)?;
        let textures = (0..count)
            .map(|_| reader.read_sized_string())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { textures })
    }

    pub fn slot(&self, index: usize) -> Option<&str> {
        self.textures
            .get(index)
            .map(|path| path.trim())
            .filter(|path| !path.is_empty())
    }
}

/// NiAlphaProperty.
///
/// Flag layout: bit 0 blend enable, bits 1-4 source factor, bits 5-8
/// destination factor, bit 9 test enable, bits 10-12 test function.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlphaProperty {
    pub net: ObjectNet,
    pub flags: u16,
    pub threshold: u8,
}

impl AlphaProperty {
    pub fn read(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let net = ObjectNet::read(reader, header)?;
        let flags = reader.read_u16()?;
        let threshold = reader.read_u8()?;
        Ok(Self {
            net,
            flags,
            threshold,
        })
    }

    pub fn blend_enabled(&self) -> bool {
        self.flags & 0x1 != 0
    }

    pub fn source_blend(&self) -> u16 {
        (self.flags >> 1) & 0xF
    }

    pub fn destination_blend(&self) -> u16 {
        (self.flags >> 5) & 0xF
    }

    pub fn test_enabled(&self) -> bool {
        self.flags & (1 << 9) != 0
    }

    pub fn test_function(&self) -> u16 {
        (self.flags >> 10) & 0x7
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_flag_fields() {
        // blend on, src 6, dst 7, test on, GREATER
        let flags = 1 | (6 << 1) | (7 << 5) | (1 << 9) | (4 << 10);
        let alpha = AlphaProperty {
            flags,
            threshold: 64,
            ..Default::default()
        };
        assert!(alpha.blend_enabled());
        assert_eq!(alpha.source_blend(), 6);
        assert_eq!(alpha.destination_blend(), 7);
        assert!(alpha.test_enabled());
        assert_eq!(alpha.test_function(), 4);
    }

    #[test]
    fn empty_texture_slots_read_as_none() {
        let set = TextureSet {
            textures: vec!["a.dds".into(), "  ".into()],
        };
        assert_eq!(set.slot(0), Some("a.dds"));
        assert_eq!(set.slot(1), None);
        assert_eq!(set.slot(5), None);
    }
}
