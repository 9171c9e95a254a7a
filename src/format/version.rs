//! Version gating.
//!
//! Every optional field in the format is a pure function of the stream
//! version, the user version and the Bethesda sub-version. Each condition the
//! decoders need has a named predicate here so the layout rules can be
//! audited and tested without decoding anything.

/// Packs a dotted version (`20.2.0.7`) the way the header stores it.
pub const fn pack(a: u8, b: u8, c: u8, d: u8) -> u32 {
    ((a as u32) << 24) | ((b as u32) << 16) | ((c as u32) << 8) | d as u32
}

pub const V3_1: u32 = pack(3, 1, 0, 0);
pub const V4_1_0_1: u32 = pack(4, 1, 0, 1);
pub const V5_0_0_1: u32 = pack(5, 0, 0, 1);
pub const V5_0_0_6: u32 = pack(5, 0, 0, 6);
pub const V10_0_1_0: u32 = pack(10, 0, 1, 0);
pub const V10_0_1_2: u32 = pack(10, 0, 1, 2);
pub const V10_0_1_3: u32 = pack(10, 0, 1, 3);
pub const V10_0_1_8: u32 = pack(10, 0, 1, 8);
pub const V10_1_0_0: u32 = pack(10, 1, 0, 0);
pub const V10_1_0_114: u32 = pack(10, 1, 0, 114);
pub const V20_0_0_3: u32 = pack(20, 0, 0, 3);
pub const V20_0_0_4: u32 = pack(20, 0, 0, 4);
pub const V20_0_0_5: u32 = pack(20, 0, 0, 5);
pub const V20_1_0_1: u32 = pack(20, 1, 0, 1);
pub const V20_1_0_3: u32 = pack(20, 1, 0, 3);
pub const V20_2_0_5: u32 = pack(20, 2, 0, 5);
pub const V20_2_0_7: u32 = pack(20, 2, 0, 7);

/// Bethesda sub-versions that change layouts.
pub mod bs {
    pub const FALLOUT_3: u32 = 34;
    pub const FLAGS_U32: u32 = 26;
    pub const BODY_FLAGS_U16: u32 = 76;
    pub const SKYRIM: u32 = 83;
    pub const MAX_FILE_PATH: u32 = 103;
    pub const FALLOUT_4: u32 = 130;
}

const HAVOK_SCALE_LEGACY: f32 = 7.0;
const HAVOK_SCALE_SKYRIM: f32 = 69.991_24;

/// The three numbers that decide every conditional field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Versions {
    pub version: u32,
    pub user_version: u32,
    pub bs_version: u32,
}

impl Versions {
    pub fn new(version: u32, user_version: u32, bs_version: u32) -> Self {
        Self {
            version,
            user_version,
            bs_version,
        }
    }

    pub fn at_least(&self, version: u32) -> bool {
        self.version >= version
    }

    pub fn at_most(&self, version: u32) -> bool {
        self.version <= version
    }

    /// A stream written by a Bethesda exporter (carries the vendor header).
    pub fn is_bethesda(&self) -> bool {
        self.bs_version > 0
    }

    pub fn bs_at_least(&self, bs_version: u32) -> bool {
        self.is_bethesda() && self.bs_version >= bs_version
    }

    pub fn has_endian_byte(&self) -> bool {
        self.at_least(V20_0_0_3)
    }

    pub fn has_user_version(&self) -> bool {
        self.at_least(V10_0_1_8)
    }

    pub fn has_bs_header(&self) -> bool {
        let v = self.version;
        let known = v == V10_0_1_2
            || v == V20_2_0_7
            || v == V20_0_0_5
            || (v >= V10_1_0_0 && v <= V20_0_0_4 && self.user_version <= 11);
        known && self.user_version >= 3
    }

    pub fn has_unknown_export_int(&self) -> bool {
        self.bs_version > bs::FALLOUT_4
    }

    pub fn has_process_script(&self) -> bool {
        self.bs_version <= bs::FALLOUT_4
    }

    pub fn has_max_file_path(&self) -> bool {
        self.bs_version >= bs::MAX_FILE_PATH
    }

    pub fn has_block_type_table(&self) -> bool {
        self.at_least(V5_0_0_1)
    }

    pub fn has_block_sizes(&self) -> bool {
        self.at_least(V20_2_0_5)
    }

    /// Strings are indices into the header string table instead of inline.
    pub fn has_string_table(&self) -> bool {
        self.at_least(V20_1_0_1)
    }

    pub fn has_groups(&self) -> bool {
        self.at_least(V5_0_0_6)
    }

    /// Booleans are one byte from 4.1.0.1 on, four bytes before.
    pub fn bool_is_byte(&self) -> bool {
        self.at_least(V4_1_0_1)
    }

    pub fn has_extra_data_list(&self) -> bool {
        self.at_least(V10_0_1_0)
    }

    pub fn has_controller(&self) -> bool {
        self.at_least(V3_1)
    }

    pub fn av_flags_are_u32(&self) -> bool {
        self.bs_version > bs::FLAGS_U32
    }

    /// NiAVObject carries its own property list (pre Skyrim layouts).
    pub fn has_property_list(&self) -> bool {
        self.bs_version <= bs::FALLOUT_3
    }

    pub fn has_collision_ref(&self) -> bool {
        self.at_least(V10_0_1_0)
    }

    pub fn has_effect_list(&self) -> bool {
        self.bs_version < bs::FALLOUT_4
    }

    pub fn has_material_data(&self) -> bool {
        self.at_least(V20_2_0_5)
    }

    /// Pre material-data geometry names its shader inline.
    pub fn has_legacy_shader_name(&self) -> bool {
        self.at_least(V10_0_1_0) && self.at_most(V20_1_0_3)
    }

    pub fn has_billboard_mode(&self) -> bool {
        self.at_least(V10_1_0_0)
    }

    pub fn has_material_needs_update(&self) -> bool {
        self.at_least(V20_2_0_7)
    }

    /// Geometry references its shader and alpha property directly.
    pub fn has_shader_alpha_refs(&self) -> bool {
        self.at_least(V20_2_0_7) && self.bs_version > bs::FALLOUT_3
    }

    pub fn has_data_group_id(&self) -> bool {
        self.at_least(V10_1_0_114)
    }

    pub fn has_keep_compress_flags(&self) -> bool {
        self.at_least(V10_1_0_0)
    }

    pub fn has_vector_flags(&self) -> bool {
        self.at_least(V10_0_1_0)
    }

    pub fn has_consistency_flags(&self) -> bool {
        self.at_least(V10_0_1_0)
    }

    pub fn has_additional_data(&self) -> bool {
        self.at_least(V20_0_0_4)
    }

    pub fn has_triangles_flag(&self) -> bool {
        self.at_least(V10_1_0_0)
    }

    pub fn has_strip_points_flag(&self) -> bool {
        self.at_least(V10_0_1_3)
    }

    pub fn has_extra_data_name(&self) -> bool {
        self.at_least(V10_0_1_0)
    }

    /// BSLightingShaderProperty opens with its shader type.
    pub fn has_lighting_shader_type(&self) -> bool {
        self.bs_version <= bs::FALLOUT_4
    }

    /// Time factor, gravity factor, rolling friction and the extra
    /// contact bytes of the rigid body construction info.
    pub fn has_skyrim_body_params(&self) -> bool {
        self.bs_at_least(bs::SKYRIM)
    }

    pub fn body_flags_are_u16(&self) -> bool {
        self.bs_version >= bs::BODY_FLAGS_U16
    }

    pub fn has_mopp_build_type(&self) -> bool {
        self.at_least(V20_2_0_7) && self.bs_version > bs::FALLOUT_3
    }

    /// Number of UV sets encoded in the geometry vector flags.
    pub fn uv_set_count(&self, vector_flags: u16) -> usize {
        if self.is_bethesda() {
            (vector_flags & 0x1) as usize
        } else {
            (vector_flags & 0x3F) as usize
        }
    }

    /// Source units per Havok unit.
    pub fn havok_scale(&self) -> f32 {
        if self.bs_at_least(bs::SKYRIM) {
            HAVOK_SCALE_SKYRIM
        } else {
            HAVOK_SCALE_LEGACY
        }
    }

    /// Dotted representation for diagnostics.
    pub fn dotted(&self) -> String {
        let v = self.version;
        format!("{}.{}.{}.{}", v >> 24, (v >> 16) & 0xFF, (v >> 8) & 0xFF, v & 0xFF)
    }
}
