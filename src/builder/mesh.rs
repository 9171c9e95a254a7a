//! Mesh builder: shader and alpha resolution, material extraction and
//! geometry conversion.

use std::sync::Arc;

use log::{debug, warn};

use crate::{
    builder::{SceneBuilder, strip_triangles},
    convert,
    data_structures::{
        material::{
            BlendFactor, BlendState, MaterialDescription, ShaderKind, ShaderParams, TestFunction,
            TextureSlot,
        },
        mesh::MeshGeometry,
        scene_graph::{Component, SceneNode},
    },
    flow::checkpoint,
    format::{
        blocks::{
            AlphaProperty, Block, EffectShader, Geometry, GeometryData, LightingShader, Primitives,
            TextureSet, shader::flags,
        },
        refs::BlockRef,
    },
};

/// Canonical form of a texture path: trimmed, forward slashes, lower case
/// and rooted at `textures/`. `None` for empty paths.
pub fn texture_path(raw: &str) -> Option<String> {
    let path = raw.trim().replace('\\', "/").to_lowercase();
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return None;
    }
    if path.starts_with("textures/") {
        Some(path.to_string())
    } else {
        Some(format!("textures/{path}"))
    }
}

#[derive(Clone, Copy)]
enum Shader<'f> {
    Lighting(&'f LightingShader),
    Effect(&'f EffectShader),
}

/// Whether a lighting shader's flags enable a texture slot.
fn slot_enabled(slot: TextureSlot, shader: &LightingShader) -> bool {
    match slot {
        TextureSlot::Diffuse | TextureSlot::Normal => true,
        TextureSlot::Glow => shader.flags2 & flags::SLSF2_GLOW_MAP != 0,
        TextureSlot::Parallax => shader.flags1 & flags::SLSF1_PARALLAX != 0,
        TextureSlot::Environment | TextureSlot::EnvironmentMask => {
            shader.flags1 & flags::SLSF1_ENVIRONMENT_MAPPING != 0
        }
    }
}

impl<'f> SceneBuilder<'f> {
    /// A mesh without a usable shader or without geometry data produces no
    /// node at all.
    pub(crate) async fn build_mesh(&mut self, geometry: &'f Geometry) -> Option<SceneNode> {
        let name = geometry.av.name();
        let Some(material) = self.material_for(geometry) else {
            debug!("{}: mesh `{}` has no shader, skipping", self.file_name(), name);
            return None;
        };
        let Some(data) = self.resolve::<GeometryData>(geometry.data) else {
            debug!("{}: mesh `{}` has no geometry data, skipping", self.file_name(), name);
            return None;
        };
        let mesh = self.convert_geometry(name, data).await;

        let mut scene_node = SceneNode::new(name);
        scene_node.set_local_transform(convert::transform(&geometry.av));
        scene_node.add_component(Component::Mesh(mesh));
        scene_node.add_component(Component::Material(material));
        scene_node.extra_data = self.extra_data(&geometry.av.net);
        self.attach_collision(&mut scene_node, &geometry.av).await;
        Some(scene_node)
    }

    /// Shader and alpha references: dedicated fields in newer Bethesda
    /// streams, the property list before that.
    fn property_refs(&self, geometry: &Geometry) -> (BlockRef, BlockRef) {
        if self.file.header.versions.has_shader_alpha_refs() {
            return (geometry.shader, geometry.alpha);
        }
        let mut shader = BlockRef::NONE;
        let mut alpha = BlockRef::NONE;
        for reference in &geometry.av.properties {
            let Ok(Some(entry)) = self.file.entry_at(*reference) else {
                continue;
            };
            match entry.block {
                Block::LightingShader(_) | Block::EffectShader(_) if shader.is_none() => {
                    shader = *reference
                }
                Block::Alpha(_) if alpha.is_none() => alpha = *reference,
                _ => {}
            }
        }
        (shader, alpha)
    }

    fn shader_at(&self, reference: BlockRef) -> Option<Shader<'f>> {
        let file = self.file;
        match file.entry_at(reference) {
            Ok(Some(entry)) => match &entry.block {
                Block::LightingShader(shader) => Some(Shader::Lighting(shader)),
                Block::EffectShader(shader) => Some(Shader::Effect(shader)),
                _ => {
                    warn!(
                        "{}: shader reference {} points at `{}`",
                        file.name, reference, entry.type_name
                    );
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("{}: {}", file.name, e);
                None
            }
        }
    }

    /// Material of a mesh, shared per pass by (shader, alpha) and across
    /// files by content.
    fn material_for(&mut self, geometry: &Geometry) -> Option<Arc<MaterialDescription>> {
        let key = self.property_refs(geometry);
        if let Some(cached) = self.materials.get(&key) {
            return cached.clone();
        }
        let material = self
            .describe_material(key.0, key.1)
            .map(|description| self.context.materials.intern(description));
        self.materials.insert(key, material.clone());
        material
    }

    fn describe_material(&self, shader: BlockRef, alpha: BlockRef) -> Option<MaterialDescription> {
        let shader = self.shader_at(shader)?;
        let mut description = MaterialDescription {
            blend: self.blend_state(alpha),
            ..Default::default()
        };
        match shader {
            Shader::Lighting(lighting) => {
                description.name = lighting.net.name.clone().unwrap_or_default();
                if let Some(set) = self.resolve::<TextureSet>(lighting.texture_set) {
                    for slot in TextureSlot::ALL {
                        if slot_enabled(slot, lighting) {
                            description.textures[slot.index()] =
                                set.slot(slot.index()).and_then(texture_path);
                        }
                    }
                }
                description.shader = ShaderParams {
                    kind: ShaderKind::Lighting,
                    shader_type: lighting.shader_type,
                    uv_offset: lighting.uv_offset,
                    uv_scale: lighting.uv_scale,
                    emissive_color: [
                        lighting.emissive_color[0],
                        lighting.emissive_color[1],
                        lighting.emissive_color[2],
                        1.0,
                    ],
                    emissive_multiple: lighting.emissive_multiple,
                    alpha: lighting.alpha,
                    glossiness: lighting.glossiness,
                    specular_color: lighting.specular_color,
                    specular_strength: lighting.specular_strength,
                    double_sided: lighting.flags2 & flags::SLSF2_DOUBLE_SIDED != 0,
                    vertex_colors: lighting.flags2 & flags::SLSF2_VERTEX_COLORS != 0,
                };
            }
            Shader::Effect(effect) => {
                description.name = effect.net.name.clone().unwrap_or_default();
                description.textures[TextureSlot::Diffuse.index()] =
                    texture_path(&effect.source_texture);
                description.textures[TextureSlot::Glow.index()] =
                    texture_path(&effect.greyscale_texture);
                description.shader = ShaderParams {
                    kind: ShaderKind::Effect,
                    uv_offset: effect.uv_offset,
                    uv_scale: effect.uv_scale,
                    emissive_color: effect.emissive_color,
                    emissive_multiple: effect.emissive_multiple,
                    double_sided: effect.flags2 & flags::SLSF2_DOUBLE_SIDED != 0,
                    vertex_colors: effect.flags2 & flags::SLSF2_VERTEX_COLORS != 0,
                    ..Default::default()
                };
            }
        }
        Some(description)
    }

    /// Unknown enum values fall back to the defaults.
    fn blend_state(&self, alpha: BlockRef) -> BlendState {
        let defaults = BlendState::default();
        let Some(alpha) = self.resolve::<AlphaProperty>(alpha) else {
            return defaults;
        };
        let file_name = self.file_name();
        let source = BlendFactor::try_from(alpha.source_blend()).unwrap_or_else(|e| {
            warn!("{}: {}, using {:?}", file_name, e, defaults.source);
            defaults.source
        });
        let destination = BlendFactor::try_from(alpha.destination_blend()).unwrap_or_else(|e| {
            warn!("{}: {}, using {:?}", file_name, e, defaults.destination);
            defaults.destination
        });
        let test_function = TestFunction::try_from(alpha.test_function()).unwrap_or_else(|e| {
            warn!("{}: {}, using {:?}", file_name, e, defaults.test_function);
            defaults.test_function
        });
        BlendState {
            blend_enabled: alpha.blend_enabled(),
            source,
            destination,
            test_enabled: alpha.test_enabled(),
            test_function,
            threshold: alpha.threshold,
        }
    }

    /// Converts vertex data into target space, yielding every
    /// `vertex_batch` vertices or triangles.
    async fn convert_geometry(&self, name: &str, data: &GeometryData) -> MeshGeometry {
        let batch = self.context.vertex_batch.max(1);
        let count = data.num_vertices();
        let mut mesh = MeshGeometry::default();

        mesh.positions.reserve(count);
        for (i, vertex) in data.vertices.iter().enumerate() {
            mesh.positions.push(convert::position(*vertex).into());
            if (i + 1) % batch == 0 {
                checkpoint().await;
            }
        }
        if data.normals.len() == count {
            mesh.normals = data
                .normals
                .iter()
                .map(|n| convert::direction(*n).into())
                .collect();
        }
        if data.tangents.len() == count {
            mesh.tangents = data
                .tangents
                .iter()
                .map(|t| convert::direction(*t).into())
                .collect();
        }
        if let Some(uvs) = data.uv_sets.first().filter(|uvs| uvs.len() == count) {
            mesh.uvs = uvs.clone();
        }
        if data.colors.len() == count {
            mesh.colors = data.colors.clone();
        }
        checkpoint().await;

        let triangles = match &data.primitives {
            Primitives::Triangles(triangles) => triangles.clone(),
            Primitives::Strips(strips) => strips.iter().flat_map(|s| strip_triangles(s)).collect(),
        };
        let mut dropped = 0usize;
        mesh.indices.reserve(triangles.len() * 3);
        for (i, triangle) in triangles.iter().enumerate() {
            if triangle.iter().any(|index| *index as usize >= count) {
                dropped += 1;
            } else {
                mesh.indices
                    .extend(convert::winding(*triangle).map(u32::from));
            }
            if (i + 1) % batch == 0 {
                checkpoint().await;
            }
        }
        if dropped > 0 {
            warn!(
                "{}: mesh `{}` dropped {} triangles indexing past {} vertices",
                self.file_name(),
                name,
                dropped,
                count
            );
        }

        if mesh.normals.is_empty() {
            mesh.recompute_normals();
        }
        mesh.recompute_bounds();
        mesh
    }
}
