use std::sync::Arc;

use crate::{data_structures::material::MaterialCache, format::blocks::BlockRegistry};

const DEFAULT_VERTEX_BATCH: usize = 1024;
const DEFAULT_MAX_NODES: usize = 1 << 16;

/// Build options plus the read-only state shared by every decode and build
/// pass. Cloning is cheap; clones share the registry and the material cache.
#[derive(Clone, Debug)]
pub struct Context {
    /// Vertices (and triangles) converted between two checkpoints.
    pub vertex_batch: usize,
    /// Whether collision references are followed.
    pub build_collision: bool,
    /// Upper bound on blocks instantiated by one pass. Subtrees shared by
    /// several parents are instantiated once per parent, so a small file can
    /// otherwise expand without limit.
    pub max_nodes: usize,
    pub registry: Arc<BlockRegistry>,
    pub materials: Arc<MaterialCache>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vertex_batch(mut self, vertex_batch: usize) -> Self {
        // zero would never yield
        self.vertex_batch = vertex_batch.max(1);
        self
    }

    pub fn with_collision(mut self, build_collision: bool) -> Self {
        self.build_collision = build_collision;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_registry(mut self, registry: BlockRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_materials(mut self, materials: Arc<MaterialCache>) -> Self {
        self.materials = materials;
        self
    }
}

impl Default for Context {
    fn default() -> Self {
        Self {
            vertex_batch: DEFAULT_VERTEX_BATCH,
            build_collision: true,
            max_nodes: DEFAULT_MAX_NODES,
            registry: Arc::new(BlockRegistry::default()),
            materials: Arc::new(MaterialCache::new()),
        }
    }
}
