//! Scene instantiation.
//!
//! A [`SceneBuilder`] turns the flat block list of a [`NifFile`] into a tree
//! of [`SceneNode`]s. Each block is dispatched through a priority ordered
//! table of builders; the first builder whose applicability test accepts the
//! block wins and a block nobody accepts produces no node. Builders
//! instantiate the blocks they reference by recursing into the same
//! dispatch, so arbitrarily deep hierarchies work the same way at every
//! level.
//!
//! One builder value is one instantiation pass: it carries the set of blocks
//! on the current path (a reference back into that path is a cycle and is
//! dropped), a per pass material map and a count of instantiated blocks
//! capped by [`Context::max_nodes`]. Building is cooperative, see
//! [`crate::flow`].

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use futures::{FutureExt, future::LocalBoxFuture};
use log::{debug, warn};

use crate::{
    context::Context,
    data_structures::{material::MaterialDescription, scene_graph::SceneNode},
    flow::{Job, checkpoint},
    format::{
        blocks::Block,
        file::{BlockEntry, NifFile},
        refs::{BlockRef, FromBlock},
    },
};

pub mod collision;
pub mod mesh;
pub mod node;

pub use mesh::texture_path;

/// One row of a dispatch table.
pub(crate) struct BuilderEntry<K> {
    pub name: &'static str,
    pub applies: fn(&BlockEntry) -> bool,
    pub kind: K,
}

/// First applicable builder in table order.
pub(crate) fn dispatch<K: Copy>(table: &[BuilderEntry<K>], entry: &BlockEntry) -> Option<(&'static str, K)> {
    table
        .iter()
        .find(|builder| (builder.applies)(entry))
        .map(|builder| (builder.name, builder.kind))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BuilderKind {
    Node,
    Mesh,
}

fn is_graph_node(entry: &BlockEntry) -> bool {
    matches!(entry.block, Block::Node(_))
}

/// NiTriShape, BSLODTriShape and NiTriStrips share one builder.
fn is_mesh(entry: &BlockEntry) -> bool {
    matches!(entry.block, Block::Geometry(_))
}

const SCENE_BUILDERS: &[BuilderEntry<BuilderKind>] = &[
    BuilderEntry {
        name: "graph node",
        applies: is_graph_node,
        kind: BuilderKind::Node,
    },
    BuilderEntry {
        name: "mesh",
        applies: is_mesh,
        kind: BuilderKind::Mesh,
    },
];

pub struct SceneBuilder<'f> {
    file: &'f NifFile,
    context: &'f Context,
    path: HashSet<usize>,
    visited: usize,
    materials: HashMap<(BlockRef, BlockRef), Option<Arc<MaterialDescription>>>,
}

impl<'f> SceneBuilder<'f> {
    pub fn new(file: &'f NifFile, context: &'f Context) -> Self {
        Self {
            file,
            context,
            path: HashSet::new(),
            visited: 0,
            materials: HashMap::new(),
        }
    }

    /// Instantiates the subtree below one block.
    pub fn build_root(mut self, root: BlockRef) -> Job<'f, Option<SceneNode>> {
        Job::new(async move { self.instantiate(root).await })
    }

    /// Instantiates every footer root. Several roots are wrapped in a node
    /// named after the file.
    pub fn build_scene(mut self) -> Job<'f, Option<SceneNode>> {
        Job::new(async move {
            let file = self.file;
            let mut built = Vec::new();
            for root in &file.roots {
                if let Some(node) = self.instantiate(*root).await {
                    built.push(node);
                }
            }
            if built.len() > 1 {
                let mut container = SceneNode::new(file.name.clone());
                container.children = built;
                return Some(container);
            }
            built.pop()
        })
    }

    pub(crate) fn file_name(&self) -> &'f str {
        &self.file.name
    }

    /// Dispatches one referenced block. `None` for absent or dangling
    /// references, back edges and blocks no builder accepts.
    pub(crate) fn instantiate(&mut self, reference: BlockRef) -> LocalBoxFuture<'_, Option<SceneNode>> {
        async move {
            let (index, entry) = self.enter(reference)?;
            let built = match dispatch(SCENE_BUILDERS, entry) {
                Some((name, kind)) => {
                    debug!(
                        "{}: building block {} (`{}`) with the {} builder",
                        self.file_name(),
                        index,
                        entry.type_name,
                        name
                    );
                    match (kind, &entry.block) {
                        (BuilderKind::Node, Block::Node(node)) => self.build_node(node).await,
                        (BuilderKind::Mesh, Block::Geometry(geometry)) => {
                            self.build_mesh(geometry).await
                        }
                        _ => None,
                    }
                }
                None => {
                    debug!(
                        "{}: no builder for block {} (`{}`)",
                        self.file_name(),
                        index,
                        entry.type_name
                    );
                    None
                }
            };
            self.leave(index);
            checkpoint().await;
            built
        }
        .boxed_local()
    }

    /// Puts a referenced block on the current path. Fails once the pass has
    /// used up its node budget.
    pub(crate) fn enter(&mut self, reference: BlockRef) -> Option<(usize, &'f BlockEntry)> {
        let file = self.file;
        let entry = match file.entry_at(reference) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!("{}: {}", file.name, e);
                return None;
            }
        };
        let index = reference.index()?;
        if !self.path.insert(index) {
            warn!(
                "{}: block {} (`{}`) references itself through its children, dropping the back edge",
                file.name, index, entry.type_name
            );
            return None;
        }
        if self.visited >= self.context.max_nodes {
            if self.visited == self.context.max_nodes {
                warn!(
                    "{}: more than {} blocks instantiated, skipping the rest",
                    file.name, self.context.max_nodes
                );
                // warn once
                self.visited += 1;
            }
            self.path.remove(&index);
            return None;
        }
        self.visited += 1;
        Some((index, entry))
    }

    pub(crate) fn leave(&mut self, index: usize) {
        self.path.remove(&index);
    }

    /// Typed lookup for optional dependencies. Dangling references are
    /// logged and read as absent.
    pub(crate) fn resolve<T: FromBlock>(&self, reference: BlockRef) -> Option<&'f T> {
        let file = self.file;
        match file.resolve::<T>(reference) {
            Ok(found) => found,
            Err(e) => {
                warn!("{}: {}", file.name, e);
                None
            }
        }
    }
}

/// Instantiates every root of `file`.
pub fn build_scene<'f>(file: &'f NifFile, context: &'f Context) -> Job<'f, Option<SceneNode>> {
    SceneBuilder::new(file, context).build_scene()
}

/// Expands a triangle strip, alternating the winding of every other
/// triangle and dropping degenerate ones.
pub(crate) fn strip_triangles(strip: &[u16]) -> Vec<[u16; 3]> {
    strip
        .windows(3)
        .enumerate()
        .filter_map(|(i, w)| {
            let tri = if i % 2 == 0 {
                [w[0], w[1], w[2]]
            } else {
                [w[0], w[2], w[1]]
            };
            let degenerate = tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2];
            (!degenerate).then_some(tri)
        })
        .collect()
}
