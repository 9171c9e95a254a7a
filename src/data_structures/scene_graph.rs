//! Engine agnostic scene graph.
//!
//! The builders produce a tree of [`SceneNode`]s that owns everything it
//! contains: nodes do not point back at the blocks they came from. A
//! [`SceneBackend`] turns a finished tree into live objects of some engine;
//! [`materialize`] drives it parent first.

use std::sync::Arc;

use crate::data_structures::{
    collision::CollisionNode, material::MaterialDescription, mesh::MeshGeometry,
    transform::Transform,
};

/// Something attached to a node.
#[derive(Clone, Debug, PartialEq)]
pub enum Component {
    Mesh(MeshGeometry),
    Material(Arc<MaterialDescription>),
    Collision(CollisionNode),
}

/// Extra data copied from the file (string and integer key/values, BSX flags).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtraDataValue {
    String(String),
    Integer(u32),
    BsxFlags(u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtraDataEntry {
    pub name: String,
    pub value: ExtraDataValue,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub children: Vec<SceneNode>,
    pub components: Vec<Component>,
    pub extra_data: Vec<ExtraDataEntry>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    pub fn get_children(&self) -> &Vec<SceneNode> {
        &self.children
    }

    pub fn get_children_mut(&mut self) -> &mut Vec<SceneNode> {
        &mut self.children
    }

    pub fn get_local_transform(&self) -> Transform {
        self.transform
    }

    pub fn set_local_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn add_component(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn mesh(&self) -> Option<&MeshGeometry> {
        self.components.iter().find_map(|c| match c {
            Component::Mesh(mesh) => Some(mesh),
            _ => None,
        })
    }

    pub fn material(&self) -> Option<&Arc<MaterialDescription>> {
        self.components.iter().find_map(|c| match c {
            Component::Material(material) => Some(material),
            _ => None,
        })
    }

    pub fn collision(&self) -> Option<&CollisionNode> {
        self.components.iter().find_map(|c| match c {
            Component::Collision(collision) => Some(collision),
            _ => None,
        })
    }

    pub fn extra(&self, name: &str) -> Option<&ExtraDataValue> {
        self.extra_data
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.value)
    }

    /// First node in the subtree (self included) with the given name.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Number of nodes in the subtree, self included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }

    /// Visits the subtree depth first with each node's world transform,
    /// `parent` being the world transform of this node's parent.
    pub fn walk(&self, parent: &Transform, visit: &mut dyn FnMut(&SceneNode, &Transform)) {
        let world = parent * &self.transform;
        visit(self, &world);
        for child in &self.children {
            child.walk(&world, visit);
        }
    }
}

/// Receives finished nodes and materializes them in some engine.
pub trait SceneBackend {
    type Handle;

    /// Called once per node, parents before children. The node carries its
    /// name, local transform, children and components.
    fn create_node(
        &mut self,
        node: &SceneNode,
        parent: Option<&Self::Handle>,
    ) -> anyhow::Result<Self::Handle>;
}

/// Hands a completed tree to `backend`, returning the root's handle.
pub fn materialize<B: SceneBackend>(backend: &mut B, root: &SceneNode) -> anyhow::Result<B::Handle> {
    fn visit<B: SceneBackend>(
        backend: &mut B,
        node: &SceneNode,
        parent: Option<&B::Handle>,
    ) -> anyhow::Result<B::Handle> {
        let handle = backend.create_node(node, parent)?;
        for child in &node.children {
            visit(backend, child, Some(&handle))?;
        }
        Ok(handle)
    }
    visit(backend, root, None)
}
