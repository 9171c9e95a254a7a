use log::warn;

use crate::{
    builder::SceneBuilder,
    convert,
    data_structures::scene_graph::{Component, ExtraDataEntry, ExtraDataValue, SceneNode},
    flow::checkpoint,
    format::blocks::{AvObject, ExtraData, ExtraValue, Node, ObjectNet},
};

impl<'f> SceneBuilder<'f> {
    /// Graph node: children in file order, absent and unbuildable children
    /// omitted, then the converted local transform.
    pub(crate) async fn build_node(&mut self, node: &'f Node) -> Option<SceneNode> {
        let mut scene_node = SceneNode::new(node.av.name());
        for child in &node.children {
            if child.is_none() {
                continue;
            }
            if let Some(built) = self.instantiate(*child).await {
                scene_node.add_child(built);
            }
        }
        scene_node.set_local_transform(convert::transform(&node.av));
        scene_node.extra_data = self.extra_data(&node.av.net);
        self.attach_collision(&mut scene_node, &node.av).await;
        Some(scene_node)
    }

    pub(crate) fn extra_data(&self, net: &ObjectNet) -> Vec<ExtraDataEntry> {
        net.extra_data
            .iter()
            .filter_map(|reference| self.resolve::<ExtraData>(*reference))
            .map(|extra| ExtraDataEntry {
                name: extra.name.clone().unwrap_or_default(),
                value: match &extra.value {
                    ExtraValue::String(text) => ExtraDataValue::String(text.clone().unwrap_or_default()),
                    ExtraValue::Integer(value) => ExtraDataValue::Integer(*value),
                    ExtraValue::BsxFlags(flags) => ExtraDataValue::BsxFlags(*flags),
                },
            })
            .collect()
    }

    /// Builds the collision subtree an object references, if any, as a
    /// component next to whatever the node already carries.
    pub(crate) async fn attach_collision(&mut self, scene_node: &mut SceneNode, av: &'f AvObject) {
        if !self.context.build_collision || av.collision.is_none() {
            return;
        }
        match self.build_collision(av.collision).await {
            Some(collision) => scene_node.add_component(Component::Collision(collision)),
            None => warn!(
                "{}: collision {} of `{}` produced no shape",
                self.file_name(),
                av.collision,
                scene_node.name
            ),
        }
        checkpoint().await;
    }
}
