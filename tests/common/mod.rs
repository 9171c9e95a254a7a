#![allow(dead_code)]

pub mod nif_writer;

use flow_nif::{
    Context, NifFile,
    builder::build_scene,
    data_structures::scene_graph::SceneNode,
    flow::init_logging,
    format::BlockRegistry,
};

pub fn decode(bytes: Vec<u8>) -> NifFile {
    init_logging();
    NifFile::from_bytes(bytes, "test.nif", &BlockRegistry::default()).expect("synthetic file decodes")
}

/// Builds the scene of `file` in one go.
pub fn build(file: &NifFile, context: &Context) -> Option<SceneNode> {
    build_scene(file, context)
        .run_to_completion()
        .expect("a fresh job completes")
}

pub fn close(a: [f32; 3], b: [f32; 3]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
}
