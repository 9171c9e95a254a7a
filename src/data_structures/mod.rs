//! Output data structures: the engine agnostic scene graph and what hangs off it.
//!
//! - `transform` holds local position/rotation/scale and their composition
//! - `scene_graph` is the node tree plus the backend callback contract
//! - `mesh` contains converted triangle buffers and bounds
//! - `material` contains material descriptions and the shared material cache
//! - `collision` contains collision descriptors

pub mod collision;
pub mod material;
pub mod mesh;
pub mod scene_graph;
pub mod transform;
