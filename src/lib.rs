//! flow-nif
//!
//! Decoder for NetImmerse/Gamebryo `.nif` scene files (including the
//! Bethesda extensions) and an instantiation engine that turns a decoded file
//! into an engine agnostic scene graph with materials and collision
//! descriptors. Decoding and building are cooperative: both hand out
//! resumable jobs that a frame loop can advance under its own time budget.
//!
//! High-level modules
//! - `format`: header, version predicates, typed blocks, references
//! - `builder`: scene and collision instantiation from decoded blocks
//! - `convert`: source (Z-up, game units) to target (Y-up, meters) conversion
//! - `data_structures`: scene nodes, meshes, materials, collision descriptors
//! - `flow`: resumable jobs, checkpoints and a reference step driver
//! - `context`: build options and shared registry/material cache
//! - `resources`: resource suppliers and (parallel) file loading
//! - `error`: the decoding error taxonomy
//!

pub mod builder;
pub mod context;
pub mod convert;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod format;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use builder::{SceneBuilder, build_scene};
pub use context::Context;
pub use data_structures::scene_graph::{Component, SceneBackend, SceneNode, materialize};
pub use error::{NifError, Result};
pub use flow::{Job, Step, StepQueue, checkpoint};
pub use format::{BinaryReader, BlockRef, BlockRegistry, NifFile};
pub use resources::{SourceSet, load_nif, load_nifs};
