//! Engine data structures: models, textures, scene graphs, and instances.
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-node transformation data
//! - `scene_graph` enables hierarchical scene organization
//! - `sphere` generates the UV sphere and its wireframe

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod sphere;
pub mod texture;
