//! Scene data structures: geometry, materials, textures, transforms and
//! keyframe animation.
//!
//! - `model` contains vertices, meshes and materials with their GPU resources
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds per-object transformation data
//! - `animation` holds keyframe tracks, clips and the looping player
//! - `scene_graph` defines scene membership and the meshed node

pub mod animation;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
