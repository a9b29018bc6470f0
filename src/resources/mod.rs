//! Loading of external assets and generation of built-in geometry.
//!
//! - `texture` fetches image files and uploads them as textures
//! - `geometry` builds sphere and plane meshes

pub mod geometry;
pub mod texture;

pub use texture::{load_binary, load_texture, load_texture_or_placeholder};
