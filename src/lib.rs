//! neon-globe
//!
//! A small decorative wgpu scene that runs natively and in the browser: a
//! textured globe turning under a flickering red light, wrapped in an
//! additive glow, with a translucent image in front of it and a field of
//! particles around it. The camera orbits the globe with mouse or touch input.
//!
//! High-level modules
//! - `config`: every constant the scene is built from
//! - `camera`: orbit camera, projection, input controller and uniforms
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: meshes, materials, instances, textures and keyframe animation
//! - `flow`: event loop and the flow lifecycle (init, update, tick, render)
//! - `pipelines`: Phong, glow, particle and transparent render pipelines
//! - `resources`: asset loading and built-in sphere/plane geometry
//! - `render`: render composition and per-pipeline batching
//! - `scene`: the globe, atmosphere, billboard, particles and neon light
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::WindowEvent;

use crate::{config::SceneConfig, scene::NeonScene};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Builds the scene from the default configuration (plus environment
/// overrides natively) and runs it until the window is closed.
pub fn start() -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    let config = SceneConfig::from_env()?;
    #[cfg(target_arch = "wasm32")]
    let config = SceneConfig::default();

    flow::run(config.clone(), vec![NeonScene::constructor(config)])
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    start().map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
