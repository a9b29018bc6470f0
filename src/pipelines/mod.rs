//! Render pipelines and the bind group layouts they share.
//!
//! - `basic` holds the pipeline builder and the lit Phong pipeline
//! - `light` holds the point and ambient light uniform
//! - `glow` renders the additive atmosphere rim
//! - `particles` renders camera-facing point quads
//! - `transparent` renders unlit, alpha blended meshes

pub mod basic;
pub mod glow;
pub mod light;
pub mod particles;
pub mod transparent;

use crate::data_structures::model;

/// Bind group layouts, created once and shared by pipelines and scene objects.
#[derive(Clone, Debug)]
pub struct Layouts {
    pub material: wgpu::BindGroupLayout,
    pub camera: wgpu::BindGroupLayout,
    pub light: wgpu::BindGroupLayout,
    pub glow: wgpu::BindGroupLayout,
    pub particles: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(
        device: &wgpu::Device,
        camera: wgpu::BindGroupLayout,
        light: wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            material: model::material_layout(device),
            camera,
            light,
            glow: glow::mk_bind_group_layout(device),
            particles: particles::mk_bind_group_layout(device),
        }
    }
}

#[derive(Debug)]
pub struct Pipelines {
    pub phong: wgpu::RenderPipeline,
    pub points: wgpu::RenderPipeline,
    pub glow: wgpu::RenderPipeline,
    pub transparent: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        sample_count: u32,
        layouts: &Layouts,
    ) -> Self {
        Self {
            phong: basic::mk_phong_pipeline(
                device,
                config,
                sample_count,
                &layouts.material,
                &layouts.camera,
                &layouts.light,
            ),
            points: particles::mk_particle_pipeline(
                device,
                config,
                sample_count,
                &layouts.particles,
                &layouts.camera,
            ),
            glow: glow::mk_glow_pipeline(
                device,
                config,
                sample_count,
                &layouts.glow,
                &layouts.camera,
            ),
            transparent: transparent::mk_transparent_pipeline(
                device,
                config,
                sample_count,
                &layouts.material,
                &layouts.camera,
            ),
        }
    }
}
