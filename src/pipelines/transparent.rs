use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
    },
    pipelines::basic::{RasterState, mk_render_pipeline},
};

/// Unlit, alpha blended meshes: material at group 0, camera at group 1.
///
/// Depth is tested against the opaque geometry but never written, so
/// translucent surfaces don't hide what is drawn after them.
pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
    material_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Transparent Pipeline Layout"),
        bind_group_layouts: &[material_layout, camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Unlit Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("unlit.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        config.format,
        sample_count,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        RasterState::TRANSLUCENT,
        &[ModelVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
