//! Point cloud rendering.
//!
//! wgpu has no point size, so every particle is drawn as a small
//! camera-facing quad. The quad corners come from `vertex_index`; the only
//! vertex buffer is the per-instance particle position.
//!
//! Particle sizes are given the way size-attenuated points are: a particle of
//! size `s` at view depth `d` covers `s * (viewport height / 2) / d` pixels.

use wgpu::util::DeviceExt;

use crate::pipelines::basic::{RasterState, mk_render_pipeline};

/// Vertices per particle quad (two triangles, no index buffer).
pub const QUAD_VERTICES: u32 = 6;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 3],
    /// Edge length of a particle quad in world units.
    pub size: f32,
}

impl ParticleUniform {
    /// `size` is the attenuated point size, `fovy` the camera's vertical
    /// field of view.
    pub fn new<F: Into<cgmath::Rad<f32>>>(color: [f32; 3], size: f32, fovy: F) -> Self {
        use cgmath::SquareMatrix;
        Self {
            model: cgmath::Matrix4::identity().into(),
            color,
            size: quad_edge(size, fovy.into()),
        }
    }

    pub fn set_rotation_y(&mut self, angle: f32) {
        self.model = cgmath::Matrix4::from_angle_y(cgmath::Rad(angle)).into();
    }
}

/// World-space quad edge that projects to the same height as a
/// size-attenuated point of `size`.
pub fn quad_edge(size: f32, fovy: cgmath::Rad<f32>) -> f32 {
    size * (fovy.0 / 2.0).tan()
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
}

impl ParticleInstance {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ParticleInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Uniform buffer and bind group of one point cloud.
#[derive(Debug)]
pub struct ParticleMaterial {
    pub uniform: ParticleUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl ParticleMaterial {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform: ParticleUniform,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("particle_bind_group"),
        });
        Self {
            uniform,
            buffer,
            bind_group,
        }
    }

    pub fn write_to_buffer(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("particle_bind_group_layout"),
    })
}

/// Particle uniform at group 0, camera at group 1.
pub fn mk_particle_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
    particle_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Particle Pipeline Layout"),
        bind_group_layouts: &[particle_layout, camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Particle Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("particles.wgsl").into()),
    };
    // Quads face the camera regardless of winding, so nothing is culled.
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        sample_count,
        Some(wgpu::BlendState::REPLACE),
        RasterState {
            cull_mode: None,
            depth_write_enabled: true,
        },
        &[ParticleInstance::desc()],
        shader,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_a_matrix_and_one_vec4() {
        assert_eq!(std::mem::size_of::<ParticleUniform>(), 80);
    }

    #[test]
    fn quads_match_attenuated_point_size() {
        let fovy = cgmath::Rad::from(cgmath::Deg(75.0));
        let edge = quad_edge(0.025, fovy);
        let (height, depth) = (1080.0_f32, 5.0_f32);
        // pixels covered by a quad of `edge` at `depth` under this projection
        let pixels = edge / (2.0 * depth * (fovy.0 / 2.0).tan()) * height;
        assert!((pixels - 0.025 * (height / 2.0) / depth).abs() < 1e-4);
        assert!(edge < 0.025);
    }

    #[test]
    fn a_right_angle_view_keeps_the_size() {
        assert!((quad_edge(0.5, cgmath::Deg(90.0).into()) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rotation_replaces_the_model_matrix() {
        let mut uniform = ParticleUniform::new([1.0; 3], 0.025, cgmath::Deg(75.0));
        uniform.set_rotation_y(std::f32::consts::FRAC_PI_2);
        // x axis maps onto -z
        let x_axis = uniform.model[0];
        assert!(x_axis[0].abs() < 1e-6);
        assert!((x_axis[2] + 1.0).abs() < 1e-6);
    }
}
