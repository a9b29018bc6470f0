//! The slowly turning field of point particles.

use rand::{Rng, SeedableRng, rngs::StdRng};
use wgpu::util::DeviceExt;

use crate::{
    config::{ParticleConfig, hex_to_linear},
    context::InitContext,
    data_structures::scene_graph::SceneNode,
    pipelines::particles::{ParticleInstance, ParticleMaterial, ParticleUniform},
    render::{PointCloud, Render},
};

/// `count` positions drawn uniformly from the cube `[-extent/2, extent/2)^3`.
pub fn scatter<R: Rng>(count: usize, extent: f32, rng: &mut R) -> Vec<ParticleInstance> {
    let mut coordinate = || (rng.random::<f32>() - 0.5) * extent;
    (0..count)
        .map(|_| ParticleInstance {
            position: [coordinate(), coordinate(), coordinate()],
        })
        .collect()
}

/// The configured seed, or one taken from the clock.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    let seed = seed.unwrap_or_else(|| instant::now().to_bits());
    log::debug!("particle seed {seed}");
    StdRng::seed_from_u64(seed)
}

pub struct ParticleField {
    positions: wgpu::Buffer,
    material: ParticleMaterial,
    count: usize,
    rotation_y: f32,
}

impl ParticleField {
    pub const ID: u32 = 4;

    pub fn new(ctx: &InitContext, config: &ParticleConfig, fovy: cgmath::Deg<f32>) -> Self {
        let mut rng = seeded_rng(config.seed);
        let particles = scatter(config.count, config.extent, &mut rng);
        let positions = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Particle Position Buffer"),
                contents: bytemuck::cast_slice(&particles),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let material = ParticleMaterial::new(
            &ctx.device,
            &ctx.layouts.particles,
            ParticleUniform::new(hex_to_linear(config.colour), config.size, fovy),
        );
        Self {
            positions,
            material,
            count: particles.len(),
            rotation_y: 0.0,
        }
    }

    pub fn set_rotation_y(&mut self, angle: f32) {
        self.rotation_y = angle;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl SceneNode for ParticleField {
    fn write_to_buffer(&mut self, queue: &wgpu::Queue) {
        self.material.uniform.set_rotation_y(self.rotation_y);
        self.material.write_to_buffer(queue);
    }

    fn get_render(&self) -> Render<'_> {
        Render::Points(PointCloud {
            positions: &self.positions,
            group: &self.material.bind_group,
            amount: self.count,
            id: Self::ID,
        })
    }
}
