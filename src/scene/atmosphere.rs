//! The glow shell around the globe.

use crate::{
    config::{AtmosphereConfig, hex_to_linear},
    context::InitContext,
    data_structures::{
        instance::Instance,
        model::Mesh,
        scene_graph::{MeshNode, SceneNode},
    },
    pipelines::glow::{GlowMaterial, GlowUniform},
    render::{Drawable, Render},
    resources::geometry,
};

pub struct Atmosphere {
    node: MeshNode,
    glow: GlowMaterial,
}

impl Atmosphere {
    pub const ID: u32 = 2;

    pub fn new(ctx: &InitContext, config: &AtmosphereConfig) -> Self {
        let geometry =
            geometry::sphere(config.radius, config.width_segments, config.height_segments);
        let mesh = Mesh::from_geometry(&ctx.device, "atmosphere", &geometry);
        let glow = GlowMaterial::new(
            &ctx.device,
            &ctx.layouts.glow,
            GlowUniform {
                color: hex_to_linear(config.glow_colour),
                strength: config.glow_strength,
            },
        );
        Self {
            node: MeshNode::new(Self::ID, &ctx.device, mesh, Instance::new()),
            glow,
        }
    }

    pub fn set_rotation_y(&mut self, angle: f32) {
        self.node.rotation_y = angle;
    }
}

impl SceneNode for Atmosphere {
    fn write_to_buffer(&mut self, queue: &wgpu::Queue) {
        self.node.write_to_buffer(queue);
    }

    fn get_render(&self) -> Render<'_> {
        Render::Glow(Drawable {
            mesh: &self.node.mesh,
            instance: self.node.instance_buffer(),
            group: &self.glow.bind_group,
            id: self.node.id,
        })
    }
}
