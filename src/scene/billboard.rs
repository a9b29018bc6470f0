//! The semi-transparent image plane in front of the globe.

use crate::{
    config::BillboardConfig,
    context::InitContext,
    data_structures::{
        instance::Instance,
        model::{Material, MaterialUniform, Mesh},
        scene_graph::{MeshNode, SceneNode},
        texture::Texture,
    },
    render::{Drawable, Render},
    resources::geometry,
};

pub struct Billboard {
    node: MeshNode,
    material: Material,
}

impl Billboard {
    pub const ID: u32 = 3;

    pub fn new(ctx: &InitContext, config: &BillboardConfig, texture: Texture) -> Self {
        let geometry = geometry::plane(config.width, config.height);
        let mesh = Mesh::from_geometry(&ctx.device, "billboard", &geometry);
        let material = Material::new(
            &ctx.device,
            "billboard",
            texture,
            MaterialUniform {
                colour: [1.0; 3],
                opacity: config.opacity,
            },
            &ctx.layouts.material,
        );
        let instance = Instance::from(cgmath::Vector3::from(config.position));
        Self {
            node: MeshNode::new(Self::ID, &ctx.device, mesh, instance),
            material,
        }
    }
}

impl SceneNode for Billboard {
    // static, the instance buffer is written once on creation
    fn write_to_buffer(&mut self, _queue: &wgpu::Queue) {}

    fn get_render(&self) -> Render<'_> {
        Render::Transparent(Drawable {
            mesh: &self.node.mesh,
            instance: self.node.instance_buffer(),
            group: &self.material.bind_group,
            id: self.node.id,
        })
    }
}
