//! Scene membership.
//!
//! The scene is flat: every object implements [`SceneNode`] and is drawn each
//! frame. [`MeshNode`] is the common building block of meshed objects: a mesh,
//! its local transform and the GPU buffer holding that transform.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::Instance,
        model::Mesh,
    },
    render::Render,
};

pub trait SceneNode {
    /// Uploads whatever changed this frame to the GPU.
    fn write_to_buffer(&mut self, queue: &wgpu::Queue);

    /// Describes how the node is drawn this frame.
    fn get_render(&self) -> Render<'_>;
}

#[derive(Debug)]
pub struct MeshNode {
    pub id: u32,
    pub mesh: Mesh,
    pub instance: Instance,
    /// Rotation around Y in radians; synced into `instance` on upload.
    pub rotation_y: f32,
    instance_buffer: wgpu::Buffer,
}

impl MeshNode {
    pub fn new(id: u32, device: &wgpu::Device, mesh: Mesh, instance: Instance) -> Self {
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&[instance.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            id,
            mesh,
            instance,
            rotation_y: 0.0,
            instance_buffer,
        }
    }

    pub fn instance_buffer(&self) -> &wgpu::Buffer {
        &self.instance_buffer
    }

    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue) {
        self.instance.set_rotation_y(self.rotation_y);
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[self.instance.to_raw()]),
        );
    }
}
