//! Object transformation data for GPU rendering.
//!
//! Each scene object has one [`Instance`] (position, rotation, scale) that is
//! packed into an [`InstanceRaw`] and bound as a per-instance vertex buffer.

use cgmath::{One, Rotation3};

use crate::data_structures::model;

/// Position, rotation (as quaternion) and scale of a scene object.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Replaces the rotation with a rotation of `angle` radians around +Y.
    pub fn set_rotation_y(&mut self, angle: f32) {
        self.rotation = cgmath::Quaternion::from_angle_y(cgmath::Rad(angle));
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            normal: cgmath::Matrix3::from(self.rotation).into(),
        }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

/**
 * Stride layout here: the model matrix as four vec4 columns followed by the
 * normal matrix as three vec3 columns. Locations 0..=2 belong to the vertex.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Advance once per instance rather than once per vertex.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::model::Vertex;
    use cgmath::{InnerSpace, Transform};

    #[test]
    fn raw_instance_is_25_floats() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 25 * 4);
        assert_eq!(InstanceRaw::desc().array_stride, 100);
    }

    #[test]
    fn rotation_y_turns_x_into_minus_z() {
        let mut instance = Instance::new();
        instance.set_rotation_y(std::f32::consts::FRAC_PI_2);
        let p = instance
            .to_matrix()
            .transform_point(cgmath::Point3::new(1.0, 0.0, 0.0));
        assert!(p.x.abs() < 1e-6);
        assert!((p.z + 1.0).abs() < 1e-6);
    }

    #[test]
    fn translation_is_applied_after_rotation() {
        let mut instance = Instance::from(cgmath::Vector3::new(0.0, 0.0, 2.0));
        instance.set_rotation_y(std::f32::consts::PI);
        let p = instance
            .to_matrix()
            .transform_point(cgmath::Point3::new(0.0, 0.0, 1.0));
        assert!((cgmath::Vector3::new(p.x, p.y, p.z) - cgmath::Vector3::new(0.0, 0.0, 1.0)).magnitude() < 1e-5);
    }
}
