//! Built-in geometry: UV spheres and flat rectangles.
//!
//! Both follow the usual three.js layouts so that equirectangular textures
//! wrap the same way: the sphere seam sits on -X, `u` runs eastwards and
//! `v = 0` is the north pole (top row of the image). Faces wind
//! counter-clockwise seen from outside.

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::model::{Geometry, ModelVertex};

/// UV sphere centred at the origin with `width_segments` around the equator
/// and `height_segments` from pole to pole.
///
/// Segment counts are raised to the smallest meaningful values (3 and 2).
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Geometry {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let mut vertices =
        Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let theta = v * PI;

        // Pole vertices sit between their neighbours to avoid a twisted seam.
        let u_offset = if iy == 0 {
            0.5 / width_segments as f32
        } else if iy == height_segments {
            -0.5 / width_segments as f32
        } else {
            0.0
        };

        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * TAU;
            let position = Vector3::new(
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            );
            let normal = if position.magnitude2() > 0.0 {
                position.normalize()
            } else {
                Vector3::unit_y()
            };
            vertices.push(ModelVertex {
                position: position.into(),
                tex_coords: [u + u_offset, v],
                normal: normal.into(),
            });
        }
    }

    let row = width_segments + 1;
    let mut indices = Vec::new();
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            // the quads touching a pole collapse into one triangle
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    Geometry { vertices, indices }
}

/// `width` x `height` rectangle in the XY plane, centred at the origin and
/// facing +Z.
pub fn plane(width: f32, height: f32) -> Geometry {
    let (half_w, half_h) = (width / 2.0, height / 2.0);
    let mut vertices = Vec::with_capacity(4);
    for iy in 0..=1u32 {
        let y = half_h - iy as f32 * height;
        for ix in 0..=1u32 {
            let x = ix as f32 * width - half_w;
            vertices.push(ModelVertex {
                position: [x, y, 0.0],
                tex_coords: [ix as f32, iy as f32],
                normal: [0.0, 0.0, 1.0],
            });
        }
    }
    // 0 1
    // 2 3
    let indices = vec![0, 2, 1, 2, 3, 1];
    Geometry { vertices, indices }
}
