//! Render composition and pipeline batching.
//!
//! Scene nodes describe how they are drawn with a [`Render`] value. The frame
//! loop flattens every node's `Render` into per-pipeline [`Batches`] and draws
//! them in a fixed order: opaque, points, glow, transparent.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the primary enum describing render operations
//! - [`Drawable<'a>`] is an indexed mesh with its transform and bind group
//! - [`PointCloud<'a>`] is an instanced particle buffer with its bind group

use crate::data_structures::model::Mesh;

/// An indexed mesh, the buffer holding its transform and the bind group
/// (material or glow parameters) bound at group 0.
#[derive(Clone, Copy)]
pub struct Drawable<'a> {
    pub mesh: &'a Mesh,
    pub instance: &'a wgpu::Buffer,
    pub group: &'a wgpu::BindGroup,
    pub id: u32,
}

/// Particle positions (one per instance) and the particle bind group.
#[derive(Clone, Copy)]
pub struct PointCloud<'a> {
    pub positions: &'a wgpu::Buffer,
    pub group: &'a wgpu::BindGroup,
    pub amount: usize,
    pub id: u32,
}

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Opaque(Drawable)` renders a lit mesh with the Phong pipeline
/// - `Glow(Drawable)` renders the back faces of a mesh with additive blending
/// - `Transparent(Drawable)` renders an unlit, alpha-blended mesh
/// - `Points(PointCloud)` renders camera-facing particles
/// - `Composed(Vec<Render>)` recursively renders composition of multiple renders
pub enum Render<'a> {
    None,
    Opaque(Drawable<'a>),
    Glow(Drawable<'a>),
    Transparent(Drawable<'a>),
    Points(PointCloud<'a>),
    Composed(Vec<Render<'a>>),
}

/// Renders sorted by the pipeline that draws them.
#[derive(Default)]
pub(crate) struct Batches<'a> {
    pub opaque: Vec<Drawable<'a>>,
    pub points: Vec<PointCloud<'a>>,
    pub glow: Vec<Drawable<'a>>,
    pub transparent: Vec<Drawable<'a>>,
}

impl<'a> Render<'a> {
    pub(crate) fn set_pipelines(self, batches: &mut Batches<'a>) {
        match self {
            Render::Opaque(drawable) => batches.opaque.push(drawable),
            Render::Glow(drawable) => batches.glow.push(drawable),
            Render::Transparent(drawable) => batches.transparent.push(drawable),
            Render::Points(cloud) => batches.points.push(cloud),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(batches)),
            Render::None => (),
        }
    }
}
