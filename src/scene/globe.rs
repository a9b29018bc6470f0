//! The textured, Phong-lit globe.

use std::time::Duration;

use crate::{
    config::GlobeConfig,
    context::InitContext,
    data_structures::{
        animation::{AnimationClip, AnimationPlayer, KeyframeTrack, TrackTarget},
        instance::Instance,
        model::{Material, MaterialUniform, Mesh},
        scene_graph::{MeshNode, SceneNode},
        texture::Texture,
    },
    render::{Drawable, Render},
    resources::geometry,
};

/// Y rotation of the globe.
///
/// Every frame the keyframed clip writes its absolute angle, then a fixed
/// per-frame spin is added on top. The spin therefore never accumulates
/// across frames; the clip alone turns the globe once every 30 seconds.
#[derive(Clone, Debug)]
pub struct GlobeRotation {
    player: AnimationPlayer,
    spin_per_frame: f32,
    angle: f32,
}

impl GlobeRotation {
    pub fn new(config: &GlobeConfig) -> anyhow::Result<Self> {
        let track = KeyframeTrack::new(
            TrackTarget::RotationY,
            config.rotation_times.clone(),
            config.rotation_values.clone(),
        )?;
        let mut player = AnimationPlayer::new(AnimationClip::new("rotate", None, vec![track]));
        player.play();
        Ok(Self {
            player,
            spin_per_frame: config.spin_per_frame,
            angle: 0.0,
        })
    }

    /// Advances the clip by `dt` and returns the new angle in radians.
    pub fn advance(&mut self, dt: Duration) -> f32 {
        self.player.update(dt);
        if let Some(angle) = self.player.value(TrackTarget::RotationY) {
            self.angle = angle;
        }
        self.angle += self.spin_per_frame;
        self.angle
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn player(&self) -> &AnimationPlayer {
        &self.player
    }
}

pub struct Globe {
    node: MeshNode,
    material: Material,
}

impl Globe {
    pub const ID: u32 = 1;

    pub fn new(ctx: &InitContext, config: &GlobeConfig, texture: Texture) -> Self {
        let geometry =
            geometry::sphere(config.radius, config.width_segments, config.height_segments);
        let mesh = Mesh::from_geometry(&ctx.device, "globe", &geometry);
        let material = Material::new(
            &ctx.device,
            "globe",
            texture,
            MaterialUniform {
                colour: [1.0; 3],
                opacity: 1.0,
            },
            &ctx.layouts.material,
        );
        Self {
            node: MeshNode::new(Self::ID, &ctx.device, mesh, Instance::new()),
            material,
        }
    }

    pub fn set_rotation_y(&mut self, angle: f32) {
        self.node.rotation_y = angle;
    }
}

impl SceneNode for Globe {
    fn write_to_buffer(&mut self, queue: &wgpu::Queue) {
        self.node.write_to_buffer(queue);
    }

    fn get_render(&self) -> Render<'_> {
        Render::Opaque(Drawable {
            mesh: &self.node.mesh,
            instance: self.node.instance_buffer(),
            group: &self.material.bind_group,
            id: self.node.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    fn millis(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn spin_does_not_accumulate() {
        let mut rotation = GlobeRotation::new(&SceneConfig::default().globe).unwrap();
        for _ in 0..100 {
            rotation.advance(Duration::ZERO);
        }
        assert!((rotation.angle() - 0.005).abs() < 1e-6);
    }

    #[test]
    fn follows_the_clip() {
        let mut rotation = GlobeRotation::new(&SceneConfig::default().globe).unwrap();
        let angle = rotation.advance(millis(15_000));
        assert!((angle - (std::f32::consts::PI + 0.005)).abs() < 1e-4);
    }

    #[test]
    fn loops_every_thirty_seconds() {
        let mut rotation = GlobeRotation::new(&SceneConfig::default().globe).unwrap();
        rotation.advance(millis(29_000));
        let angle = rotation.advance(millis(2_000));
        // 31 s wraps to 1 s into the clip
        let expected = std::f32::consts::TAU / 30.0 + 0.005;
        assert!((angle - expected).abs() < 1e-3, "{angle} != {expected}");
        assert!((rotation.player().time() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn rejects_a_broken_clip() {
        let mut config = SceneConfig::default().globe;
        config.rotation_values.pop();
        assert!(GlobeRotation::new(&config).is_err());
    }
}
