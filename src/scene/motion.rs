//! Everything in the scene that moves, kept apart from the GPU objects it
//! drives.

use std::time::Duration;

use crate::config::SceneConfig;

use super::{globe::GlobeRotation, neon::NeonLight};

/// A constant turn around +Y added every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spin {
    per_frame: f32,
    angle: f32,
}

impl Spin {
    pub fn new(per_frame: f32) -> Self {
        Self {
            per_frame,
            angle: 0.0,
        }
    }

    pub fn advance(&mut self) -> f32 {
        self.angle += self.per_frame;
        self.angle
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}

/// Angles (radians) and light intensity for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub globe: f32,
    pub atmosphere: f32,
    pub particles: f32,
    pub intensity: f32,
}

#[derive(Clone, Debug)]
pub struct SceneMotion {
    globe: GlobeRotation,
    light: NeonLight,
    atmosphere: Spin,
    particles: Spin,
}

impl SceneMotion {
    pub fn new(config: &SceneConfig) -> anyhow::Result<Self> {
        Ok(Self {
            globe: GlobeRotation::new(&config.globe)?,
            light: NeonLight::new(&config.light)?,
            atmosphere: Spin::new(config.atmosphere.spin_per_frame),
            particles: Spin::new(config.particles.spin_per_frame),
        })
    }

    /// Advances one frame: the keyframe clips by `dt` first, then the
    /// per-frame spins.
    pub fn advance(&mut self, dt: Duration) -> Pose {
        let globe = self.globe.advance(dt);
        let intensity = self.light.advance(dt);
        Pose {
            globe,
            atmosphere: self.atmosphere.advance(),
            particles: self.particles.advance(),
            intensity,
        }
    }

    /// Intensity before the first frame.
    pub fn intensity(&self) -> f32 {
        self.light.intensity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn spins_accumulate() {
        let mut spin = Spin::new(0.005);
        for _ in 0..200 {
            spin.advance();
        }
        assert!((spin.angle() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn first_frame_pose() {
        let mut motion = SceneMotion::new(&SceneConfig::default()).unwrap();
        assert_eq!(motion.intensity(), 2.0);
        let pose = motion.advance(Duration::ZERO);
        // clip values at t = 0, each spin applied once
        assert!((pose.globe - 0.005).abs() < 1e-6);
        assert!((pose.atmosphere - 0.005).abs() < 1e-6);
        assert!((pose.particles - 0.001).abs() < 1e-6);
        assert_eq!(pose.intensity, 0.5);
    }

    #[test]
    fn only_the_globe_spin_is_absolute() {
        let mut motion = SceneMotion::new(&SceneConfig::default()).unwrap();
        let mut pose = motion.advance(FRAME);
        for _ in 1..100 {
            pose = motion.advance(FRAME);
        }
        assert!((pose.atmosphere - 0.5).abs() < 1e-4);
        assert!((pose.particles - 0.1).abs() < 1e-4);
        // 1.6 s into the 30 s clip, plus a single spin
        let expected = std::f32::consts::TAU * 1.6 / 30.0 + 0.005;
        assert!((pose.globe - expected).abs() < 1e-3, "{}", pose.globe);
    }

    #[test]
    fn light_follows_the_flicker_clip() {
        let mut motion = SceneMotion::new(&SceneConfig::default()).unwrap();
        let pose = motion.advance(Duration::from_millis(1500));
        assert!((pose.intensity - 1.25).abs() < 1e-5);
        assert_eq!(motion.intensity(), pose.intensity);
    }
}
