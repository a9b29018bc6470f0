//! The flickering red point light.
//!
//! The light itself lives in the context's [`LightResources`]; this module
//! only owns the flicker clip that drives its intensity.
//!
//! [`LightResources`]: crate::pipelines::light::LightResources

use std::time::Duration;

use crate::{
    config::NeonLightConfig,
    data_structures::animation::{AnimationClip, AnimationPlayer, KeyframeTrack, TrackTarget},
};

#[derive(Clone, Debug)]
pub struct NeonLight {
    flicker: AnimationPlayer,
    intensity: f32,
}

impl NeonLight {
    pub fn new(config: &NeonLightConfig) -> anyhow::Result<Self> {
        let track = KeyframeTrack::new(
            TrackTarget::Intensity,
            config.flicker_times.clone(),
            config.flicker_values.clone(),
        )?;
        let mut flicker = AnimationPlayer::new(AnimationClip::new("flicker", None, vec![track]));
        flicker.play();
        Ok(Self {
            flicker,
            intensity: config.intensity,
        })
    }

    /// Advances the flicker by `dt` and returns the new intensity.
    pub fn advance(&mut self, dt: Duration) -> f32 {
        self.flicker.update(dt);
        if let Some(intensity) = self.flicker.value(TrackTarget::Intensity) {
            self.intensity = intensity;
        }
        self.intensity
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    #[test]
    fn starts_at_the_configured_intensity() {
        let light = NeonLight::new(&SceneConfig::default().light).unwrap();
        assert_eq!(light.intensity(), 2.0);
    }

    #[test]
    fn flickers_between_dim_and_bright() {
        let mut light = NeonLight::new(&SceneConfig::default().light).unwrap();
        assert_eq!(light.advance(Duration::ZERO), 0.5);
        assert_eq!(light.advance(Duration::from_millis(1000)), 2.0);
        assert!((light.advance(Duration::from_millis(500)) - 1.25).abs() < 1e-5);
        assert_eq!(light.advance(Duration::from_millis(500)), 0.5);
    }

    #[test]
    fn wraps_after_three_seconds() {
        let mut light = NeonLight::new(&SceneConfig::default().light).unwrap();
        // 3.5 s is half a second into the next loop
        let intensity = light.advance(Duration::from_millis(3500));
        assert!((intensity - 1.25).abs() < 1e-5);
    }
}
