//! Keyframe animation.
//!
//! A [`KeyframeTrack`] maps time to a scalar property by linear
//! interpolation, an [`AnimationClip`] groups tracks under a name and a
//! duration, and an [`AnimationPlayer`] advances a clip in time and loops it
//! forever.

use std::time::Duration;

use anyhow::{bail, ensure};

/// The scalar property a track drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackTarget {
    /// Rotation around the object's Y axis, in radians.
    RotationY,
    /// Light intensity.
    Intensity,
}

#[derive(Clone, Debug)]
pub struct KeyframeTrack {
    target: TrackTarget,
    times: Vec<f32>,
    values: Vec<f32>,
}

impl KeyframeTrack {
    /// Validates and creates a track.
    ///
    /// `times` must be non-empty, ascending and as long as `values`, and every
    /// keyframe must be finite.
    pub fn new(target: TrackTarget, times: Vec<f32>, values: Vec<f32>) -> anyhow::Result<Self> {
        ensure!(!times.is_empty(), "keyframe track for {target:?} has no keyframes");
        ensure!(
            times.len() == values.len(),
            "keyframe track for {target:?} has {} times but {} values",
            times.len(),
            values.len()
        );
        ensure!(
            times.iter().chain(&values).all(|t| t.is_finite()),
            "keyframe track for {target:?} has a non-finite time or value"
        );
        if let Some(pair) = times.windows(2).find(|pair| pair[1] < pair[0]) {
            bail!(
                "keyframe times for {target:?} are not ascending: {} after {}",
                pair[1],
                pair[0]
            );
        }
        Ok(Self {
            target,
            times,
            values,
        })
    }

    pub fn target(&self) -> TrackTarget {
        self.target
    }

    /// Time of the last keyframe.
    pub fn end_time(&self) -> f32 {
        self.times[self.times.len() - 1]
    }

    /// Samples the track at `time`, holding the first/last value outside the
    /// keyframe range.
    pub fn sample(&self, time: f32) -> f32 {
        let last = self.times.len() - 1;
        if time <= self.times[0] {
            return self.values[0];
        }
        if time >= self.times[last] {
            return self.values[last];
        }
        // index of the first keyframe strictly after `time`
        let next = self.times.partition_point(|&t| t <= time);
        let prev = next - 1;
        let (t0, t1) = (self.times[prev], self.times[next]);
        let (v0, v1) = (self.values[prev], self.values[next]);
        let alpha = (time - t0) / (t1 - t0);
        v0 + (v1 - v0) * alpha
    }
}

#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<KeyframeTrack>,
}

impl AnimationClip {
    /// Creates a clip. Without an explicit duration the clip lasts until the
    /// last keyframe of its longest track.
    pub fn new(name: &str, duration: Option<f32>, tracks: Vec<KeyframeTrack>) -> Self {
        let duration = duration.unwrap_or_else(|| {
            tracks
                .iter()
                .map(KeyframeTrack::end_time)
                .fold(0.0, f32::max)
        });
        Self {
            name: name.to_string(),
            duration,
            tracks,
        }
    }
}

/// Plays one clip on a loop.
#[derive(Clone, Debug)]
pub struct AnimationPlayer {
    clip: AnimationClip,
    time: f32,
    time_scale: f32,
    playing: bool,
}

impl AnimationPlayer {
    pub fn new(clip: AnimationClip) -> Self {
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            playing: false,
        }
    }

    pub fn play(&mut self) -> &mut Self {
        self.playing = true;
        self
    }

    /// Stops playback and rewinds to the start.
    pub fn stop(&mut self) -> &mut Self {
        self.playing = false;
        self.time = 0.0;
        self
    }

    pub fn set_time_scale(&mut self, time_scale: f32) -> &mut Self {
        self.time_scale = time_scale;
        self
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Local time within the clip, in `[0, duration)`.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advances the local time by `dt` scaled by the time scale, wrapping
    /// around at the clip's end.
    pub fn update(&mut self, dt: Duration) {
        if !self.playing {
            return;
        }
        let duration = self.clip.duration;
        if duration <= 0.0 {
            self.time = 0.0;
            return;
        }
        self.time = (self.time + dt.as_secs_f32() * self.time_scale).rem_euclid(duration);
    }

    /// The current value of the track driving `target`, if the clip has one.
    pub fn value(&self, target: TrackTarget) -> Option<f32> {
        self.clip
            .tracks
            .iter()
            .find(|track| track.target() == target)
            .map(|track| track.sample(self.time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flicker() -> AnimationPlayer {
        let track = KeyframeTrack::new(
            TrackTarget::Intensity,
            vec![0.0, 1.0, 2.0, 3.0],
            vec![0.5, 2.0, 0.5, 2.0],
        )
        .unwrap();
        let mut player = AnimationPlayer::new(AnimationClip::new("flicker", None, vec![track]));
        player.play();
        player
    }

    #[test]
    fn rejects_malformed_tracks() {
        assert!(KeyframeTrack::new(TrackTarget::Intensity, vec![], vec![]).is_err());
        assert!(KeyframeTrack::new(TrackTarget::Intensity, vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(
            KeyframeTrack::new(TrackTarget::Intensity, vec![1.0, 0.0], vec![1.0, 2.0]).is_err()
        );
    }

    #[test]
    fn rejects_non_finite_keyframes() {
        let track = KeyframeTrack::new(TrackTarget::Intensity, vec![f32::NAN, 1.0], vec![1.0, 2.0]);
        assert!(track.unwrap_err().to_string().contains("non-finite"));
        assert!(
            KeyframeTrack::new(TrackTarget::Intensity, vec![0.0, f32::INFINITY], vec![1.0, 2.0])
                .is_err()
        );
        assert!(KeyframeTrack::new(TrackTarget::Intensity, vec![0.0], vec![f32::NAN]).is_err());
    }

    #[test]
    fn interpolates_linearly_between_keyframes() {
        let track = KeyframeTrack::new(
            TrackTarget::RotationY,
            vec![0.0, 30.0],
            vec![0.0, std::f32::consts::TAU],
        )
        .unwrap();
        assert_eq!(track.sample(0.0), 0.0);
        assert!((track.sample(15.0) - std::f32::consts::PI).abs() < 1e-5);
        assert!((track.sample(7.5) - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn holds_end_values_outside_range() {
        let track =
            KeyframeTrack::new(TrackTarget::Intensity, vec![1.0, 2.0], vec![3.0, 4.0]).unwrap();
        assert_eq!(track.sample(-1.0), 3.0);
        assert_eq!(track.sample(5.0), 4.0);
    }

    #[test]
    fn duration_defaults_to_last_keyframe() {
        let player = flicker();
        assert_eq!(player.clip().duration, 3.0);
    }

    #[test]
    fn flicker_follows_keyframes() {
        let mut player = flicker();
        assert_eq!(player.value(TrackTarget::Intensity), Some(0.5));
        player.update(Duration::from_millis(500));
        assert!((player.value(TrackTarget::Intensity).unwrap() - 1.25).abs() < 1e-5);
        player.update(Duration::from_millis(500));
        assert!((player.value(TrackTarget::Intensity).unwrap() - 2.0).abs() < 1e-5);
        player.update(Duration::from_millis(1000));
        assert!((player.value(TrackTarget::Intensity).unwrap() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn loops_at_clip_end() {
        let mut player = flicker();
        player.update(Duration::from_millis(3500));
        assert!((player.time() - 0.5).abs() < 1e-4);
        assert!((player.value(TrackTarget::Intensity).unwrap() - 1.25).abs() < 1e-3);
    }

    #[test]
    fn paused_player_does_not_advance() {
        let mut player = flicker();
        player.stop();
        player.update(Duration::from_secs(1));
        assert_eq!(player.time(), 0.0);
        assert!(!player.is_playing());
    }

    #[test]
    fn time_scale_speeds_up_playback() {
        let mut player = flicker();
        player.set_time_scale(2.0);
        player.update(Duration::from_millis(500));
        assert!((player.time() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn missing_target_yields_none() {
        assert_eq!(flicker().value(TrackTarget::RotationY), None);
    }
}
