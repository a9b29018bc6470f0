mod common;

use std::f32::consts::TAU;

use common::{FRAME, assert_close, config};
use neon_globe::scene::{globe::GlobeRotation, motion::SceneMotion, neon::NeonLight};

#[test]
fn globe_turns_once_per_clip() {
    let config = config();
    let mut rotation = GlobeRotation::new(&config.globe).unwrap();

    // ten seconds at 60 fps
    let mut angle = 0.0;
    for _ in 0..600 {
        angle = rotation.advance(FRAME);
    }
    let clip_time = rotation.player().time();
    assert_close(clip_time, 10.0, 0.01);
    assert_close(angle, TAU * clip_time / 30.0 + 0.005, 1e-3);
}

#[test]
fn globe_angle_is_absolute_each_frame() {
    let config = config();
    let mut a = GlobeRotation::new(&config.globe).unwrap();
    let mut b = GlobeRotation::new(&config.globe).unwrap();

    // many small frames and one big frame land on the same angle
    for _ in 0..120 {
        a.advance(FRAME);
    }
    b.advance(FRAME * 120);
    assert_close(a.angle(), b.angle(), 1e-3);
}

#[test]
fn light_flickers_with_a_three_second_period() {
    let config = config();
    let mut light = NeonLight::new(&config.light).unwrap();

    let mut samples = Vec::new();
    for _ in 0..360 {
        samples.push(light.advance(FRAME));
    }
    let max = samples.iter().copied().fold(f32::MIN, f32::max);
    let min = samples.iter().copied().fold(f32::MAX, f32::min);
    assert_close(max, 2.0, 0.05);
    assert_close(min, 0.5, 0.05);
    assert!(samples.iter().all(|i| (0.5..=2.0).contains(i)));
}

#[test]
fn broken_flicker_is_reported() {
    let mut config = config();
    config.light.flicker_times = vec![0.0, 2.0, 1.0, 3.0];
    let err = NeonLight::new(&config.light).unwrap_err();
    assert!(err.to_string().contains("not ascending"), "{err}");
}

#[test]
fn shell_and_particles_keep_turning() {
    let config = config();
    let mut motion = SceneMotion::new(&config).unwrap();

    let mut poses = Vec::new();
    for _ in 0..600 {
        poses.push(motion.advance(FRAME));
    }
    let last = poses[599];
    assert_close(last.atmosphere, 600.0 * 0.005, 1e-3);
    assert_close(last.particles, 600.0 * 0.001, 1e-4);
    // the globe follows its clip instead of piling up spins
    assert!(last.globe < TAU);
    assert!(poses.windows(2).all(|w| w[1].atmosphere > w[0].atmosphere));
    assert!(poses.iter().all(|p| (0.5..=2.0).contains(&p.intensity)));
}
