use neon_globe::{cgmath::Point3, config::SceneConfig};

/// One frame at 60 fps.
#[allow(dead_code)]
pub const FRAME: std::time::Duration = std::time::Duration::from_micros(16_667);

pub fn config() -> SceneConfig {
    let mut config = SceneConfig::default();
    config.particles.seed = Some(2024);
    config
}

#[allow(dead_code)]
pub fn assert_close(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() < eps, "{a} != {b} (eps {eps})");
}

#[allow(dead_code)]
pub fn assert_point_close(a: Point3<f32>, b: Point3<f32>) {
    use neon_globe::cgmath::InnerSpace;
    assert!((a - b).magnitude() < 1e-4, "{a:?} != {b:?}");
}
