mod common;

use common::{assert_close, config};
use neon_globe::{
    resources::geometry,
    scene::particles::{scatter, seeded_rng},
};

#[test]
fn globe_and_atmosphere_spheres() {
    let config = config();
    let globe = geometry::sphere(
        config.globe.radius,
        config.globe.width_segments,
        config.globe.height_segments,
    );
    let atmosphere = geometry::sphere(
        config.atmosphere.radius,
        config.atmosphere.width_segments,
        config.atmosphere.height_segments,
    );
    assert_eq!(globe.vertices.len(), 65 * 65);
    assert_eq!(atmosphere.vertices.len(), 51 * 51);

    let outermost = |g: &neon_globe::data_structures::model::Geometry| {
        g.vertices
            .iter()
            .map(|v| v.position.iter().map(|c| c * c).sum::<f32>().sqrt())
            .fold(0.0, f32::max)
    };
    // the shell sits just outside the globe
    assert_close(outermost(&globe), 2.0, 1e-4);
    assert_close(outermost(&atmosphere), 2.05, 1e-4);
}

#[test]
fn texture_coordinates_cover_the_image() {
    let sphere = geometry::sphere(1.0, 32, 16);
    for vertex in &sphere.vertices {
        let [u, v] = vertex.tex_coords;
        assert!((0.0..=1.0).contains(&u), "u = {u}");
        assert!((0.0..=1.0).contains(&v), "v = {v}");
    }
}

#[test]
fn billboard_plane_matches_its_size() {
    let config = config();
    let plane = geometry::plane(config.billboard.width, config.billboard.height);
    let xs: Vec<f32> = plane.vertices.iter().map(|v| v.position[0]).collect();
    let ys: Vec<f32> = plane.vertices.iter().map(|v| v.position[1]).collect();
    let span = |values: &[f32]| {
        values.iter().copied().fold(f32::MIN, f32::max) - values.iter().copied().fold(f32::MAX, f32::min)
    };
    assert_eq!(span(&xs), 3.0);
    assert_eq!(span(&ys), 3.0);
}

#[test]
fn particle_field_fills_the_configured_cube() {
    let config = config();
    let particles = scatter(
        config.particles.count,
        config.particles.extent,
        &mut seeded_rng(config.particles.seed),
    );
    assert_eq!(particles.len(), 5000);
    let half = config.particles.extent / 2.0;
    let max = particles
        .iter()
        .flat_map(|p| p.position)
        .fold(0.0f32, |m, c| m.max(c.abs()));
    assert!(max <= half);
    // 15000 uniform samples get close to the faces
    assert!(max > half * 0.99);
}
