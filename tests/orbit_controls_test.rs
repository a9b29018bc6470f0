mod common;

use common::{assert_close, assert_point_close, config};
use neon_globe::{
    camera::{Camera, OrbitController, Projection},
    cgmath::{Deg, Point3},
    PhysicalPosition,
};
use winit::event::{MouseButton, MouseScrollDelta};

fn setup() -> (Camera, OrbitController, Projection) {
    let config = config();
    let camera = Camera::looking_at(config.camera.position, config.camera.target);
    let controller = OrbitController::new(&config.orbit);
    let projection = Projection::new(
        1280,
        720,
        Deg(config.camera.fov_y_degrees),
        config.camera.near,
        config.camera.far,
    );
    (camera, controller, projection)
}

#[test]
fn starts_five_units_in_front_of_the_globe() {
    let (camera, _, _) = setup();
    assert_point_close(camera.position(), Point3::new(0.0, 0.0, 5.0));
    assert_point_close(camera.target, Point3::new(0.0, 0.0, 0.0));
}

#[test]
fn full_drag_across_the_viewport_height_is_a_full_turn() {
    let (mut camera, mut controller, projection) = setup();
    controller.process_cursor(PhysicalPosition::new(0.0, 300.0));
    controller.process_mouse_button(MouseButton::Left, true);
    controller.process_cursor(PhysicalPosition::new(720.0, 300.0));
    controller.process_mouse_button(MouseButton::Left, false);
    controller.update(&mut camera, &projection, 720.0);

    assert_point_close(camera.position(), Point3::new(0.0, 0.0, 5.0));
}

#[test]
fn rotating_keeps_the_distance() {
    let (mut camera, mut controller, projection) = setup();
    controller.process_cursor(PhysicalPosition::new(0.0, 0.0));
    controller.process_mouse_button(MouseButton::Left, true);
    controller.process_cursor(PhysicalPosition::new(123.0, -77.0));
    controller.update(&mut camera, &projection, 720.0);

    let offset = camera.position() - camera.target;
    use neon_globe::cgmath::InnerSpace;
    assert_close(offset.magnitude(), 5.0, 1e-4);
}

#[test]
fn scrolling_in_and_out_returns_to_the_start() {
    let (mut camera, mut controller, projection) = setup();
    controller.process_scroll(&MouseScrollDelta::LineDelta(0.0, 3.0));
    controller.update(&mut camera, &projection, 720.0);
    assert!(camera.distance < 5.0);
    controller.process_scroll(&MouseScrollDelta::LineDelta(0.0, -3.0));
    controller.update(&mut camera, &projection, 720.0);
    assert_close(camera.distance, 5.0, 1e-4);
}

#[test]
fn zooming_out_stops_at_the_far_limit() {
    let (mut camera, mut controller, projection) = setup();
    controller.process_scroll(&MouseScrollDelta::LineDelta(0.0, -10_000.0));
    controller.update(&mut camera, &projection, 720.0);
    assert_eq!(camera.distance, 1000.0);
}

#[test]
fn resize_follows_the_window() {
    let (_, _, mut projection) = setup();
    projection.resize(800, 800);
    assert_eq!(projection.aspect, 1.0);
    projection.resize(800, 0);
    assert_eq!(projection.aspect, 1.0);
}
