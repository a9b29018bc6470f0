//! Orbit camera, perspective projection and pointer controls.
//!
//! The camera orbits a target point and is described in spherical
//! coordinates (distance, azimuth around +Y, polar angle from +Y). The
//! [`OrbitController`] turns input into changes of those coordinates:
//!
//! - mouse: left drag rotates, right drag pans, middle drag and the wheel dolly
//! - touch: one finger rotates, two fingers pan and pinch to dolly
//! - trackpad pinch gestures dolly

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector2, Vector3};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the camera off the poles, where the view basis degenerates.
const POLAR_EPSILON: f32 = 1e-6;
/// Each wheel notch scales the orbit distance by this factor.
const ZOOM_BASE: f32 = 0.95;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub target: Point3<f32>,
    pub distance: f32,
    pub azimuth: Rad<f32>,
    pub polar: Rad<f32>,
}

impl Camera {
    pub fn looking_at<P: Into<Point3<f32>>, T: Into<Point3<f32>>>(position: P, target: T) -> Self {
        let target = target.into();
        let mut camera = Self {
            target,
            distance: 1.0,
            azimuth: Rad(0.0),
            polar: Rad(PI / 2.0),
        };
        camera.set_position(position.into());
        camera
    }

    /// Moves the camera to `position`, keeping the target.
    pub fn set_position(&mut self, position: Point3<f32>) {
        let offset = position - self.target;
        let distance = offset.magnitude();
        if distance <= f32::EPSILON {
            return;
        }
        self.distance = distance;
        self.azimuth = Rad(offset.x.atan2(offset.z));
        self.polar = Rad((offset.y / distance).clamp(-1.0, 1.0).acos());
    }

    pub fn position(&self) -> Point3<f32> {
        let (sin_polar, cos_polar) = self.polar.0.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.0.sin_cos();
        self.target
            + Vector3::new(
                sin_polar * sin_azimuth,
                cos_polar,
                sin_polar * cos_azimuth,
            ) * self.distance
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position(), self.target, Vector3::unit_y())
    }

    /// Camera right and up vectors in world space.
    fn basis(&self) -> (Vector3<f32>, Vector3<f32>) {
        let forward = (self.target - self.position()).normalize();
        let right = forward.cross(Vector3::unit_y()).normalize();
        let up = right.cross(forward);
        (right, up)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Matches the aspect ratio to the new viewport. Zero-sized viewports
    /// (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    Rotate,
    Pan,
    Dolly,
}

#[derive(Debug)]
pub struct OrbitController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    drag: Option<Drag>,
    cursor: Option<PhysicalPosition<f64>>,
    // Active touch points in the order they went down.
    touches: Vec<(u64, PhysicalPosition<f64>)>,
    rotate_delta: Vector2<f32>,
    pan_delta: Vector2<f32>,
    zoom_steps: f32,
    dolly_scale: f32,
}

impl OrbitController {
    pub fn new(config: &crate::config::OrbitConfig) -> Self {
        Self {
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            pan_speed: config.pan_speed,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            drag: None,
            cursor: None,
            touches: Vec::new(),
            rotate_delta: Vector2::new(0.0, 0.0),
            pan_delta: Vector2::new(0.0, 0.0),
            zoom_steps: 0.0,
            dolly_scale: 1.0,
        }
    }

    /// Feeds a window event to the controller. Returns whether the event was
    /// used for camera control.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.process_mouse_button(*button, *state == ElementState::Pressed)
            }
            WindowEvent::CursorMoved { position, .. } => self.process_cursor(*position),
            WindowEvent::CursorLeft { .. } => {
                self.drag = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.process_scroll(delta);
                true
            }
            WindowEvent::Touch(Touch {
                id,
                phase,
                location,
                ..
            }) => self.process_touch(*id, *phase, *location),
            WindowEvent::PinchGesture { delta, .. } => self.process_pinch(*delta),
            _ => false,
        }
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, pressed: bool) -> bool {
        let drag = match button {
            MouseButton::Left => Drag::Rotate,
            MouseButton::Right => Drag::Pan,
            MouseButton::Middle => Drag::Dolly,
            _ => return false,
        };
        if pressed {
            self.drag = Some(drag);
        } else if self.drag == Some(drag) {
            self.drag = None;
        }
        true
    }

    pub fn process_cursor(&mut self, position: PhysicalPosition<f64>) -> bool {
        let previous = self.cursor.replace(position);
        let (Some(drag), Some(previous)) = (self.drag, previous) else {
            return false;
        };
        let delta = to_vector(position) - to_vector(previous);
        match drag {
            Drag::Rotate => self.rotate_delta += delta * self.rotate_speed,
            Drag::Pan => self.pan_delta += delta * self.pan_speed,
            // dragging down moves the camera away, 100 px per wheel notch
            Drag::Dolly => self.zoom_steps -= delta.y * 0.01,
        }
        true
    }

    /// Positive steps (wheel away from the user) move the camera closer.
    pub fn process_scroll(&mut self, delta: &MouseScrollDelta) {
        self.zoom_steps += match delta {
            MouseScrollDelta::LineDelta(_, lines) => *lines,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 * 0.01,
        };
    }

    /// One finger rotates like a left drag. With two fingers down, the
    /// motion of their midpoint pans and the change of their separation
    /// dollies. Further fingers are tracked but ignored.
    pub fn process_touch(
        &mut self,
        id: u64,
        phase: TouchPhase,
        location: PhysicalPosition<f64>,
    ) -> bool {
        match phase {
            TouchPhase::Started => {
                self.touches.retain(|(touch, _)| *touch != id);
                self.touches.push((id, location));
                true
            }
            TouchPhase::Moved => self.move_touch(id, location),
            TouchPhase::Ended | TouchPhase::Cancelled => {
                let before = self.touches.len();
                self.touches.retain(|(touch, _)| *touch != id);
                self.touches.len() != before
            }
        }
    }

    fn move_touch(&mut self, id: u64, location: PhysicalPosition<f64>) -> bool {
        let Some(index) = self.touches.iter().position(|(touch, _)| *touch == id) else {
            return false;
        };
        if self.touches.len() == 1 {
            let previous = std::mem::replace(&mut self.touches[0].1, location);
            self.rotate_delta += (to_vector(location) - to_vector(previous)) * self.rotate_speed;
        } else if index < 2 {
            let (midpoint, separation) = self.pinch();
            self.touches[index].1 = location;
            let (new_midpoint, new_separation) = self.pinch();
            self.pan_delta += (new_midpoint - midpoint) * self.pan_speed;
            if separation > 0.0 && new_separation > 0.0 {
                self.dolly_scale *= (separation / new_separation).powf(self.zoom_speed);
            }
        } else {
            self.touches[index].1 = location;
        }
        true
    }

    /// Midpoint and distance of the first two touches.
    fn pinch(&self) -> (Vector2<f32>, f32) {
        let a = to_vector(self.touches[0].1);
        let b = to_vector(self.touches[1].1);
        ((a + b) * 0.5, (b - a).magnitude())
    }

    /// Trackpad magnification; positive deltas move the camera closer.
    pub fn process_pinch(&mut self, delta: f64) -> bool {
        let magnification = 1.0 + delta as f32;
        if magnification <= 0.0 {
            return false;
        }
        self.dolly_scale /= magnification.powf(self.zoom_speed);
        true
    }

    /// Applies the input gathered since the last frame to `camera`.
    pub fn update(&mut self, camera: &mut Camera, projection: &Projection, viewport_height: f32) {
        let height = viewport_height.max(1.0);

        camera.azimuth.0 -= TAU * self.rotate_delta.x / height;
        camera.polar.0 = (camera.polar.0 - TAU * self.rotate_delta.y / height)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        if self.pan_delta != Vector2::new(0.0, 0.0) {
            let target_distance = camera.distance * (projection.fovy.0 / 2.0).tan();
            let (right, up) = camera.basis();
            let left = -right * (2.0 * self.pan_delta.x * target_distance / height);
            let up = up * (2.0 * self.pan_delta.y * target_distance / height);
            camera.target += left + up;
        }

        let scale = ZOOM_BASE.powf(self.zoom_speed * self.zoom_steps) * self.dolly_scale;
        if scale != 1.0 {
            camera.distance =
                (camera.distance * scale).clamp(self.min_distance, self.max_distance);
        }

        self.rotate_delta = Vector2::new(0.0, 0.0);
        self.pan_delta = Vector2::new(0.0, 0.0);
        self.zoom_steps = 0.0;
        self.dolly_scale = 1.0;
    }
}

fn to_vector(position: PhysicalPosition<f64>) -> Vector2<f32> {
    Vector2::new(position.x as f32, position.y as f32)
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view: Matrix4::identity().into(),
            proj: Matrix4::identity().into(),
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        let view = camera.calc_matrix();
        let proj = projection.calc_matrix();
        self.view_position = camera.position().to_homogeneous().into();
        self.view = view.into();
        self.proj = proj.into();
        self.view_proj = (proj * view).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    fn controller() -> OrbitController {
        OrbitController::new(&SceneConfig::default().orbit)
    }

    fn projection() -> Projection {
        Projection::new(800, 600, cgmath::Deg(75.0), 0.1, 1000.0)
    }

    fn assert_close(a: Point3<f32>, b: Point3<f32>) {
        assert!((a - b).magnitude() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn looking_at_recovers_position() {
        let camera = Camera::looking_at((0.0, 0.0, 5.0), (0.0, 0.0, 0.0));
        assert_eq!(camera.distance, 5.0);
        assert!(camera.azimuth.0.abs() < 1e-6);
        assert!((camera.polar.0 - PI / 2.0).abs() < 1e-6);
        assert_close(camera.position(), Point3::new(0.0, 0.0, 5.0));

        let camera = Camera::looking_at((3.0, 4.0, -2.0), (1.0, 1.0, 1.0));
        assert_close(camera.position(), Point3::new(3.0, 4.0, -2.0));
    }

    #[test]
    fn resize_sets_exact_aspect() {
        let mut projection = projection();
        projection.resize(1920, 1080);
        assert_eq!(projection.aspect, 1920.0 / 1080.0);
        projection.resize(0, 1080);
        assert_eq!(projection.aspect, 1920.0 / 1080.0);
    }

    #[test]
    fn projection_maps_near_plane_to_zero_depth() {
        let projection = projection();
        let clip = projection.calc_matrix() * cgmath::Vector4::new(0.0, 0.0, -0.1, 1.0);
        assert!((clip.z / clip.w).abs() < 1e-5);
        let clip = projection.calc_matrix() * cgmath::Vector4::new(0.0, 0.0, -1000.0, 1.0);
        assert!((clip.z / clip.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn left_drag_orbits_around_target() {
        let mut camera = Camera::looking_at((0.0, 0.0, 5.0), (0.0, 0.0, 0.0));
        let mut controller = controller();
        controller.process_cursor(PhysicalPosition::new(100.0, 100.0));
        controller.process_mouse_button(MouseButton::Left, true);
        controller.process_cursor(PhysicalPosition::new(250.0, 100.0));
        controller.update(&mut camera, &projection(), 600.0);

        // a drag of a quarter of the viewport height is a quarter turn
        assert!((camera.azimuth.0 + TAU * 150.0 / 600.0).abs() < 1e-5);
        assert!((camera.distance - 5.0).abs() < 1e-6);
        assert_close(camera.target, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn cursor_motion_without_button_is_ignored() {
        let mut camera = Camera::looking_at((0.0, 0.0, 5.0), (0.0, 0.0, 0.0));
        let mut controller = controller();
        controller.process_cursor(PhysicalPosition::new(0.0, 0.0));
        assert!(!controller.process_cursor(PhysicalPosition::new(50.0, 50.0)));
        controller.update(&mut camera, &projection(), 600.0);
        assert_close(camera.position(), Point3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn polar_angle_never_reaches_the_poles() {
        let mut camera = Camera::looking_at((0.0, 0.0, 5.0), (0.0, 0.0, 0.0));
        let mut controller = controller();
        controller.process_cursor(PhysicalPosition::new(0.0, 0.0));
        controller.process_mouse_button(MouseButton::Left, true);
        controller.process_cursor(PhysicalPosition::new(0.0, 5000.0));
        controller.update(&mut camera, &projection(), 600.0);
        assert!(camera.polar.0 > 0.0);
        assert!(camera.polar.0 < PI);
    }

    #[test]
    fn wheel_dollies_and_clamps() {
        let mut camera = Camera::looking_at((0.0, 0.0, 5.0), (0.0, 0.0, 0.0));
        let mut controller = controller();
        controller.process_scroll(&MouseScrollDelta::LineDelta(0.0, 1.0));
        controller.update(&mut camera, &projection(), 600.0);
        assert!((camera.distance - 5.0 * 0.95).abs() < 1e-5);

        controller.process_scroll(&MouseScrollDelta::LineDelta(0.0, 1000.0));
        controller.update(&mut camera, &projection(), 600.0);
        assert_eq!(camera.distance, 0.1);
    }

    #[test]
    fn right_drag_pans_target() {
        let mut camera = Camera::looking_at((0.0, 0.0, 5.0), (0.0, 0.0, 0.0));
        let mut controller = controller();
        controller.process_cursor(PhysicalPosition::new(0.0, 0.0));
        controller.process_mouse_button(MouseButton::Right, true);
        controller.process_cursor(PhysicalPosition::new(60.0, 0.0));
        controller.process_mouse_button(MouseButton::Right, false);
        controller.update(&mut camera, &projection(), 600.0);

        // dragging right moves the target to the camera's left (-X here)
        assert!(camera.target.x < 0.0);
        assert!(camera.target.y.abs() < 1e-6);
        assert!((camera.distance - 5.0).abs() < 1e-6);
    }

    fn touch(controller: &mut OrbitController, id: u64, phase: TouchPhase, x: f64, y: f64) {
        controller.process_touch(id, phase, PhysicalPosition::new(x, y));
    }

    #[test]
    fn one_finger_rotates_like_a_left_drag() {
        let mut camera = Camera::looking_at((0.0, 0.0, 5.0), (0.0, 0.0, 0.0));
        let mut controller = controller();
        touch(&mut controller, 0, TouchPhase::Started, 100.0, 100.0);
        touch(&mut controller, 0, TouchPhase::Moved, 250.0, 100.0);
        touch(&mut controller, 0, TouchPhase::Ended, 250.0, 100.0);
        controller.update(&mut camera, &projection(), 600.0);

        assert!((camera.azimuth.0 + TAU * 150.0 / 600.0).abs() < 1e-5);
        assert!((camera.distance - 5.0).abs() < 1e-6);
    }

    #[test]
    fn spreading_two_fingers_dollies_in() {
        let mut camera = Camera::looking_at((0.0, 0.0, 5.0), (0.0, 0.0, 0.0));
        let mut controller = controller();
        touch(&mut controller, 0, TouchPhase::Started, 100.0, 300.0);
        touch(&mut controller, 1, TouchPhase::Started, 200.0, 300.0);
        // separation 100 -> 150 -> 200, midpoint back where it started
        touch(&mut controller, 0, TouchPhase::Moved, 50.0, 300.0);
        touch(&mut controller, 1, TouchPhase::Moved, 250.0, 300.0);
        controller.update(&mut camera, &projection(), 600.0);

        assert!((camera.distance - 2.5).abs() < 1e-4, "{}", camera.distance);
        assert_close(camera.target, Point3::new(0.0, 0.0, 0.0));
        assert!(camera.azimuth.0.abs() < 1e-6);
    }

    #[test]
    fn two_fingers_moving_together_pan() {
        let mut camera = Camera::looking_at((0.0, 0.0, 5.0), (0.0, 0.0, 0.0));
        let mut controller = controller();
        touch(&mut controller, 0, TouchPhase::Started, 100.0, 300.0);
        touch(&mut controller, 1, TouchPhase::Started, 200.0, 300.0);
        touch(&mut controller, 0, TouchPhase::Moved, 160.0, 300.0);
        touch(&mut controller, 1, TouchPhase::Moved, 260.0, 300.0);
        controller.update(&mut camera, &projection(), 600.0);

        assert!(camera.target.x < 0.0);
        assert!((camera.distance - 5.0).abs() < 1e-4);
        assert!(camera.azimuth.0.abs() < 1e-6);
    }

    #[test]
    fn lifting_a_finger_hands_over_to_rotation() {
        let mut camera = Camera::looking_at((0.0, 0.0, 5.0), (0.0, 0.0, 0.0));
        let mut controller = controller();
        touch(&mut controller, 0, TouchPhase::Started, 100.0, 300.0);
        touch(&mut controller, 1, TouchPhase::Started, 200.0, 300.0);
        touch(&mut controller, 0, TouchPhase::Ended, 100.0, 300.0);
        touch(&mut controller, 1, TouchPhase::Moved, 260.0, 300.0);
        controller.update(&mut camera, &projection(), 600.0);

        assert!((camera.azimuth.0 + TAU * 60.0 / 600.0).abs() < 1e-5);
        assert_close(camera.target, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn unknown_touches_are_ignored() {
        let mut controller = controller();
        assert!(!controller.process_touch(7, TouchPhase::Moved, PhysicalPosition::new(1.0, 1.0)));
        assert!(!controller.process_touch(7, TouchPhase::Ended, PhysicalPosition::new(1.0, 1.0)));
    }

    #[test]
    fn pinch_gesture_dollies() {
        let mut camera = Camera::looking_at((0.0, 0.0, 5.0), (0.0, 0.0, 0.0));
        let mut controller = controller();
        assert!(controller.process_pinch(0.25));
        controller.update(&mut camera, &projection(), 600.0);
        assert!((camera.distance - 4.0).abs() < 1e-5);

        assert!(!controller.process_pinch(-1.0));
    }
}
