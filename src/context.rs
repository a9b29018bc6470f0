//! GPU and window context.
//!
//! [`Context`] owns everything the frame loop needs: surface, device, queue,
//! the depth buffer, camera and light resources, shared bind group layouts
//! and the render pipelines. Scenes receive an [`InitContext`] while they are
//! being constructed and a `&Context` afterwards.

use std::sync::Arc;

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{self, CameraResources, CameraUniform, OrbitController, Projection},
    config::{SceneConfig, hex_to_linear},
    data_structures::texture,
    pipelines::{
        Layouts, Pipelines,
        light::{LightResources, LightUniform},
    },
};

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    // Rendered into and resolved to the surface when `sample_count > 1`.
    pub(crate) multisampled_framebuffer: Option<texture::Texture>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub layouts: Layouts,
    pub(crate) pipelines: Pipelines,
    pub sample_count: u32,
    pub clear_colour: wgpu::Color,
    pub tick_duration_millis: u64,
}

impl Context {
    pub async fn new(window: Arc<Window>, scene: &SceneConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("wgpu setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("could not create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no graphics adapter is compatible with the surface")?;
        log::info!("adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("could not open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders output linear colour and rely on an sRGB surface for
        // the final encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface reports no supported formats")?;
        let present_mode = surface_caps
            .present_modes
            .first()
            .copied()
            .unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera = camera::Camera::looking_at(scene.camera.position, scene.camera.target);
        let projection = Projection::new(
            config.width,
            config.height,
            cgmath::Deg(scene.camera.fov_y_degrees),
            scene.camera.near,
            scene.camera.far,
        );
        let controller = OrbitController::new(&scene.orbit);

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera, &projection);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout = camera::mk_bind_group_layout(&device);
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let camera = CameraResources {
            camera,
            controller,
            uniform: camera_uniform,
            buffer: camera_buffer,
            bind_group: camera_bind_group,
            bind_group_layout: camera_bind_group_layout.clone(),
        };

        let colour_flags = adapter.get_texture_format_features(surface_format).flags;
        let depth_flags = adapter
            .get_texture_format_features(texture::Texture::DEPTH_FORMAT)
            .flags;
        let sample_count = supported_sample_count(scene.sample_count, |count| {
            colour_flags.sample_count_supported(count) && depth_flags.sample_count_supported(count)
        });
        if sample_count != scene.sample_count {
            log::warn!(
                "{}x multisampling is not supported, using {sample_count}x",
                scene.sample_count
            );
        }

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            sample_count,
            "depth_texture",
        );
        let multisampled_framebuffer = texture::Texture::create_multisampled_framebuffer(
            &device,
            &config,
            sample_count,
        );

        let light_uniform = LightUniform {
            position: scene.light.position,
            intensity: scene.light.intensity,
            color: hex_to_linear(scene.light.colour),
            distance: scene.light.distance,
            ambient: hex_to_linear(scene.light.ambient),
            decay: scene.light.decay,
        };
        let light = LightResources::new(light_uniform, &device);

        let layouts = Layouts::new(
            &device,
            camera_bind_group_layout,
            light.bind_group_layout.clone(),
        );
        let pipelines = Pipelines::new(&device, &config, sample_count, &layouts);
        log::info!(
            "surface {}x{} ({:?}, {sample_count}x MSAA) ready",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            window,
            depth_texture,
            multisampled_framebuffer,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            layouts,
            pipelines,
            sample_count,
            clear_colour: scene.clear_colour(),
            tick_duration_millis: scene.tick_duration_millis,
        })
    }
}

/// What a scene constructor needs to create GPU resources.
///
/// Device and queue are reference counted internally, so cloning is cheap.
#[derive(Clone, Debug)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub layouts: Layouts,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            layouts: ctx.layouts.clone(),
        }
    }
}

/// The largest sample count up to `requested` that `supported` accepts.
/// Single sampling is always available.
pub(crate) fn supported_sample_count(requested: u32, supported: impl Fn(u32) -> bool) -> u32 {
    [16, 8, 4, 2]
        .into_iter()
        .find(|&count| count <= requested && supported(count))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_a_supported_sample_count() {
        assert_eq!(supported_sample_count(4, |count| count == 4), 4);
        assert_eq!(supported_sample_count(1, |_| true), 1);
    }

    #[test]
    fn falls_back_to_fewer_samples() {
        assert_eq!(supported_sample_count(8, |count| count <= 4), 4);
        assert_eq!(supported_sample_count(3, |_| true), 2);
        assert_eq!(supported_sample_count(4, |_| false), 1);
        assert_eq!(supported_sample_count(0, |_| true), 1);
    }
}
