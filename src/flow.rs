//! Flow control and application event loop.
//!
//! A "flow" is a scene that reacts to input, updates its state and describes
//! what to draw each frame. The `App` owns the window and the [`Context`],
//! drives every flow through its lifecycle and renders their output in
//! batches.
//!
//! # User-facing types
//!
//! - [`GraphicsFlow<S>`] is the trait for scenes that handle events and rendering
//! - [`Out`] lets a lifecycle hook reconfigure the context
//! - [`FlowConstructor<S>`] builds a flow asynchronously once the GPU is ready
//!
//! # Lifecycle
//!
//! Each frame (`RedrawRequested`):
//! 1. measure the time since the last frame
//! 2. call `on_update` on every flow
//! 3. apply orbit input to the camera and upload camera and light uniforms
//! 4. collect every flow's `on_render` into pipeline batches and draw them
//! 5. call `on_tick` if `tick_duration_millis` have passed
//! 6. request the next frame

use std::{iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    config::SceneConfig,
    context::{Context, InitContext},
    data_structures::{
        instance::InstanceRaw,
        model::DrawModel,
        texture::Texture,
    },
    pipelines::particles::QUAD_VERTICES,
    render::{Batches, Drawable},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Output of every lifecycle hook.
///
/// `Out::Configure` modifies the Context at runtime, for instance the light
/// intensity or the clear colour. `Empty` is the default when nothing needs
/// to change.
pub enum Out {
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl Default for Out {
    fn default() -> Self {
        Self::Empty
    }
}

/// Trait for implementing a renderable scene.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once when the flow is created
/// 2. `on_window_events()` is called for each winit window event
/// 3. `on_update()` is called every frame
/// 4. `on_tick()` is called every `tick_duration_millis`
/// 5. `on_render()` is called every frame and specifies how to render `self`
pub trait GraphicsFlow<S> {
    /// Initialize the flow and configure the context.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out;

    /// Called every frame with the elapsed time `dt`.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration) -> Out;

    /// Called every `tick_duration_millis` milliseconds.
    fn on_tick(&mut self, ctx: &Context, state: &mut S) -> Out;

    /// Handle window events (mouse, resizing, ...).
    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent) -> Out;

    /// Return renderable objects for this flow.
    fn on_render(&self) -> crate::render::Render<'_>;
}

/// The pending result of a [`FlowConstructor`].
pub type FlowFuture<S> = Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn GraphicsFlow<S>>>>>>;

/// A flow constructor takes an `InitContext` and asynchronously returns a
/// boxed `GraphicsFlow`, so that assets can be loaded before the first frame.
pub type FlowConstructor<S> = Box<dyn FnOnce(InitContext) -> FlowFuture<S>>;

/// GPU context, app state and surface status.
#[derive(Debug)]
pub(crate) struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
}

impl<State: Default> AppState<State> {
    async fn new(window: Arc<Window>, config: &SceneConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config).await?;
        Ok(Self {
            ctx,
            state: State::default(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        // The camera follows the viewport, the surface may be scaled down.
        self.ctx.projection.resize(width, height);
        let max = self.ctx.device.limits().max_texture_dimension_2d;
        let (surface_width, surface_height) = fit_surface(width, height, max);
        if (surface_width, surface_height) != (width, height) {
            log::warn!(
                "{width}x{height} exceeds the texture limit of {max}, rendering at {surface_width}x{surface_height}"
            );
        }
        self.ctx.config.width = surface_width;
        self.ctx.config.height = surface_height;
        self.is_surface_configured = true;
        self.ctx.surface.configure(&self.ctx.device, &self.ctx.config);
        self.ctx.depth_texture = Texture::create_depth_texture(
            &self.ctx.device,
            [surface_width, surface_height],
            self.ctx.sample_count,
            "depth_texture",
        );
        self.ctx.multisampled_framebuffer = Texture::create_multisampled_framebuffer(
            &self.ctx.device,
            &self.ctx.config,
            self.ctx.sample_count,
        );
        log::debug!("resized to {width}x{height}");
    }

    fn render(&mut self, graphics_flows: &[Box<dyn GraphicsFlow<State>>]) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            // With MSAA the samples are resolved into the surface and dropped.
            let (target, resolve_target, store) = match &self.ctx.multisampled_framebuffer {
                Some(framebuffer) => (&framebuffer.view, Some(&view), wgpu::StoreOp::Discard),
                None => (&view, None, wgpu::StoreOp::Store),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let mut batches = Batches::default();
            graphics_flows
                .iter()
                .for_each(|flow| flow.on_render().set_pipelines(&mut batches));

            let camera = &self.ctx.camera.bind_group;
            let light = &self.ctx.light.bind_group;

            render_pass.set_pipeline(&self.ctx.pipelines.phong);
            for drawable in batches.opaque {
                draw_drawable(&mut render_pass, drawable, &[drawable.group, camera, light]);
            }

            render_pass.set_pipeline(&self.ctx.pipelines.points);
            for cloud in batches.points {
                if cloud.amount == 0 || cloud.positions.size() == 0 {
                    log::warn!("point cloud {} has no particles, skipping", cloud.id);
                    continue;
                }
                render_pass.set_bind_group(0, cloud.group, &[]);
                render_pass.set_bind_group(1, camera, &[]);
                render_pass.set_vertex_buffer(0, cloud.positions.slice(..));
                render_pass.draw(0..QUAD_VERTICES, 0..cloud.amount as u32);
            }

            render_pass.set_pipeline(&self.ctx.pipelines.glow);
            for drawable in batches.glow {
                draw_drawable(&mut render_pass, drawable, &[drawable.group, camera]);
            }

            render_pass.set_pipeline(&self.ctx.pipelines.transparent);
            for drawable in batches.transparent {
                draw_drawable(&mut render_pass, drawable, &[drawable.group, camera]);
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// The largest size with the aspect ratio of `width` x `height` whose sides
/// both fit in `max`. Sizes that already fit are returned unchanged.
pub(crate) fn fit_surface(width: u32, height: u32, max: u32) -> (u32, u32) {
    let largest = width.max(height);
    if largest <= max {
        return (width, height);
    }
    let scale = |side: u32| ((side as u64 * max as u64) / largest as u64).max(1) as u32;
    (scale(width), scale(height))
}

fn draw_drawable(
    render_pass: &mut wgpu::RenderPass<'_>,
    drawable: Drawable<'_>,
    bind_groups: &[&wgpu::BindGroup],
) {
    let amount = drawable.instance.size() / std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress;
    if amount == 0 || drawable.mesh.num_elements == 0 {
        log::warn!(
            "you attempted to render {} ({}) with zero instances",
            drawable.mesh.name,
            drawable.id
        );
        return;
    }
    render_pass.set_vertex_buffer(1, drawable.instance.slice(..));
    render_pass.draw_mesh_instanced(drawable.mesh, 0..amount as u32, bind_groups);
}

pub(crate) struct App<State: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State>>,
    config: SceneConfig,
    state: Option<AppState<State>>,
    // Filled once the constructors have resolved.
    graphics_flows: Vec<Box<dyn GraphicsFlow<State>>>,
    // Taken on the first `resumed`.
    constructors: Option<Vec<FlowConstructor<State>>>,
    last_time: Instant,
    time_since_tick: Duration,
}

impl<State: 'static + Default> App<State> {
    fn new(
        event_loop: &EventLoop<FlowEvent<State>>,
        config: SceneConfig,
        constructors: Vec<FlowConstructor<State>>,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
            time_since_tick: Duration::from_millis(0),
        })
    }

    fn initialized(&mut self, mut app_state: AppState<State>, flows: Vec<Box<dyn GraphicsFlow<State>>>) {
        self.graphics_flows = flows;
        let size = app_state.ctx.window.inner_size();
        app_state.resize(size.width, size.height);
        self.graphics_flows.iter_mut().for_each(|flow| {
            let out = flow.on_init(&mut app_state.ctx, &mut app_state.state);
            handle_flow_output(&mut app_state.ctx, out);
        });
        app_state.ctx.window.request_redraw();
        self.last_time = Instant::now();
        self.state = Some(app_state);
        log::info!("{} flow(s) initialised", self.graphics_flows.len());
    }
}

pub(crate) enum FlowEvent<State: 'static> {
    #[allow(dead_code)]
    Initialized {
        state: AppState<State>,
        flows: Vec<Box<dyn GraphicsFlow<State>>>,
    },
}

impl<State: 'static + Default> ApplicationHandler<FlowEvent<State>> for App<State> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(constructors) = self.constructors.take() else {
            return;
        };

        let window_attributes = Window::default_attributes().with_title("neon-globe");
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("could not create a window: {e}");
                event_loop.exit();
                return;
            }
        };

        #[cfg(target_arch = "wasm32")]
        attach_canvas(&window, &self.config.canvas_container);

        let config = self.config.clone();
        let init_future = async move {
            let app_state = AppState::new(window, &config).await?;
            let flow_futures: Vec<_> = constructors
                .into_iter()
                // Device and queue are Arcs internally, so this only clones handles
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let flows = futures::future::try_join_all(flow_futures).await?;
            anyhow::Ok((app_state, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok((app_state, flows)) => self.initialized(app_state, flows),
                Err(e) => {
                    log::error!("initialisation failed: {e:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok((state, flows)) => {
                        if proxy
                            .send_event(FlowEvent::Initialized { state, flows })
                            .is_err()
                        {
                            log::error!("event loop closed before initialisation finished");
                        }
                    }
                    Err(e) => log::error!("initialisation failed: {e:#}"),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FlowEvent<State>) {
        match event {
            FlowEvent::Initialized { state, flows } => self.initialized(state, flows),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        self.graphics_flows.iter_mut().for_each(|f| {
            let out = f.on_window_events(&state.ctx, &mut state.state, &event);
            handle_flow_output(&mut state.ctx, out);
        });

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                self.time_since_tick += dt;

                self.graphics_flows.iter_mut().for_each(|f| {
                    let out = f.on_update(&state.ctx, &mut state.state, dt);
                    handle_flow_output(&mut state.ctx, out);
                });

                // Update the camera. Input deltas are in window pixels, which
                // differ from the surface size when it had to be scaled down.
                let viewport_height = state.ctx.window.inner_size().height as f32;
                state.ctx.camera.controller.update(
                    &mut state.ctx.camera.camera,
                    &state.ctx.projection,
                    viewport_height,
                );
                state
                    .ctx
                    .camera
                    .uniform
                    .update_view_proj(&state.ctx.camera.camera, &state.ctx.projection);
                state.ctx.queue.write_buffer(
                    &state.ctx.camera.buffer,
                    0,
                    bytemuck::cast_slice(&[state.ctx.camera.uniform]),
                );
                state.ctx.light.write_to_buffer(&state.ctx.queue);

                match state.render(&self.graphics_flows) {
                    Ok(()) => {
                        if self.time_since_tick
                            >= Duration::from_millis(state.ctx.tick_duration_millis)
                        {
                            self.graphics_flows.iter_mut().for_each(|f| {
                                let out = f.on_tick(&state.ctx, &mut state.state);
                                handle_flow_output(&mut state.ctx, out);
                            });
                            self.time_since_tick = Duration::from_millis(0);
                        }
                    }
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => log::error!("unable to render: {e}"),
                }
                state.ctx.window.request_redraw();
            }
            _ => {}
        }
    }
}

fn handle_flow_output(ctx: &mut Context, out: Out) {
    match out {
        Out::Configure(f) => f(ctx),
        Out::Empty => (),
    }
}

/// Appends the window's canvas to the element with id `container`, or to
/// `<body>` if there is no such element, and stretches it over the viewport.
#[cfg(target_arch = "wasm32")]
fn attach_canvas(window: &Window, container: &str) {
    use winit::platform::web::WindowExtWebSys;

    let Some(canvas) = window.canvas() else {
        log::error!("window has no canvas");
        return;
    };
    let style = canvas.style();
    for (property, value) in [("width", "100vw"), ("height", "100vh"), ("display", "block")] {
        if let Err(e) = style.set_property(property, value) {
            log::warn!("could not set canvas {property}: {e:?}");
        }
    }

    let Some(document) = web_sys::window().and_then(|win| win.document()) else {
        log::error!("no document to attach the canvas to");
        return;
    };
    let parent: Option<web_sys::Element> = match document.get_element_by_id(container) {
        Some(element) => Some(element),
        None => {
            log::warn!("no element with id {container:?}, appending the canvas to <body>");
            document.body().map(web_sys::Element::from)
        }
    };
    let attached = parent
        .map(|parent| parent.append_child(&web_sys::Element::from(canvas)).is_ok())
        .unwrap_or(false);
    if !attached {
        log::error!("could not attach the canvas to the document");
    }
}

/// Initialises logging and runs `constructors` until the window is closed.
pub fn run<State: 'static + Default>(
    config: SceneConfig,
    constructors: Vec<FlowConstructor<State>>,
) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            eprintln!("Warning: Could not initialize logger: {e}");
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent<State>> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config, constructors)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surfaces_within_the_limit_are_kept() {
        assert_eq!(fit_surface(1920, 1080, 2048), (1920, 1080));
        assert_eq!(fit_surface(2048, 2048, 2048), (2048, 2048));
    }

    #[test]
    fn oversized_surfaces_keep_their_aspect_ratio() {
        // a 1440x900 viewport at a device pixel ratio of 2 on WebGL2
        let (width, height) = fit_surface(2880, 1800, 2048);
        assert_eq!((width, height), (2048, 1280));
        assert_eq!(width as f32 / height as f32, 2880.0 / 1800.0);

        let (width, height) = fit_surface(1000, 9000, 2048);
        assert_eq!(height, 2048);
        assert_eq!(width, 227);
    }

    #[test]
    fn thin_surfaces_never_collapse() {
        assert_eq!(fit_surface(10_000, 1, 2048), (2048, 1));
    }
}
