//! The neon globe scene.
//!
//! [`NeonScene`] is the one [`GraphicsFlow`] of the application. It owns the
//! globe, its glow shell, the billboard and the particle field. Their
//! animation lives in [`SceneMotion`], which is advanced once per frame and
//! copied onto the GPU objects and the neon light.

pub mod atmosphere;
pub mod billboard;
pub mod globe;
pub mod motion;
pub mod neon;
pub mod particles;

use instant::{Duration, Instant};
use winit::event::WindowEvent;

use crate::{
    config::SceneConfig,
    context::{Context, InitContext},
    data_structures::scene_graph::SceneNode,
    flow::{FlowConstructor, FlowFuture, GraphicsFlow, Out},
    render::Render,
    resources::load_texture_or_placeholder,
};

use self::{
    atmosphere::Atmosphere, billboard::Billboard, globe::Globe, motion::SceneMotion,
    particles::ParticleField,
};

/// Frames rendered since the last tick.
#[derive(Debug)]
pub struct FrameStats {
    frames: u64,
    since: Instant,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            frames: 0,
            since: Instant::now(),
        }
    }
}

impl FrameStats {
    pub fn record_frame(&mut self) {
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames per second over `elapsed`; zero for an empty interval.
    pub fn frame_rate(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.frames as f64 / secs
    }

    /// Returns the frame rate since the previous call and starts a new interval.
    pub fn restart(&mut self) -> f64 {
        let rate = self.frame_rate(self.since.elapsed());
        self.frames = 0;
        self.since = Instant::now();
        rate
    }
}

pub struct NeonScene {
    globe: Globe,
    atmosphere: Atmosphere,
    billboard: Billboard,
    particles: ParticleField,
    motion: SceneMotion,
}

impl NeonScene {
    /// Loads both textures concurrently and builds every scene object.
    pub async fn new(ctx: InitContext, config: SceneConfig) -> anyhow::Result<Self> {
        let (globe_texture, billboard_texture) = futures::join!(
            load_texture_or_placeholder(
                &config.asset_dir,
                &config.globe.texture,
                &ctx.device,
                &ctx.queue
            ),
            load_texture_or_placeholder(
                &config.asset_dir,
                &config.billboard.texture,
                &ctx.device,
                &ctx.queue
            ),
        );

        let scene = Self {
            globe: Globe::new(&ctx, &config.globe, globe_texture),
            atmosphere: Atmosphere::new(&ctx, &config.atmosphere),
            billboard: Billboard::new(&ctx, &config.billboard, billboard_texture),
            particles: ParticleField::new(
                &ctx,
                &config.particles,
                cgmath::Deg(config.camera.fov_y_degrees),
            ),
            motion: SceneMotion::new(&config)?,
        };
        log::info!(
            "scene ready: globe, atmosphere, billboard and {} particles",
            scene.particles.len()
        );
        Ok(scene)
    }

    /// A [`FlowConstructor`] building the scene from `config`.
    pub fn constructor(config: SceneConfig) -> FlowConstructor<FrameStats> {
        Box::new(move |ctx: InitContext| -> FlowFuture<FrameStats> {
            Box::pin(async move {
                let scene = NeonScene::new(ctx, config).await?;
                Ok(Box::new(scene) as Box<dyn GraphicsFlow<FrameStats>>)
            })
        })
    }
}

impl GraphicsFlow<FrameStats> for NeonScene {
    fn on_init(&mut self, ctx: &mut Context, _: &mut FrameStats) -> Out {
        ctx.light.uniform.intensity = self.motion.intensity();
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, stats: &mut FrameStats, dt: Duration) -> Out {
        stats.record_frame();

        let pose = self.motion.advance(dt);
        self.globe.set_rotation_y(pose.globe);
        self.atmosphere.set_rotation_y(pose.atmosphere);
        self.particles.set_rotation_y(pose.particles);

        self.globe.write_to_buffer(&ctx.queue);
        self.atmosphere.write_to_buffer(&ctx.queue);
        self.particles.write_to_buffer(&ctx.queue);

        Out::Configure(Box::new(move |ctx: &mut Context| {
            ctx.light.uniform.intensity = pose.intensity;
        }))
    }

    fn on_tick(&mut self, _: &Context, stats: &mut FrameStats) -> Out {
        let frames = stats.frames();
        let rate = stats.restart();
        log::debug!("{frames} frames, {rate:.1} fps");
        Out::Empty
    }

    fn on_window_events(&mut self, _: &Context, _: &mut FrameStats, _: &WindowEvent) -> Out {
        Out::Empty
    }

    fn on_render(&self) -> Render<'_> {
        Render::Composed(vec![
            self.globe.get_render(),
            self.atmosphere.get_render(),
            self.billboard.get_render(),
            self.particles.get_render(),
        ])
    }
}
