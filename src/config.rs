//! Scene configuration.
//!
//! [`SceneConfig`] gathers every constant the scene is built from: camera
//! optics, object sizes, light parameters, per-frame rotation deltas and
//! asset locations. `Default` reproduces the reference scene; native builds
//! can override a few values from the environment via
//! [`SceneConfig::from_env`].

#[cfg(not(target_arch = "wasm32"))]
use anyhow::Context as _;

#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

#[derive(Clone, Debug)]
pub struct OrbitConfig {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

#[derive(Clone, Debug)]
pub struct GlobeConfig {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub texture: String,
    /// Keyframe times (seconds) of the rotation clip.
    pub rotation_times: Vec<f32>,
    /// Keyframe values (radians) of the rotation clip.
    pub rotation_values: Vec<f32>,
    pub spin_per_frame: f32,
}

#[derive(Clone, Debug)]
pub struct NeonLightConfig {
    pub colour: u32,
    pub intensity: f32,
    /// Range after which the light contributes nothing. `0.0` means unlimited.
    pub distance: f32,
    pub decay: f32,
    pub position: [f32; 3],
    pub flicker_times: Vec<f32>,
    pub flicker_values: Vec<f32>,
    pub ambient: u32,
}

#[derive(Clone, Debug)]
pub struct AtmosphereConfig {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub glow_strength: f32,
    pub glow_colour: u32,
    pub spin_per_frame: f32,
}

#[derive(Clone, Debug)]
pub struct BillboardConfig {
    pub width: f32,
    pub height: f32,
    pub position: [f32; 3],
    pub texture: String,
    pub opacity: f32,
}

#[derive(Clone, Debug)]
pub struct ParticleConfig {
    pub count: usize,
    /// Edge length of the cube the particles are scattered in.
    pub extent: f32,
    pub size: f32,
    pub colour: u32,
    pub spin_per_frame: f32,
    /// Fixed seed for reproducible fields. A fresh seed is drawn when `None`.
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub asset_dir: String,
    /// Id of the DOM element the canvas is appended to (web only).
    pub canvas_container: String,
    pub clear_colour: u32,
    pub clear_alpha: f64,
    pub tick_duration_millis: u64,
    /// Requested MSAA samples per pixel. Lowered to what the adapter supports.
    pub sample_count: u32,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub globe: GlobeConfig,
    pub light: NeonLightConfig,
    pub atmosphere: AtmosphereConfig,
    pub billboard: BillboardConfig,
    pub particles: ParticleConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            asset_dir: "assets".to_string(),
            canvas_container: "canvasContainer".to_string(),
            clear_colour: 0x000000,
            clear_alpha: 1.0,
            tick_duration_millis: 1000,
            sample_count: 4,
            camera: CameraConfig {
                fov_y_degrees: 75.0,
                near: 0.1,
                far: 1000.0,
                position: [0.0, 0.0, 5.0],
                target: [0.0, 0.0, 0.0],
            },
            orbit: OrbitConfig {
                rotate_speed: 1.0,
                zoom_speed: 1.0,
                pan_speed: 1.0,
                min_distance: 0.1,
                max_distance: 1000.0,
            },
            globe: GlobeConfig {
                radius: 2.0,
                width_segments: 64,
                height_segments: 64,
                texture: "2k_earth_daymap.jpg".to_string(),
                rotation_times: vec![0.0, 30.0],
                rotation_values: vec![0.0, std::f32::consts::TAU],
                spin_per_frame: 0.005,
            },
            light: NeonLightConfig {
                colour: 0xff0000,
                intensity: 2.0,
                distance: 100.0,
                decay: 2.0,
                position: [5.0, 5.0, 5.0],
                flicker_times: vec![0.0, 1.0, 2.0, 3.0],
                flicker_values: vec![0.5, 2.0, 0.5, 2.0],
                ambient: 0x333333,
            },
            atmosphere: AtmosphereConfig {
                radius: 2.05,
                width_segments: 50,
                height_segments: 50,
                glow_strength: 0.5,
                glow_colour: 0x4da6ff,
                spin_per_frame: 0.005,
            },
            billboard: BillboardConfig {
                width: 3.0,
                height: 3.0,
                position: [0.0, 0.0, 2.0],
                texture: "orville.jpeg".to_string(),
                opacity: 0.7,
            },
            particles: ParticleConfig {
                count: 5000,
                extent: 10.0,
                size: 0.025,
                colour: 0xffffff,
                spin_per_frame: 0.001,
                seed: None,
            },
        }
    }
}

impl SceneConfig {
    /// Defaults with `NEON_GLOBE_ASSETS`, `NEON_GLOBE_SEED` and
    /// `NEON_GLOBE_MSAA` applied.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("NEON_GLOBE_ASSETS") {
            config.asset_dir = dir;
        }
        if let Ok(seed) = std::env::var("NEON_GLOBE_SEED") {
            let seed = seed
                .trim()
                .parse::<u64>()
                .with_context(|| format!("NEON_GLOBE_SEED is not a valid u64: {seed:?}"))?;
            config.particles.seed = Some(seed);
        }
        if let Ok(samples) = std::env::var("NEON_GLOBE_MSAA") {
            config.sample_count = samples
                .trim()
                .parse::<u32>()
                .with_context(|| format!("NEON_GLOBE_MSAA is not a sample count: {samples:?}"))?;
        }
        Ok(config)
    }

    pub fn clear_colour(&self) -> wgpu::Color {
        let [r, g, b] = hex_to_linear(self.clear_colour);
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: self.clear_alpha,
        }
    }
}

/// Converts a `0xRRGGBB` sRGB colour into linear RGB.
pub fn hex_to_linear(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0)]
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.camera.fov_y_degrees, 75.0);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.camera.far, 1000.0);
        assert_eq!(config.camera.position, [0.0, 0.0, 5.0]);
    }

    #[test]
    fn antialiased_by_default() {
        assert_eq!(SceneConfig::default().sample_count, 4);
    }

    #[test]
    fn per_frame_spins() {
        let config = SceneConfig::default();
        assert_eq!(config.globe.spin_per_frame, 0.005);
        assert_eq!(config.atmosphere.spin_per_frame, 0.005);
        assert_eq!(config.particles.spin_per_frame, 0.001);
    }

    #[test]
    fn primaries_stay_saturated() {
        let [r, g, b] = hex_to_linear(0xff0000);
        assert!((r - 1.0).abs() < 1e-5);
        assert_eq!([g, b], [0.0, 0.0]);
        assert_eq!(hex_to_linear(0x000000), [0.0, 0.0, 0.0]);
        let white = hex_to_linear(0xffffff);
        for c in white {
            assert!((c - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn mid_grey_is_darker_in_linear_space() {
        let [r, g, b] = hex_to_linear(0x333333);
        assert!((r - 0.0331).abs() < 1e-3, "{r}");
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn clear_colour_is_opaque_black() {
        let colour = SceneConfig::default().clear_colour();
        assert_eq!(colour, wgpu::Color::BLACK);
    }
}
