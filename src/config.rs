//! Scene configuration.
//!
//! Everything that the scene treats as fixed setup (geometry, light and camera
//! parameters, the asset path, animation increments) lives in [`SceneConfig`].
//! `SceneConfig::default()` reproduces the globe scene; callers may tweak any
//! field before handing the config to [`crate::app::run`].

use instant::Duration;

/// Convert a `0xRRGGBB` sRGB colour into linear RGB components.
///
/// Shaders write to an sRGB surface, so colour constants have to be linearised
/// before they reach a uniform or vertex buffer.
pub fn linear_rgb(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0)]
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[derive(Clone, Debug)]
pub struct SphereConfig {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub color: u32,
}

#[derive(Clone, Debug)]
pub struct ShadowConfig {
    pub map_size: u32,
    pub far: f32,
    /// Half extent of the orthographic shadow camera (left/right/top/bottom).
    pub extent: f32,
}

#[derive(Clone, Debug)]
pub struct LightConfig {
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub directional_color: u32,
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
    pub shadow: ShadowConfig,
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

#[derive(Clone, Debug)]
pub struct AnimationConfig {
    /// Radians added to the sphere's y rotation every frame.
    pub sphere_increment: f32,
    /// Radians subtracted from the model's z rotation every frame.
    pub model_increment: f32,
    /// Scale rotations by the frame delta instead of applying fixed per-frame steps.
    pub time_scaled_rotation: bool,
    /// Radians per second used when `time_scaled_rotation` is on.
    pub sphere_rate: f32,
    pub model_rate: f32,
}

#[derive(Clone, Debug)]
pub struct SceneConfig {
    /// CSS selector of the canvas the renderer draws into on the web.
    pub canvas_selector: String,
    /// Path of the globe model relative to the asset root.
    pub model_path: String,
    pub model_scale: f32,
    pub sphere: SphereConfig,
    pub light: LightConfig,
    pub camera: CameraConfig,
    pub animation: AnimationConfig,
    pub max_pixel_ratio: f64,
    pub clear_colour: wgpu::Color,
    pub double_click_window: Duration,
    /// Maximum cursor travel (physical pixels) between the two clicks of a double click.
    pub double_click_slop: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        // the per-frame increments were tuned at this refresh rate
        let frames_per_second = 60.0;
        Self {
            canvas_selector: "canvas.webgl".to_string(),
            model_path: "models/earth/scene.gltf".to_string(),
            model_scale: 0.5,
            sphere: SphereConfig {
                radius: 1.0,
                width_segments: 32,
                height_segments: 32,
                color: 0xF00FFF,
            },
            light: LightConfig {
                ambient_color: 0xFF3613,
                ambient_intensity: 0.8,
                directional_color: 0xFFFFFF,
                directional_intensity: 0.6,
                directional_position: [5.0, 5.0, 5.0],
                shadow: ShadowConfig {
                    map_size: 1024,
                    far: 10.0,
                    extent: 7.0,
                },
            },
            camera: CameraConfig {
                fovy: 75.0,
                znear: 0.1,
                zfar: 100.0,
                position: [2.0, 2.0, 5.0],
                target: [0.0, 0.0, 0.0],
                rotate_speed: 1.0,
                pan_speed: 1.0,
                zoom_speed: 1.0,
                min_distance: 0.0,
                max_distance: f32::INFINITY,
            },
            animation: AnimationConfig {
                sphere_increment: 0.001,
                model_increment: 0.001,
                time_scaled_rotation: false,
                sphere_rate: 0.001 * frames_per_second,
                model_rate: 0.001 * frames_per_second,
            },
            max_pixel_ratio: 2.0,
            clear_colour: wgpu::Color::BLACK,
            double_click_window: Duration::from_millis(500),
            double_click_slop: 4.0,
        }
    }
}
