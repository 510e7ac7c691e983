//! globe-scene
//!
//! A small cross-platform wgpu scene that runs natively and in the browser: a
//! wireframe sphere and a lit glTF globe that rotate slowly while an ambient
//! light pulses, with orbit controls, resize handling and a double-click
//! fullscreen toggle.
//!
//! High-level modules
//! - `app`: window, winit event loop and the `run` entry point
//! - `driver`: the per-frame animation driver and its lifecycle
//! - `loader`: asynchronous asset loading with progress/success/failure events
//! - `viewport`: logical window size and clamped pixel ratio
//! - `fullscreen`: fullscreen toggling and double-click detection
//! - `camera`: camera, projection and orbit controls
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: engine data models (meshes, instances, textures, sphere)
//! - `pipelines`: the lit model and wireframe pipelines
//! - `resources`: glTF decoding into CPU-side model data
//! - `render`: render composition for efficient pipeline reuse
//!

pub mod app;
pub mod camera;
pub mod clock;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod driver;
pub mod fullscreen;
pub mod loader;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod viewport;

pub use app::run;
pub use config::SceneConfig;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    run(SceneConfig::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
