//! Render pipelines.
//!
//! - `basic` draws lit, textured glTF meshes
//! - `wireframe` draws unlit line lists
//! - `light` holds the light uniform shared by the lit pipeline

pub mod basic;
pub mod light;
pub mod wireframe;

/// The pipelines the renderer binds, one per [`crate::render::Render`] batch.
#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub wireframe: wgpu::RenderPipeline,
}
