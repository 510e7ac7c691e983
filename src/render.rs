//! Render composition and pipeline batching.
//!
//! Scene nodes describe what they want drawn with [`Render`]. The renderer
//! walks the tree once per frame, sorts the entries into one batch per
//! pipeline, and then draws each batch with its pipeline bound only once.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the enum describing render operations
//! - [`Instanced<'a>`] is a lit model plus its single-instance buffer
//! - [`Lines<'a>`] is an unlit line mesh plus its instance buffer

use crate::data_structures::model::Model;

/// A lit, textured model drawn with GPU instancing.
#[derive(Clone)]
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
}

/// An unlit line list (the wireframe sphere).
#[derive(Clone)]
pub struct Lines<'a> {
    pub instance: &'a wgpu::Buffer,
    pub vertex: &'a wgpu::Buffer,
    pub index: &'a wgpu::Buffer,
    pub num_indices: u32,
}

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `Default(Instanced)` renders a single lit model
/// - `Wireframe(Lines)` renders a line mesh
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
pub enum Render<'a> {
    Default(Instanced<'a>),
    Wireframe(Lines<'a>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Flatten the render tree into one batch per pipeline.
    pub(crate) fn set_pipelines(self, basics: &mut Vec<Instanced<'a>>, lines: &mut Vec<Lines<'a>>) {
        match self {
            Render::Default(instanced) => basics.push(instanced),
            Render::Wireframe(wire) => lines.push(wire),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(basics, lines)),
        }
    }
}
