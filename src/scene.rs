//! The scene: a wireframe sphere at the origin plus the loaded globe.

use crate::{
    config::{SceneConfig, linear_rgb},
    context::Context,
    data_structures::{
        instance::Instance,
        scene_graph::{ContainerNode, LinesNode, SceneNode, upload_model},
        sphere::SphereGeometry,
    },
    driver::ModelHandle,
    render::Render,
    resources::ModelData,
};

const SPHERE: usize = 0;

pub struct SceneState {
    root: ContainerNode,
}

impl SceneState {
    pub fn new(ctx: &Context, config: &SceneConfig) -> Self {
        let sphere = SphereGeometry::new(
            config.sphere.radius,
            config.sphere.width_segments,
            config.sphere.height_segments,
        );
        let vertices = sphere.line_vertices(linear_rgb(config.sphere.color));
        let indices = sphere.wireframe_indices();
        let sphere = LinesNode::new(&ctx.device, &vertices, &indices, "Sphere");

        let mut root = ContainerNode::new(Instance::default());
        root.add_child(Box::new(sphere));
        Self { root }
    }

    /// Upload `model`, scale it and add it to the scene.
    pub fn attach_model(&mut self, ctx: &Context, model: ModelData, scale: f32) -> ModelHandle {
        let mut node = upload_model(&ctx.device, &ctx.queue, &ctx.material_layout, model);
        node.get_local_transform_mut().set_uniform_scale(scale);
        self.root.add_child(node);
        ModelHandle::new(self.root.children.len() - 1)
    }

    pub fn rotate_sphere_y(&mut self, radians: f32) {
        if let Some(sphere) = self.root.children.get_mut(SPHERE) {
            sphere.get_local_transform_mut().rotate_local_y(radians);
        }
    }

    pub fn rotate_model_z(&mut self, model: ModelHandle, radians: f32) {
        match self.root.children.get_mut(model.index()) {
            Some(node) => node.get_local_transform_mut().rotate_local_z(radians),
            None => log::warn!("No model attached for {:?}", model),
        }
    }

    /// Propagate transforms and upload them for the next frame.
    pub fn prepare(&mut self, queue: &wgpu::Queue) {
        self.root.update_world_transforms(&Instance::default());
        self.root.write_to_buffers(queue);
    }

    pub fn get_render(&self) -> Render<'_> {
        self.root.get_render()
    }
}
