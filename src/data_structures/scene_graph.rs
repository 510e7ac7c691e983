//! Scene graph and hierarchical scene organization.
//!
//! Every node carries a local transform and the world transform derived from
//! its parent. Model nodes own GPU buffers; container nodes only group their
//! children. Nodes are built from CPU-side [`NodeData`] decoded by the asset
//! loader, so GPU uploads always happen on the thread that owns the device.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::{Instance, InstanceRaw},
        model::{self, LineVertex},
        texture::Texture,
    },
    render::{Instanced, Lines, Render},
    resources::{MaterialData, ModelData, NodeData},
};

pub trait SceneNode {
    fn get_local_transform_mut(&mut self) -> &mut Instance;

    /// Recompute this node's world transform from `parent` and recurse into the children.
    fn update_world_transforms(&mut self, parent: &Instance);

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    /// Upload world transforms of this subtree.
    fn write_to_buffers(&mut self, queue: &wgpu::Queue);

    fn get_render(&self) -> Render<'_>;
}

fn children_render(children: &[Box<dyn SceneNode>]) -> Vec<Render<'_>> {
    children.iter().map(|child| child.get_render()).collect()
}

fn mk_instance_buffer(device: &wgpu::Device, instance: &Instance) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Instance Buffer"),
        contents: bytemuck::cast_slice(&[instance.to_raw()]),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

#[derive(Default)]
pub struct ContainerNode {
    pub children: Vec<Box<dyn SceneNode>>,
    local: Instance,
    world: Instance,
}

impl ContainerNode {
    pub fn new(local: Instance) -> Self {
        Self {
            children: Vec::new(),
            world: local.clone(),
            local,
        }
    }
}

impl SceneNode for ContainerNode {
    fn get_local_transform_mut(&mut self) -> &mut Instance {
        &mut self.local
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&self.world);
        }
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue));
    }

    fn get_render(&self) -> Render<'_> {
        Render::Composed(children_render(&self.children))
    }
}

pub struct ModelNode {
    children: Vec<Box<dyn SceneNode>>,
    instance_buffer: wgpu::Buffer,
    local: Instance,
    world: Instance,
    model: model::Model,
}

impl ModelNode {
    pub fn from_model(device: &wgpu::Device, model: model::Model, local: Instance) -> Self {
        let instance_buffer = mk_instance_buffer(device, &local);
        Self {
            children: Vec::new(),
            instance_buffer,
            world: local.clone(),
            local,
            model,
        }
    }
}

impl SceneNode for ModelNode {
    fn get_local_transform_mut(&mut self) -> &mut Instance {
        &mut self.local
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&self.world);
        }
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        let raw: [InstanceRaw; 1] = [self.world.to_raw()];
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&raw));
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue));
    }

    fn get_render(&self) -> Render<'_> {
        let mut renders = children_render(&self.children);
        renders.push(Render::Default(Instanced {
            instance: &self.instance_buffer,
            model: &self.model,
        }));
        Render::Composed(renders)
    }
}

/// An unlit line mesh; used for the wireframe sphere.
pub struct LinesNode {
    children: Vec<Box<dyn SceneNode>>,
    instance_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    local: Instance,
    world: Instance,
}

impl LinesNode {
    pub fn new(device: &wgpu::Device, vertices: &[LineVertex], indices: &[u32], label: &str) -> Self {
        let local = Instance::default();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            children: Vec::new(),
            instance_buffer: mk_instance_buffer(device, &local),
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
            world: local.clone(),
            local,
        }
    }
}

impl SceneNode for LinesNode {
    fn get_local_transform_mut(&mut self) -> &mut Instance {
        &mut self.local
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&self.world);
        }
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        let raw: [InstanceRaw; 1] = [self.world.to_raw()];
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&raw));
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue));
    }

    fn get_render(&self) -> Render<'_> {
        let mut renders = children_render(&self.children);
        renders.push(Render::Wireframe(Lines {
            instance: &self.instance_buffer,
            vertex: &self.vertex_buffer,
            index: &self.index_buffer,
            num_indices: self.num_indices,
        }));
        Render::Composed(renders)
    }
}

fn upload_material(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    material: &MaterialData,
) -> model::Material {
    let texture = match &material.base_color {
        Some(image) => Texture::from_rgba(device, queue, image, Some(&material.name)),
        None => Texture::create_solid(device, queue, material.factor_as_srgb8(), &material.name),
    };
    model::Material::new(device, &material.name, texture, layout)
}

fn upload_node(
    device: &wgpu::Device,
    node: NodeData,
    materials: &[model::Material],
) -> Box<dyn SceneNode> {
    let NodeData {
        name,
        transform,
        meshes,
        children,
    } = node;
    let mut scene_node: Box<dyn SceneNode> = if meshes.is_empty() {
        Box::new(ContainerNode::new(transform))
    } else {
        let label = name.as_deref().unwrap_or("unnamed node");
        let meshes = meshes
            .into_iter()
            .map(|mesh| {
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Vertex Buffer", label)),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Index Buffer", label)),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                model::Mesh {
                    name: mesh.name,
                    vertex_buffer,
                    index_buffer,
                    num_elements: mesh.indices.len() as u32,
                    material: mesh.material,
                }
            })
            .collect();
        let model = model::Model {
            meshes,
            materials: materials.to_vec(),
        };
        Box::new(ModelNode::from_model(device, model, transform))
    };
    for child in children {
        scene_node.add_child(upload_node(device, child, materials));
    }
    scene_node
}

/// Turn decoded model data into GPU-backed scene nodes.
pub fn upload_model(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    material_layout: &wgpu::BindGroupLayout,
    data: ModelData,
) -> Box<dyn SceneNode> {
    let materials: Vec<_> = data
        .materials
        .iter()
        .map(|material| upload_material(device, queue, material_layout, material))
        .collect();
    log::info!(
        "Uploading {} with {} materials",
        data.source,
        materials.len()
    );
    upload_node(device, data.root, &materials)
}
