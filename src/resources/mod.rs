use std::sync::atomic::{AtomicUsize, Ordering};

use futures::{channel::mpsc::UnboundedSender, future::try_join_all};

use crate::{
    data_structures::{instance::Instance, model::ModelVertex},
    loader::LoadProgress,
    resources::texture::{apply_factor, decode_image, load_binary},
};

/**
 * This module contains all logic for loading meshes and textures from external files.
 *
 * Loading is split in two: `load_model_gltf` fetches and decodes everything on
 * whatever task it runs on and produces plain CPU data (`ModelData`), which the
 * scene graph later uploads on the thread owning the GPU device.
 */
pub mod texture;

/// One primitive of a glTF mesh, triangulated and flattened.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    /// Index into [`ModelData::materials`].
    pub material: usize,
}

#[derive(Clone, Debug)]
pub struct MaterialData {
    pub name: String,
    /// Base colour image with the base colour factor already applied.
    pub base_color: Option<image::RgbaImage>,
    pub base_color_factor: [f32; 4],
}

impl MaterialData {
    pub fn white(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base_color: None,
            base_color_factor: [1.0; 4],
        }
    }

    /// The base colour factor as an sRGB texel, used for image-less materials.
    pub fn factor_as_srgb8(&self) -> [u8; 4] {
        let [r, g, b, a] = self.base_color_factor;
        let encode = |c: f32| {
            let c = c.clamp(0.0, 1.0);
            let srgb = if c <= 0.003_130_8 {
                c * 12.92
            } else {
                1.055 * c.powf(1.0 / 2.4) - 0.055
            };
            (srgb * 255.0).round() as u8
        };
        [encode(r), encode(g), encode(b), (a.clamp(0.0, 1.0) * 255.0).round() as u8]
    }
}

#[derive(Clone, Debug, Default)]
pub struct NodeData {
    pub name: Option<String>,
    pub transform: Instance,
    pub meshes: Vec<MeshData>,
    pub children: Vec<NodeData>,
}

impl NodeData {
    pub fn count_meshes(&self) -> usize {
        self.meshes.len() + self.children.iter().map(NodeData::count_meshes).sum::<usize>()
    }
}

/// A decoded glTF model ready for upload.
#[derive(Clone, Debug)]
pub struct ModelData {
    /// First root node of the file's default scene.
    pub root: NodeData,
    pub materials: Vec<MaterialData>,
    pub source: String,
}

/// Resolve a URI referenced by a glTF file against the file's own directory.
pub fn resolve_uri(gltf_path: &str, uri: &str) -> String {
    match gltf_path.rfind('/') {
        Some(idx) => format!("{}/{}", &gltf_path[..idx], uri),
        None => uri.to_string(),
    }
}

struct Progress<'a> {
    path: &'a str,
    sink: &'a UnboundedSender<LoadProgress>,
    loaded: AtomicUsize,
    total: usize,
}

impl Progress<'_> {
    fn report(&self, bytes: usize, file: &str) {
        let loaded_files = self.loaded.fetch_add(1, Ordering::SeqCst) + 1;
        let progress = LoadProgress {
            path: self.path.to_string(),
            file: file.to_string(),
            bytes,
            loaded_files,
            total_files: self.total,
        };
        // a closed receiver only means nobody listens to progress any more
        let _ = self.sink.unbounded_send(progress);
    }

    async fn fetch(&self, file: String) -> anyhow::Result<Vec<u8>> {
        let data = load_binary(&file).await?;
        self.report(data.len(), &file);
        Ok(data)
    }
}

/// Load a glTF file from the asset root, with its external buffers and images.
///
/// `progress` receives one [`LoadProgress`] per fetched file. Embedded
/// data URIs are not supported and fail the load.
pub async fn load_model_gltf(
    file_name: &str,
    progress: UnboundedSender<LoadProgress>,
) -> anyhow::Result<ModelData> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf = gltf::Gltf::from_slice(&gltf_bytes)?;

    let buffer_uris: Vec<Option<String>> = gltf
        .buffers()
        .map(|buffer| match buffer.source() {
            gltf::buffer::Source::Bin => None,
            gltf::buffer::Source::Uri(uri) => Some(uri.to_string()),
        })
        .collect();
    let image_uris: Vec<Option<(String, Option<String>)>> = gltf
        .images()
        .map(|image| match image.source() {
            gltf::image::Source::View { .. } => None,
            gltf::image::Source::Uri { uri, mime_type } => {
                Some((uri.to_string(), mime_type.map(str::to_string)))
            }
        })
        .collect();
    for uri in buffer_uris
        .iter()
        .flatten()
        .chain(image_uris.iter().flatten().map(|(uri, _)| uri))
    {
        if uri.starts_with("data:") {
            anyhow::bail!("{file_name}: embedded data URIs are not supported");
        }
    }

    let progress = Progress {
        path: file_name,
        sink: &progress,
        loaded: AtomicUsize::new(0),
        total: 1 + buffer_uris.iter().flatten().count() + image_uris.iter().flatten().count(),
    };
    progress.report(gltf_bytes.len(), file_name);

    let fetched = try_join_all(
        buffer_uris
            .iter()
            .flatten()
            .map(|uri| progress.fetch(resolve_uri(file_name, uri))),
    )
    .await?;
    let mut fetched = fetched.into_iter();
    let mut buffers = Vec::with_capacity(buffer_uris.len());
    for uri in &buffer_uris {
        let data = match uri {
            Some(_) => fetched.next(),
            None => gltf.blob.clone(),
        };
        buffers.push(data.ok_or_else(|| anyhow::anyhow!("{file_name}: missing binary chunk"))?);
    }

    let fetched = try_join_all(
        image_uris
            .iter()
            .flatten()
            .map(|(uri, _)| progress.fetch(resolve_uri(file_name, uri))),
    )
    .await?;
    let mut fetched = fetched.into_iter();
    let mut images = Vec::with_capacity(image_uris.len());
    for (image, uri) in gltf.images().zip(&image_uris) {
        let decoded = match (image.source(), uri) {
            (_, Some((uri, mime_type))) => {
                let bytes = fetched
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("{file_name}: image {uri} was not fetched"))?;
                decode_image(&bytes, mime_type.as_deref())
            }
            (gltf::image::Source::View { view, mime_type }, None) => {
                let buffer = buffers
                    .get(view.buffer().index())
                    .ok_or_else(|| anyhow::anyhow!("{file_name}: image view outside buffers"))?;
                let start = view.offset();
                let end = start + view.length();
                let bytes = buffer
                    .get(start..end)
                    .ok_or_else(|| anyhow::anyhow!("{file_name}: image view out of range"))?;
                decode_image(bytes, Some(mime_type))
            }
            (gltf::image::Source::Uri { uri, .. }, None) => {
                Err(anyhow::anyhow!("{file_name}: image {uri} was skipped"))
            }
        };
        match decoded {
            Ok(decoded) => images.push(Some(decoded)),
            Err(e) => {
                log::warn!("Image {} in {} could not be decoded: {}", image.index(), file_name, e);
                images.push(None);
            }
        }
    }

    let mut materials: Vec<MaterialData> = gltf
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            let factor = pbr.base_color_factor();
            let name = material
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}#material{}", file_name, material.index().unwrap_or(0)));
            let base_color = pbr
                .base_color_texture()
                .and_then(|info| images.get(info.texture().source().index()).cloned().flatten())
                .map(|mut image| {
                    apply_factor(&mut image, factor);
                    image
                });
            MaterialData {
                name,
                base_color,
                base_color_factor: factor,
            }
        })
        .collect();
    let default_material = materials.len();
    materials.push(MaterialData::white(&format!("{file_name}#default")));

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| anyhow::anyhow!("{file_name} contains no scene"))?;
    let node = scene
        .nodes()
        .next()
        .ok_or_else(|| anyhow::anyhow!("{file_name}: scene has no root node"))?;
    let root = read_node(&node, &buffers, default_material);
    log::info!(
        "Decoded {}: {} meshes, {} materials",
        file_name,
        root.count_meshes(),
        materials.len()
    );

    Ok(ModelData {
        root,
        materials,
        source: file_name.to_string(),
    })
}

fn read_node(node: &gltf::Node, buffers: &[Vec<u8>], default_material: usize) -> NodeData {
    let (translation, rotation, scale) = node.transform().decomposed();
    let transform = Instance {
        position: translation.into(),
        rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: scale.into(),
    };

    let mut meshes = Vec::new();
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of mesh {:?}: only triangles are drawn",
                    primitive.index(),
                    mesh.name()
                );
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let Some(positions) = reader.read_positions() else {
                log::warn!("Primitive {} of mesh {:?} has no positions", primitive.index(), mesh.name());
                continue;
            };
            let mut vertices: Vec<ModelVertex> = positions
                .map(|position| ModelVertex {
                    position,
                    ..Default::default()
                })
                .collect();
            if let Some(normals) = reader.read_normals() {
                vertices
                    .iter_mut()
                    .zip(normals)
                    .for_each(|(v, normal)| v.normal = normal);
            }
            if let Some(tex_coords) = reader.read_tex_coords(0) {
                vertices
                    .iter_mut()
                    .zip(tex_coords.into_f32())
                    .for_each(|(v, uv)| v.tex_coords = uv);
            }
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertices.len() as u32).collect(),
            };
            meshes.push(MeshData {
                name: mesh.name().unwrap_or("mesh").to_string(),
                vertices,
                indices,
                material: primitive.material().index().unwrap_or(default_material),
            });
        }
    }

    NodeData {
        name: node.name().map(str::to_string),
        transform,
        meshes,
        children: node
            .children()
            .map(|child| read_node(&child, buffers, default_material))
            .collect(),
    }
}
