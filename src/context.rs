use std::sync::Arc;

use winit::window::Window;

use crate::{
    camera::{CameraResources, Projection},
    config::SceneConfig,
    data_structures::texture,
    pipelines::{
        Pipelines, basic::mk_basic_pipeline, light::LightResources,
        wireframe::mk_wireframe_pipeline,
    },
    resources::texture::material_layout,
    viewport::Viewport,
};

/// GPU device, surface and the per-scene GPU resources shared by every frame.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub pipelines: Pipelines,
    pub material_layout: wgpu::BindGroupLayout,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(
        window: Arc<Window>,
        scene: &SceneConfig,
        viewport: &Viewport,
        (width, height): (u32, u32),
    ) -> anyhow::Result<Self> {
        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders assume an sRGB surface; linear colours would come out too dark otherwise.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("the surface supports no texture format"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("Surface configured at {}x{} ({:?})", width, height, surface_format);

        let mut projection = Projection::new(
            width,
            height,
            cgmath::Deg(scene.camera.fovy),
            scene.camera.znear,
            scene.camera.zfar,
        );
        projection.set_aspect(viewport.aspect());
        let camera = CameraResources::new(&device, &scene.camera, &projection);

        let depth_texture =
            texture::Texture::create_depth_texture(&device, [width, height], "depth_texture");

        let light = LightResources::new(&device, &scene.light);
        let material_layout = material_layout(&device);

        let pipelines = Pipelines {
            basic: mk_basic_pipeline(
                &device,
                &config,
                &material_layout,
                &camera.bind_group_layout,
                &light.bind_group_layout,
            ),
            wireframe: mk_wireframe_pipeline(&device, &config, &camera.bind_group_layout),
        };

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            pipelines,
            material_layout,
            clear_colour: scene.clear_colour,
        })
    }

    /// Match the projection to `viewport` and the surface and depth buffer to
    /// `width` x `height` physical pixels.
    pub fn resize(&mut self, viewport: &Viewport, (width, height): (u32, u32)) {
        self.projection.set_aspect(viewport.aspect());
        self.camera.write(&self.queue, &self.projection);
        if self.config.width == width && self.config.height == height {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            texture::Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        log::info!("Surface resized to {}x{}", width, height);
    }

    /// Reconfigure the surface with its current size, after it was lost or outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}
