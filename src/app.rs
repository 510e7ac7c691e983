//! Window, event loop and frame scheduling.
//!
//! [`App`] owns everything that lives for the whole session and reacts to
//! winit's events:
//!
//! 1. `resumed` creates the window (the `canvas.webgl` element on the web)
//!    and the GPU context, then starts loading the globe model
//! 2. the asset load reports back through [`SceneEvent::Asset`]; a success
//!    attaches the model and starts the [`AnimationDriver`]
//! 3. every `RedrawRequested` is one driver invocation, which renders and
//!    requests the next redraw
//! 4. resizes update the [`Viewport`], a double click toggles fullscreen and
//!    closing the window stops the driver

use std::{iter, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use crate::{
    clock::InstantClock,
    config::SceneConfig,
    context::Context,
    data_structures::model::DrawModel,
    driver::{AnimationDriver, FrameTarget, ModelHandle, StopToken, TickOutcome},
    fullscreen::{DoubleClickDetector, toggle_fullscreen},
    loader::{self, AssetLoad, LoadEvent},
    scene::SceneState,
    viewport::{SurfaceSizing, Viewport},
};

/// Everything that needs the GPU: created once the window exists.
pub struct AppState {
    pub ctx: Context,
    pub scene: SceneState,
    pub viewport: Viewport,
}

impl AppState {
    async fn new(window: Arc<Window>, config: SceneConfig) -> anyhow::Result<Self> {
        let viewport = initial_viewport(&window, config.max_pixel_ratio);
        let size = window.inner_size();
        let surface_size =
            viewport.surface_size_with(SurfaceSizing::platform(), (size.width, size.height));
        let ctx = Context::new(window, &config, &viewport, surface_size).await?;
        let scene = SceneState::new(&ctx, &config);
        Ok(Self {
            ctx,
            scene,
            viewport,
        })
    }

    /// Apply a window size reported in physical pixels.
    fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        let logical = size.to_logical::<f64>(scale_factor);
        if self
            .viewport
            .resize(logical.width, logical.height, scale_factor)
        {
            log::info!(
                "Viewport resized to {}x{} at pixel ratio {}",
                self.viewport.width(),
                self.viewport.height(),
                self.viewport.pixel_ratio()
            );
        }
        let surface_size = self
            .viewport
            .surface_size_with(SurfaceSizing::platform(), (size.width, size.height));
        self.ctx.resize(&self.viewport, surface_size);
    }

    fn draw(&self) -> Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let mut basics = Vec::new();
        let mut lines = Vec::new();
        self.scene
            .get_render()
            .set_pipelines(&mut basics, &mut lines);

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            if !lines.is_empty() {
                render_pass.set_pipeline(&self.ctx.pipelines.wireframe);
                render_pass.set_bind_group(0, &self.ctx.camera.bind_group, &[]);
                for wire in lines {
                    render_pass.set_vertex_buffer(0, wire.vertex.slice(..));
                    render_pass.set_vertex_buffer(1, wire.instance.slice(..));
                    render_pass.set_index_buffer(wire.index.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..wire.num_indices, 0, 0..1);
                }
            }

            if !basics.is_empty() {
                render_pass.set_pipeline(&self.ctx.pipelines.basic);
                for instanced in basics {
                    render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                    render_pass.draw_model_instanced(
                        instanced.model,
                        0..1,
                        &self.ctx.camera.bind_group,
                        &self.ctx.light.bind_group,
                    );
                }
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl FrameTarget for AppState {
    type Error = wgpu::SurfaceError;

    fn set_ambient_intensity(&mut self, intensity: f32) {
        self.ctx.light.uniform.set_ambient_intensity(intensity);
        self.ctx.light.write(&self.ctx.queue);
    }

    fn rotate_sphere_y(&mut self, radians: f32) {
        self.scene.rotate_sphere_y(radians);
    }

    fn rotate_model_z(&mut self, model: ModelHandle, radians: f32) {
        self.scene.rotate_model_z(model, radians);
    }

    fn update_controls(&mut self) {
        let height = self.ctx.config.height;
        self.ctx
            .camera
            .update(&self.ctx.queue, &self.ctx.projection, height);
    }

    fn render(&mut self) -> Result<(), Self::Error> {
        self.scene.prepare(&self.ctx.queue);
        match self.draw() {
            Ok(()) => Ok(()),
            // Reconfigure the surface if it's lost or outdated
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface {e}, reconfiguring");
                self.ctx.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timed out, skipping frame");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn request_frame(&mut self) {
        self.ctx.window.request_redraw();
    }
}

fn initial_viewport(window: &Window, max_pixel_ratio: f64) -> Viewport {
    let scale_factor = window.scale_factor();
    let logical = window.inner_size().to_logical::<f64>(scale_factor);
    Viewport::new(logical.width, logical.height, scale_factor, max_pixel_ratio)
}

pub enum SceneEvent {
    /// The GPU context finished initializing (the web initializes asynchronously).
    #[cfg(target_arch = "wasm32")]
    Ready(Box<anyhow::Result<AppState>>),
    Asset(LoadEvent),
}

impl std::fmt::Debug for SceneEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(target_arch = "wasm32")]
            Self::Ready(_) => f.write_str("Ready"),
            Self::Asset(event) => f.debug_tuple("Asset").field(&event.kind()).finish(),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<SceneEvent>,
    config: SceneConfig,
    state: Option<AppState>,
    initializing: bool,
    driver: AnimationDriver,
    stop_token: Option<StopToken>,
    clock: InstantClock,
    asset: AssetLoad,
    double_click: DoubleClickDetector,
    cursor: PhysicalPosition<f64>,
}

impl App {
    fn new(event_loop: &EventLoop<SceneEvent>, config: SceneConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            initializing: false,
            driver: AnimationDriver::new(&config.animation),
            stop_token: None,
            clock: InstantClock::new(),
            asset: AssetLoad::new(config.model_path.clone()),
            double_click: DoubleClickDetector::new(config.double_click_window, config.double_click_slop),
            cursor: PhysicalPosition::new(0.0, 0.0),
            config,
        })
    }

    fn on_ready(&mut self, mut state: AppState) {
        let size = state.ctx.window.inner_size();
        let scale_factor = state.ctx.window.scale_factor();
        state.resize(size, scale_factor);
        self.state = Some(state);
        self.initializing = false;
        self.spawn_asset_load();
    }

    fn spawn_asset_load(&self) {
        let proxy = self.proxy.clone();
        let sink = move |event: LoadEvent| {
            if proxy.send_event(SceneEvent::Asset(event)).is_err() {
                log::warn!("Event loop closed before the asset load finished");
            }
        };
        loader::spawn_load(
            #[cfg(not(target_arch = "wasm32"))]
            &self.async_runtime,
            self.config.model_path.clone(),
            sink,
        );
    }

    fn on_asset(&mut self, event: LoadEvent) {
        let Some(model) = self.asset.handle(event) else {
            return;
        };
        let Some(state) = self.state.as_mut() else {
            log::warn!("Model {} arrived without a GPU context", self.asset.path());
            return;
        };
        let handle = state
            .scene
            .attach_model(&state.ctx, model, self.config.model_scale);
        self.stop_token = self.driver.start(handle, state);
    }
}

impl ApplicationHandler<SceneEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.initializing {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Globe");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| {
                    document
                        .query_selector(&self.config.canvas_selector)
                        .ok()
                        .flatten()
                })
                .and_then(|element| element.dyn_into::<web_sys::HtmlCanvasElement>().ok());
            let Some(canvas) = canvas else {
                log::error!("No canvas matches {}", self.config.canvas_selector);
                event_loop.exit();
                return;
            };
            window_attributes = window_attributes.with_canvas(Some(canvas));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {e}");
                event_loop.exit();
                return;
            }
        };

        self.initializing = true;
        let init_future = AppState::new(window, self.config.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(state) => self.on_ready(state),
                Err(e) => {
                    log::error!("Could not initialize the renderer: {e:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = init_future.await;
                if proxy.send_event(SceneEvent::Ready(Box::new(result))).is_err() {
                    log::warn!("Event loop closed during initialization");
                }
            });
        }
    }

    #[cfg_attr(not(target_arch = "wasm32"), allow(unused_variables))]
    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: SceneEvent) {
        match event {
            #[cfg(target_arch = "wasm32")]
            SceneEvent::Ready(result) => match *result {
                Ok(state) => self.on_ready(state),
                Err(e) => {
                    log::error!("Could not initialize the renderer: {e:#}");
                    event_loop.exit();
                }
            },
            SceneEvent::Asset(event) => self.on_asset(event),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            if let WindowEvent::CloseRequested = event {
                event_loop.exit();
            }
            return;
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CursorMoved { position, .. } => self.cursor = position,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if self.double_click.press(Instant::now(), self.cursor) {
                    let request = toggle_fullscreen(Some(state.ctx.window.as_ref()));
                    log::info!("Double click: fullscreen {:?}", request);
                }
            }
            WindowEvent::Resized(size) => {
                let scale_factor = state.ctx.window.scale_factor();
                state.resize(size, scale_factor);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let size = state.ctx.window.inner_size();
                state.resize(size, scale_factor);
            }
            WindowEvent::CloseRequested => {
                if let Some(token) = &self.stop_token {
                    token.stop();
                }
                // lets the driver observe the stop before the loop goes away
                match self.driver.tick(&mut self.clock, state) {
                    Ok(TickOutcome::Stopped) => log::info!("Animation driver stopped"),
                    Ok(TickOutcome::Idle) => log::debug!("Closed before the animation started"),
                    Ok(TickOutcome::Rendered(_)) => {
                        log::warn!("Animation driver rendered after its stop was requested")
                    }
                    Err(e) => log::error!("Unable to render: {e}"),
                }
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => match self.driver.tick(&mut self.clock, state) {
                Ok(TickOutcome::Stopped) => {
                    log::debug!("Redraw after the animation driver stopped");
                }
                Ok(_) => (),
                Err(e) => log::error!("Unable to render: {e}"),
            },
            _ => {}
        }
    }
}

/// Open the window and run the scene until the window closes.
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if console_log::init_with_level(log::Level::Info).is_err() {
            log::warn!("Logger was already initialized");
        }
    }

    let event_loop: EventLoop<SceneEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
