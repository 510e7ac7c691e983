//! Camera, projection and orbit controls.
//!
//! The camera always looks at a target point. [`OrbitController`] collects
//! pointer input between frames and applies it in [`OrbitController::update`],
//! which the animation driver calls once per frame:
//!
//! - left drag orbits around the target
//! - right drag pans the target in the view plane
//! - the mouse wheel dollies towards or away from the target

use std::f32::consts::PI;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use wgpu::util::DeviceExt;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use crate::config::CameraConfig;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the polar angle off the poles where `look_at` degenerates.
const POLAR_EPSILON: f32 = 1e-6;
/// Smallest orbit radius; the camera never reaches its target.
const MIN_RADIUS: f32 = 1e-4;
/// Wheel pixels that count as one line step.
const PIXELS_PER_LINE: f64 = 100.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, T: Into<Point3<f32>>>(position: P, target: T) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
}

/// Orbit controls without damping.
#[derive(Debug)]
pub struct OrbitController {
    rotate_speed: f32,
    pan_speed: f32,
    zoom_speed: f32,
    min_distance: f32,
    max_distance: f32,
    drag: Option<DragMode>,
    cursor: Option<PhysicalPosition<f64>>,
    // accumulated since the last update
    theta_delta: f32,
    phi_delta: f32,
    pan_pixels: (f32, f32),
    scale: f32,
}

impl OrbitController {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            rotate_speed: config.rotate_speed,
            pan_speed: config.pan_speed,
            zoom_speed: config.zoom_speed,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            drag: None,
            cursor: None,
            theta_delta: 0.0,
            phi_delta: 0.0,
            pan_pixels: (0.0, 0.0),
            scale: 1.0,
        }
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        self.drag
    }

    pub fn begin_drag(&mut self, mode: DragMode, position: PhysicalPosition<f64>) {
        self.drag = Some(mode);
        self.cursor = Some(position);
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Accumulate cursor movement in physical pixels while a drag is active.
    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        let previous = self.cursor.replace(position);
        let (Some(mode), Some(previous)) = (self.drag, previous) else {
            return;
        };
        let dx = (position.x - previous.x) as f32;
        let dy = (position.y - previous.y) as f32;
        match mode {
            DragMode::Rotate => {
                self.theta_delta -= dx * self.rotate_speed;
                self.phi_delta -= dy * self.rotate_speed;
            }
            DragMode::Pan => {
                self.pan_pixels.0 += dx * self.pan_speed;
                self.pan_pixels.1 += dy * self.pan_speed;
            }
        }
    }

    /// Positive steps move towards the target.
    pub fn scroll(&mut self, steps: f32) {
        self.scale *= 0.95_f32.powf(self.zoom_speed * steps);
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let mode = match button {
                    MouseButton::Left => DragMode::Rotate,
                    MouseButton::Right => DragMode::Pan,
                    _ => return,
                };
                match (state, self.cursor) {
                    (ElementState::Pressed, Some(cursor)) => self.begin_drag(mode, cursor),
                    (ElementState::Released, _) if self.drag == Some(mode) => self.end_drag(),
                    _ => (),
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.cursor_moved(*position),
            WindowEvent::CursorLeft { .. } => self.end_drag(),
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
                };
                self.scroll(steps);
            }
            _ => (),
        }
    }

    /// Apply the accumulated input to `camera`.
    ///
    /// Pixel deltas are converted with `viewport_height` (physical pixels) so a
    /// drag across the full height orbits a full turn, and panning keeps the
    /// point under the cursor in place at the target's depth.
    pub fn update(&mut self, camera: &mut Camera, projection: &Projection, viewport_height: u32) {
        let height = viewport_height.max(1) as f32;
        let offset = camera.position - camera.target;
        let mut radius = offset.magnitude();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            PI / 2.0
        };

        theta += 2.0 * PI * self.theta_delta / height;
        phi += 2.0 * PI * self.phi_delta / height;
        phi = phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        let min_distance = self.min_distance.max(MIN_RADIUS);
        radius = (radius * self.scale).clamp(min_distance, self.max_distance.max(min_distance));

        let (dx, dy) = self.pan_pixels;
        if let Some((right, up)) = view_plane(-offset, camera.up).filter(|_| dx != 0.0 || dy != 0.0) {
            let target_distance = offset.magnitude() * (projection.fovy().0 / 2.0).tan();
            let pan = right * (-2.0 * dx * target_distance / height)
                + up * (2.0 * dy * target_distance / height);
            camera.target += pan;
        }

        let offset = Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = camera.target + offset;

        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.pan_pixels = (0.0, 0.0);
        self.scale = 1.0;
    }
}

/// Right and up axes of the plane facing `forward`, if it is well defined.
fn view_plane(forward: Vector3<f32>, up: Vector3<f32>) -> Option<(Vector3<f32>, Vector3<f32>)> {
    let right = forward.cross(up);
    if !right.magnitude2().is_normal() {
        return None;
    }
    let right = right.normalize();
    Some((right, right.cross(forward.normalize())))
}

/// GPU-side camera state: the uniform buffer and its bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, config: &CameraConfig, projection: &Projection) -> Self {
        let camera = Camera::new(config.position, config.target);
        let controller = OrbitController::new(config);

        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Run the orbit controls and upload the resulting view-projection.
    pub fn update(&mut self, queue: &wgpu::Queue, projection: &Projection, viewport_height: u32) {
        self.controller
            .update(&mut self.camera, projection, viewport_height);
        self.write(queue, projection);
    }

    pub fn write(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
