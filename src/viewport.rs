//! Viewport state: the logical window size and the pixel ratio used for the
//! render surface.
//!
//! Sizes are logical (CSS) pixels, the same unit a browser reports through
//! `innerWidth`/`innerHeight`. The render surface is `logical * pixel_ratio`
//! physical pixels, where the pixel ratio is the device ratio clamped to a cap
//! (2.0 by default) so high-density screens don't quadruple the fill cost.
//! Native swapchains must match the window's physical extent, so there the
//! surface follows the window instead (see [`SurfaceSizing`]).

/// Current window dimensions plus the clamped pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    width: f64,
    height: f64,
    pixel_ratio: f64,
    max_pixel_ratio: f64,
}

impl Viewport {
    /// Create a viewport. Zero or negative dimensions are raised to one pixel.
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        let mut viewport = Self {
            width: 1.0,
            height: 1.0,
            pixel_ratio: 1.0,
            max_pixel_ratio,
        };
        viewport.resize(width, height, device_pixel_ratio);
        viewport
    }

    /// Apply a new window size and device ratio.
    ///
    /// Returns `true` when anything observable changed. Calling it twice with
    /// the same arguments is a no-op the second time.
    pub fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) -> bool {
        let width = width.max(1.0);
        let height = height.max(1.0);
        let pixel_ratio = clamp_pixel_ratio(device_pixel_ratio, self.max_pixel_ratio);
        let changed =
            width != self.width || height != self.height || pixel_ratio != self.pixel_ratio;
        self.width = width;
        self.height = height;
        self.pixel_ratio = pixel_ratio;
        changed
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Width over height, used as the camera aspect ratio.
    pub fn aspect(&self) -> f32 {
        (self.width / self.height) as f32
    }

    /// Size of the render surface in physical pixels.
    pub fn surface_size(&self) -> (u32, u32) {
        let scale = |v: f64| ((v * self.pixel_ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

/// Where the render surface size comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceSizing {
    /// `logical * pixel_ratio`; a canvas backing store may have any size.
    PixelRatio,
    /// The window's physical size.
    Window,
}

impl SurfaceSizing {
    pub const fn platform() -> Self {
        if cfg!(target_arch = "wasm32") {
            SurfaceSizing::PixelRatio
        } else {
            SurfaceSizing::Window
        }
    }
}

impl Viewport {
    /// Surface size under `sizing`, given the window's physical size.
    pub fn surface_size_with(&self, sizing: SurfaceSizing, window: (u32, u32)) -> (u32, u32) {
        match sizing {
            SurfaceSizing::PixelRatio => self.surface_size(),
            SurfaceSizing::Window => (window.0.max(1), window.1.max(1)),
        }
    }
}

/// `min(device_pixel_ratio, max)`. Non-finite or non-positive ratios fall back to 1.
pub fn clamp_pixel_ratio(device_pixel_ratio: f64, max: f64) -> f64 {
    if !device_pixel_ratio.is_finite() || device_pixel_ratio <= 0.0 {
        return 1.0_f64.min(max);
    }
    device_pixel_ratio.min(max)
}
