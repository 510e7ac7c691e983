use globe_scene::{
    camera::Projection,
    viewport::{SurfaceSizing, Viewport, clamp_pixel_ratio},
};

fn assert_aspect(actual: f32, width: f32, height: f32) {
    assert!((actual - width / height).abs() < 1e-6, "aspect was {actual}");
}

fn projection_for(viewport: &Viewport) -> Projection {
    let (width, height) = viewport.surface_size();
    let mut projection = Projection::new(width, height, cgmath::Deg(75.0), 0.1, 100.0);
    projection.set_aspect(viewport.aspect());
    projection
}

#[test]
fn pixel_ratio_is_capped_at_two() {
    assert_eq!(clamp_pixel_ratio(1.0, 2.0), 1.0);
    assert_eq!(clamp_pixel_ratio(1.5, 2.0), 1.5);
    assert_eq!(clamp_pixel_ratio(3.0, 2.0), 2.0);
    assert_eq!(clamp_pixel_ratio(f64::NAN, 2.0), 1.0);
    assert_eq!(clamp_pixel_ratio(0.0, 2.0), 1.0);
}

#[test]
fn resize_updates_aspect_and_surface() {
    let mut viewport = Viewport::new(800.0, 600.0, 1.0, 2.0);
    let mut projection = projection_for(&viewport);
    assert_eq!(viewport.surface_size(), (800, 600));

    assert!(viewport.resize(1600.0, 900.0, 1.0));
    projection.set_aspect(viewport.aspect());

    assert_aspect(viewport.aspect(), 1600.0, 900.0);
    assert_aspect(projection.aspect(), 1600.0, 900.0);
    assert_eq!(viewport.surface_size(), (1600, 900));
    assert_eq!(viewport.pixel_ratio(), 1.0);
}

#[test]
fn resize_is_idempotent() {
    let mut viewport = Viewport::new(800.0, 600.0, 3.0, 2.0);
    assert!(viewport.resize(1024.0, 768.0, 3.0));
    let first_state = viewport;
    let first_matrix = projection_for(&viewport).calc_matrix();

    assert!(!viewport.resize(1024.0, 768.0, 3.0));
    assert_eq!(viewport, first_state);
    assert_eq!(projection_for(&viewport).calc_matrix(), first_matrix);
}

#[test]
fn high_density_screens_render_at_the_cap() {
    let viewport = Viewport::new(800.0, 600.0, 3.0, 2.0);
    assert_eq!(viewport.pixel_ratio(), 2.0);
    assert_eq!(viewport.surface_size(), (1600, 1200));
    // aspect only depends on the logical size
    assert_aspect(viewport.aspect(), 800.0, 600.0);
}

#[test]
fn degenerate_sizes_keep_a_one_pixel_surface() {
    let viewport = Viewport::new(0.0, 0.0, 1.0, 2.0);
    assert_eq!(viewport.surface_size(), (1, 1));
    assert_eq!(viewport.aspect(), 1.0);
}

#[test]
fn window_sizing_follows_the_physical_window() {
    // 1000x700 logical at a device ratio of 3
    let viewport = Viewport::new(1000.0, 700.0, 3.0, 2.0);
    let window = (3000, 2100);

    assert_eq!(viewport.surface_size_with(SurfaceSizing::PixelRatio, window), (2000, 1400));
    assert_eq!(viewport.surface_size_with(SurfaceSizing::Window, window), (3000, 2100));
    assert_eq!(viewport.surface_size_with(SurfaceSizing::Window, (0, 0)), (1, 1));
    assert_aspect(viewport.aspect(), 1000.0, 700.0);
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn native_surfaces_match_the_window() {
    assert_eq!(SurfaceSizing::platform(), SurfaceSizing::Window);
}
