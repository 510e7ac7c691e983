use cgmath::{EuclideanSpace, InnerSpace, MetricSpace, Point3};
use globe_scene::{
    camera::{Camera, DragMode, OrbitController, Projection},
    config::{CameraConfig, SceneConfig},
};
use winit::dpi::PhysicalPosition;

const HEIGHT: u32 = 600;

fn setup(config: &CameraConfig) -> (Camera, Projection, OrbitController) {
    let camera = Camera::new(config.position, config.target);
    let projection = Projection::new(800, HEIGHT, cgmath::Deg(config.fovy), config.znear, config.zfar);
    (camera, projection, OrbitController::new(config))
}

fn distance(camera: &Camera) -> f32 {
    camera.position.distance(camera.target)
}

fn assert_near(a: Point3<f32>, b: Point3<f32>) {
    assert!(a.distance(b) < 1e-4, "{a:?} != {b:?}");
}

#[test]
fn update_without_input_keeps_the_camera() {
    let config = SceneConfig::default().camera;
    let (mut camera, projection, mut controller) = setup(&config);
    let before = camera.clone();

    controller.cursor_moved(PhysicalPosition::new(10.0, 10.0));
    controller.cursor_moved(PhysicalPosition::new(50.0, 80.0));
    controller.update(&mut camera, &projection, HEIGHT);

    assert_near(camera.position, before.position);
    assert_eq!(camera.target, before.target);
}

#[test]
fn dragging_the_full_height_orbits_a_full_turn() {
    let config = SceneConfig::default().camera;
    let (mut camera, projection, mut controller) = setup(&config);
    let start = camera.position;

    controller.begin_drag(DragMode::Rotate, PhysicalPosition::new(0.0, 300.0));
    controller.cursor_moved(PhysicalPosition::new(HEIGHT as f64 / 2.0, 300.0));
    controller.update(&mut camera, &projection, HEIGHT);
    // half a turn around y mirrors x and z
    assert_near(camera.position, Point3::new(-start.x, start.y, -start.z));

    controller.cursor_moved(PhysicalPosition::new(HEIGHT as f64, 300.0));
    controller.update(&mut camera, &projection, HEIGHT);
    assert_near(camera.position, start);
    assert!((distance(&camera) - 33.0_f32.sqrt()).abs() < 1e-4);
}

#[test]
fn polar_angle_never_passes_the_pole() {
    let config = SceneConfig::default().camera;
    let (mut camera, projection, mut controller) = setup(&config);
    let radius = distance(&camera);

    controller.begin_drag(DragMode::Rotate, PhysicalPosition::new(0.0, 0.0));
    controller.cursor_moved(PhysicalPosition::new(0.0, 10_000.0));
    controller.update(&mut camera, &projection, HEIGHT);

    let offset = camera.position - camera.target;
    assert!(offset.y > radius * 0.999);
    assert!(offset.x.is_finite() && offset.z.is_finite());
    assert!((offset.magnitude() - radius).abs() < 1e-3);

    controller.cursor_moved(PhysicalPosition::new(0.0, -10_000.0));
    controller.update(&mut camera, &projection, HEIGHT);
    let offset = camera.position - camera.target;
    assert!(offset.y < -radius * 0.999);
}

#[test]
fn wheel_dollies_towards_the_target() {
    let config = SceneConfig::default().camera;
    let (mut camera, projection, mut controller) = setup(&config);
    let radius = distance(&camera);

    controller.scroll(1.0);
    controller.update(&mut camera, &projection, HEIGHT);
    assert!((distance(&camera) - radius * 0.95).abs() < 1e-4);

    controller.scroll(-2.0);
    controller.update(&mut camera, &projection, HEIGHT);
    assert!((distance(&camera) - radius * 0.95 / (0.95 * 0.95)).abs() < 1e-4);
}

#[test]
fn distance_is_clamped() {
    let mut config = SceneConfig::default().camera;
    config.min_distance = 2.0;
    config.max_distance = 8.0;
    let (mut camera, projection, mut controller) = setup(&config);

    controller.scroll(500.0);
    controller.update(&mut camera, &projection, HEIGHT);
    assert!((distance(&camera) - 2.0).abs() < 1e-4);

    controller.scroll(-500.0);
    controller.update(&mut camera, &projection, HEIGHT);
    assert!((distance(&camera) - 8.0).abs() < 1e-3);
}

#[test]
fn panning_moves_target_and_camera_together() {
    let config = SceneConfig::default().camera;
    let (mut camera, projection, mut controller) = setup(&config);
    let offset = camera.position - camera.target;

    controller.begin_drag(DragMode::Pan, PhysicalPosition::new(400.0, 300.0));
    controller.cursor_moved(PhysicalPosition::new(450.0, 280.0));
    controller.end_drag();
    controller.update(&mut camera, &projection, HEIGHT);

    assert_ne!(camera.target, Point3::new(0.0, 0.0, 0.0));
    let moved = camera.position - camera.target;
    assert!((moved - offset).magnitude() < 1e-4);
    // dragging right moves the target left, away from the camera's right axis
    let right = (camera.target - camera.position).normalize().cross(camera.up).normalize();
    assert!(camera.target.to_vec().dot(right) < 0.0);
}

fn assert_finite(camera: &Camera, projection: &Projection) {
    let view: [[f32; 4]; 4] = (projection.calc_matrix() * camera.calc_matrix()).into();
    assert!(view.iter().flatten().all(|v| v.is_finite()), "{view:?}");
    assert!(camera.target.x.is_finite() && camera.target.y.is_finite() && camera.target.z.is_finite());
}

#[test]
fn zooming_all_the_way_in_stays_recoverable() {
    let config = SceneConfig::default().camera;
    let (mut camera, projection, mut controller) = setup(&config);

    for _ in 0..40 {
        controller.scroll(60.0);
        controller.update(&mut camera, &projection, HEIGHT);
    }
    assert!(distance(&camera) > 0.0);
    assert_finite(&camera, &projection);

    controller.begin_drag(DragMode::Pan, PhysicalPosition::new(400.0, 300.0));
    controller.cursor_moved(PhysicalPosition::new(420.0, 310.0));
    controller.end_drag();
    controller.update(&mut camera, &projection, HEIGHT);
    assert_finite(&camera, &projection);

    for _ in 0..4 {
        controller.scroll(-60.0);
        controller.update(&mut camera, &projection, HEIGHT);
    }
    assert!(distance(&camera) > 1.0);
    assert_finite(&camera, &projection);
}
