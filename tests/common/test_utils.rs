use std::fmt;

use globe_scene::{
    clock::FrameClock,
    driver::{FrameTarget, ModelHandle},
    loader::{LoadEvent, LoadProgress},
};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    Ambient(f32),
    RotateSphere(f32),
    RotateModel(ModelHandle, f32),
    Controls,
    Render,
    RequestFrame,
}

#[derive(Debug)]
pub(crate) struct RenderFailure;

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("device lost")
    }
}

impl std::error::Error for RenderFailure {}

/// A frame target that records every call the driver makes.
pub(crate) struct RecordingTarget {
    calls: Vec<Call>,
    sphere_rotation: f32,
    model_rotation: f32,
    ambient_intensity: f32,
    render_invocations: u32,
    frame_requests: u32,
    fail_on_render: Option<u32>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            sphere_rotation: 0.0,
            model_rotation: 0.0,
            ambient_intensity: 0.8,
            render_invocations: 0,
            frame_requests: 0,
            fail_on_render: None,
        }
    }

    /// Make the `n`th render call (1-based) fail.
    pub fn failing_on_render(n: u32) -> Self {
        Self {
            fail_on_render: Some(n),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn sphere_rotation(&self) -> f32 {
        self.sphere_rotation
    }

    pub fn model_rotation(&self) -> f32 {
        self.model_rotation
    }

    pub fn ambient_intensity(&self) -> f32 {
        self.ambient_intensity
    }

    pub fn render_invocations(&self) -> u32 {
        self.render_invocations
    }

    pub fn frame_requests(&self) -> u32 {
        self.frame_requests
    }
}

impl Default for RecordingTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTarget for RecordingTarget {
    type Error = RenderFailure;

    fn set_ambient_intensity(&mut self, intensity: f32) {
        self.ambient_intensity = intensity;
        self.calls.push(Call::Ambient(intensity));
    }

    fn rotate_sphere_y(&mut self, radians: f32) {
        self.sphere_rotation += radians;
        self.calls.push(Call::RotateSphere(radians));
    }

    fn rotate_model_z(&mut self, model: ModelHandle, radians: f32) {
        self.model_rotation += radians;
        self.calls.push(Call::RotateModel(model, radians));
    }

    fn update_controls(&mut self) {
        self.calls.push(Call::Controls);
    }

    fn render(&mut self) -> Result<(), Self::Error> {
        self.render_invocations += 1;
        self.calls.push(Call::Render);
        if self.fail_on_render == Some(self.render_invocations) {
            return Err(RenderFailure);
        }
        Ok(())
    }

    fn request_frame(&mut self) {
        self.frame_requests += 1;
        self.calls.push(Call::RequestFrame);
    }
}

pub(crate) fn progress(loaded_files: usize, total_files: usize) -> LoadEvent<ModelHandle> {
    LoadEvent::Progress(LoadProgress {
        path: "models/earth/scene.gltf".to_string(),
        file: "models/earth/scene.bin".to_string(),
        bytes: 1024,
        loaded_files,
        total_files,
    })
}

pub(crate) fn failure(message: &str) -> LoadEvent<ModelHandle> {
    LoadEvent::Failure(anyhow::anyhow!(message.to_string()))
}

pub(crate) fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

/// A clock replaying a fixed list of readings; the last one repeats once exhausted.
#[derive(Debug, Clone)]
pub(crate) struct ManualClock {
    readings: Vec<f32>,
    next: usize,
}

impl ManualClock {
    pub fn new(readings: impl Into<Vec<f32>>) -> Self {
        Self {
            readings: readings.into(),
            next: 0,
        }
    }
}

impl FrameClock for ManualClock {
    fn elapsed(&mut self) -> f32 {
        let reading = self
            .readings
            .get(self.next)
            .or(self.readings.last())
            .copied()
            .unwrap_or(0.0);
        self.next += 1;
        reading
    }
}
