//! The animation driver.
//!
//! One driver invocation is one frame: read the clock, animate, update the
//! camera controls, render, and schedule the next frame. The driver never runs
//! until it is started with the handle of the loaded model, and once running it
//! keeps rescheduling itself until it is stopped through its [`StopToken`] or a
//! render fails.
//!
//! The steps of an invocation always run in this order:
//!
//! 1. read the elapsed time
//! 2. compute the delta to the previous frame
//! 3. set the ambient light intensity from the elapsed time
//! 4. remember the elapsed time as the previous time
//! 5. rotate the sphere around y
//! 6. rotate the model around z (in the opposite direction)
//! 7. update the camera controls
//! 8. render
//! 9. request the next frame
//!
//! A render error skips step 9 and leaves the driver [`DriverState::Stopped`].

use std::{
    error::Error,
    fmt::{self, Display},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{clock::FrameClock, config::AnimationConfig};

/// Identifies the loaded model inside the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModelHandle(usize);

impl ModelHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Everything a frame touches. Implemented by the live scene and by test doubles.
pub trait FrameTarget {
    type Error: Error + Send + Sync + 'static;

    fn set_ambient_intensity(&mut self, intensity: f32);

    fn rotate_sphere_y(&mut self, radians: f32);

    fn rotate_model_z(&mut self, model: ModelHandle, radians: f32);

    fn update_controls(&mut self);

    fn render(&mut self) -> Result<(), Self::Error>;

    /// Ask the platform for another frame callback.
    fn request_frame(&mut self);
}

/// `0.9 * |3.5 * sin(t)| + 1.5`, always within `[1.5, 4.65]`.
pub fn ambient_intensity(elapsed: f32) -> f32 {
    0.9 * (3.5 * elapsed.sin()).abs() + 1.5
}

/// Timing carried between frames. Only `previous_time` survives into the next frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoopState {
    pub elapsed_time: f32,
    pub previous_time: f32,
    pub delta_time: f32,
}

/// What a single rendered frame did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub elapsed_time: f32,
    pub delta_time: f32,
    pub ambient_intensity: f32,
    pub sphere_step: f32,
    pub model_step: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    NotStarted,
    Running { model: ModelHandle },
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// The driver has not been started; nothing happened.
    Idle,
    Rendered(FrameStats),
    /// The driver is (or just became) stopped; nothing was rendered or scheduled.
    Stopped,
}

/// Cancellation token handed out by [`AnimationDriver::start`].
#[derive(Clone, Debug, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A render failure that ended the animation loop.
#[derive(Debug)]
pub struct DriverError<E> {
    pub frame: u64,
    pub source: E,
}

impl<E: Display> Display for DriverError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "animation stopped at frame {}: {}", self.frame, self.source)
    }
}

impl<E: Error + 'static> Error for DriverError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Clone, Copy, Debug)]
struct RotationStep {
    sphere_increment: f32,
    model_increment: f32,
    time_scaled: bool,
    sphere_rate: f32,
    model_rate: f32,
}

impl RotationStep {
    fn steps(&self, delta_time: f32) -> (f32, f32) {
        if self.time_scaled {
            (self.sphere_rate * delta_time, self.model_rate * delta_time)
        } else {
            (self.sphere_increment, self.model_increment)
        }
    }
}

impl From<&AnimationConfig> for RotationStep {
    fn from(config: &AnimationConfig) -> Self {
        Self {
            sphere_increment: config.sphere_increment,
            model_increment: config.model_increment,
            time_scaled: config.time_scaled_rotation,
            sphere_rate: config.sphere_rate,
            model_rate: config.model_rate,
        }
    }
}

#[derive(Debug)]
pub struct AnimationDriver {
    state: DriverState,
    loop_state: LoopState,
    frames: u64,
    token: StopToken,
    rotation: RotationStep,
}

impl AnimationDriver {
    pub fn new(animation: &AnimationConfig) -> Self {
        Self {
            state: DriverState::NotStarted,
            loop_state: LoopState::default(),
            frames: 0,
            token: StopToken::default(),
            rotation: animation.into(),
        }
    }

    /// Start animating `model` and schedule the first frame.
    ///
    /// Only the first call has an effect; the driver is never restarted.
    pub fn start<T: FrameTarget>(&mut self, model: ModelHandle, target: &mut T) -> Option<StopToken> {
        if self.state != DriverState::NotStarted {
            log::warn!(
                "Ignoring start request for {:?}, the animation driver is already {:?}",
                model,
                self.state
            );
            return None;
        }
        log::info!("Starting animation driver for {:?}", model);
        self.state = DriverState::Running { model };
        target.request_frame();
        Some(self.token.clone())
    }

    /// Stop the loop. The next invocation neither renders nor reschedules.
    pub fn stop(&mut self) {
        self.token.stop();
    }

    /// Run one frame.
    pub fn tick<C, T>(&mut self, clock: &mut C, target: &mut T) -> Result<TickOutcome, DriverError<T::Error>>
    where
        C: FrameClock + ?Sized,
        T: FrameTarget,
    {
        let model = match self.state {
            DriverState::Running { model } => model,
            DriverState::NotStarted => return Ok(TickOutcome::Idle),
            DriverState::Stopped => return Ok(TickOutcome::Stopped),
        };
        if self.token.is_stopped() {
            log::info!("Animation driver stopped after {} frames", self.frames);
            self.state = DriverState::Stopped;
            return Ok(TickOutcome::Stopped);
        }

        // The clock is monotonic, never let a misbehaving one move time backwards.
        let elapsed_time = clock.elapsed().max(self.loop_state.previous_time);
        let delta_time = elapsed_time - self.loop_state.previous_time;

        let intensity = ambient_intensity(elapsed_time);
        target.set_ambient_intensity(intensity);

        self.loop_state = LoopState {
            elapsed_time,
            previous_time: elapsed_time,
            delta_time,
        };

        let (sphere_step, model_step) = self.rotation.steps(delta_time);
        target.rotate_sphere_y(sphere_step);
        target.rotate_model_z(model, -model_step);

        target.update_controls();

        if let Err(source) = target.render() {
            self.state = DriverState::Stopped;
            return Err(DriverError {
                frame: self.frames,
                source,
            });
        }
        self.frames += 1;

        target.request_frame();

        Ok(TickOutcome::Rendered(FrameStats {
            frame: self.frames,
            elapsed_time,
            delta_time,
            ambient_intensity: intensity,
            sphere_step,
            model_step,
        }))
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
