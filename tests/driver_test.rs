use std::f32::consts::PI;

use globe_scene::{
    config::{AnimationConfig, SceneConfig},
    driver::{AnimationDriver, DriverState, ModelHandle, TickOutcome, ambient_intensity},
};

use crate::common::test_utils::{Call, ManualClock, RecordingTarget, assert_close};

mod common;

fn animation() -> AnimationConfig {
    SceneConfig::default().animation
}

fn started(target: &mut RecordingTarget) -> AnimationDriver {
    let mut driver = AnimationDriver::new(&animation());
    assert!(driver.start(ModelHandle::new(1), target).is_some());
    target.clear_calls();
    driver
}

#[test]
fn steps_run_in_order() {
    let mut target = RecordingTarget::new();
    let mut driver = started(&mut target);
    let mut clock = ManualClock::new([0.5]);

    let outcome = driver.tick(&mut clock, &mut target).unwrap();
    assert!(matches!(outcome, TickOutcome::Rendered(_)));

    let model = ModelHandle::new(1);
    assert_eq!(
        target.calls(),
        &[
            Call::Ambient(ambient_intensity(0.5)),
            Call::RotateSphere(0.001),
            Call::RotateModel(model, -0.001),
            Call::Controls,
            Call::Render,
            Call::RequestFrame,
        ]
    );
}

#[test]
fn rotation_is_per_frame_not_per_second() {
    let mut target = RecordingTarget::new();
    let mut driver = started(&mut target);
    let mut clock = ManualClock::new([0.0, 0.016, 0.033]);

    for _ in 0..3 {
        driver.tick(&mut clock, &mut target).unwrap();
    }

    assert_close(target.sphere_rotation(), 0.003);
    assert_close(target.model_rotation(), -0.003);
    assert_eq!(driver.frames(), 3);
    assert_eq!(target.render_invocations(), 3);
}

#[test]
fn delta_time_is_computed_before_previous_time_moves() {
    let mut target = RecordingTarget::new();
    let mut driver = started(&mut target);
    let mut clock = ManualClock::new([0.25, 1.0]);

    driver.tick(&mut clock, &mut target).unwrap();
    let TickOutcome::Rendered(stats) = driver.tick(&mut clock, &mut target).unwrap() else {
        panic!("second frame was not rendered");
    };
    assert_close(stats.delta_time, 0.75);
    assert_close(stats.elapsed_time, 1.0);
    assert_eq!(driver.loop_state().previous_time, 1.0);
    assert_eq!(stats.frame, 2);
}

#[test]
fn previous_time_never_decreases() {
    let mut target = RecordingTarget::new();
    let mut driver = started(&mut target);
    let mut clock = ManualClock::new([0.5, 0.2, 0.7, 0.7, 3.0]);

    let mut last_previous = 0.0;
    for _ in 0..5 {
        driver.tick(&mut clock, &mut target).unwrap();
        let state = driver.loop_state();
        assert!(state.previous_time >= last_previous);
        assert!(state.previous_time <= state.elapsed_time);
        assert!(state.delta_time >= 0.0);
        last_previous = state.previous_time;
    }
    assert_eq!(last_previous, 3.0);
}

#[test]
fn ambient_intensity_stays_in_bounds() {
    for i in 0..20_000 {
        let t = i as f32 * 0.001;
        let intensity = ambient_intensity(t);
        assert!(
            (1.5..=4.65 + 1e-5).contains(&intensity),
            "intensity {intensity} at t={t}"
        );
    }
    assert_close(ambient_intensity(0.0), 1.5);
    assert!((ambient_intensity(PI / 2.0) - 4.65).abs() < 1e-5);
}

#[test]
fn ambient_intensity_has_period_pi() {
    for i in 0..100 {
        let t = i as f32 * 0.0314;
        assert!((ambient_intensity(t) - ambient_intensity(t + PI)).abs() < 1e-4);
    }
}

#[test]
fn driver_is_idle_until_started() {
    let mut target = RecordingTarget::new();
    let mut driver = AnimationDriver::new(&animation());
    let mut clock = ManualClock::new([0.1, 0.2]);

    for _ in 0..2 {
        assert_eq!(driver.tick(&mut clock, &mut target).unwrap(), TickOutcome::Idle);
    }
    assert_eq!(driver.state(), DriverState::NotStarted);
    assert!(target.calls().is_empty());
}

#[test]
fn second_start_is_ignored() {
    let mut target = RecordingTarget::new();
    let mut driver = AnimationDriver::new(&animation());

    assert!(driver.start(ModelHandle::new(1), &mut target).is_some());
    assert!(driver.start(ModelHandle::new(2), &mut target).is_none());

    assert_eq!(target.frame_requests(), 1);
    assert_eq!(
        driver.state(),
        DriverState::Running {
            model: ModelHandle::new(1)
        }
    );
}

#[test]
fn stop_token_ends_the_loop_without_rendering() {
    let mut target = RecordingTarget::new();
    let mut driver = AnimationDriver::new(&animation());
    let token = driver.start(ModelHandle::new(1), &mut target).unwrap();
    let mut clock = ManualClock::new([0.1, 0.2, 0.3]);

    driver.tick(&mut clock, &mut target).unwrap();
    token.stop();
    assert!(token.is_stopped());

    assert_eq!(driver.tick(&mut clock, &mut target).unwrap(), TickOutcome::Stopped);
    assert_eq!(driver.tick(&mut clock, &mut target).unwrap(), TickOutcome::Stopped);
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(target.render_invocations(), 1);
    // start plus the single rendered frame
    assert_eq!(target.frame_requests(), 2);
    assert!(driver.start(ModelHandle::new(1), &mut target).is_none());
}

#[test]
fn driver_stop_behaves_like_the_token() {
    let mut target = RecordingTarget::new();
    let mut driver = started(&mut target);
    let mut clock = ManualClock::new([0.1]);

    driver.stop();
    assert_eq!(driver.tick(&mut clock, &mut target).unwrap(), TickOutcome::Stopped);
    assert!(target.calls().is_empty());
}

#[test]
fn render_error_stops_rescheduling() {
    let mut target = RecordingTarget::failing_on_render(2);
    let mut driver = started(&mut target);
    let mut clock = ManualClock::new([0.1, 0.2, 0.3]);

    driver.tick(&mut clock, &mut target).unwrap();
    let error = driver.tick(&mut clock, &mut target).unwrap_err();
    assert_eq!(error.frame, 1);
    assert!(error.to_string().contains("device lost"));
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(target.calls().last(), Some(&Call::Render));

    assert_eq!(driver.tick(&mut clock, &mut target).unwrap(), TickOutcome::Stopped);
    assert_eq!(target.render_invocations(), 2);
    assert_eq!(target.frame_requests(), 1);
    assert_eq!(driver.frames(), 1);
}

#[test]
fn time_scaled_rotation_uses_the_delta() {
    let mut config = animation();
    config.time_scaled_rotation = true;
    let mut target = RecordingTarget::new();
    let mut driver = AnimationDriver::new(&config);
    driver.start(ModelHandle::new(1), &mut target);
    let mut clock = ManualClock::new([0.0, 0.5]);

    driver.tick(&mut clock, &mut target).unwrap();
    assert_close(target.sphere_rotation(), 0.0);
    driver.tick(&mut clock, &mut target).unwrap();
    assert_close(target.sphere_rotation(), 0.03);
    assert_close(target.model_rotation(), -0.03);
}
