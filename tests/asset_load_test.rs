use std::cell::RefCell;

use futures::executor::block_on;
use globe_scene::{
    config::SceneConfig,
    driver::{AnimationDriver, DriverState, ModelHandle},
    loader::{AssetLoad, LoadEvent, LoadProgress, LoadStatus, drive_load},
};

use crate::common::test_utils::{ManualClock, RecordingTarget, failure, progress};

mod common;

/// Feed load events the way the app does: the first success starts the driver.
fn deliver(
    events: Vec<LoadEvent<ModelHandle>>,
    driver: &mut AnimationDriver,
    target: &mut RecordingTarget,
) -> AssetLoad {
    let mut load = AssetLoad::new("models/earth/scene.gltf");
    for event in events {
        if let Some(model) = load.handle(event) {
            driver.start(model, target);
        }
    }
    load
}

fn run_frames(driver: &mut AnimationDriver, target: &mut RecordingTarget, frames: usize) {
    let mut clock = ManualClock::new([0.0, 0.016, 0.033, 0.05, 0.066]);
    for _ in 0..frames {
        driver.tick(&mut clock, target).unwrap();
    }
}

#[test]
fn failed_load_never_starts_the_driver() {
    let mut target = RecordingTarget::new();
    let mut driver = AnimationDriver::new(&SceneConfig::default().animation);

    let load = deliver(vec![failure("404 Not Found")], &mut driver, &mut target);
    run_frames(&mut driver, &mut target, 5);

    assert_eq!(load.status(), LoadStatus::Failed);
    assert_eq!(driver.state(), DriverState::NotStarted);
    assert_eq!(target.render_invocations(), 0);
    assert_eq!(target.frame_requests(), 0);
}

#[test]
fn progress_alone_never_starts_the_driver() {
    let mut target = RecordingTarget::new();
    let mut driver = AnimationDriver::new(&SceneConfig::default().animation);

    let load = deliver(
        vec![progress(1, 3), progress(2, 3), progress(3, 3)],
        &mut driver,
        &mut target,
    );
    run_frames(&mut driver, &mut target, 3);

    assert_eq!(load.status(), LoadStatus::Pending);
    assert_eq!(load.progress_events(), 3);
    assert_eq!(target.render_invocations(), 0);
}

#[test]
fn success_after_progress_starts_the_driver_once() {
    let mut target = RecordingTarget::new();
    let mut driver = AnimationDriver::new(&SceneConfig::default().animation);

    let load = deliver(
        vec![
            progress(1, 2),
            progress(2, 2),
            LoadEvent::Success(ModelHandle::new(1)),
            LoadEvent::Success(ModelHandle::new(2)),
        ],
        &mut driver,
        &mut target,
    );

    assert_eq!(load.status(), LoadStatus::Loaded);
    assert_eq!(
        driver.state(),
        DriverState::Running {
            model: ModelHandle::new(1)
        }
    );
    assert_eq!(target.frame_requests(), 1);

    run_frames(&mut driver, &mut target, 2);
    assert_eq!(target.render_invocations(), 2);
}

#[test]
fn events_after_a_failure_are_ignored() {
    let mut load = AssetLoad::new("models/earth/scene.gltf");
    assert_eq!(load.handle(failure("parse error")), None);
    assert_eq!(load.handle(LoadEvent::Success(ModelHandle::new(1))), None);
    assert_eq!(load.handle(progress(1, 1)), None);
    assert_eq!(load.status(), LoadStatus::Failed);
    assert_eq!(load.progress_events(), 0);
}

#[test]
fn drive_load_forwards_progress_before_the_outcome() {
    let seen = RefCell::new(Vec::new());
    block_on(drive_load(
        |tx| async move {
            for loaded_files in 1..=2 {
                tx.unbounded_send(LoadProgress {
                    path: "scene.gltf".to_string(),
                    file: format!("part{loaded_files}.bin"),
                    bytes: 10,
                    loaded_files,
                    total_files: 2,
                })?;
            }
            Ok::<_, anyhow::Error>(42)
        },
        |event: LoadEvent<i32>| {
            let entry = match event {
                LoadEvent::Progress(p) => format!("progress {}/{}", p.loaded_files, p.total_files),
                LoadEvent::Success(value) => format!("success {value}"),
                LoadEvent::Failure(e) => format!("failure {e}"),
            };
            seen.borrow_mut().push(entry);
        },
    ));

    assert_eq!(
        seen.into_inner(),
        vec!["progress 1/2", "progress 2/2", "success 42"]
    );
}

#[test]
fn drive_load_reports_exactly_one_failure() {
    let terminal = RefCell::new(Vec::new());
    block_on(drive_load(
        |_tx| async move { Err::<(), _>(anyhow::anyhow!("no such file")) },
        |event: LoadEvent<()>| {
            if event.is_terminal() {
                terminal.borrow_mut().push(event.kind());
            }
        },
    ));

    assert_eq!(terminal.into_inner(), vec!["failure"]);
}
