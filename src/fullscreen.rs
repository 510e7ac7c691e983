//! Fullscreen toggling on double click.
//!
//! The platform owns the fullscreen state. The toggle only asks "is something
//! fullscreen right now?" and issues the matching request; it never records
//! what it asked for.

use instant::{Duration, Instant};
use winit::{dpi::PhysicalPosition, window::Fullscreen};

/// A surface that can be presented fullscreen.
pub trait FullscreenTarget {
    /// Whether the platform exposes a fullscreen API at all.
    fn supports_fullscreen(&self) -> bool {
        true
    }

    fn is_fullscreen(&self) -> bool;

    fn request_fullscreen(&self);

    fn exit_fullscreen(&self);
}

/// What a toggle ended up asking the platform for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FullscreenRequest {
    /// No surface or no fullscreen API; nothing was requested.
    Unavailable,
    Enter,
    Exit,
}

/// Enter fullscreen when nothing is fullscreen, exit otherwise.
pub fn toggle_fullscreen<T>(target: Option<&T>) -> FullscreenRequest
where
    T: FullscreenTarget + ?Sized,
{
    let Some(target) = target else {
        return FullscreenRequest::Unavailable;
    };
    if !target.supports_fullscreen() {
        return FullscreenRequest::Unavailable;
    }
    if target.is_fullscreen() {
        target.exit_fullscreen();
        FullscreenRequest::Exit
    } else {
        target.request_fullscreen();
        FullscreenRequest::Enter
    }
}

impl FullscreenTarget for winit::window::Window {
    #[cfg(target_arch = "wasm32")]
    fn supports_fullscreen(&self) -> bool {
        web_sys::window()
            .and_then(|window| window.document())
            .is_some_and(|document| document.fullscreen_enabled())
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen().is_some()
    }

    fn request_fullscreen(&self) {
        self.set_fullscreen(Some(Fullscreen::Borderless(None)));
    }

    fn exit_fullscreen(&self) {
        self.set_fullscreen(None);
    }
}

/// Turns single left presses into double clicks.
///
/// Two presses form a double click when the second lands within `window` of
/// the first and no further than `slop` physical pixels away. A detected
/// double click resets the detector, so a triple click is one double click
/// followed by a fresh first click.
#[derive(Debug, Clone)]
pub struct DoubleClickDetector {
    window: Duration,
    slop: f64,
    last: Option<(Instant, PhysicalPosition<f64>)>,
}

impl DoubleClickDetector {
    pub fn new(window: Duration, slop: f64) -> Self {
        Self {
            window,
            slop,
            last: None,
        }
    }

    /// Register a press at `position`; returns `true` when it completes a double click.
    pub fn press(&mut self, at: Instant, position: PhysicalPosition<f64>) -> bool {
        let is_double = self.last.is_some_and(|(last_at, last_position)| {
            let dx = position.x - last_position.x;
            let dy = position.y - last_position.y;
            at >= last_at
                && at.duration_since(last_at) <= self.window
                && (dx * dx + dy * dy).sqrt() <= self.slop
        });
        self.last = if is_double { None } else { Some((at, position)) };
        is_double
    }
}
