//! Input model: raw host events, normalized pointer events, and the click
//! disambiguation state machine.
//!
//! `RawEvent` is what a host delivers. `normalize` turns it into a
//! `PointerEvent` according to the engine's input mode. `PointerState` is the
//! per-engine record of the last press/release positions, the click tracker,
//! and the pending single-click timer.
//!
//! TOUCH POLICY
//! ============
//! In touch mode only the first active touch point is consumed. When a touch
//! event carries no touch point at all (a `touchend` normally doesn't), the
//! event becomes a synthetic zero-coordinate pointer event. The policy is the
//! same for press, move, and release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::geom::Point;

/// One active touch contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Host-assigned contact identifier.
    pub identifier: i64,
    pub client_x: f64,
    pub client_y: f64,
}

impl TouchPoint {
    #[must_use]
    pub fn new(identifier: i64, client_x: f64, client_y: f64) -> Self {
        Self { identifier, client_x, client_y }
    }
}

/// A pointer/touch event as delivered by the host.
///
/// Mouse events carry client coordinates; touch events carry the list of
/// active touch points and leave the client coordinates at zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawEvent {
    pub client_x: f64,
    pub client_y: f64,
    #[serde(default)]
    pub touches: Vec<TouchPoint>,
}

impl RawEvent {
    #[must_use]
    pub fn mouse(client_x: f64, client_y: f64) -> Self {
        Self { client_x, client_y, touches: Vec::new() }
    }

    #[must_use]
    pub fn touch(touches: Vec<TouchPoint>) -> Self {
        Self { client_x: 0.0, client_y: 0.0, touches }
    }
}

/// Where a normalized pointer event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerSource {
    Mouse,
    Touch,
    /// Stand-in for a touch event that carried no touch point.
    Synthetic,
}

/// A pointer event in client coordinates, as published on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub client: Point,
    pub source: PointerSource,
}

impl PointerEvent {
    #[must_use]
    pub fn mouse(client_x: f64, client_y: f64) -> Self {
        Self { client: Point::new(client_x, client_y), source: PointerSource::Mouse }
    }

    /// Zero-coordinate event substituted for touch input without a contact.
    #[must_use]
    pub fn synthetic() -> Self {
        Self { client: Point::default(), source: PointerSource::Synthetic }
    }

    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.source == PointerSource::Synthetic
    }
}

/// Translate a raw host event into a pointer event.
///
/// In touch mode the first touch point is used, or a synthetic zero event
/// if there is none. In mouse mode the client coordinates pass through.
#[must_use]
pub fn normalize(raw: &RawEvent, touch_mode: bool) -> PointerEvent {
    if !touch_mode {
        return PointerEvent::mouse(raw.client_x, raw.client_y);
    }
    match raw.touches.first() {
        Some(t) => PointerEvent { client: Point::new(t.client_x, t.client_y), source: PointerSource::Touch },
        None => PointerEvent::synthetic(),
    }
}

// =============================================================================
// CLICK TRACKER
// =============================================================================

/// What a click turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Possibly the first of a pair; confirm once the window elapses.
    Pending,
    /// Second click inside the window.
    Double,
}

/// Pure click/double-click disambiguation.
///
/// A click within `window` of the previous recorded click is a double-click
/// and clears the record, so a third click starts a fresh cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickTracker {
    last_click: Option<Instant>,
}

impl ClickTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a click at `now`.
    pub fn register(&mut self, now: Instant, window: Duration) -> ClickOutcome {
        if let Some(last) = self.last_click {
            if now.saturating_duration_since(last) <= window {
                self.last_click = None;
                return ClickOutcome::Double;
            }
        }
        self.last_click = Some(now);
        ClickOutcome::Pending
    }

    #[must_use]
    pub fn last_click(&self) -> Option<Instant> {
        self.last_click
    }

    pub fn reset(&mut self) {
        self.last_click = None;
    }
}

// =============================================================================
// POINTER STATE
// =============================================================================

/// Per-engine pointer bookkeeping. Mutated only by the engine's handlers.
#[derive(Debug, Default)]
pub struct PointerState {
    /// Client position of the last press.
    pub down_position: Point,
    /// Client position of the last release.
    pub up_position: Point,
    pub clicks: ClickTracker,
    /// Timer that will publish the pending single click.
    pub pending_click: Option<JoinHandle<()>>,
}

impl PointerState {
    /// Abort the pending single-click timer. Returns whether one was pending.
    pub fn cancel_pending_click(&mut self) -> bool {
        match self.pending_click.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel any pending timer and return to zeroed defaults.
    pub fn clear(&mut self) {
        self.cancel_pending_click();
        self.down_position = Point::default();
        self.up_position = Point::default();
        self.clicks.reset();
    }
}
