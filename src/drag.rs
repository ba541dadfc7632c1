//! Built-in drag plugin.
//!
//! Derives `DRAG-START`, `DRAG-MOVE`, and `DRAG-END` from the engine's
//! press/move/release signals. Positions are surface-local.
//!
//! A press only arms the tracker. The drag starts on the first move that
//! takes the pointer strictly farther than the threshold from the press
//! position; later moves report their delta since the previous move and the
//! total offset from the press. Release ends the drag. A press and release
//! without a qualifying move publishes nothing.
//!
//! The threshold is read from the `dragThresholdPx` option at every press, so
//! `update_opt` takes effect on the next gesture.

#[cfg(test)]
#[path = "drag_test.rs"]
mod drag_test;

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::consts::DRAG_THRESHOLD_PX;
use crate::engine::{Engine, WeakEngine};
use crate::error::PluginError;
use crate::geom::Point;
use crate::input::PointerEvent;
use crate::plugin::Plugin;
use crate::signal::Signal;
use crate::topic;
use crate::utils::Utils;

/// Option key overriding [`DRAG_THRESHOLD_PX`].
pub const THRESHOLD_OPTION: &str = "dragThresholdPx";

/// Payload of every drag signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragEvent {
    /// Press position.
    pub start: Point,
    pub current: Point,
    /// Movement since the previous drag signal.
    pub delta: Point,
    /// Offset from `start` to `current`.
    pub total: Point,
}

/// One step of a drag in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragStep {
    Start(DragEvent),
    Move(DragEvent),
}

/// Pointer-driven drag state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct DragTracker {
    start: Option<Point>,
    last: Option<Point>,
    threshold: f64,
    dragging: bool,
}

impl DragTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the tracker at `pos`. Any drag in progress is dropped.
    pub fn press(&mut self, pos: Point, threshold: f64) {
        self.start = Some(pos);
        self.last = Some(pos);
        self.threshold = threshold;
        self.dragging = false;
    }

    /// Feed a move. `None` while unpressed or still inside the threshold.
    pub fn motion(&mut self, pos: Point, utils: &Utils) -> Option<DragStep> {
        let start = self.start?;
        let last = self.last?;
        if !self.dragging {
            if utils.distance(start, pos) <= self.threshold {
                return None;
            }
            self.dragging = true;
            self.last = Some(pos);
            return Some(DragStep::Start(event(start, last, pos)));
        }
        self.last = Some(pos);
        Some(DragStep::Move(event(start, last, pos)))
    }

    /// End the gesture. Returns the final event if a drag was in progress.
    ///
    /// `pos` is `None` when the release carried no usable position; the last
    /// move position is reported instead.
    pub fn release(&mut self, pos: Option<Point>) -> Option<DragEvent> {
        let was_dragging = self.dragging;
        let start = self.start.take();
        let last = self.last.take();
        self.dragging = false;
        if !was_dragging {
            return None;
        }
        let (start, last) = (start?, last?);
        Some(event(start, last, pos.unwrap_or(last)))
    }

    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.start.is_some()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

fn event(start: Point, last: Point, current: Point) -> DragEvent {
    DragEvent { start, current, delta: current.offset_from(last), total: current.offset_from(start) }
}

// =============================================================================
// PLUGIN
// =============================================================================

/// A fresh drag plugin. Install it into a registry before building engines.
#[must_use]
pub fn plugin() -> Rc<Plugin> {
    Plugin::new("drag", |engine: Engine, utils: Rc<Utils>| async move {
        attach(&engine, utils);
        Ok::<(), PluginError>(())
    })
}

fn attach(engine: &Engine, utils: Rc<Utils>) {
    let tracker = Rc::new(RefCell::new(DragTracker::new()));

    let (weak, state) = (engine.downgrade(), Rc::clone(&tracker));
    engine.on(topic::MOUSEDOWN, move |signal: &Signal| {
        let Some((engine, ev)) = live(&weak, signal) else { return };
        if ev.is_synthetic() {
            return;
        }
        let Ok(pos) = engine.to_canvas_pos(ev.client) else { return };
        state.borrow_mut().press(pos, threshold(&engine));
    });

    let (weak, state, helpers) = (engine.downgrade(), Rc::clone(&tracker), Rc::clone(&utils));
    engine.on(topic::MOUSEMOVE, move |signal: &Signal| {
        let Some((engine, ev)) = live(&weak, signal) else { return };
        if ev.is_synthetic() {
            return;
        }
        let Ok(pos) = engine.to_canvas_pos(ev.client) else { return };
        let step = state.borrow_mut().motion(pos, &helpers);
        match step {
            Some(DragStep::Start(drag)) => {
                debug!(engine = %engine.id(), x = drag.start.x, y = drag.start.y, "drag started");
                engine.emit(topic::DRAG_START, &Signal::Drag(drag));
            }
            Some(DragStep::Move(drag)) => {
                engine.emit(topic::DRAG_MOVE, &Signal::Drag(drag));
            }
            None => {}
        }
    });

    let (weak, state) = (engine.downgrade(), tracker);
    engine.on(topic::MOUSEUP, move |signal: &Signal| {
        let Some((engine, ev)) = live(&weak, signal) else { return };
        let pos = match engine.to_canvas_pos(ev.client) {
            Ok(pos) if !ev.is_synthetic() => Some(pos),
            _ => None,
        };
        let finished = state.borrow_mut().release(pos);
        if let Some(drag) = finished {
            debug!(engine = %engine.id(), dx = drag.total.x, dy = drag.total.y, "drag ended");
            engine.emit(topic::DRAG_END, &Signal::Drag(drag));
        }
    });
}

fn live(weak: &WeakEngine, signal: &Signal) -> Option<(Engine, PointerEvent)> {
    let ev = *signal.pointer()?;
    Some((weak.upgrade()?, ev))
}

fn threshold(engine: &Engine) -> f64 {
    engine.options().extra(THRESHOLD_OPTION).and_then(Value::as_f64).unwrap_or(DRAG_THRESHOLD_PX)
}
