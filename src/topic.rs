//! Stable topic names published on an engine's bus.
//!
//! Integrators subscribe with these names; the spellings (including
//! `DESTORY`) are part of the public contract.

/// Single click, published once the double-click window has elapsed.
pub const CLICK: &str = "CLICK";
/// Two clicks within the double-click window.
pub const DOUBLE_CLICK: &str = "DOUBLE-CLICK";
pub const MOUSEDOWN: &str = "MOUSEDOWN";
pub const MOUSEMOVE: &str = "MOUSEMOVE";
/// Release, observed at window level so drags ending off-surface still land.
pub const MOUSEUP: &str = "MOUSEUP";
pub const MOUSEENTER: &str = "MOUSEENTER";
pub const MOUSELEAVE: &str = "MOUSELEAVE";
/// A click anywhere in the host page, surface included.
pub const WINDOW_CLICK: &str = "WINDOW-CLICK";
/// Every plugin initializer has resolved.
pub const PLUGINS_LOADED: &str = "PLUGINS_LOADED";
/// Configuration changed; payload carries the merged options.
pub const UPDATED_OPT: &str = "UPDATED_OPT";
/// Engine is being torn down. Last signal before the bus is cleared.
pub const DESTORY: &str = "DESTORY";

// ── Drag plugin ─────────────────────────────────────────────────

pub const DRAG_START: &str = "DRAG-START";
pub const DRAG_MOVE: &str = "DRAG-MOVE";
pub const DRAG_END: &str = "DRAG-END";

/// Every topic the engine itself publishes.
pub const ENGINE_TOPICS: [&str; 11] = [
    CLICK,
    DOUBLE_CLICK,
    MOUSEDOWN,
    MOUSEMOVE,
    MOUSEUP,
    MOUSEENTER,
    MOUSELEAVE,
    WINDOW_CLICK,
    PLUGINS_LOADED,
    UPDATED_OPT,
    DESTORY,
];
