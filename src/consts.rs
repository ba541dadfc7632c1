//! Shared constants for the engine and its built-in plugin.

// ── Timing ──────────────────────────────────────────────────────

/// Default double-click disambiguation window, in milliseconds.
pub const DEFAULT_DOUBLE_CLICK_WINDOW_MS: u64 = 200;

// ── Drag ────────────────────────────────────────────────────────

/// Pointer travel, in CSS pixels, before a press becomes a drag.
pub const DRAG_THRESHOLD_PX: f64 = 3.0;

// ── Environment ─────────────────────────────────────────────────

/// Overrides the double-click window for every config built with env overrides.
pub const ENV_DOUBLE_CLICK_MS: &str = "MARKSURFACE_DOUBLE_CLICK_MS";

/// `true`/`1` forces touch input normalization.
pub const ENV_TOUCH_INPUT: &str = "MARKSURFACE_TOUCH_INPUT";
