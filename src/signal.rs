//! Payload carried by every publish on an engine's bus.

use serde_json::Value;

use crate::config::Options;
use crate::drag::DragEvent;
use crate::input::PointerEvent;

/// What a subscriber receives.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// No payload (`PLUGINS_LOADED`, `DESTORY`).
    Empty,
    /// Normalized pointer input in client coordinates.
    Pointer(PointerEvent),
    /// Full merged options after `update_opt`.
    Options(Options),
    /// Drag progress from the drag plugin.
    Drag(DragEvent),
    /// Anything a plugin publishes for its own topics.
    Custom(Value),
}

impl Signal {
    #[must_use]
    pub fn pointer(&self) -> Option<&PointerEvent> {
        match self {
            Self::Pointer(ev) => Some(ev),
            _ => None,
        }
    }

    #[must_use]
    pub fn options(&self) -> Option<&Options> {
        match self {
            Self::Options(opts) => Some(opts),
            _ => None,
        }
    }

    #[must_use]
    pub fn drag(&self) -> Option<&DragEvent> {
        match self {
            Self::Drag(ev) => Some(ev),
            _ => None,
        }
    }

    #[must_use]
    pub fn custom(&self) -> Option<&Value> {
        match self {
            Self::Custom(v) => Some(v),
            _ => None,
        }
    }
}
