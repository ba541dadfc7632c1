//! Engine configuration: the container reference plus a mergeable options
//! document.
//!
//! DESIGN
//! ======
//! The container is fixed for the lifetime of an engine. Everything else
//! lives in [`Options`], which round-trips through `serde_json` so that
//! `update_opt` can deep-merge an arbitrary JSON patch into it: objects merge
//! key-wise, arrays concatenate, anything else replaces. Unknown keys are
//! kept in `extra` for plugins to read.
//!
//! The original option names `dbClickTime` and `mobile` are accepted as
//! aliases in patches and on deserialization.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::consts::{DEFAULT_DOUBLE_CLICK_WINDOW_MS, ENV_DOUBLE_CLICK_MS, ENV_TOUCH_INPUT};
use crate::error::EngineError;
use crate::host::Container;

const KEY_WINDOW: &str = "doubleClickWindowMs";
const KEY_TOUCH: &str = "isTouchInput";

/// Patch keys accepted in place of the canonical ones.
const KEY_ALIASES: [(&str, &str); 2] = [("dbClickTime", KEY_WINDOW), ("mobile", KEY_TOUCH)];

/// How the engine finds its container.
#[derive(Clone)]
pub enum ContainerRef {
    /// Resolved through [`crate::host::Host::resolve`] at construction.
    Selector(String),
    /// Used as-is.
    Element(Rc<dyn Container>),
}

impl fmt::Debug for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
            Self::Element(_) => f.write_str("Element(..)"),
        }
    }
}

impl From<&str> for ContainerRef {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_owned())
    }
}

impl From<String> for ContainerRef {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

impl From<Rc<dyn Container>> for ContainerRef {
    fn from(element: Rc<dyn Container>) -> Self {
        Self::Element(element)
    }
}

/// Mergeable engine options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Double-click disambiguation window in milliseconds.
    #[serde(rename = "doubleClickWindowMs", alias = "dbClickTime", default = "default_window_ms")]
    pub double_click_window_ms: u64,
    /// Normalize input from touch events instead of mouse events.
    #[serde(rename = "isTouchInput", alias = "mobile", default)]
    pub touch_input: bool,
    /// Caller and plugin extensions.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_window_ms() -> u64 {
    DEFAULT_DOUBLE_CLICK_WINDOW_MS
}

impl Default for Options {
    fn default() -> Self {
        Self { double_click_window_ms: DEFAULT_DOUBLE_CLICK_WINDOW_MS, touch_input: false, extra: Map::new() }
    }
}

impl Options {
    #[must_use]
    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_window_ms)
    }

    /// Look up a caller extension by key.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Serialize to the JSON options document.
    pub fn to_value(&self) -> Result<Value, EngineError> {
        serde_json::to_value(self).map_err(|e| EngineError::InvalidOption(e.to_string()))
    }

    /// Deep-merge `patch` into a copy of these options.
    ///
    /// `self` is untouched when the patch is rejected.
    pub fn merged(&self, patch: Value) -> Result<Options, EngineError> {
        if !patch.is_object() {
            return Err(EngineError::InvalidOption(format!("patch must be a JSON object, got {patch}")));
        }
        let mut doc = self.to_value()?;
        deep_merge(&mut doc, canonicalize_keys(patch));
        serde_json::from_value(doc).map_err(|e| EngineError::InvalidOption(e.to_string()))
    }
}

/// Construction-time configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub container: ContainerRef,
    pub options: Options,
}

impl EngineConfig {
    /// Default options against `container`.
    pub fn new(container: impl Into<ContainerRef>) -> Self {
        Self { container: container.into(), options: Options::default() }
    }

    #[must_use]
    pub fn with_double_click_window_ms(mut self, ms: u64) -> Self {
        self.options.double_click_window_ms = ms;
        self
    }

    #[must_use]
    pub fn with_touch_input(mut self, touch: bool) -> Self {
        self.options.touch_input = touch;
        self
    }

    /// Add a caller extension.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.extra.insert(key.into(), value);
        self
    }

    /// Deep-merge a JSON options document over the current options.
    pub fn with_options(mut self, patch: Value) -> Result<Self, EngineError> {
        self.options = self.options.merged(patch)?;
        Ok(self)
    }

    /// Apply environment overrides.
    ///
    /// - `MARKSURFACE_DOUBLE_CLICK_MS`: window in milliseconds
    /// - `MARKSURFACE_TOUCH_INPUT`: `true`/`1` or `false`/`0`
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        let window = env_parse(ENV_DOUBLE_CLICK_MS, self.options.double_click_window_ms);
        let touch = env_flag(ENV_TOUCH_INPUT, self.options.touch_input);
        if window != self.options.double_click_window_ms || touch != self.options.touch_input {
            debug!(double_click_window_ms = window, touch_input = touch, "engine options overridden from env");
        }
        self.options.double_click_window_ms = window;
        self.options.touch_input = touch;
        self
    }
}

// =============================================================================
// MERGING
// =============================================================================

/// Merge `patch` into `target`: objects key-wise, arrays by concatenation,
/// everything else by replacement.
pub fn deep_merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(existing), Value::Array(incoming)) => existing.extend(incoming),
        (slot, value) => *slot = value,
    }
}

/// Rewrite alias keys at the top level of a patch to their canonical names.
fn canonicalize_keys(patch: Value) -> Value {
    let Value::Object(map) = patch else {
        return patch;
    };
    let renamed = map
        .into_iter()
        .map(|(key, value)| {
            let canonical = KEY_ALIASES
                .iter()
                .find(|(alias, _)| *alias == key)
                .map_or(key, |(_, canonical)| (*canonical).to_owned());
            (canonical, value)
        })
        .collect();
    Value::Object(renamed)
}

// =============================================================================
// ENVIRONMENT
// =============================================================================

fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
