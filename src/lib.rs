//! Pointer-interaction engine for an embeddable drawing surface.
//!
//! An [`Engine`] mounts a drawing surface inside a host container, turns raw
//! mouse and touch input into a small catalog of named signals (see
//! [`topic`]), and loads optional plugins in order before announcing that it
//! is ready. The engine is single-threaded and runs inside a
//! `tokio::task::LocalSet`; the host page is abstracted behind the traits in
//! [`host`], with an in-memory implementation in [`headless`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Engine handle, lifecycle, input binding, and operations |
//! | [`bus`] | Topic-keyed publish/subscribe with stable tokens |
//! | [`topic`] | Signal names published on the bus |
//! | [`signal`] | Payload type carried by every publish |
//! | [`input`] | Raw events, touch normalization, click disambiguation |
//! | [`plugin`] | Plugin registry and the sequential loading chain |
//! | [`drag`] | Built-in drag plugin |
//! | [`config`] | Engine configuration and option merging |
//! | [`host`] | Traits for the host page, container, surface, and context |
//! | [`headless`] | In-memory host used by tests and non-browser integrators |
//! | [`geom`] | Points, sizes, and rectangles |
//! | [`utils`] | Geometry helpers handed to plugins |
//! | [`error`] | Error types |
//! | [`consts`] | Defaults and environment variable names |

pub mod bus;
pub mod config;
pub mod consts;
pub mod drag;
pub mod engine;
pub mod error;
pub mod geom;
pub mod headless;
pub mod host;
pub mod input;
pub mod plugin;
pub mod signal;
pub mod topic;
pub mod utils;

pub use bus::{EventBus, Token};
pub use config::{ContainerRef, EngineConfig, Options};
pub use engine::{Engine, Lifecycle, WeakEngine};
pub use error::{EngineError, PluginError};
pub use plugin::{InsertAt, Plugin, PluginRegistry};
pub use signal::Signal;
