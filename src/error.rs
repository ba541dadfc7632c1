//! Error types for engine construction, configuration, and plugin loading.

/// Failure raised by a plugin initializer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    /// The initializer could not attach to the engine.
    #[error("plugin `{plugin}` failed to initialize: {reason}")]
    Init { plugin: String, reason: String },
    /// An initializer panicked; the payload message is kept.
    #[error("plugin chain panicked: {0}")]
    Panicked(String),
}

impl PluginError {
    /// Convenience constructor for [`PluginError::Init`].
    #[must_use]
    pub fn init(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Init { plugin: plugin.into(), reason: reason.into() }
    }
}

/// Error returned by [`crate::engine::Engine`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The configuration names no container at all.
    #[error("container reference is empty")]
    MissingContainer,
    /// The host could not resolve the container selector.
    #[error("container `{selector}` could not be resolved")]
    UnresolvedContainer { selector: String },
    /// Constructed outside a tokio runtime.
    #[error("engine requires a tokio runtime with a LocalSet")]
    NoRuntime,
    /// The created surface exposes no 2-D drawing context.
    #[error("drawing surface has no 2d context")]
    NoDrawingContext,
    /// An options patch produced an invalid configuration.
    #[error("invalid option: {0}")]
    InvalidOption(String),
    /// The engine has been destroyed.
    #[error("engine has been destroyed")]
    Destroyed,
    /// The plugin chain halted.
    #[error(transparent)]
    Plugin(#[from] PluginError),
}
