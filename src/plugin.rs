//! Plugin registry and the sequential loading chain.
//!
//! DESIGN
//! ======
//! A plugin is a named async initializer plus a `used` flag. Installing a
//! plugin marks it used, so installing the same plugin again (into any
//! registry) is a no-op. Registries are cheap `Rc` handles: an engine takes
//! a snapshot of the registry it is given at construction, so plugins
//! installed afterwards never attach to an engine that already exists.
//!
//! `load_all` awaits each initializer before starting the next. An
//! initializer resolves once its subscriptions are attached, not when its
//! feature is done being used.

#[cfg(test)]
#[path = "plugin_test.rs"]
mod plugin_test;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use tracing::debug;

use crate::engine::Engine;
use crate::error::PluginError;
use crate::utils::Utils;

/// Future returned by a plugin initializer.
pub type PluginFuture = LocalBoxFuture<'static, Result<(), PluginError>>;

type Initializer = Rc<dyn Fn(Engine, Rc<Utils>) -> PluginFuture>;

/// An optional behavior that attaches itself to an engine.
pub struct Plugin {
    name: String,
    init: Initializer,
    used: Cell<bool>,
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("used", &self.used.get())
            .finish_non_exhaustive()
    }
}

impl Plugin {
    /// Wrap an async initializer as a plugin.
    pub fn new<F, Fut>(name: impl Into<String>, init: F) -> Rc<Self>
    where
        F: Fn(Engine, Rc<Utils>) -> Fut + 'static,
        Fut: Future<Output = Result<(), PluginError>> + 'static,
    {
        let init: Initializer = Rc::new(move |engine: Engine, utils: Rc<Utils>| init(engine, utils).boxed_local());
        Rc::new(Self { name: name.into(), init, used: Cell::new(false) })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the plugin has been installed into a registry.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.used.get()
    }

    fn initialize(&self, engine: Engine, utils: Rc<Utils>) -> PluginFuture {
        (self.init)(engine, utils)
    }
}

/// Where [`PluginRegistry::install`] places a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertAt {
    #[default]
    Append,
    /// Insert before the plugin currently at this index; clamped to the end.
    Index(usize),
}

/// Ordered catalog of plugins available to engines.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Rc<RefCell<Vec<Rc<Plugin>>>>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.plugins.borrow().iter().map(|p| p.name())).finish()
    }
}

thread_local! {
    static SHARED: PluginRegistry = PluginRegistry::new();
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The thread-wide registry, for hosts that want one catalog for every engine.
    #[must_use]
    pub fn shared() -> Self {
        SHARED.with(Clone::clone)
    }

    /// Install `plugin`. Returns `false` if it was already used.
    pub fn install(&self, plugin: &Rc<Plugin>, at: InsertAt) -> bool {
        if plugin.used.replace(true) {
            debug!(plugin = plugin.name(), "plugin already installed; ignoring");
            return false;
        }
        let mut plugins = self.plugins.borrow_mut();
        match at {
            InsertAt::Append => plugins.push(Rc::clone(plugin)),
            InsertAt::Index(i) => {
                let i = i.min(plugins.len());
                plugins.insert(i, Rc::clone(plugin));
            }
        }
        debug!(plugin = plugin.name(), position = ?at, "plugin installed");
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.borrow().is_empty()
    }

    /// Plugin names in load order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.plugins.borrow().iter().map(|p| p.name.clone()).collect()
    }

    /// The current load order, detached from later installs.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Rc<Plugin>> {
        self.plugins.borrow().clone()
    }
}

/// Run every initializer in order, each after the previous one resolved.
///
/// Stops at the first failure.
pub(crate) async fn load_all(engine: &Engine, plugins: Vec<Rc<Plugin>>, utils: Rc<Utils>) -> Result<(), PluginError> {
    for plugin in plugins {
        debug!(engine = %engine.id(), plugin = plugin.name(), "initializing plugin");
        plugin.initialize(engine.clone(), Rc::clone(&utils)).await?;
        debug!(engine = %engine.id(), plugin = plugin.name(), "plugin ready");
    }
    Ok(())
}
