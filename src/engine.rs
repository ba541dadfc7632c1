//! The pointer-interaction engine.
//!
//! DESIGN
//! ======
//! `Engine` is a cheap `Rc` handle. Construction resolves the container,
//! creates and mounts a surface sized to it, and binds every input listener
//! (`Bound`). It then spawns the plugin chain on the current `LocalSet`
//! (`PluginsLoading`), which ends in `Ready` plus `PLUGINS_LOADED`, or in
//! `PluginsFailed` if an initializer errors.
//!
//! Host listeners and timer tasks hold weak references, so dropping every
//! `Engine` handle frees the engine even if `destroy` was never called.
//! `destroy` is still the only thing that unbinds listeners and unmounts the
//! surface.
//!
//! All bus delivery happens synchronously inside the host's listener call.
//! The only suspension points are plugin initializers and the single-click
//! timer.
//!
//! INPUT MODE
//! ==========
//! Press, move, and release are bound for both mouse and touch event kinds.
//! Only the set matching the live `isTouchInput` option acts; the other set
//! is inert. Switching the option through `update_opt` therefore changes
//! which host events drive the engine from the next event on.
//!
//! ERROR HANDLING
//! ==============
//! A subscriber that panics while a host listener is running unwinds into
//! the host. Publishes made from spawned tasks (`CLICK` after the window,
//! `PLUGINS_LOADED`) have no caller to unwind into: the panic is caught and
//! logged at `error!`. A panicking plugin initializer halts the chain like a
//! failed one, with [`PluginError::Panicked`].

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::bus::{EventBus, Token};
use crate::config::{ContainerRef, EngineConfig, Options};
use crate::error::{EngineError, PluginError};
use crate::geom::{Point, Rect};
use crate::host::{Container, DrawingContext, Host, InputHandler, ListenerKind, Surface, Teardown};
use crate::input::{self, ClickOutcome, PointerEvent, PointerState, RawEvent};
use crate::plugin::{self, PluginRegistry};
use crate::signal::Signal;
use crate::topic;
use crate::utils::Utils;

/// Where an engine is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    /// Surface mounted and listeners bound; plugin chain not started yet.
    Bound,
    PluginsLoading,
    Ready,
    /// A plugin initializer failed and the chain stopped.
    PluginsFailed,
    Destroyed,
}

struct Inner {
    id: Uuid,
    container: Rc<dyn Container>,
    surface: Rc<dyn Surface>,
    context: Rc<dyn DrawingContext>,
    options: RefCell<Options>,
    bus: EventBus<Signal>,
    pointer: RefCell<PointerState>,
    teardowns: RefCell<Vec<Teardown>>,
    lifecycle: watch::Sender<Lifecycle>,
    plugin_error: RefCell<Option<PluginError>>,
    chain: RefCell<Option<JoinHandle<()>>>,
    utils: Rc<Utils>,
}

/// Handle to a live engine. Clones share the same engine.
#[derive(Clone)]
pub struct Engine {
    inner: Rc<Inner>,
}

/// Non-owning engine handle for subscriber closures.
#[derive(Clone)]
pub struct WeakEngine {
    inner: Weak<Inner>,
}

impl WeakEngine {
    #[must_use]
    pub fn upgrade(&self) -> Option<Engine> {
        self.inner.upgrade().map(|inner| Engine { inner })
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.inner.id)
            .field("lifecycle", &self.lifecycle())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Build an engine against `config.container` and start loading the
    /// plugins currently in `registry`.
    ///
    /// The plugin chain and click timers are spawned onto the current
    /// `tokio::task::LocalSet`. Outside any tokio runtime this returns
    /// [`EngineError::NoRuntime`] before anything is mounted.
    ///
    /// # Panics
    ///
    /// Panics (inside tokio's `spawn_local`) when called on a tokio runtime
    /// but outside a `LocalSet`.
    pub fn new(config: EngineConfig, host: &dyn Host, registry: &PluginRegistry) -> Result<Engine, EngineError> {
        let container = resolve_container(&config.container, host)?;
        let rect = container.bounding_rect();
        let surface = host.create_surface(rect.size());
        let context = surface.context().ok_or(EngineError::NoDrawingContext)?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(EngineError::NoRuntime);
        }
        container.append_surface(Rc::clone(&surface));

        let (lifecycle, _) = watch::channel(Lifecycle::Uninitialized);
        let engine = Engine {
            inner: Rc::new(Inner {
                id: Uuid::new_v4(),
                container,
                surface,
                context,
                options: RefCell::new(config.options),
                bus: EventBus::new(),
                pointer: RefCell::new(PointerState::default()),
                teardowns: RefCell::new(Vec::new()),
                lifecycle,
                plugin_error: RefCell::new(None),
                chain: RefCell::new(None),
                utils: Rc::new(Utils::new()),
            }),
        };

        engine.bind(host);
        engine.set_lifecycle(Lifecycle::Bound);

        let plugins = registry.snapshot();
        info!(
            engine = %engine.inner.id,
            width = rect.width,
            height = rect.height,
            plugins = plugins.len(),
            "engine bound"
        );
        engine.spawn_plugin_chain(plugins);
        Ok(engine)
    }

    // --- Identity / state ---

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        *self.inner.lifecycle.borrow()
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakEngine {
        WeakEngine { inner: Rc::downgrade(&self.inner) }
    }

    /// Snapshot of the live options.
    #[must_use]
    pub fn options(&self) -> Options {
        self.inner.options.borrow().clone()
    }

    #[must_use]
    pub fn surface(&self) -> Rc<dyn Surface> {
        Rc::clone(&self.inner.surface)
    }

    #[must_use]
    pub fn container(&self) -> Rc<dyn Container> {
        Rc::clone(&self.inner.container)
    }

    /// The engine's bus. Prefer [`Engine::on`] / [`Engine::emit`].
    #[must_use]
    pub fn bus(&self) -> &EventBus<Signal> {
        &self.inner.bus
    }

    /// Client position of the last press.
    #[must_use]
    pub fn down_position(&self) -> Point {
        self.inner.pointer.borrow().down_position
    }

    /// Client position of the last release.
    #[must_use]
    pub fn up_position(&self) -> Point {
        self.inner.pointer.borrow().up_position
    }

    /// Whether a single click is waiting out the double-click window.
    #[must_use]
    pub fn has_pending_click(&self) -> bool {
        self.inner.pointer.borrow().pending_click.is_some()
    }

    /// Resolves once the plugin chain has finished.
    pub async fn ready(&self) -> Result<(), EngineError> {
        let mut rx = self.inner.lifecycle.subscribe();
        let settled = rx
            .wait_for(|s| matches!(s, Lifecycle::Ready | Lifecycle::PluginsFailed | Lifecycle::Destroyed))
            .await
            .map(|s| *s);
        match settled {
            Ok(Lifecycle::Ready) => Ok(()),
            Ok(Lifecycle::PluginsFailed) => match self.inner.plugin_error.borrow().clone() {
                Some(err) => Err(err.into()),
                None => Err(EngineError::Destroyed),
            },
            _ => Err(EngineError::Destroyed),
        }
    }

    // --- Bus ---

    /// Subscribe to a topic. `None` for an empty topic.
    pub fn on<F>(&self, topic: &str, callback: F) -> Option<Token>
    where
        F: Fn(&Signal) + 'static,
    {
        self.inner.bus.subscribe(topic, callback)
    }

    /// Subscribe several topics at once. Empty topics are skipped.
    pub fn on_many<'a, I>(&self, handlers: I) -> Vec<Token>
    where
        I: IntoIterator<Item = (&'a str, Box<dyn Fn(&Signal)>)>,
    {
        handlers
            .into_iter()
            .filter_map(|(topic, callback)| self.inner.bus.subscribe(topic, callback))
            .collect()
    }

    pub fn off(&self, token: Token) -> bool {
        self.inner.bus.unsubscribe(token)
    }

    /// Publish on the engine's bus. Plugins use this for their own topics.
    pub fn emit(&self, topic: &str, signal: &Signal) -> bool {
        self.inner.bus.publish(topic, signal)
    }

    // --- Operations ---

    /// Deep-merge `patch` into the live options and announce the result.
    pub fn update_opt(&self, patch: Value) -> Result<Options, EngineError> {
        self.ensure_live()?;
        let merged = self.inner.options.borrow().merged(patch)?;
        *self.inner.options.borrow_mut() = merged.clone();
        debug!(engine = %self.inner.id, "options updated");
        self.emit(topic::UPDATED_OPT, &Signal::Options(merged.clone()));
        Ok(merged)
    }

    /// Clear the whole surface.
    pub fn clear_canvas(&self) -> Result<(), EngineError> {
        self.ensure_live()?;
        self.inner.context.clear_rect(Rect::from_size(self.inner.surface.size()));
        Ok(())
    }

    /// Translate a client position into surface-local coordinates.
    ///
    /// The surface position is measured on every call; layout may have moved it.
    pub fn to_canvas_pos(&self, client: Point) -> Result<Point, EngineError> {
        self.ensure_live()?;
        Ok(client.offset_from(self.inner.surface.bounding_rect().origin()))
    }

    /// Unbind input, unmount the surface, announce `DESTORY`, clear the bus.
    ///
    /// Any pending single click and an unfinished plugin chain are cancelled.
    /// Calling this again does nothing.
    pub fn destroy(&self) {
        if self.lifecycle() == Lifecycle::Destroyed {
            return;
        }
        self.set_lifecycle(Lifecycle::Destroyed);

        self.inner.pointer.borrow_mut().clear();
        if let Some(chain) = self.inner.chain.borrow_mut().take() {
            chain.abort();
        }

        let teardowns = std::mem::take(&mut *self.inner.teardowns.borrow_mut());
        let unbound = teardowns.len();
        for teardown in teardowns {
            teardown.run();
        }
        self.inner.container.remove_surface(&self.inner.surface);

        self.emit(topic::DESTORY, &Signal::Empty);
        self.inner.bus.clear_all();
        info!(engine = %self.inner.id, unbound, "engine destroyed");
    }

    // --- Internals ---

    fn ensure_live(&self) -> Result<(), EngineError> {
        if self.lifecycle() == Lifecycle::Destroyed {
            return Err(EngineError::Destroyed);
        }
        Ok(())
    }

    fn set_lifecycle(&self, next: Lifecycle) {
        self.inner.lifecycle.send_modify(|state| {
            if *state != Lifecycle::Destroyed {
                *state = next;
            }
        });
    }

    fn spawn_plugin_chain(&self, plugins: Vec<Rc<plugin::Plugin>>) {
        let engine = self.clone();
        let handle = tokio::task::spawn_local(async move {
            engine.set_lifecycle(Lifecycle::PluginsLoading);
            let count = plugins.len();
            let utils = Rc::clone(&engine.inner.utils);
            let loaded = AssertUnwindSafe(plugin::load_all(&engine, plugins, utils))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(PluginError::Panicked(panic_message(payload.as_ref()))));
            match loaded {
                Ok(()) => {
                    engine.set_lifecycle(Lifecycle::Ready);
                    info!(engine = %engine.inner.id, plugins = count, "plugins loaded");
                    engine.emit_detached(topic::PLUGINS_LOADED, &Signal::Empty);
                }
                Err(err) => {
                    error!(engine = %engine.inner.id, error = %err, "plugin chain halted");
                    *engine.inner.plugin_error.borrow_mut() = Some(err);
                    engine.set_lifecycle(Lifecycle::PluginsFailed);
                }
            }
            engine.inner.chain.borrow_mut().take();
        });
        *self.inner.chain.borrow_mut() = Some(handle);
    }

    fn bind(&self, host: &dyn Host) {
        let surface = &self.inner.surface;
        let mut teardowns = vec![
            surface.listen(ListenerKind::Click, self.handler(None, Engine::on_click)),
            surface.listen(ListenerKind::MouseEnter, self.handler(None, Engine::on_enter)),
            surface.listen(ListenerKind::MouseLeave, self.handler(None, Engine::on_leave)),
            host.listen_window(ListenerKind::Click, self.handler(None, Engine::on_window_click)),
        ];
        for touch in [false, true] {
            teardowns.extend([
                surface.listen(ListenerKind::press(touch), self.handler(Some(touch), Engine::on_press)),
                surface.listen(ListenerKind::motion(touch), self.handler(Some(touch), Engine::on_move)),
                host.listen_window(ListenerKind::release(touch), self.handler(Some(touch), Engine::on_release)),
            ]);
        }
        let touch = self.inner.options.borrow().touch_input;
        debug!(engine = %self.inner.id, touch, listeners = teardowns.len(), "input bound");
        self.inner.teardowns.borrow_mut().extend(teardowns);
    }

    /// Wrap an engine method as a host listener holding only a weak reference.
    ///
    /// With `Some(touch)` the listener only acts while the engine's input
    /// mode equals `touch`.
    fn handler(&self, mode: Option<bool>, method: fn(&Engine, &RawEvent)) -> InputHandler {
        let weak = self.downgrade();
        Rc::new(move |raw: &RawEvent| {
            let Some(engine) = weak.upgrade() else { return };
            if engine.lifecycle() == Lifecycle::Destroyed {
                return;
            }
            if mode.is_some_and(|touch| touch != engine.inner.options.borrow().touch_input) {
                return;
            }
            method(&engine, raw);
        })
    }

    /// Publish from a spawned task. There is no host listener to unwind
    /// into, so a panicking subscriber is logged instead.
    fn emit_detached(&self, topic: &str, signal: &Signal) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.emit(topic, signal))) {
            error!(engine = %self.inner.id, topic, panic = %panic_message(payload.as_ref()), "subscriber panicked");
        }
    }

    fn normalize(&self, raw: &RawEvent, phase: &'static str) -> PointerEvent {
        let touch = self.inner.options.borrow().touch_input;
        let ev = input::normalize(raw, touch);
        if ev.is_synthetic() {
            debug!(engine = %self.inner.id, phase, "touch event without touch point; using zero position");
        }
        ev
    }

    fn on_press(&self, raw: &RawEvent) {
        let ev = self.normalize(raw, "press");
        self.inner.pointer.borrow_mut().down_position = ev.client;
        self.emit(topic::MOUSEDOWN, &Signal::Pointer(ev));
    }

    fn on_release(&self, raw: &RawEvent) {
        let ev = self.normalize(raw, "release");
        self.inner.pointer.borrow_mut().up_position = ev.client;
        self.emit(topic::MOUSEUP, &Signal::Pointer(ev));
    }

    fn on_move(&self, raw: &RawEvent) {
        let ev = self.normalize(raw, "move");
        self.emit(topic::MOUSEMOVE, &Signal::Pointer(ev));
    }

    fn on_enter(&self, raw: &RawEvent) {
        self.emit(topic::MOUSEENTER, &Signal::Pointer(PointerEvent::mouse(raw.client_x, raw.client_y)));
    }

    fn on_leave(&self, raw: &RawEvent) {
        self.emit(topic::MOUSELEAVE, &Signal::Pointer(PointerEvent::mouse(raw.client_x, raw.client_y)));
    }

    fn on_window_click(&self, raw: &RawEvent) {
        self.emit(topic::WINDOW_CLICK, &Signal::Pointer(PointerEvent::mouse(raw.client_x, raw.client_y)));
    }

    fn on_click(&self, raw: &RawEvent) {
        let ev = PointerEvent::mouse(raw.client_x, raw.client_y);
        let window = self.inner.options.borrow().double_click_window();
        let outcome = {
            let mut pointer = self.inner.pointer.borrow_mut();
            pointer.cancel_pending_click();
            pointer.clicks.register(Instant::now(), window)
        };

        match outcome {
            ClickOutcome::Double => {
                debug!(engine = %self.inner.id, "double click");
                self.emit(topic::DOUBLE_CLICK, &Signal::Pointer(ev));
            }
            ClickOutcome::Pending => {
                let weak = self.downgrade();
                let timer = tokio::task::spawn_local(async move {
                    tokio::time::sleep(window).await;
                    if let Some(engine) = weak.upgrade() {
                        engine.inner.pointer.borrow_mut().pending_click = None;
                        engine.emit_detached(topic::CLICK, &Signal::Pointer(ev));
                    }
                });
                self.inner.pointer.borrow_mut().pending_click = Some(timer);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

fn resolve_container(container: &ContainerRef, host: &dyn Host) -> Result<Rc<dyn Container>, EngineError> {
    match container {
        ContainerRef::Element(element) => Ok(Rc::clone(element)),
        ContainerRef::Selector(selector) if selector.trim().is_empty() => Err(EngineError::MissingContainer),
        ContainerRef::Selector(selector) => host
            .resolve(selector)
            .ok_or_else(|| EngineError::UnresolvedContainer { selector: selector.clone() }),
    }
}
