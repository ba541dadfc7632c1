//! In-memory host for driving an engine without a page.
//!
//! Containers are registered by selector with a fixed bounding box. Surfaces
//! record every clear and keep their listeners in a table that tests (or any
//! non-browser input source) dispatch into. `simulate_click` and
//! `simulate_tap` replay the event order a browser produces for one click.

#[cfg(test)]
#[path = "headless_test.rs"]
mod headless_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::geom::{Point, Rect, Size};
use crate::host::{Container, DrawingContext, Host, InputHandler, ListenerKind, Surface, Teardown};
use crate::input::{RawEvent, TouchPoint};

// =============================================================================
// LISTENER TABLE
// =============================================================================

#[derive(Default)]
struct Listeners {
    last_id: Cell<u64>,
    entries: RefCell<Vec<(u64, ListenerKind, InputHandler)>>,
}

impl Listeners {
    fn add(self: &Rc<Self>, kind: ListenerKind, handler: InputHandler) -> Teardown {
        let id = self.last_id.get() + 1;
        self.last_id.set(id);
        self.entries.borrow_mut().push((id, kind, handler));
        let table = Rc::downgrade(self);
        Teardown::new(move || {
            if let Some(table) = table.upgrade() {
                table.entries.borrow_mut().retain(|(entry, _, _)| *entry != id);
            }
        })
    }

    /// Invoke every handler for `kind`. Returns how many ran.
    fn dispatch(&self, kind: ListenerKind, raw: &RawEvent) -> usize {
        let handlers: Vec<InputHandler> = self
            .entries
            .borrow()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| Rc::clone(h))
            .collect();
        for handler in &handlers {
            handler(raw);
        }
        handlers.len()
    }

    fn count(&self) -> usize {
        self.entries.borrow().len()
    }

    fn count_kind(&self, kind: ListenerKind) -> usize {
        self.entries.borrow().iter().filter(|(_, k, _)| *k == kind).count()
    }
}

// =============================================================================
// CONTEXT / SURFACE / CONTAINER
// =============================================================================

/// Drawing context that records the rectangles it was asked to clear.
#[derive(Debug, Default)]
pub struct HeadlessContext {
    clears: RefCell<Vec<Rect>>,
}

impl HeadlessContext {
    #[must_use]
    pub fn clears(&self) -> Vec<Rect> {
        self.clears.borrow().clone()
    }
}

impl DrawingContext for HeadlessContext {
    fn clear_rect(&self, rect: Rect) {
        self.clears.borrow_mut().push(rect);
    }
}

/// A surface whose position can be moved to mimic layout changes.
pub struct HeadlessSurface {
    size: Size,
    origin: Cell<Point>,
    context: Option<Rc<HeadlessContext>>,
    listeners: Rc<Listeners>,
}

impl HeadlessSurface {
    /// Move the surface's top-left corner in client coordinates.
    pub fn move_to(&self, left: f64, top: f64) {
        self.origin.set(Point::new(left, top));
    }

    /// Deliver a surface-level event. Returns how many listeners ran.
    pub fn dispatch(&self, kind: ListenerKind, raw: &RawEvent) -> usize {
        self.listeners.dispatch(kind, raw)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.count()
    }

    #[must_use]
    pub fn listener_count_for(&self, kind: ListenerKind) -> usize {
        self.listeners.count_kind(kind)
    }

    #[must_use]
    pub fn headless_context(&self) -> Option<Rc<HeadlessContext>> {
        self.context.clone()
    }
}

impl Surface for HeadlessSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn bounding_rect(&self) -> Rect {
        let origin = self.origin.get();
        Rect::new(origin.x, origin.y, self.size.width, self.size.height)
    }

    fn context(&self) -> Option<Rc<dyn DrawingContext>> {
        self.context.clone().map(|ctx| ctx as Rc<dyn DrawingContext>)
    }

    fn listen(&self, kind: ListenerKind, handler: InputHandler) -> Teardown {
        self.listeners.add(kind, handler)
    }
}

/// A container with a fixed bounding box.
pub struct HeadlessContainer {
    rect: Rect,
    children: RefCell<Vec<Rc<dyn Surface>>>,
}

impl HeadlessContainer {
    #[must_use]
    pub fn new(rect: Rect) -> Rc<Self> {
        Rc::new(Self { rect, children: RefCell::new(Vec::new()) })
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }
}

impl Container for HeadlessContainer {
    fn bounding_rect(&self) -> Rect {
        self.rect
    }

    fn append_surface(&self, surface: Rc<dyn Surface>) {
        self.children.borrow_mut().push(surface);
    }

    fn remove_surface(&self, surface: &Rc<dyn Surface>) {
        self.children
            .borrow_mut()
            .retain(|child| !std::ptr::addr_eq(Rc::as_ptr(child), Rc::as_ptr(surface)));
    }
}

// =============================================================================
// HOST
// =============================================================================

/// Page stand-in: a selector table, created surfaces, and window listeners.
pub struct HeadlessHost {
    containers: RefCell<HashMap<String, Rc<HeadlessContainer>>>,
    surfaces: RefCell<Vec<Rc<HeadlessSurface>>>,
    window: Rc<Listeners>,
    provide_context: Cell<bool>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            containers: RefCell::new(HashMap::new()),
            surfaces: RefCell::new(Vec::new()),
            window: Rc::new(Listeners::default()),
            provide_context: Cell::new(true),
        }
    }

    /// Register a container reachable through `selector`.
    pub fn add_container(&self, selector: &str, rect: Rect) -> Rc<HeadlessContainer> {
        let container = HeadlessContainer::new(rect);
        self.containers.borrow_mut().insert(selector.to_owned(), Rc::clone(&container));
        container
    }

    /// Make future surfaces report no 2-D context.
    pub fn disable_context(&self) {
        self.provide_context.set(false);
    }

    /// The most recently created surface.
    #[must_use]
    pub fn last_surface(&self) -> Option<Rc<HeadlessSurface>> {
        self.surfaces.borrow().last().cloned()
    }

    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.surfaces.borrow().len()
    }

    /// Deliver a window-level event. Returns how many listeners ran.
    pub fn dispatch_window(&self, kind: ListenerKind, raw: &RawEvent) -> usize {
        self.window.dispatch(kind, raw)
    }

    #[must_use]
    pub fn window_listener_count(&self) -> usize {
        self.window.count()
    }

    /// Replay a mouse click on `surface` at client `(x, y)`: press, release
    /// (window), click, then the window click it bubbles to.
    pub fn simulate_click(&self, surface: &HeadlessSurface, x: f64, y: f64) {
        let raw = RawEvent::mouse(x, y);
        surface.dispatch(ListenerKind::MouseDown, &raw);
        self.dispatch_window(ListenerKind::MouseUp, &raw);
        surface.dispatch(ListenerKind::Click, &raw);
        self.dispatch_window(ListenerKind::Click, &raw);
    }

    /// Replay a one-finger tap. `touchend` carries no active touch, as in a browser.
    pub fn simulate_tap(&self, surface: &HeadlessSurface, x: f64, y: f64) {
        surface.dispatch(ListenerKind::TouchStart, &RawEvent::touch(vec![TouchPoint::new(0, x, y)]));
        self.dispatch_window(ListenerKind::TouchEnd, &RawEvent::touch(Vec::new()));
        let click = RawEvent::mouse(x, y);
        surface.dispatch(ListenerKind::Click, &click);
        self.dispatch_window(ListenerKind::Click, &click);
    }
}

impl Host for HeadlessHost {
    fn resolve(&self, selector: &str) -> Option<Rc<dyn Container>> {
        self.containers
            .borrow()
            .get(selector)
            .map(|c| Rc::clone(c) as Rc<dyn Container>)
    }

    fn create_surface(&self, size: Size) -> Rc<dyn Surface> {
        let context = self.provide_context.get().then(|| Rc::new(HeadlessContext::default()));
        let surface = Rc::new(HeadlessSurface {
            size,
            origin: Cell::new(Point::default()),
            context,
            listeners: Rc::new(Listeners::default()),
        });
        self.surfaces.borrow_mut().push(Rc::clone(&surface));
        surface
    }

    fn listen_window(&self, kind: ListenerKind, handler: InputHandler) -> Teardown {
        self.window.add(kind, handler)
    }
}
