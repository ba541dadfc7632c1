//! Host collaborators the engine is built against.
//!
//! DESIGN
//! ======
//! The engine never touches a page directly. It asks a [`Host`] to resolve a
//! container, create a surface, and deliver window-level input; it asks the
//! [`Surface`] for its context, its current position, and surface-level
//! input. Every listener registration hands back a [`Teardown`], which the
//! engine keeps until destroy.
//!
//! [`crate::headless`] implements these traits in memory.

use std::fmt;
use std::rc::Rc;

use crate::geom::{Rect, Size};
use crate::input::RawEvent;

/// Host input event kinds the engine listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Click,
    MouseDown,
    TouchStart,
    MouseMove,
    TouchMove,
    MouseUp,
    TouchEnd,
    MouseEnter,
    MouseLeave,
}

impl ListenerKind {
    /// Press listener for the given input mode.
    #[must_use]
    pub fn press(touch: bool) -> Self {
        if touch { Self::TouchStart } else { Self::MouseDown }
    }

    /// Move listener for the given input mode.
    #[must_use]
    pub fn motion(touch: bool) -> Self {
        if touch { Self::TouchMove } else { Self::MouseMove }
    }

    /// Release listener for the given input mode.
    #[must_use]
    pub fn release(touch: bool) -> Self {
        if touch { Self::TouchEnd } else { Self::MouseUp }
    }
}

/// Listener callback registered with the host.
pub type InputHandler = Rc<dyn Fn(&RawEvent)>;

/// One-shot handle that removes a single host listener.
pub struct Teardown(Option<Box<dyn FnOnce()>>);

impl Teardown {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    /// Remove the listener. Consumes the handle.
    pub fn run(mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Teardown").field(&self.0.is_some()).finish()
    }
}

/// 2-D drawing context of a surface. The engine only ever clears it.
pub trait DrawingContext {
    fn clear_rect(&self, rect: Rect);
}

/// A sized drawing surface placed inside a container.
pub trait Surface {
    /// Backing-store size fixed at creation.
    fn size(&self) -> Size;

    /// Current position and size in client coordinates.
    fn bounding_rect(&self) -> Rect;

    /// The 2-D context, if the surface supports one.
    fn context(&self) -> Option<Rc<dyn DrawingContext>>;

    /// Register a surface-level listener.
    fn listen(&self, kind: ListenerKind, handler: InputHandler) -> Teardown;
}

/// The host element the surface is mounted in.
pub trait Container {
    fn bounding_rect(&self) -> Rect;

    fn append_surface(&self, surface: Rc<dyn Surface>);

    fn remove_surface(&self, surface: &Rc<dyn Surface>);
}

/// The page hosting one or more engines.
pub trait Host {
    /// Look up a container by selector.
    fn resolve(&self, selector: &str) -> Option<Rc<dyn Container>>;

    /// Create a detached surface with the given backing size.
    fn create_surface(&self, size: Size) -> Rc<dyn Surface>;

    /// Register a window-level listener.
    fn listen_window(&self, kind: ListenerKind, handler: InputHandler) -> Teardown;
}
