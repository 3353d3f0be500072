//! Desktop event contract: a closed set of lifecycle events plus the
//! synchronous subscription surface exposed through [`crate::Desktop`].

use std::{cell::RefCell, rc::Rc};

use crate::bounds::Bounds;
use crate::model::{WindowId, WindowRecord};

/// Everything the engine announces to listeners. Emission is synchronous and
/// happens after the corresponding state mutation is complete, so handlers
/// may immediately call back into the engine and observe consistent state.
#[derive(Debug, Clone, PartialEq)]
pub enum DesktopEvent<C> {
    WindowCreated(WindowRecord<C>),
    WindowClosed {
        window_id: WindowId,
        window: WindowRecord<C>,
    },
    WindowFocused {
        window_id: WindowId,
    },
    WindowBlurred {
        window_id: WindowId,
    },
    WindowBounds {
        window_id: WindowId,
        bounds: Bounds,
        old_bounds: Bounds,
    },
    WindowMinimized {
        window_id: WindowId,
    },
    WindowMaximized {
        window_id: WindowId,
    },
    WindowRestored {
        window_id: WindowId,
    },
    DesktopContextMenu {
        x: f64,
        y: f64,
    },
    WindowContextMenu {
        window_id: WindowId,
        x: f64,
        y: f64,
    },
}

/// Discriminant used to subscribe to one event variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    WindowCreated,
    WindowClosed,
    WindowFocused,
    WindowBlurred,
    WindowBounds,
    WindowMinimized,
    WindowMaximized,
    WindowRestored,
    DesktopContextMenu,
    WindowContextMenu,
}

impl<C> DesktopEvent<C> {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::WindowCreated(_) => EventKind::WindowCreated,
            Self::WindowClosed { .. } => EventKind::WindowClosed,
            Self::WindowFocused { .. } => EventKind::WindowFocused,
            Self::WindowBlurred { .. } => EventKind::WindowBlurred,
            Self::WindowBounds { .. } => EventKind::WindowBounds,
            Self::WindowMinimized { .. } => EventKind::WindowMinimized,
            Self::WindowMaximized { .. } => EventKind::WindowMaximized,
            Self::WindowRestored { .. } => EventKind::WindowRestored,
            Self::DesktopContextMenu { .. } => EventKind::DesktopContextMenu,
            Self::WindowContextMenu { .. } => EventKind::WindowContextMenu,
        }
    }
}

/// Subscription token returned by [`crate::Desktop::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub(crate) u64);

/// Event callback. Receives the engine so handlers can call back into it;
/// re-entrant emission is supported, unbounded recursion is the caller's
/// problem.
pub type EventHandler<C> = Rc<RefCell<dyn FnMut(&mut crate::Desktop<C>, &DesktopEvent<C>)>>;

pub(crate) struct HandlerEntry<C> {
    pub(crate) id: HandlerId,
    pub(crate) kind: EventKind,
    pub(crate) callback: EventHandler<C>,
}

/// Registration-ordered handler table keyed by event kind.
pub(crate) struct EventBus<C> {
    next_id: u64,
    handlers: Vec<HandlerEntry<C>>,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self {
            next_id: 1,
            handlers: Vec::new(),
        }
    }
}

impl<C> EventBus<C> {
    pub(crate) fn subscribe(&mut self, kind: EventKind, callback: EventHandler<C>) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.push(HandlerEntry {
            id,
            kind,
            callback,
        });
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|entry| entry.id != id);
        self.handlers.len() != before
    }

    /// Snapshot of the callbacks registered for `kind`, in registration
    /// order. Taken before invocation so handlers can (un)subscribe while an
    /// emission is in flight.
    pub(crate) fn handlers_for(&self, kind: EventKind) -> Vec<EventHandler<C>> {
        self.handlers
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| Rc::clone(&entry.callback))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }
}
