// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notifications scoped to a document.

extern crate alloc;
use alloc::{rc::Rc, vec::Vec};

use core::{
    cell::{Cell, RefCell},
    fmt,
};

use peniko::kurbo::Rect;

/// Something about an element changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementEvent {
    /// Transform or geometry changed.
    GeometryChanged {
        /// Paint bounds before the change, for repainting the vacated area.
        previous_paint_bbox: Option<Rect>,
    },
    /// Style changed.
    StyleChanged {
        /// Paint bounds before the change.
        previous_paint_bbox: Option<Rect>,
    },
}

/// Handle for removing a listener from [`DocumentEvents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&ElementEvent)>;

/// Listeners for changes of the elements in one document.
///
/// Listeners may subscribe or unsubscribe from inside a callback; the change
/// takes effect from the next [`DocumentEvents::emit`].
#[derive(Default)]
pub struct DocumentEvents {
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_id: Cell<u64>,
}

impl fmt::Debug for DocumentEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentEvents")
            .field("listeners", &self.listeners.borrow().len())
            .finish_non_exhaustive()
    }
}

impl DocumentEvents {
    /// Make a registry without listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`, returning a handle to unsubscribe it.
    pub fn subscribe(&self, listener: impl Fn(&ElementEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(i, _)| *i != id);
        listeners.len() != before
    }

    /// Deliver `event` to every listener, in subscription order.
    pub fn emit(&self, event: &ElementEvent) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    /// `true` if nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_receive_until_unsubscribed() {
        let events = DocumentEvents::new();
        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        let id = events.subscribe(move |_| counter.set(counter.get() + 1));

        let event = ElementEvent::GeometryChanged {
            previous_paint_bbox: None,
        };
        events.emit(&event);
        assert_eq!(seen.get(), 1);

        assert!(events.unsubscribe(id));
        assert!(!events.unsubscribe(id));
        events.emit(&event);
        assert_eq!(seen.get(), 1);
        assert!(events.is_empty());
    }

    #[test]
    fn listeners_can_unsubscribe_while_notified() {
        let events = Rc::new(DocumentEvents::new());
        let seen = Rc::new(Cell::new(0));
        let own_id = Rc::new(Cell::new(None));

        let registry = Rc::downgrade(&events);
        let (counter, id_cell) = (seen.clone(), own_id.clone());
        let id = events.subscribe(move |_| {
            counter.set(counter.get() + 1);
            if let (Some(document), Some(id)) = (registry.upgrade(), id_cell.get()) {
                document.unsubscribe(id);
                document.subscribe(|_| {});
            }
        });
        own_id.set(Some(id));

        let event = ElementEvent::StyleChanged {
            previous_paint_bbox: None,
        };
        events.emit(&event);
        events.emit(&event);
        assert_eq!(seen.get(), 1);
        assert!(!events.is_empty());
    }
}
