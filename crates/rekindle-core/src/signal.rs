//! Event signal primitive.
//!
//! A [`Signal`] delivers fired payloads synchronously to its subscribers in
//! subscription order. Signals are cheap handles: clones share one
//! subscriber list, so an owner can hand out copies for firing or
//! subscribing without sharing the rest of its state.
//!
//! Delivery iterates a snapshot of the subscriber list, so handlers may
//! connect and disconnect subscriptions (including their own) while a fire
//! is in progress. A subscription disconnected mid-fire is skipped; one
//! connected mid-fire is first delivered to on the next fire.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

struct Slot<T> {
    id: u64,
    connected: Rc<Cell<bool>>,
    handler: Rc<dyn Fn(&T)>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            connected: Rc::clone(&self.connected),
            handler: Rc::clone(&self.handler),
        }
    }
}

struct Registry<T> {
    next_id: Cell<u64>,
    slots: RefCell<Vec<Slot<T>>>,
}

impl<T> Registry<T> {
    fn remove(&self, id: u64) {
        self.slots.borrow_mut().retain(|slot| slot.id != id);
    }
}

/// An event that fires payloads of type `T` to its subscribers.
pub struct Signal<T> {
    registry: Rc<Registry<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<T: 'static> Signal<T> {
    /// Create a signal with no subscribers.
    pub fn new() -> Self {
        Self {
            registry: Rc::new(Registry {
                next_id: Cell::new(0),
                slots: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Subscribe to every subsequent fire until disconnected.
    pub fn connect(&self, handler: impl Fn(&T) + 'static) -> Subscription {
        let (id, connected) = self.register(Rc::new(handler));
        self.subscription(id, connected)
    }

    /// Subscribe for exactly one delivery.
    ///
    /// The subscription disconnects itself before the handler is invoked,
    /// so a re-entrant fire from inside the handler cannot deliver to it
    /// again.
    pub fn once(&self, handler: impl Fn(&T) + 'static) -> Subscription {
        let id = self.next_id();
        let connected = Rc::new(Cell::new(true));

        let flag = Rc::clone(&connected);
        let registry = Rc::downgrade(&self.registry);
        let wrapper = Rc::new(move |payload: &T| {
            if !flag.replace(false) {
                return;
            }
            if let Some(registry) = registry.upgrade() {
                registry.remove(id);
            }
            handler(payload);
        });

        self.registry.slots.borrow_mut().push(Slot {
            id,
            connected: Rc::clone(&connected),
            handler: wrapper,
        });
        self.subscription(id, connected)
    }

    /// Fire synchronously to all currently connected subscribers, in
    /// subscription order.
    pub fn fire(&self, payload: T) {
        let snapshot: Vec<Slot<T>> = self.registry.slots.borrow().clone();
        for slot in snapshot {
            if !slot.connected.get() {
                continue;
            }
            (slot.handler)(&payload);
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.registry.slots.borrow().len()
    }

    fn next_id(&self) -> u64 {
        let id = self.registry.next_id.get();
        self.registry.next_id.set(id + 1);
        id
    }

    fn register(&self, handler: Rc<dyn Fn(&T)>) -> (u64, Rc<Cell<bool>>) {
        let id = self.next_id();
        let connected = Rc::new(Cell::new(true));
        self.registry.slots.borrow_mut().push(Slot {
            id,
            connected: Rc::clone(&connected),
            handler,
        });
        (id, connected)
    }

    fn subscription(&self, id: u64, connected: Rc<Cell<bool>>) -> Subscription {
        let registry = Rc::downgrade(&self.registry);
        Subscription {
            connected,
            detach: Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.remove(id);
                }
            }),
        }
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.registry.slots.borrow().len())
            .finish()
    }
}

/// Exclusively owned handle to one subscription on a [`Signal`].
///
/// Dropping the handle does not disconnect: teardown is explicit, and a
/// subscription with no live handle keeps receiving fires. Once-style
/// subscriptions disconnect themselves after their single delivery.
pub struct Subscription {
    connected: Rc<Cell<bool>>,
    detach: Box<dyn Fn()>,
}

impl Subscription {
    /// Whether this subscription can still receive deliveries.
    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    /// Disconnect. Idempotent: disconnecting twice is a no-op.
    pub fn disconnect(&self) {
        if self.connected.replace(false) {
            (self.detach)();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("connected", &self.is_connected())
            .finish()
    }
}
