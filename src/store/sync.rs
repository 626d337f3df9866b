//! In-process publish/subscribe used to keep several mounted views of the
//! persisted store in step.
//!
//! Delivery is re-entrancy guarded: a `publish` made from inside a handler is
//! queued and delivered after the current round finishes, so handlers never
//! nest and no value is dropped.

use crate::domain::{Project, Todo};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use tracing::trace;

type Handler<T> = Rc<dyn Fn(&T)>;

struct Registry<T> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
    pending: VecDeque<T>,
    delivering: bool,
}

/// A single named channel
pub struct Broadcaster<T> {
    name: &'static str,
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T: 'static> Broadcaster<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
                pending: VecDeque::new(),
                delivering: false,
            })),
        }
    }

    /// Register a handler for every future publish
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, Rc::new(handler)));

        let weak: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.registry);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    registry.borrow_mut().handlers.retain(|(hid, _)| *hid != id);
                }
            })),
        }
    }

    /// Deliver `value` to every subscriber
    pub fn publish(&self, value: T) {
        {
            let mut registry = self.registry.borrow_mut();
            registry.pending.push_back(value);
            if registry.delivering {
                trace!(channel = self.name, "Publish queued behind active delivery");
                return;
            }
            registry.delivering = true;
        }
        let _guard = DeliveryGuard(&self.registry);

        loop {
            // Never hold the registry borrow while a handler runs
            let next = {
                let mut registry = self.registry.borrow_mut();
                match registry.pending.pop_front() {
                    Some(value) => {
                        let handlers: Vec<Handler<T>> =
                            registry.handlers.iter().map(|(_, h)| h.clone()).collect();
                        Some((value, handlers))
                    }
                    None => {
                        registry.delivering = false;
                        None
                    }
                }
            };

            let Some((value, handlers)) = next else {
                break;
            };

            trace!(channel = self.name, subscribers = handlers.len(), "Delivering");
            for handler in handlers {
                handler(&value);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().handlers.len()
    }
}

/// Clears the delivering flag even if a handler panics
struct DeliveryGuard<'a, T>(&'a RefCell<Registry<T>>);

impl<T> Drop for DeliveryGuard<'_, T> {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.0.try_borrow_mut() {
            registry.delivering = false;
        }
    }
}

/// Handle returned by `subscribe`; the handler is removed when this is dropped
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

/// Named notification channels shared by the whole application
pub struct Signals {
    pub todos_updated: Broadcaster<Vec<Todo>>,
    pub projects_updated: Broadcaster<Vec<Project>>,
    pub mute_toggled: Broadcaster<bool>,
    pub song_changed: Broadcaster<usize>,
    pub image_changed: Broadcaster<String>,
}

impl Signals {
    pub fn new() -> Self {
        Self {
            todos_updated: Broadcaster::new("todosUpdated"),
            projects_updated: Broadcaster::new("projectsUpdated"),
            mute_toggled: Broadcaster::new("muteToggled"),
            song_changed: Broadcaster::new("songChanged"),
            image_changed: Broadcaster::new("imageChanged"),
        }
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::new()
    }
}
