use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentData, Schema};
use crate::entity::Entity;
use crate::error::ListenerResult;

/// Lifecycle step a [`ComponentEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    /// A component was attached to an entity that did not hold it.
    Add,
    /// An existing component was replaced or changed in place.
    Update,
    /// A component was detached.
    Remove,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "ADD"),
            Self::Update => write!(f, "UPDATE"),
            Self::Remove => write!(f, "REMOVE"),
        }
    }
}

/// Notification that one component of one entity changed.
///
/// Borrows the current value straight from the store; nothing is copied.
/// Only exists for the duration of a dispatch.
pub struct ComponentEvent<'a, S: Schema> {
    /// What happened.
    pub kind: EventKind,
    /// The entity whose component changed.
    pub entity: Entity,
    /// Which component changed.
    pub name: S::Name,
    component: Option<&'a dyn ComponentData>,
}

impl<'a, S: Schema> ComponentEvent<'a, S> {
    /// Event carrying the post-change value. Used for ADD and UPDATE.
    pub fn with_value(
        kind: EventKind,
        entity: Entity,
        name: S::Name,
        component: &'a dyn ComponentData,
    ) -> Self {
        Self {
            kind,
            entity,
            name,
            component: Some(component),
        }
    }

    /// REMOVE event. Carries no value.
    pub fn removed(entity: Entity, name: S::Name) -> Self {
        Self {
            kind: EventKind::Remove,
            entity,
            name,
            component: None,
        }
    }

    /// The value as `T`, if this event is about `T` and carries a value.
    pub fn component<T: Component<S>>(&self) -> Option<&'a T> {
        if self.name != T::NAME {
            return None;
        }
        self.component?.as_any().downcast_ref::<T>()
    }

    /// The value as an untyped object.
    pub fn data(&self) -> Option<&'a dyn ComponentData> {
        self.component
    }
}

impl<S: Schema> Clone for ComponentEvent<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Schema> Copy for ComponentEvent<'_, S> {}

impl<S: Schema> fmt::Debug for ComponentEvent<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentEvent")
            .field("kind", &self.kind)
            .field("entity", &self.entity)
            .field("name", &self.name)
            .field("component", &self.component)
            .finish()
    }
}

/// Token returned when subscribing. Pass it to `unsubscribe` to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Callback<S> = Box<dyn FnMut(&ComponentEvent<'_, S>) -> ListenerResult + Send>;

struct Listener<S: Schema> {
    id: u64,
    /// `None` listens to every component.
    scope: Option<S::Name>,
    callback: Callback<S>,
}

/// Synchronous fan-out of component events to registered listeners.
///
/// Listeners run in registration order. A listener that returns an error or
/// panics is logged and skipped; delivery continues with the next one.
pub struct EventBus<S: Schema> {
    listeners: Vec<Listener<S>>,
    next_id: u64,
    faults: u64,
}

impl<S: Schema> EventBus<S> {
    /// Create a bus with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 1,
            faults: 0,
        }
    }

    /// Listen to every event.
    pub fn subscribe_all<F>(&mut self, callback: F) -> Subscription
    where
        F: FnMut(&ComponentEvent<'_, S>) -> ListenerResult + Send + 'static,
    {
        self.register(None, Box::new(callback))
    }

    /// Listen to events about the component called `name` only.
    pub fn subscribe_for<F>(&mut self, name: S::Name, callback: F) -> Subscription
    where
        F: FnMut(&ComponentEvent<'_, S>) -> ListenerResult + Send + 'static,
    {
        self.register(Some(name), Box::new(callback))
    }

    fn register(&mut self, scope: Option<S::Name>, callback: Callback<S>) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            scope,
            callback,
        });
        match scope {
            Some(name) => log::debug!("listener {id} subscribed to {name}"),
            None => log::debug!("listener {id} subscribed to all components"),
        }
        Subscription(id)
    }

    /// Detach a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != subscription.0);
        let removed = self.listeners.len() != before;
        if removed {
            log::debug!("listener {} unsubscribed", subscription.0);
        }
        removed
    }

    /// Drop every listener.
    pub fn clear_all(&mut self) {
        log::debug!("clearing {} listeners", self.listeners.len());
        self.listeners.clear();
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// How many listener invocations failed since the bus was created.
    pub fn fault_count(&self) -> u64 {
        self.faults
    }

    /// Deliver `event` to every matching listener before returning.
    pub fn emit(&mut self, event: &ComponentEvent<'_, S>) {
        log::trace!("{} {} on {}", event.kind, event.name, event.entity);
        for listener in &mut self.listeners {
            if listener.scope.is_some_and(|name| name != event.name) {
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (listener.callback)(event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    self.faults += 1;
                    log::warn!(
                        "listener {} failed on {} {} for {}: {err}",
                        listener.id,
                        event.kind,
                        event.name,
                        event.entity
                    );
                }
                Err(payload) => {
                    self.faults += 1;
                    log::error!(
                        "listener {} panicked on {} {} for {}: {}",
                        listener.id,
                        event.kind,
                        event.name,
                        event.entity,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
    }
}

impl<S: Schema> Default for EventBus<S> {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
