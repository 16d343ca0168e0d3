use crate::clock::WorldClock;
use crate::component::{Component, Schema};
use crate::config::WorldConfig;
use crate::entity::Entity;
use crate::error::ListenerResult;
use crate::event::{ComponentEvent, EventBus, EventKind, Subscription};
use crate::query::{self, Query};
use crate::store::{ComponentStore, Insertion};

/// The central container. Owns every entity's components, the listeners
/// observing them, and the simulation clock.
///
/// Every mutating call updates the store first and then notifies listeners
/// synchronously, so a listener always sees the post-change state. Nothing
/// here fails: unknown entities and components turn into `None`, `false` or
/// empty results.
pub struct World<S: Schema> {
    store: ComponentStore<S>,
    bus: EventBus<S>,
    clock: WorldClock,
    config: WorldConfig,
}

impl<S: Schema> std::fmt::Debug for World<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.store.entities().len())
            .field("listeners", &self.bus.len())
            .field("time", &self.clock.elapsed())
            .finish()
    }
}

impl<S: Schema> World<S> {
    /// Create an empty world with the default configuration.
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create an empty world.
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            store: ComponentStore::new(),
            bus: EventBus::new(),
            clock: WorldClock::new(config.start_time),
            config,
        }
    }

    /// The configuration this world was created with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Entities and components
    // -----------------------------------------------------------------------

    /// Issue a new entity handle. Handles start at 1 and are never reused.
    ///
    /// Returns [`Entity::NONE`] if the id space is exhausted.
    pub fn create_entity(&mut self) -> Entity {
        self.store.create_entity()
    }

    /// Like [`create_entity`](Self::create_entity), but `None` once no id is
    /// left.
    pub fn try_create_entity(&mut self) -> Option<Entity> {
        self.store.try_create_entity()
    }

    /// Attach `component` to `entity`, replacing any previous value.
    ///
    /// Emits ADD if the entity did not hold the component, UPDATE otherwise,
    /// and returns which one it emitted.
    pub fn add_component<T: Component<S>>(&mut self, entity: Entity, component: T) -> EventKind {
        let kind = match self.store.set_component(entity, component) {
            Insertion::Inserted => EventKind::Add,
            Insertion::Overwrote => EventKind::Update,
        };
        if let Some(current) = self.store.get_component::<T>(entity) {
            self.bus
                .emit(&ComponentEvent::with_value(kind, entity, T::NAME, current));
        }
        kind
    }

    /// The `T` component of `entity`. No events.
    pub fn get_component<T: Component<S>>(&self, entity: Entity) -> Option<&T> {
        self.store.get_component(entity)
    }

    /// Mutable access for in-place updates. Follow up with
    /// [`mark_component_updated`](Self::mark_component_updated) so listeners
    /// hear about the change.
    pub fn get_component_mut<T: Component<S>>(&mut self, entity: Entity) -> Option<&mut T> {
        self.store.get_component_mut(entity)
    }

    /// Whether `entity` holds a `T`.
    pub fn has_component<T: Component<S>>(&self, entity: Entity) -> bool {
        self.store.has(entity, T::NAME)
    }

    /// Announce that the `T` component of `entity` was changed in place.
    ///
    /// Emits UPDATE with the current value. Emits nothing and returns false
    /// if the entity does not hold a `T`.
    pub fn mark_component_updated<T: Component<S>>(&mut self, entity: Entity) -> bool {
        self.mark_updated_by_name(entity, T::NAME)
    }

    /// Name-keyed form of [`mark_component_updated`](Self::mark_component_updated).
    pub fn mark_updated_by_name(&mut self, entity: Entity, name: S::Name) -> bool {
        let Some(current) = self.store.erased(name).and_then(|t| t.data(entity)) else {
            return false;
        };
        self.bus
            .emit(&ComponentEvent::with_value(EventKind::Update, entity, name, current));
        true
    }

    /// Mutate the `T` component of `entity` through `f`, then emit UPDATE.
    ///
    /// Returns false without calling `f` if the component is absent.
    pub fn modify_component<T, F>(&mut self, entity: Entity, f: F) -> bool
    where
        T: Component<S>,
        F: FnOnce(&mut T),
    {
        let Some(component) = self.store.get_component_mut::<T>(entity) else {
            return false;
        };
        f(component);
        self.mark_component_updated::<T>(entity)
    }

    /// Detach the `T` component of `entity` and return it.
    ///
    /// Emits REMOVE only if something was removed.
    pub fn remove_component<T: Component<S>>(&mut self, entity: Entity) -> Option<T> {
        let removed = self.store.take_component::<T>(entity)?;
        self.bus.emit(&ComponentEvent::removed(entity, T::NAME));
        Some(removed)
    }

    /// Name-keyed form of [`remove_component`](Self::remove_component).
    pub fn remove_component_by_name(&mut self, entity: Entity, name: S::Name) -> bool {
        if !self.store.delete_component(entity, name) {
            return false;
        }
        self.bus.emit(&ComponentEvent::removed(entity, name));
        true
    }

    /// Detach every component of `entity`.
    ///
    /// Emits one REMOVE per component actually held and returns their names.
    pub fn remove_entity(&mut self, entity: Entity) -> Vec<S::Name> {
        let removed = self.store.delete_entity(entity);
        for &name in &removed {
            self.bus.emit(&ComponentEvent::removed(entity, name));
        }
        removed
    }

    /// Remove every entity, emitting REMOVE for each component.
    ///
    /// Listeners and the clock are left alone. Returns how many entities were
    /// removed.
    pub fn clear_entities(&mut self) -> usize {
        let entities = self.store.entities();
        for &entity in &entities {
            self.remove_entity(entity);
        }
        self.store.clear();
        log::debug!("cleared {} entities", entities.len());
        entities.len()
    }

    /// Every entity holding at least one component, ascending.
    pub fn entities(&self) -> Vec<Entity> {
        self.store.entities()
    }

    /// Number of entities holding the component called `name`.
    pub fn component_count(&self, name: S::Name) -> usize {
        self.store.table_len(name)
    }

    /// Every component value grouped by name. Meant for persistence.
    pub fn dump(&self) -> Vec<(S::Name, Vec<(Entity, S::Value)>)> {
        self.store.dump()
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &ComponentStore<S> {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut ComponentStore<S> {
        &mut self.store
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Every entity holding all components of `Q`, with their values in the
    /// order `Q` lists them. `Q = ()` matches nothing.
    pub fn query<Q: Query<S>>(&self) -> Vec<(Entity, Q::Item<'_>)> {
        query::run::<S, Q>(&self.store, self.config.query_seed)
    }

    /// Like [`query`](Self::query) but returns only the entities, so the
    /// caller can mutate the world while walking them.
    pub fn query_entities<Q: Query<S>>(&self) -> Vec<Entity> {
        self.matching_entities(&Q::names())
    }

    /// Entities holding every component in `names`. Empty `names` matches
    /// nothing.
    pub fn matching_entities(&self, names: &[S::Name]) -> Vec<Entity> {
        query::matching_entities(&self.store, names, self.config.query_seed)
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    /// Call `callback` for every component event.
    pub fn on_component_event<F>(&mut self, callback: F) -> Subscription
    where
        F: FnMut(&ComponentEvent<'_, S>) -> ListenerResult + Send + 'static,
    {
        self.bus.subscribe_all(callback)
    }

    /// Call `callback` for events about the component called `name` only.
    pub fn on_component_event_for<F>(&mut self, name: S::Name, callback: F) -> Subscription
    where
        F: FnMut(&ComponentEvent<'_, S>) -> ListenerResult + Send + 'static,
    {
        self.bus.subscribe_for(name, callback)
    }

    /// Detach a listener. Returns false if it was already detached.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.bus.unsubscribe(subscription)
    }

    /// Detach every listener. Entities and components are kept.
    pub fn clear_all_listeners(&mut self) {
        self.bus.clear_all();
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.bus.len()
    }

    /// How many listener calls failed or panicked so far.
    pub fn listener_faults(&self) -> u64 {
        self.bus.fault_count()
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Accumulated simulation time.
    pub fn time(&self) -> f64 {
        self.clock.elapsed()
    }

    /// Add `dt` to the clock. Any sign is accepted.
    pub fn update_time(&mut self, dt: f64) -> f64 {
        self.clock.advance(dt)
    }

    /// The clock itself.
    pub fn clock(&self) -> &WorldClock {
        &self.clock
    }

    pub(crate) fn clock_mut(&mut self) -> &mut WorldClock {
        &mut self.clock
    }
}

impl<S: Schema> Default for World<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::component::fixtures::*;
    use crate::error::ListenerError;
    use crate::query::QuerySeed;

    type Log = Arc<Mutex<Vec<(EventKind, Entity, GameComponent)>>>;

    fn recording_world() -> (World<Game>, Log) {
        let mut world = World::new();
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        world.on_component_event(move |event| {
            sink.lock()
                .unwrap()
                .push((event.kind, event.entity, event.name));
            Ok(())
        });
        (world, log)
    }

    fn taken(log: &Log) -> Vec<(EventKind, Entity, GameComponent)> {
        std::mem::take(&mut *log.lock().unwrap())
    }

    #[test]
    fn entities_are_unique_and_start_at_one() {
        let mut world = World::<Game>::new();
        let ids: Vec<u64> = (0..5).map(|_| world.create_entity().id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn add_then_overwrite_emits_add_then_update() {
        let (mut world, log) = recording_world();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let values = Arc::clone(&seen);
        world.on_component_event_for(GameComponent::Health, move |event| {
            if let Some(hp) = event.component::<Health>() {
                values.lock().unwrap().push(hp.0);
            }
            Ok(())
        });

        let e = world.create_entity();
        assert_eq!(world.add_component(e, Health(10)), EventKind::Add);
        assert_eq!(world.add_component(e, Health(7)), EventKind::Update);

        assert_eq!(
            taken(&log),
            vec![
                (EventKind::Add, e, GameComponent::Health),
                (EventKind::Update, e, GameComponent::Health),
            ]
        );
        assert_eq!(*seen.lock().unwrap(), vec![10, 7]);
        assert_eq!(world.get_component::<Health>(e), Some(&Health(7)));
    }

    #[test]
    fn remove_component_emits_once() {
        let (mut world, log) = recording_world();
        let e = world.create_entity();
        world.add_component(e, Health(3));
        taken(&log);

        assert_eq!(world.remove_component::<Health>(e), Some(Health(3)));
        assert!(world.get_component::<Health>(e).is_none());
        assert_eq!(taken(&log), vec![(EventKind::Remove, e, GameComponent::Health)]);

        assert_eq!(world.remove_component::<Health>(e), None);
        assert!(!world.remove_component_by_name(e, GameComponent::Health));
        assert!(taken(&log).is_empty());
    }

    #[test]
    fn remove_entity_emits_one_remove_per_component() {
        let (mut world, log) = recording_world();
        let e = world.create_entity();
        world.add_component(e, Transform { x: 0.0, y: 0.0 });
        world.add_component(e, Velocity { dx: 1.0, dy: 1.0 });
        taken(&log);

        let removed = world.remove_entity(e);
        assert_eq!(removed, vec![GameComponent::Transform, GameComponent::Velocity]);

        let mut events = taken(&log);
        events.sort_by_key(|(_, _, name)| *name);
        assert_eq!(
            events,
            vec![
                (EventKind::Remove, e, GameComponent::Transform),
                (EventKind::Remove, e, GameComponent::Velocity),
            ]
        );
        assert!(world.get_component::<Transform>(e).is_none());
        assert!(world.get_component::<Velocity>(e).is_none());

        let bare = world.create_entity();
        assert!(world.remove_entity(bare).is_empty());
        assert!(taken(&log).is_empty());
    }

    #[test]
    fn query_join_matches_only_full_sets() {
        let mut world = World::<Game>::new();
        let e1 = world.create_entity();
        let e2 = world.create_entity();
        let e3 = world.create_entity();
        world.add_component(e1, Transform { x: 1.0, y: 0.0 });
        world.add_component(e1, Velocity { dx: 1.0, dy: 0.0 });
        world.add_component(e2, Transform { x: 2.0, y: 0.0 });
        world.add_component(e3, Velocity { dx: 3.0, dy: 0.0 });

        let both = world.query::<(Transform, Velocity)>();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].0, e1);

        assert!(world.query::<()>().is_empty());

        let only_t: Vec<(Entity, f64)> = world
            .query::<(Transform,)>()
            .into_iter()
            .map(|(e, (t,))| (e, t.x))
            .collect();
        assert_eq!(only_t, vec![(e1, 1.0), (e2, 2.0)]);
    }

    #[test]
    fn first_component_seed_gives_same_answer() {
        let mut world = World::<Game>::with_config(
            WorldConfig::default().with_query_seed(QuerySeed::FirstComponent),
        );
        let e = world.create_entity();
        world.add_component(e, Transform { x: 0.0, y: 0.0 });
        world.add_component(e, Health(1));
        let other = world.create_entity();
        world.add_component(other, Health(2));
        assert_eq!(world.query_entities::<(Health, Transform)>(), vec![e]);
    }

    #[test]
    fn in_place_mutation_is_announced_explicitly() {
        let (mut world, log) = recording_world();
        let last = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&last);
        world.on_component_event_for(GameComponent::Transform, move |event| {
            *sink.lock().unwrap() = event.component::<Transform>().copied();
            Ok(())
        });

        let e = world.create_entity();
        world.add_component(e, Transform { x: 0.0, y: 0.0 });
        taken(&log);

        if let Some(t) = world.get_component_mut::<Transform>(e) {
            t.x = 42.0;
        }
        assert!(taken(&log).is_empty());

        assert!(world.mark_component_updated::<Transform>(e));
        assert_eq!(taken(&log), vec![(EventKind::Update, e, GameComponent::Transform)]);
        assert_eq!(*last.lock().unwrap(), Some(Transform { x: 42.0, y: 0.0 }));

        assert!(!world.mark_component_updated::<Health>(e));
        assert!(taken(&log).is_empty());
    }

    #[test]
    fn modify_component_mutates_and_announces() {
        let (mut world, log) = recording_world();
        let e = world.create_entity();
        world.add_component(e, Health(5));
        taken(&log);

        assert!(world.modify_component::<Health, _>(e, |hp| hp.0 -= 2));
        assert_eq!(world.get_component::<Health>(e), Some(&Health(3)));
        assert_eq!(taken(&log), vec![(EventKind::Update, e, GameComponent::Health)]);

        assert!(!world.modify_component::<Label, _>(e, |_| unreachable!()));
        assert!(taken(&log).is_empty());
    }

    #[test]
    fn failing_listener_is_isolated() {
        let mut world = World::<Game>::new();
        world.on_component_event(|_| Err(ListenerError::new("always fails")));
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        world.on_component_event(move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let e = world.create_entity();
        world.add_component(e, Health(1));
        world.add_component(e, Health(2));
        world.remove_component::<Health>(e);

        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(world.listener_faults(), 3);
    }

    #[test]
    fn panicking_listener_is_isolated() {
        let mut world = World::<Game>::new();
        world.on_component_event(|_| panic!("observer bug"));
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        world.on_component_event(move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let e = world.create_entity();
        world.add_component(e, Label("x".into()));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(world.get_component::<Label>(e), Some(&Label("x".into())));
    }

    #[test]
    fn panics_never_escape_mutating_calls() {
        let mut world = World::<Game>::new();
        world.on_component_event(|_| panic!("observer bug"));
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        world.on_component_event(move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let e = world.create_entity();
        world.add_component(e, Health(3));
        world.add_component(e, Health(2));
        world.mark_component_updated::<Health>(e);
        world.modify_component::<Health, _>(e, |hp| hp.0 -= 1);
        world.remove_component::<Health>(e);
        world.add_component(e, Label("x".into()));
        world.remove_entity(e);
        world.add_component(e, Health(1));
        world.clear_entities();

        assert_eq!(count.load(Ordering::SeqCst), 9);
        assert_eq!(world.listener_faults(), 9);
        assert!(world.entities().is_empty());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut world = World::<Game>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let sub = world.on_component_event(move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let e = world.create_entity();
        world.add_component(e, Health(1));
        assert!(world.unsubscribe(sub));
        world.add_component(e, Health(2));
        world.remove_entity(e);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(world.listener_count(), 0);
    }

    #[test]
    fn scoped_listener_ignores_other_components() {
        let mut world = World::<Game>::new();
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&names);
        world.on_component_event_for(GameComponent::Transform, move |event| {
            sink.lock().unwrap().push(event.name);
            Ok(())
        });

        let e = world.create_entity();
        world.add_component(e, Velocity { dx: 0.0, dy: 0.0 });
        world.add_component(e, Health(1));
        world.add_component(e, Transform { x: 0.0, y: 0.0 });
        world.remove_entity(e);

        assert_eq!(
            *names.lock().unwrap(),
            vec![GameComponent::Transform, GameComponent::Transform]
        );
    }

    #[test]
    fn clock_accumulates() {
        let mut world = World::<Game>::new();
        assert_eq!(world.time(), 0.0);
        world.update_time(10.0);
        world.update_time(20.0);
        world.update_time(5.0);
        assert_eq!(world.time(), 35.0);
        assert_eq!(world.clock().updates(), 3);
    }

    #[test]
    fn clock_honours_start_time() {
        let world = World::<Game>::with_config(WorldConfig::default().with_start_time(100.0));
        assert_eq!(world.time(), 100.0);
    }

    #[test]
    fn clear_entities_keeps_listeners_and_ids_monotonic() {
        let (mut world, log) = recording_world();
        let a = world.create_entity();
        let b = world.create_entity();
        world.add_component(a, Health(1));
        world.add_component(b, Health(1));
        world.add_component(b, Label("b".into()));
        taken(&log);

        assert_eq!(world.clear_entities(), 2);
        assert_eq!(taken(&log).len(), 3);
        assert!(world.entities().is_empty());
        assert_eq!(world.listener_count(), 1);
        assert_eq!(world.create_entity().id(), 3);
    }

    #[test]
    fn clear_all_listeners_keeps_entities() {
        let (mut world, _log) = recording_world();
        let e = world.create_entity();
        world.add_component(e, Health(1));
        world.clear_all_listeners();
        assert_eq!(world.listener_count(), 0);
        assert_eq!(world.component_count(GameComponent::Health), 1);
    }

    #[test]
    fn query_entities_allows_mutation_while_walking() {
        let mut world = World::<Game>::new();
        for i in 0..4 {
            let e = world.create_entity();
            world.add_component(e, Transform { x: f64::from(i), y: 0.0 });
            world.add_component(e, Velocity { dx: 1.0, dy: 2.0 });
        }
        for e in world.query_entities::<(Transform, Velocity)>() {
            let Some(v) = world.get_component::<Velocity>(e).copied() else {
                continue;
            };
            world.modify_component::<Transform, _>(e, |t| {
                t.x += v.dx;
                t.y += v.dy;
            });
            let spawned = world.create_entity();
            world.add_component(spawned, Transform { x: -1.0, y: -1.0 });
        }
        let moved: Vec<f64> = world
            .query::<(Transform, Velocity)>()
            .into_iter()
            .map(|(_, (t, _))| t.x)
            .collect();
        assert_eq!(moved, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(world.component_count(GameComponent::Transform), 8);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut world = World::<Game>::new();
        let ghost = Entity::from_raw(77);
        assert!(world.get_component::<Health>(ghost).is_none());
        assert!(world.remove_entity(ghost).is_empty());
        assert!(!world.mark_updated_by_name(ghost, GameComponent::Label));
        assert!(world.matching_entities(&[GameComponent::Label]).is_empty());
    }
}
