//! Per-component value tables and the store that owns them.

use std::collections::HashMap;

use crate::component::{Component, ComponentData, Schema};
use crate::entity::{Entity, EntityAllocator};

/// Entity → value mapping for a single component type.
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: HashMap<Entity, T>,
}

impl<T> Table<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    /// Value stored for `entity`.
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.rows.get(&entity)
    }

    /// Mutable value stored for `entity`.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.rows.get_mut(&entity)
    }

    /// Insert or overwrite. Returns the previous value.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        self.rows.insert(entity, value)
    }

    /// Remove and return the value for `entity`.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.rows.remove(&entity)
    }

    /// Whether `entity` has a row here.
    pub fn contains(&self, entity: Entity) -> bool {
        self.rows.contains_key(&entity)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate `(entity, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.rows.iter().map(|(e, v)| (*e, v))
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Name-keyed access to a table whose value type is not known statically.
///
/// Used by the operations that work across components: whole-entity removal,
/// name-based queries, and dumps.
pub trait ErasedTable<S: Schema> {
    /// Whether `entity` has a row here.
    fn contains(&self, entity: Entity) -> bool;

    /// Remove the row for `entity`. Returns whether a row was removed.
    fn delete(&mut self, entity: Entity) -> bool;

    /// Number of rows.
    fn len(&self) -> usize;

    /// Whether the table has no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every entity holding this component, in unspecified order.
    fn entities(&self) -> Vec<Entity>;

    /// Borrow the stored value as an object.
    fn data(&self, entity: Entity) -> Option<&dyn ComponentData>;

    /// Clone the stored value into the schema's tagged value.
    fn value(&self, entity: Entity) -> Option<S::Value>;
}

impl<S: Schema, T: Component<S>> ErasedTable<S> for Table<T> {
    fn contains(&self, entity: Entity) -> bool {
        Table::contains(self, entity)
    }

    fn delete(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn len(&self) -> usize {
        Table::len(self)
    }

    fn entities(&self) -> Vec<Entity> {
        self.rows.keys().copied().collect()
    }

    fn data(&self, entity: Entity) -> Option<&dyn ComponentData> {
        self.get(entity).map(|v| v as &dyn ComponentData)
    }

    fn value(&self, entity: Entity) -> Option<S::Value> {
        self.get(entity).cloned().map(T::into_value)
    }
}

/// Whether [`ComponentStore::set_component`] created or replaced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The entity did not hold the component before.
    Inserted,
    /// An existing value was overwritten.
    Overwrote,
}

/// Owns every component value of one world.
///
/// Never fails: missing entities and components show up as `None`, `false`
/// or empty results. Ids are not validated, so components may be attached to
/// handles the allocator never issued.
pub struct ComponentStore<S: Schema> {
    allocator: EntityAllocator,
    tables: S::Tables,
}

impl<S: Schema> ComponentStore<S> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            tables: S::Tables::default(),
        }
    }

    /// Issue the next entity handle.
    ///
    /// Returns [`Entity::NONE`] once the id space is exhausted; see
    /// [`try_create_entity`](Self::try_create_entity).
    pub fn create_entity(&mut self) -> Entity {
        self.try_create_entity().unwrap_or_else(|| {
            log::error!("entity ids exhausted, returning Entity::NONE");
            Entity::NONE
        })
    }

    /// Issue the next entity handle, or `None` if no id is left.
    pub fn try_create_entity(&mut self) -> Option<Entity> {
        self.allocator.allocate()
    }

    /// Raw id of the next handle [`create_entity`](Self::create_entity) returns.
    pub fn next_entity(&self) -> u64 {
        self.allocator.peek()
    }

    /// Make sure `raw` and everything below it are never issued.
    pub fn reserve_through(&mut self, raw: u64) {
        self.allocator.advance_past(raw);
    }

    /// Insert or overwrite the `T` component of `entity`.
    ///
    /// The table for `T` is allocated on first use.
    pub fn set_component<T: Component<S>>(&mut self, entity: Entity, value: T) -> Insertion {
        let table = T::table_slot(&mut self.tables).get_or_insert_with(Table::new);
        match table.insert(entity, value) {
            Some(_) => Insertion::Overwrote,
            None => Insertion::Inserted,
        }
    }

    /// The `T` component of `entity`.
    pub fn get_component<T: Component<S>>(&self, entity: Entity) -> Option<&T> {
        T::table(&self.tables)?.get(entity)
    }

    /// Mutable access to the `T` component of `entity`.
    ///
    /// Writes through this reference are invisible to listeners until the
    /// caller announces them.
    pub fn get_component_mut<T: Component<S>>(&mut self, entity: Entity) -> Option<&mut T> {
        T::table_slot(&mut self.tables).as_mut()?.get_mut(entity)
    }

    /// Remove and return the `T` component of `entity`.
    pub fn take_component<T: Component<S>>(&mut self, entity: Entity) -> Option<T> {
        T::table_slot(&mut self.tables).as_mut()?.remove(entity)
    }

    /// Remove the component called `name` from `entity`.
    pub fn delete_component(&mut self, entity: Entity, name: S::Name) -> bool {
        S::table_mut(&mut self.tables, name).is_some_and(|t| t.delete(entity))
    }

    /// Remove `entity` from every table. Returns the names it actually held,
    /// in schema declaration order.
    pub fn delete_entity(&mut self, entity: Entity) -> Vec<S::Name> {
        let mut removed = Vec::new();
        for &name in S::NAMES {
            if self.delete_component(entity, name) {
                removed.push(name);
            }
        }
        removed
    }

    /// Whether `entity` holds the component called `name`.
    pub fn has(&self, entity: Entity, name: S::Name) -> bool {
        self.erased(name).is_some_and(|t| t.contains(entity))
    }

    /// Typed table for `T`, if anything was ever stored under it.
    pub fn table<T: Component<S>>(&self) -> Option<&Table<T>> {
        T::table(&self.tables)
    }

    /// Name-keyed table view, if the table was ever allocated.
    pub fn erased(&self, name: S::Name) -> Option<&dyn ErasedTable<S>> {
        S::table(&self.tables, name)
    }

    /// Whether a table for `name` was ever allocated.
    pub fn has_table(&self, name: S::Name) -> bool {
        self.erased(name).is_some()
    }

    /// Number of entities holding the component called `name`.
    pub fn table_len(&self, name: S::Name) -> usize {
        self.erased(name).map_or(0, |t| t.len())
    }

    /// Every entity holding at least one component, ascending.
    pub fn entities(&self) -> Vec<Entity> {
        let mut all: Vec<Entity> = S::NAMES
            .iter()
            .filter_map(|name| self.erased(*name))
            .flat_map(|t| t.entities())
            .collect();
        all.sort_unstable();
        all.dedup();
        all
    }

    /// Every component value, grouped by name in declaration order, entities
    /// ascending within each group. Names with no rows are skipped.
    pub fn dump(&self) -> Vec<(S::Name, Vec<(Entity, S::Value)>)> {
        let mut out = Vec::new();
        for &name in S::NAMES {
            let Some(table) = self.erased(name) else {
                continue;
            };
            let mut entities = table.entities();
            if entities.is_empty() {
                continue;
            }
            entities.sort_unstable();
            let rows = entities
                .into_iter()
                .filter_map(|e| table.value(e).map(|v| (e, v)))
                .collect();
            out.push((name, rows));
        }
        out
    }

    /// Drop every table. The id counter keeps running.
    pub fn clear(&mut self) {
        self.tables = S::Tables::default();
    }
}

impl<S: Schema> Default for ComponentStore<S> {
    fn default() -> Self {
        Self::new()
    }
}
