//! Joins over component tables.
//!
//! A query names a set of components and yields every entity holding all of
//! them, together with the values in the order the caller asked for them.
//!
//! ```text
//! world.query::<(Transform, Velocity)>()
//!
//! 1. names = [Transform, Velocity]
//! 2. seed  = smallest of the two tables (or the first, see QuerySeed)
//! 3. keep seed entities present in every other table
//! 4. fetch (&Transform, &Velocity) for each survivor
//! ```
//!
//! Results are collected into an owned `Vec` before they are returned, so the
//! caller can keep the entity list around while mutating the world.

use serde::{Deserialize, Serialize};

use crate::component::{Component, Schema};
use crate::entity::Entity;
use crate::store::ComponentStore;

/// Which table a multi-component query scans first.
///
/// Both strategies return the same set; they only differ in how many
/// candidates are inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySeed {
    /// Scan the table with the fewest rows.
    #[default]
    SmallestTable,
    /// Scan the table of the first requested component.
    FirstComponent,
}

/// A set of component types that can be fetched together.
///
/// Implemented for tuples of up to eight component types. The unit type is
/// the empty query and never matches anything.
pub trait Query<S: Schema> {
    /// What one matching entity yields.
    type Item<'w>
    where
        S: 'w;

    /// Requested component names, in request order.
    fn names() -> Vec<S::Name>;

    /// Fetch the item for `entity`, or `None` if a component is missing.
    fn fetch<'w>(store: &'w ComponentStore<S>, entity: Entity) -> Option<Self::Item<'w>>;
}

impl<S: Schema> Query<S> for () {
    type Item<'w>
        = ()
    where
        S: 'w;

    fn names() -> Vec<S::Name> {
        Vec::new()
    }

    fn fetch<'w>(_store: &'w ComponentStore<S>, _entity: Entity) -> Option<Self::Item<'w>> {
        Some(())
    }
}

macro_rules! impl_query_tuple {
    ($($C:ident),+) => {
        impl<S: Schema, $($C: Component<S>),+> Query<S> for ($($C,)+) {
            type Item<'w>
                = ($(&'w $C,)+)
            where
                S: 'w;

            fn names() -> Vec<S::Name> {
                vec![$($C::NAME),+]
            }

            fn fetch<'w>(store: &'w ComponentStore<S>, entity: Entity) -> Option<Self::Item<'w>> {
                Some(($(store.get_component::<$C>(entity)?,)+))
            }
        }
    };
}

impl_query_tuple!(A);
impl_query_tuple!(A, B);
impl_query_tuple!(A, B, C);
impl_query_tuple!(A, B, C, D);
impl_query_tuple!(A, B, C, D, E);
impl_query_tuple!(A, B, C, D, E, F);
impl_query_tuple!(A, B, C, D, E, F, G);
impl_query_tuple!(A, B, C, D, E, F, G, H);

/// Entities holding every component in `names`, ascending.
///
/// An empty `names` matches nothing.
pub fn matching_entities<S: Schema>(
    store: &ComponentStore<S>,
    names: &[S::Name],
    seed: QuerySeed,
) -> Vec<Entity> {
    let Some(&first) = names.first() else {
        return Vec::new();
    };

    let seed_name = match seed {
        QuerySeed::FirstComponent => first,
        QuerySeed::SmallestTable => {
            // A table that was never allocated has no rows, so nothing can match.
            if names.iter().any(|n| !store.has_table(*n)) {
                return Vec::new();
            }
            names
                .iter()
                .copied()
                .min_by_key(|n| store.table_len(*n))
                .unwrap_or(first)
        }
    };

    let Some(seed_table) = store.erased(seed_name) else {
        return Vec::new();
    };

    let mut candidates = seed_table.entities();
    candidates.retain(|entity| {
        names
            .iter()
            .filter(|n| **n != seed_name)
            .all(|n| store.has(*entity, *n))
    });
    candidates.sort_unstable();
    candidates
}

/// Run a typed query. Items follow the request order of `Q`.
pub fn run<S: Schema, Q: Query<S>>(
    store: &ComponentStore<S>,
    seed: QuerySeed,
) -> Vec<(Entity, Q::Item<'_>)> {
    matching_entities(store, &Q::names(), seed)
        .into_iter()
        .filter_map(|entity| Q::fetch(store, entity).map(|item| (entity, item)))
        .collect()
}
