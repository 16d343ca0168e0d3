//! Core of Kernwelt: an in-memory entity-component store with change
//! notification and multi-component queries.
//!
//! Components are declared once with [`component_schema!`], which produces a
//! closed set of component names and one lazily allocated table per
//! component. A [`World`] owns the tables, an [`EventBus`] that tells
//! listeners about every ADD, UPDATE and REMOVE, and a [`WorldClock`].
//!
//! ```
//! use kw_core::{World, component_schema};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Position(f64, f64);
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Speed(f64, f64);
//!
//! component_schema! {
//!     schema Demo(DemoComponent, DemoValue, DemoTables) {
//!         Position => Position,
//!         Speed => Speed,
//!     }
//! }
//!
//! let mut world = World::<Demo>::new();
//! let e = world.create_entity();
//! world.add_component(e, Position(0.0, 0.0));
//! world.add_component(e, Speed(1.0, 0.5));
//!
//! for entity in world.query_entities::<(Position, Speed)>() {
//!     let Some(speed) = world.get_component::<Speed>(entity).cloned() else { continue };
//!     world.modify_component::<Position, _>(entity, |p| {
//!         p.0 += speed.0;
//!         p.1 += speed.1;
//!     });
//! }
//! assert_eq!(world.get_component::<Position>(e).map(|p| p.0), Some(1.0));
//! ```

/// Global simulation time.
pub mod clock;
/// Schema and component traits plus the `component_schema!` macro.
pub mod component;
/// World configuration.
pub mod config;
/// Entity handles and the id allocator.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Component events and the listener bus.
pub mod event;
/// Multi-component joins.
pub mod query;
/// Whole-world persistence.
pub mod snapshot;
/// Per-component tables and the store that owns them.
pub mod store;
/// The facade tying store, events and clock together.
pub mod world;

/// Re-export of [`clock::WorldClock`].
pub use clock::WorldClock;
/// Re-exports of the component traits.
pub use component::{Component, ComponentData, Schema};
/// Re-export of [`config::WorldConfig`].
pub use config::WorldConfig;
/// Re-exports of entity types.
pub use entity::{Entity, EntityAllocator};
/// Re-exports of error types.
pub use error::{KwError, KwResult, ListenerError, ListenerResult};
/// Re-exports of event types.
pub use event::{ComponentEvent, EventBus, EventKind, Subscription};
/// Re-exports of query types.
pub use query::{Query, QuerySeed};
/// Re-exports of snapshot types.
pub use snapshot::{EntitySnapshot, SNAPSHOT_VERSION, WorldSnapshot};
/// Re-exports of storage types.
pub use store::{ComponentStore, Table};
/// Re-export of [`world::World`].
pub use world::World;
