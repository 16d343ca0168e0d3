//! Saving and loading whole worlds.
//!
//! A [`WorldSnapshot`] is a plain serde value: the id counter, the clock, and
//! every entity with its components as schema values. Listeners are not part
//! of it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::component::Schema;
use crate::entity::Entity;
use crate::error::{KwError, KwResult};
use crate::world::World;

/// Format version written by [`World::snapshot`].
pub const SNAPSHOT_VERSION: u32 = 1;

/// Complete persisted state of a world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct WorldSnapshot<S: Schema> {
    /// Format version.
    pub version: u32,
    /// Raw id the world would issue next.
    pub next_entity: u64,
    /// Clock reading.
    pub elapsed_time: f64,
    /// Entities ascending, each with its components in declaration order.
    pub entities: Vec<EntitySnapshot<S>>,
}

/// One entity and its components.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct EntitySnapshot<S: Schema> {
    /// The entity handle.
    pub entity: Entity,
    /// Component values held by the entity.
    pub components: Vec<S::Value>,
}

impl<S: Schema> WorldSnapshot<S> {
    /// Pretty-printed JSON.
    ///
    /// Fails with [`KwError::NonFiniteTime`] if the clock is NaN or infinite,
    /// since JSON would turn it into `null` and the file could not be read
    /// back.
    pub fn to_json(&self) -> KwResult<String> {
        self.check_time()?;
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse JSON written by [`to_json`](Self::to_json). Does not validate
    /// the contents; [`World::restore`] does.
    pub fn from_json(json: &str) -> KwResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check that the snapshot can be restored as is.
    pub fn validate(&self) -> KwResult<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(KwError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        self.check_time()?;
        if self.next_entity > Entity::MAX_ID {
            return Err(KwError::ExhaustedIds {
                next_entity: self.next_entity,
            });
        }

        let mut seen = HashSet::new();
        for record in &self.entities {
            let entity = record.entity;
            if entity.is_none() {
                return Err(KwError::InvalidEntity {
                    entity,
                    reason: "id 0 is reserved".to_string(),
                });
            }
            if entity.id() >= self.next_entity {
                return Err(KwError::InvalidEntity {
                    entity,
                    reason: format!("not below next_entity {}", self.next_entity),
                });
            }
            if !seen.insert(entity) {
                return Err(KwError::InvalidEntity {
                    entity,
                    reason: "listed more than once".to_string(),
                });
            }

            let mut names = HashSet::new();
            for value in &record.components {
                let name = S::name_of(value);
                if !names.insert(name) {
                    return Err(KwError::DuplicateComponent {
                        entity,
                        component: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_time(&self) -> KwResult<()> {
        if self.elapsed_time.is_finite() {
            Ok(())
        } else {
            Err(KwError::NonFiniteTime(self.elapsed_time))
        }
    }
}

impl<S: Schema> World<S> {
    /// Capture every entity, the id counter and the clock.
    pub fn snapshot(&self) -> WorldSnapshot<S> {
        let store = self.store();
        let entities = store
            .entities()
            .into_iter()
            .map(|entity| EntitySnapshot {
                entity,
                components: S::NAMES
                    .iter()
                    .filter_map(|name| store.erased(*name)?.value(entity))
                    .collect(),
            })
            .collect();

        WorldSnapshot {
            version: SNAPSHOT_VERSION,
            next_entity: store.next_entity(),
            elapsed_time: self.time(),
            entities,
        }
    }

    /// Replace the world's contents with `snapshot`.
    ///
    /// The snapshot is validated first and the world is left untouched if it
    /// is rejected. Otherwise every current entity is removed (REMOVE events),
    /// the id counter and clock are moved to the saved values, and each saved
    /// component is added again (ADD events). Listeners stay attached.
    pub fn restore(&mut self, snapshot: WorldSnapshot<S>) -> KwResult<()> {
        snapshot.validate()?;

        self.clear_entities();
        self.store_mut()
            .reserve_through(snapshot.next_entity.saturating_sub(1));
        self.clock_mut().set(snapshot.elapsed_time);

        let mut restored = 0usize;
        for record in snapshot.entities {
            for value in record.components {
                S::attach(self, record.entity, value);
                restored += 1;
            }
        }
        log::debug!(
            "restored {restored} components at t={}",
            snapshot.elapsed_time
        );
        Ok(())
    }
}
