//! Demo scene: drifting bodies that slowly lose health.
//!
//! Spawning is driven by a seeded RNG so a given seed always produces the
//! same run.

use std::fmt;

use kw_core::{Entity, World, component_schema};
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Position on the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
}

/// Units per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub dx: f64,
    pub dy: f64,
}

/// Hit points and how many are lost each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub decay: i32,
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

impl fmt::Display for Velocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:+.2}, {:+.2})", self.dx, self.dy)
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (-{}/tick)", self.current, self.decay)
    }
}

component_schema! {
    /// Components of the demo scene.
    pub schema Scene(SceneComponent, SceneValue, SceneTables) {
        Transform => Transform,
        Velocity => Velocity,
        Health => Health,
    }
}

/// Spawn `count` entities. Roughly one in four is static and gets no
/// velocity.
pub fn spawn(world: &mut World<Scene>, rng: &mut StdRng, count: usize) -> Vec<Entity> {
    (0..count)
        .map(|_| {
            let entity = world.create_entity();
            world.add_component(
                entity,
                Transform {
                    x: rng.random_range(-50.0..50.0),
                    y: rng.random_range(-50.0..50.0),
                },
            );
            if !rng.random_bool(0.25) {
                world.add_component(
                    entity,
                    Velocity {
                        dx: rng.random_range(-2.0..2.0),
                        dy: rng.random_range(-2.0..2.0),
                    },
                );
            }
            world.add_component(
                entity,
                Health {
                    current: rng.random_range(5..=30),
                    decay: rng.random_range(1..=3),
                },
            );
            entity
        })
        .collect()
}

/// Move every entity with a velocity by `velocity * dt`.
///
/// Updates in place and announces each change. Returns how many moved.
pub fn movement(world: &mut World<Scene>, dt: f64) -> usize {
    let movers = world.query_entities::<(Transform, Velocity)>();
    for &entity in &movers {
        let Some(velocity) = world.get_component::<Velocity>(entity).copied() else {
            continue;
        };
        if let Some(transform) = world.get_component_mut::<Transform>(entity) {
            transform.x += velocity.dx * dt;
            transform.y += velocity.dy * dt;
        }
        world.mark_component_updated::<Transform>(entity);
    }
    movers.len()
}

/// Apply one tick of health decay to every entity with health.
pub fn decay(world: &mut World<Scene>) {
    for entity in world.query_entities::<(Health,)>() {
        world.modify_component::<Health, _>(entity, |health| {
            health.current = (health.current - health.decay).max(0);
        });
    }
}

/// Remove `fallen` entities. Returns how many were actually removed.
pub fn despawn(world: &mut World<Scene>, fallen: impl IntoIterator<Item = Entity>) -> usize {
    fallen
        .into_iter()
        .filter(|entity| !world.remove_entity(*entity).is_empty())
        .count()
}
