use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle for a game object. Carries no data of its own.
///
/// Handles are issued by [`EntityAllocator`] starting at 1 and are never
/// reused within one world. The raw value 0 is never issued and is exposed as
/// [`Entity::NONE`] for callers that need a "no entity" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(u64);

impl Entity {
    /// The sentinel handle. No allocator ever returns it.
    pub const NONE: Entity = Entity(0);

    /// Largest raw id an allocator issues. `u64::MAX` stays free so the
    /// counter can always hold "one past the last id".
    pub const MAX_ID: u64 = u64::MAX - 1;

    /// Build a handle from a raw integer.
    ///
    /// The store accepts components on handles it never issued, which keeps
    /// fixtures and replayed saves deterministic.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer behind this handle.
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns true for [`Entity::NONE`].
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source. Starts at 1, never hands out an id twice.
///
/// Ids run from 1 to [`Entity::MAX_ID`]. Once the counter moves past that the
/// allocator is exhausted and [`allocate`](Self::allocate) returns `None`.
#[derive(Debug, Clone)]
pub struct EntityAllocator {
    next: u64,
}

impl EntityAllocator {
    /// Create an allocator whose first id is 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Issue the next unused handle, or `None` if the id space is used up.
    pub fn allocate(&mut self) -> Option<Entity> {
        if self.is_exhausted() {
            return None;
        }
        let entity = Entity(self.next);
        self.next += 1;
        Some(entity)
    }

    /// Whether every issuable id has been handed out or reserved.
    pub fn is_exhausted(&self) -> bool {
        self.next > Entity::MAX_ID
    }

    /// The raw id the next call to [`allocate`](Self::allocate) will return.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Make sure no id up to and including `raw` is issued from now on.
    ///
    /// Never moves the counter backwards. Reserving [`Entity::MAX_ID`] or
    /// above exhausts the allocator.
    pub fn advance_past(&mut self, raw: u64) {
        self.next = self.next.max(raw.saturating_add(1));
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
