use crate::entity::Entity;

/// Alias for `Result<T, KwError>`.
pub type KwResult<T> = Result<T, KwError>;

/// Errors raised while loading or saving world state.
///
/// The live component API never fails; these only come out of snapshot
/// handling.
#[derive(Debug, thiserror::Error)]
pub enum KwError {
    /// A snapshot was written by an incompatible format version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the snapshot.
        found: u32,
        /// Version this build reads and writes.
        expected: u32,
    },

    /// A snapshot refers to an entity handle it could not have issued.
    #[error("invalid entity {entity} in snapshot: {reason}")]
    InvalidEntity {
        /// The offending handle.
        entity: Entity,
        /// What is wrong with it.
        reason: String,
    },

    /// A snapshot's id counter leaves nothing to issue.
    #[error("snapshot next_entity {next_entity} leaves no entity ids to issue")]
    ExhaustedIds {
        /// The counter found in the snapshot.
        next_entity: u64,
    },

    /// The clock holds NaN or an infinity, which JSON cannot carry.
    #[error("clock reading {0} cannot be saved; only finite times are supported")]
    NonFiniteTime(f64),

    /// A snapshot lists the same component twice for one entity.
    #[error("entity {entity} lists component {component} more than once")]
    DuplicateComponent {
        /// The entity carrying the duplicate.
        entity: Entity,
        /// Display name of the repeated component.
        component: String,
    },

    /// JSON encoding or decoding failed.
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure reported by an event listener.
///
/// Returned from a listener to signal that it could not handle an event. The
/// bus logs it and moves on to the next listener.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

/// What a listener returns.
pub type ListenerResult = Result<(), ListenerError>;
