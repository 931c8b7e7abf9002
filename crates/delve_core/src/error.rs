//! # Store Error Types
//!
//! All errors that can occur in the entity store.

use thiserror::Error;

use crate::ecs::{ComponentKind, EntityId};
use crate::spatial::LocationKey;

/// Errors that can occur when mutating the entity store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The entity was destroyed, or the handle's generation is stale.
    #[error("entity {0} is not alive")]
    StaleEntity(EntityId),

    /// The entity lacks a component the operation needs.
    #[error("entity {entity} has no {kind:?} component")]
    MissingComponent {
        /// Entity that was inspected.
        entity: EntityId,
        /// Kind that was expected.
        kind: ComponentKind,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure to parse a [`LocationKey`] from its `x,y,level` string form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationParseError {
    /// Not exactly three comma-separated fields.
    #[error("expected `x,y,level`, got {0:?}")]
    WrongArity(String),

    /// A field is not a signed 32-bit integer.
    #[error("invalid coordinate {0:?}")]
    BadCoordinate(String),
}

/// A disagreement between Position components and the spatial index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexViolation {
    /// The index holds an entry the entity's Position does not back.
    Orphaned {
        /// Entity found in the index.
        entity: EntityId,
        /// Bucket it was found in.
        at: LocationKey,
    },
    /// The entity has a Position but is missing from that bucket.
    Missing {
        /// Entity with the Position.
        entity: EntityId,
        /// Bucket it should be in.
        at: LocationKey,
    },
}
