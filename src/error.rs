//! Engine error taxonomy.
//!
//! Listener failures and config problems stay `Result<(), String>` at the
//! leaves and are reported through logs; this enum covers the errors that
//! cross the crate boundary and abort the caller's operation.

use thiserror::Error;

use crate::entity::EntityId;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A system's init hook failed. Systems registered after the failing
    /// one are left uninitialized for that call.
    #[error("system `{name}` failed to initialize: {reason}")]
    SystemInit { name: String, reason: String },

    #[error("entity {0} does not exist")]
    EntityNotFound(EntityId),

    /// Attaching `child` under `parent` would make an entity its own
    /// ancestor.
    #[error("attaching entity {child} under {parent} would create a hierarchy cycle")]
    HierarchyCycle { parent: EntityId, child: EntityId },

    #[error("entity id {0} is already present in the store")]
    DuplicateEntityId(EntityId),

    #[error("invalid entity snapshot: {0}")]
    Snapshot(String),
}
