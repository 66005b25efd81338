//! Entity/component composition model.
//!
//! Every gameplay object (vehicle, track piece, checkpoint) is an entity:
//! identity + transform + a set of named, independently attachable
//! components + hierarchy links. Entities live in an [`EntityStore`] arena
//! and are addressed by [`EntityId`]; systems that hold a store drive
//! their entities — the engine never touches them directly.
//!
//! Submodules:
//! - [`component`] – the optional-capability [`Component`] trait
//! - [`store`] – the arena, hierarchy management, and snapshots
//! - [`transform`] – local position/rotation/scale

pub mod component;
pub mod store;
pub mod transform;

pub use component::Component;
pub use store::{Entity, EntityId, EntitySnapshot, EntityStore};
pub use transform::Transform;
