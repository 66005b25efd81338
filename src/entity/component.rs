//! Component trait for entity composition.

use crate::entity::EntityId;

/// A named capability attached to one entity. Every hook defaults to a
/// no-op; a component implements only what it needs.
pub trait Component {
    /// Called when the component is stored on an entity. `owner` is the
    /// back-link; components that need it keep it.
    fn attach(&mut self, _owner: EntityId) {}

    /// Per-simulation-step update, driven by the owning entity.
    fn update(&mut self, _dt: f32) {}

    /// Called when the component is removed or its entity is destroyed.
    fn destroy(&mut self) {}
}
