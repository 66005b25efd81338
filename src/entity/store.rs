//! Entity arena, hierarchy management, and snapshots.
//!
//! The store owns every entity and hands out stable [`EntityId`] handles.
//! Hierarchy links are id-based (parent pointer + child list), which keeps
//! the parent/child relation single-parent by construction; acyclicity is
//! enforced with an ancestor walk at [`EntityStore::add_child`] time.
//!
//! Destruction cascades components → children → parent detachment, so no
//! destroyed child stays reachable from a live parent.

use std::fmt;

use log::warn;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use crate::entity::component::Component;
use crate::entity::transform::Transform;
use crate::error::EngineError;
use crate::math::Vec3;

/// Stable handle to an entity in an [`EntityStore`], unique for the
/// entity's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type ChildList = SmallVec<[EntityId; 4]>;

/// A gameplay object: identity, transform, tags, named components, and
/// hierarchy links. Structural mutation (components, hierarchy, destroy)
/// goes through the owning [`EntityStore`].
pub struct Entity {
    id: EntityId,
    kind: String,
    pub transform: Transform,
    pub tags: FxHashSet<String>,
    pub active: bool,
    /// Opaque game-level data carried through snapshots.
    pub metadata: Value,
    components: FxHashMap<String, Box<dyn Component>>,
    children: ChildList,
    parent: Option<EntityId>,
}

impl Entity {
    fn new(id: EntityId, kind: String) -> Self {
        Entity {
            id,
            kind,
            transform: Transform::default(),
            tags: FxHashSet::default(),
            active: true,
            metadata: Value::Null,
            components: FxHashMap::default(),
            children: ChildList::new(),
            parent: None,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Type tag assigned at spawn ("vehicle", "track", ...).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn component(&self, name: &str) -> Option<&dyn Component> {
        self.components.get(name).map(|c| c.as_ref())
    }

    pub fn component_mut(&mut self, name: &str) -> Option<&mut (dyn Component + 'static)> {
        self.components.get_mut(name).map(|c| c.as_mut())
    }

    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}

/// Persisted slice of an entity: identity, transform, tags, active flag,
/// and metadata. Components and hierarchy are runtime wiring rebuilt by
/// factories, not part of the persisted contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: String,
    pub transform: Transform,
    pub tags: Vec<String>,
    pub active: bool,
    #[serde(default)]
    pub metadata: Value,
}

/// Arena owning every entity.
#[derive(Default)]
pub struct EntityStore {
    entities: FxHashMap<EntityId, Entity>,
    next_id: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        EntityStore::default()
    }

    /// Create a new root entity with the given type tag.
    pub fn spawn(&mut self, kind: impl Into<String>) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        self.entities.insert(id, Entity::new(id, kind.into()));
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Store `component` on the entity under a unique name and back-link
    /// it to its owner. A duplicate name is a warning no-op.
    pub fn add_component(
        &mut self,
        id: EntityId,
        name: impl Into<String>,
        mut component: Box<dyn Component>,
    ) {
        let Some(entity) = self.entities.get_mut(&id) else {
            warn!("add_component: entity {} does not exist", id);
            return;
        };
        let name = name.into();
        if entity.components.contains_key(&name) {
            warn!("entity {} already has component `{}`; ignoring", id, name);
            return;
        }
        component.attach(id);
        entity.components.insert(name, component);
    }

    /// Remove a component, running its destroy hook. Returns whether the
    /// component existed.
    pub fn remove_component(&mut self, id: EntityId, name: &str) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        match entity.components.remove(name) {
            Some(mut component) => {
                component.destroy();
                true
            }
            None => false,
        }
    }

    pub fn has_component(&self, id: EntityId, name: &str) -> bool {
        self.entities
            .get(&id)
            .is_some_and(|entity| entity.has_component(name))
    }

    /// Children of `id`; empty for unknown (or destroyed) ids.
    pub fn children(&self, id: EntityId) -> &[EntityId] {
        self.entities
            .get(&id)
            .map(|entity| entity.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.entities.get(&id).and_then(|entity| entity.parent)
    }

    /// Append `child` under `parent`, detaching it from any existing
    /// parent first. Rejects links that would make an entity its own
    /// ancestor.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<(), EngineError> {
        if !self.entities.contains_key(&parent) {
            return Err(EngineError::EntityNotFound(parent));
        }
        if !self.entities.contains_key(&child) {
            return Err(EngineError::EntityNotFound(child));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(EngineError::HierarchyCycle { parent, child });
        }
        self.detach(child);
        if let Some(entity) = self.entities.get_mut(&parent) {
            entity.children.push(child);
        }
        if let Some(entity) = self.entities.get_mut(&child) {
            entity.parent = Some(parent);
        }
        Ok(())
    }

    /// Unlink `child` from `parent`. No-op unless they are actually linked.
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) {
        if self.parent(child) != Some(parent) {
            return;
        }
        self.detach(child);
    }

    /// True when `ancestor` appears on `id`'s parent chain.
    fn is_ancestor(&self, ancestor: EntityId, id: EntityId) -> bool {
        let mut cursor = self.parent(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    fn detach(&mut self, id: EntityId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(entity) = self.entities.get_mut(&parent) {
            entity.children.retain(|c| *c != id);
        }
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.parent = None;
        }
    }

    /// Advance the entity by one simulation step: component updates first,
    /// then children, recursively. Inactive entities (and their subtrees)
    /// are skipped.
    pub fn update(&mut self, id: EntityId, dt: f32) {
        let children: ChildList = {
            let Some(entity) = self.entities.get_mut(&id) else {
                return;
            };
            if !entity.active {
                return;
            }
            for component in entity.components.values_mut() {
                component.update(dt);
            }
            entity.children.clone()
        };
        for child in children {
            self.update(child, dt);
        }
    }

    /// Local position composed with the full ancestor chain; roots return
    /// their local position unchanged.
    pub fn world_position(&self, id: EntityId) -> Vec3 {
        let Some(entity) = self.entities.get(&id) else {
            return Vec3::ZERO;
        };
        match entity.parent {
            Some(parent) => self.world_position(parent) + entity.transform.position,
            None => entity.transform.position,
        }
    }

    /// Destroy the entity and its subtree: components first, then children
    /// recursively, then the parent link, then the entity itself.
    pub fn destroy(&mut self, id: EntityId) {
        {
            let Some(entity) = self.entities.get_mut(&id) else {
                return;
            };
            entity.active = false;
            for (_, mut component) in entity.components.drain() {
                component.destroy();
            }
        }
        let children: ChildList = self
            .entities
            .get(&id)
            .map(|entity| entity.children.clone())
            .unwrap_or_default();
        for child in children {
            self.destroy(child);
        }
        self.detach(id);
        self.entities.remove(&id);
    }

    /// Serialize an entity to its persisted snapshot form.
    pub fn to_json(&self, id: EntityId) -> Option<Value> {
        let entity = self.entities.get(&id)?;
        let mut tags: Vec<String> = entity.tags.iter().cloned().collect();
        tags.sort();
        let snapshot = EntitySnapshot {
            id: entity.id,
            kind: entity.kind.clone(),
            transform: entity.transform,
            tags,
            active: entity.active,
            metadata: entity.metadata.clone(),
        };
        serde_json::to_value(&snapshot).ok()
    }

    /// Recreate an entity from [`EntityStore::to_json`] output, keeping
    /// its persisted identity. The id must not be live in this store.
    pub fn spawn_from_json(&mut self, value: &Value) -> Result<EntityId, EngineError> {
        let snapshot: EntitySnapshot =
            serde_json::from_value(value.clone()).map_err(|e| EngineError::Snapshot(e.to_string()))?;
        self.spawn_from_snapshot(snapshot)
    }

    pub fn spawn_from_snapshot(&mut self, snapshot: EntitySnapshot) -> Result<EntityId, EngineError> {
        if self.entities.contains_key(&snapshot.id) {
            return Err(EngineError::DuplicateEntityId(snapshot.id));
        }
        let mut entity = Entity::new(snapshot.id, snapshot.kind);
        entity.transform = snapshot.transform;
        entity.tags = snapshot.tags.into_iter().collect();
        entity.active = snapshot.active;
        entity.metadata = snapshot.metadata;
        self.next_id = self.next_id.max(snapshot.id.0);
        self.entities.insert(snapshot.id, entity);
        Ok(snapshot.id)
    }
}
