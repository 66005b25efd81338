//! Entity hierarchy integration tests: component lifecycle, cascade
//! destruction, reparenting, and snapshots.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use kartengine::entity::{Component, EntityId, EntityStore, Transform};
use kartengine::error::EngineError;

const EPSILON: f32 = 1e-6;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

struct Probe {
    label: &'static str,
    log: Rc<RefCell<Vec<String>>>,
}

impl Probe {
    fn new(label: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Self {
        Probe {
            label,
            log: Rc::clone(log),
        }
    }
}

impl Component for Probe {
    fn attach(&mut self, owner: EntityId) {
        self.log
            .borrow_mut()
            .push(format!("{}:attach({})", self.label, owner));
    }

    fn update(&mut self, _dt: f32) {
        self.log.borrow_mut().push(format!("{}:update", self.label));
    }

    fn destroy(&mut self) {
        self.log
            .borrow_mut()
            .push(format!("{}:destroy", self.label));
    }
}

// =============================================================================
// Components
// =============================================================================

#[test]
fn spawn_assigns_unique_stable_ids() {
    let mut store = EntityStore::new();
    let kart = store.spawn("vehicle");
    let track = store.spawn("track");

    assert_ne!(kart, track);
    assert_eq!(store.get(kart).unwrap().kind(), "vehicle");
    assert_eq!(store.get(track).unwrap().kind(), "track");
    assert_eq!(store.len(), 2);
}

#[test]
fn add_component_back_links_the_owner() {
    let mut store = EntityStore::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let kart = store.spawn("vehicle");

    store.add_component(kart, "engine", Box::new(Probe::new("engine", &log)));

    assert!(store.has_component(kart, "engine"));
    assert_eq!(*log.borrow(), vec![format!("engine:attach({})", kart)]);
}

#[test]
fn duplicate_component_name_is_rejected() {
    let mut store = EntityStore::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let kart = store.spawn("vehicle");

    store.add_component(kart, "engine", Box::new(Probe::new("first", &log)));
    store.add_component(kart, "engine", Box::new(Probe::new("second", &log)));

    // The duplicate was never attached.
    assert_eq!(*log.borrow(), vec![format!("first:attach({})", kart)]);
    assert_eq!(store.get(kart).unwrap().component_count(), 1);
}

#[test]
fn remove_component_runs_its_destroy_hook() {
    let mut store = EntityStore::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let kart = store.spawn("vehicle");
    store.add_component(kart, "engine", Box::new(Probe::new("engine", &log)));

    assert!(store.remove_component(kart, "engine"));
    assert!(!store.remove_component(kart, "engine")); // already gone

    assert!(!store.has_component(kart, "engine"));
    assert!(log.borrow().contains(&"engine:destroy".to_string()));
}

// =============================================================================
// Updates
// =============================================================================

#[test]
fn update_runs_components_then_children_recursively() {
    let mut store = EntityStore::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let kart = store.spawn("vehicle");
    let wheel = store.spawn("wheel");
    store.add_component(kart, "chassis", Box::new(Probe::new("chassis", &log)));
    store.add_component(wheel, "spin", Box::new(Probe::new("spin", &log)));
    store.add_child(kart, wheel).unwrap();
    log.borrow_mut().clear();

    store.update(kart, 0.25);

    assert_eq!(*log.borrow(), vec!["chassis:update", "spin:update"]);
}

#[test]
fn inactive_entities_skip_their_whole_subtree() {
    let mut store = EntityStore::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let kart = store.spawn("vehicle");
    let wheel = store.spawn("wheel");
    store.add_component(kart, "chassis", Box::new(Probe::new("chassis", &log)));
    store.add_component(wheel, "spin", Box::new(Probe::new("spin", &log)));
    store.add_child(kart, wheel).unwrap();
    log.borrow_mut().clear();

    store.get_mut(wheel).unwrap().active = false;
    store.update(kart, 0.25);
    assert_eq!(*log.borrow(), vec!["chassis:update"]);

    log.borrow_mut().clear();
    store.get_mut(wheel).unwrap().active = true;
    store.get_mut(kart).unwrap().active = false;
    store.update(kart, 0.25);
    assert!(log.borrow().is_empty());
}

// =============================================================================
// Destruction
// =============================================================================

#[test]
fn destroy_cascades_components_then_children_then_detaches() {
    let mut store = EntityStore::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let garage = store.spawn("garage");
    let kart = store.spawn("vehicle");
    let wheel = store.spawn("wheel");
    store.add_component(kart, "engine", Box::new(Probe::new("engine", &log)));
    store.add_component(kart, "horn", Box::new(Probe::new("horn", &log)));
    store.add_component(wheel, "spin", Box::new(Probe::new("spin", &log)));
    store.add_child(garage, kart).unwrap();
    store.add_child(kart, wheel).unwrap();
    log.borrow_mut().clear();

    store.destroy(kart);

    // The kart's own components go first, the child's component after them.
    let log = log.borrow();
    assert_eq!(log.len(), 3);
    assert!(log[..2].contains(&"engine:destroy".to_string()));
    assert!(log[..2].contains(&"horn:destroy".to_string()));
    assert_eq!(log[2], "spin:destroy");

    // The subtree is gone and unreachable from the live parent.
    assert!(!store.contains(kart));
    assert!(!store.contains(wheel));
    assert!(store.children(kart).is_empty());
    assert!(store.children(garage).is_empty());
    assert!(store.contains(garage));
}

// =============================================================================
// Hierarchy
// =============================================================================

#[test]
fn add_child_reparents_and_keeps_a_single_parent() {
    let mut store = EntityStore::new();
    let first = store.spawn("track");
    let second = store.spawn("track");
    let kart = store.spawn("vehicle");

    store.add_child(first, kart).unwrap();
    assert_eq!(store.parent(kart), Some(first));

    store.add_child(second, kart).unwrap();
    assert_eq!(store.parent(kart), Some(second));
    assert!(store.children(first).is_empty());
    assert_eq!(store.children(second), &[kart][..]);
}

#[test]
fn remove_child_only_unlinks_actual_children() {
    let mut store = EntityStore::new();
    let track = store.spawn("track");
    let other = store.spawn("track");
    let kart = store.spawn("vehicle");

    store.add_child(track, kart).unwrap();
    store.remove_child(other, kart); // not its parent: no-op
    assert_eq!(store.parent(kart), Some(track));

    store.remove_child(track, kart);
    assert_eq!(store.parent(kart), None);
    assert!(store.children(track).is_empty());
}

#[test]
fn hierarchy_cycles_are_rejected() {
    let mut store = EntityStore::new();
    let a = store.spawn("a");
    let b = store.spawn("b");
    let c = store.spawn("c");

    store.add_child(a, b).unwrap();
    store.add_child(b, c).unwrap();

    assert!(matches!(
        store.add_child(c, a),
        Err(EngineError::HierarchyCycle { .. })
    ));
    assert!(matches!(
        store.add_child(a, a),
        Err(EngineError::HierarchyCycle { .. })
    ));

    // The failed links changed nothing.
    assert_eq!(store.parent(a), None);
    assert_eq!(store.children(c), &[] as &[EntityId]);
}

#[test]
fn world_position_sums_the_ancestor_chain() {
    let mut store = EntityStore::new();
    let track = store.spawn("track");
    let kart = store.spawn("vehicle");
    let wheel = store.spawn("wheel");

    store.get_mut(track).unwrap().transform = Transform::from_position(10.0, 0.0, 0.0);
    store.get_mut(kart).unwrap().transform = Transform::from_position(1.0, 2.0, 3.0);
    store.get_mut(wheel).unwrap().transform = Transform::from_position(0.5, 0.5, 0.5);
    store.add_child(track, kart).unwrap();
    store.add_child(kart, wheel).unwrap();

    let root = store.world_position(track);
    assert!(approx_eq(root.x, 10.0)); // roots are their local position

    let position = store.world_position(wheel);
    assert!(approx_eq(position.x, 11.5));
    assert!(approx_eq(position.y, 2.5));
    assert!(approx_eq(position.z, 3.5));
}

// =============================================================================
// Snapshots
// =============================================================================

#[test]
fn snapshot_round_trip_preserves_identity_but_not_components() {
    let mut store = EntityStore::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let kart = store.spawn("vehicle");
    {
        let entity = store.get_mut(kart).unwrap();
        entity.transform = Transform::from_position(4.0, 0.0, -2.0);
        entity.tags.insert("player".into());
        entity.metadata = json!({ "driver": "P1" });
    }
    store.add_component(kart, "engine", Box::new(Probe::new("engine", &log)));

    let value = store.to_json(kart).unwrap();
    assert!(value.get("components").is_none()); // runtime-only wiring

    let mut restored_store = EntityStore::new();
    let restored = restored_store.spawn_from_json(&value).unwrap();

    assert_eq!(restored, kart); // persisted identity
    let entity = restored_store.get(restored).unwrap();
    assert_eq!(entity.kind(), "vehicle");
    assert!(approx_eq(entity.transform.position.x, 4.0));
    assert!(approx_eq(entity.transform.position.z, -2.0));
    assert!(entity.tags.contains("player"));
    assert!(entity.active);
    assert_eq!(entity.metadata, json!({ "driver": "P1" }));
    assert!(!entity.has_component("engine"));
}

#[test]
fn restoring_a_live_id_is_an_error() {
    let mut store = EntityStore::new();
    let kart = store.spawn("vehicle");
    let value = store.to_json(kart).unwrap();

    assert!(matches!(
        store.spawn_from_json(&value),
        Err(EngineError::DuplicateEntityId(_))
    ));
}

#[test]
fn spawns_after_a_restore_do_not_collide() {
    let mut store = EntityStore::new();
    for _ in 0..5 {
        store.spawn("filler");
    }
    let kart = store.spawn("vehicle");
    let value = store.to_json(kart).unwrap();

    let mut restored_store = EntityStore::new();
    let restored = restored_store.spawn_from_json(&value).unwrap();
    let fresh = restored_store.spawn("vehicle");

    assert_ne!(fresh, restored);
    assert_eq!(restored_store.len(), 2);
}
