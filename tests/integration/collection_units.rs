//! Collections as units of work: what a connector would be asked to
//! create, update and delete.

use datacore::collection::EntitySetCollection;
use datacore::record::FieldAccess;
use datacore::{EntityCollection, EntitySet, Entity, EntityState, SetCollection};

datacore::record! {
    struct Role as "Role" {
        id: i64 => "Id",
        name: String => "Name",
    }
}

datacore::record! {
    struct UserRole as "UserRole" {
        id: i64 => "Id",
        role_id: i64 => "RoleId",
    }
}

fn stored(id: i64) -> Entity {
    let e = Entity::new("Order");
    e.set_item_value("OrderId", id);
    e.actualization(None);
    e
}

// ============================================================================
// Entity collections
// ============================================================================

#[test]
fn pending_work_is_partitioned_by_state() {
    let mut orders = EntityCollection::named("Order");
    let fresh = Entity::new("Order");
    fresh.set_item_value("Note", "new");
    let edited = stored(1);
    let untouched = stored(2);
    let dropped = stored(3);
    for e in [&fresh, &edited, &untouched, &dropped] {
        orders.push(e.clone());
    }

    edited.set_item_value("Note", "changed");
    assert!(orders.remove_entity(&dropped));
    assert!(orders.remove_entity(&fresh));

    assert!(orders.creating().is_empty());
    assert_eq!(orders.updating().len(), 1);
    assert!(orders.updating()[0].ptr_eq(&edited));
    let deleting = EntitySet::take_deleting(&mut orders);
    assert_eq!(deleting.len(), 1);
    assert!(deleting[0].ptr_eq(&dropped));
    assert!(EntitySet::take_deleting(&mut orders).is_empty());
}

#[test]
fn lookup_by_id_follows_reordering() {
    let mut orders = EntityCollection::new();
    for id in [10, 20, 30] {
        orders.push(stored(id));
    }
    orders.swap(0, 2);
    orders.remove(1);

    assert_eq!(orders.entity_name(), "Order");
    assert_eq!(orders.get_by("10").map(Entity::entity_id), Some("10".to_string()));
    assert!(orders.get_by("20").is_none());
    assert_eq!(orders.get(0).map(Entity::entity_id), Some("30".to_string()));
}

#[test]
fn sort_puts_parents_first() {
    let mut tasks = EntityCollection::named("Task");
    for (id, parent) in [(3i64, Some(2i64)), (2, Some(1)), (1, None)] {
        let e = Entity::new("Task");
        e.set_item_value("TaskId", id);
        if let Some(parent) = parent {
            e.set_item_value("ParentId", parent);
        }
        tasks.push(e);
    }
    let (pk, parent_key) = {
        let first = tasks.get(0).unwrap();
        (first.primary_key(), first.parent_key())
    };
    tasks.sort(&pk, &parent_key);

    let ids: Vec<String> = tasks.iter().map(Entity::entity_id).collect();
    assert_eq!(ids, ["1", "2", "3"]);
}

// ============================================================================
// Record sets
// ============================================================================

#[test]
fn record_sets_commit_in_order_and_delete_in_reverse() {
    let mut roles = SetCollection::new("Role");
    assert!(roles.push(Role { id: 1, name: "admin".into() }));
    assert!(roles.push(Role { id: 2, name: "viewer".into() }));
    assert!(!roles.push(Role { id: 2, name: "dup".into() }));
    roles.remove(1);

    let mut links = SetCollection::new("UserRole");
    links.push(UserRole { id: 5, role_id: 2 });
    links.clear();

    let mut unit = EntitySetCollection::new();
    unit.add_set(Box::new(roles));
    unit.add_set(Box::new(links));

    let creating = unit.creating();
    assert_eq!(creating.len(), 1);
    assert_eq!(creating[0].entity_name(), "Role");
    assert_eq!(creating[0].get_item_text("Name"), "admin");
    assert!(unit.updating().is_empty());

    let deleting: Vec<String> = unit.take_deleting().iter().map(Entity::entity_name).collect();
    assert_eq!(deleting, ["UserRole", "Role"]);
    assert!(unit.take_deleting().is_empty());
}

#[test]
fn records_convert_through_entities() {
    let e = Entity::actual("Role");
    e.set_item_value("Id", 9i64);
    e.set_item_value("Name", "ops");
    e.set_item_value("Extra", true);

    let role: Role = e.to_record();
    assert_eq!(role, Role { id: 9, name: "ops".into() });

    let back = Entity::from_record(&role, "Role");
    assert_eq!(back.state(), EntityState::Created);
    assert_eq!(back.get_item_value("Name"), role.get_field("Name"));
    assert!(!back.contains_item("Extra"));
}
