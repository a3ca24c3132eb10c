//! Encoder and decoder working together, with and without table metadata.

use chrono::NaiveDate;
use uuid::Uuid;

use datacore::grammar::{encode_collection, encode_entity, parse_collection, parse_entity, Decoder};
use datacore::{DataType, Entity, EntityCollection, Requirement, SchemaBuilder, SchemaRegistry, Value};

fn order() -> Entity {
    let e = Entity::new("Order");
    e.set_item_value("OrderId", 42i64);
    e.set_item_value("Customer", r#"Acme "North""#);
    e.set_item_value("Total", 199.5f64);
    e.set_item_value(
        "Placed",
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap().and_hms_opt(9, 15, 0).unwrap(),
    );
    e.set_item_value("Rush", true);
    e
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn entity_survives_round_trip_as_text() {
    let source = order();
    let back = parse_entity(&encode_entity(&source), "Order").unwrap();

    for name in ["OrderId", "Customer", "Total", "Placed", "Rush"] {
        assert_eq!(back.get_item_text(name), source.get_item_text(name), "{}", name);
    }
    assert_eq!(back.get_item_value("Customer"), Some(Value::from(r#"Acme "North""#)));
    assert_eq!(back.get_item_value("Rush"), Some(Value::Bool(true)));
}

#[test]
fn empty_values_do_not_come_back() {
    let source = order();
    source.set_item_value("Note", "");
    source.set_item_value("Lines", 0i32);
    source.set_item_value("Batch", Uuid::nil());

    let back = parse_entity(&encode_entity(&source), "Order").unwrap();
    assert!(!back.contains_item("Note"));
    assert!(!back.contains_item("Lines"));
    assert!(!back.contains_item("Batch"));
    assert_eq!(back.items().len(), 5);
}

#[test]
fn collection_round_trip_keeps_order() {
    let mut lines = EntityCollection::named("Line");
    for (id, qty) in [(1i64, 4i32), (2, 1), (3, 9)] {
        let e = Entity::new("Line");
        e.set_item_value("LineId", id);
        e.set_item_value("Qty", qty);
        lines.push(e);
    }

    let back = parse_collection(&encode_collection(&lines)).unwrap();
    assert_eq!(back.entity_name(), "Line");
    let qty: Vec<String> = back.iter().map(|e| e.get_item_text("Qty")).collect();
    assert_eq!(qty, ["4", "1", "9"]);
}

#[test]
fn nested_collection_inside_entity() {
    let text = r#"{"OrderId":5,"Lines":{#Line[{"Qty":1},{"Qty":2}]}}"#;
    let e = parse_entity(text, "Order").unwrap();
    assert_eq!(encode_entity(&e), text);
}

// ============================================================================
// Schema-bound decoding
// ============================================================================

#[test]
fn registry_decoder_converts_to_column_types() {
    let schema = SchemaBuilder::new("Sales")
        .table("Order")
        .primary_key("OrderId")
        .column("OrderId", DataType::Int64, Requirement::PRIMARY_KEY)
        .column("Total", DataType::Decimal, Requirement::NONE)
        .build()
        .unwrap();
    let registry = SchemaRegistry::from_schema(schema);

    let e = Decoder::new()
        .with_registry(&registry)
        .decode_entity(r#"{"orderid":7,"Total":12.25}"#, "Order")
        .unwrap();

    assert!(e.schema().is_some());
    assert_eq!(e.get_item_value("OrderId"), Some(Value::Int64(7)));
    assert!(matches!(e.get_item_value("Total"), Some(Value::Decimal(_))));
    assert_eq!(e.entity_id(), "7");
}

#[test]
fn malformed_text_is_rejected() {
    assert!(parse_entity(r#"{"OrderId":5,"Lines":{#Line[{"Qty":1}]}"#, "Order").is_none());
    assert!(parse_collection("{#Line[").is_none());
}
