//! Entity and collection codec.
//!
//! Grammar:
//!
//! ```text
//! entity     = "{" [ pair { "," pair } ] "}"
//! pair       = quoted ":" value
//! value      = quoted | bare | entity | collection | array
//! collection = "{#" name "[" [ entity { "," entity } ] "]}"
//! array      = "[" [ value { "," value } ] "]"
//! quoted     = '"' text '"'        (embedded quotes doubled)
//! ```
//!
//! Encoding omits empty text, integer zero and the nil GUID. Decoding is
//! lenient about whitespace and returns `None` for malformed input.

use super::infer::ValueParser;
use super::scan::{add_quotes, next, pair, remove_quotes, text_for_value};
use crate::collection::EntityCollection;
use crate::entity::Entity;
use crate::metrics::METRICS;
use crate::schema::SchemaRegistry;
use crate::value::{coerce, EntityReference, OptionSetValue, Value, DATE_FORMAT, DATE_TIME_FORMAT, TIME_FORMAT};

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Text form of one value as it appears after `"key":`
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => add_quotes(s),
        Value::Binary(_) | Value::OptionSet(_) | Value::Reference(_) => add_quotes(&value.to_string()),
        Value::Byte(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Int16(v) => v.to_string(),
        Value::Int32(v) => v.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::Double(v) => format!("{:.2}", v),
        Value::Decimal(v) | Value::Currency(v) => format!("{:.2}", v),
        Value::Guid(v) => v.hyphenated().to_string(),
        Value::Date(v) => v.format(DATE_FORMAT).to_string(),
        Value::DateTime(v) => v.format(DATE_TIME_FORMAT).to_string(),
        Value::Time(v) => v.format(TIME_FORMAT).to_string(),
        Value::Array(items) => encode_array(items),
        Value::Collection(c) => encode_collection(c),
        Value::Entity(e) => encode_entity(e),
    }
}

/// `{"key":value,...}` over the entity's attributes; children are not encoded
pub fn encode_entity(entity: &Entity) -> String {
    let body: Vec<String> = entity
        .items()
        .iter()
        .filter(|(_, v)| !v.is_omitted_on_encode())
        .map(|(k, v)| format!("{}:{}", add_quotes(k), encode_value(v)))
        .collect();
    format!("{{{}}}", body.join(","))
}

/// `{#Name[e1,e2,...]}`
pub fn encode_collection(collection: &EntityCollection) -> String {
    let body: Vec<String> = collection.iter().map(encode_entity).collect();
    format!("{{#{}[{}]}}", collection.entity_name(), body.join(","))
}

/// `[v1,v2,...]`; nulls are skipped
pub fn encode_array(items: &[Value]) -> String {
    let body: Vec<String> = items
        .iter()
        .filter(|v| !v.is_null())
        .map(encode_value)
        .collect();
    format!("[{}]", body.join(","))
}

fn skip_separators(text: &[char], mut idx: usize, end: usize) -> usize {
    while idx < end && (text[idx].is_whitespace() || text[idx] == ',') {
        idx += 1;
    }
    idx
}

fn skip_whitespace(text: &[char], mut idx: usize, end: usize) -> usize {
    while idx < end && text[idx].is_whitespace() {
        idx += 1;
    }
    idx
}

/// Grammar decoder.
///
/// With a registry, entities whose name is a registered table are bound to
/// it and their values are converted to the column types.
#[derive(Debug, Clone, Default)]
pub struct Decoder<'a> {
    parser: ValueParser,
    registry: Option<&'a SchemaRegistry>,
}

impl<'a> Decoder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parser(mut self, parser: ValueParser) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: &'a SchemaRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Decode `{"key":value,...}` into an entity named `name`
    pub fn decode_entity(&self, text: &str, name: &str) -> Option<Entity> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::decode_span(name).entered();

        let chars: Vec<char> = text.trim().chars().collect();
        let entity = self.entity(&chars, name);
        METRICS.record_decode(entity.is_some());
        entity
    }

    /// Decode `{#Name[...]}` into a collection
    pub fn decode_collection(&self, text: &str) -> Option<EntityCollection> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::decode_span("collection").entered();

        let chars: Vec<char> = text.trim().chars().collect();
        self.collection(&chars)
    }

    /// Decode `[...]`; nested entities are named `name`
    pub fn decode_array(&self, text: &str, name: &str) -> Option<Vec<Value>> {
        let chars: Vec<char> = text.trim().chars().collect();
        self.array(&chars, name)
    }

    fn new_entity(&self, name: &str) -> Entity {
        match self.registry {
            Some(registry) => Entity::from_registry(registry, name),
            None => Entity::new(name),
        }
    }

    fn entity(&self, text: &[char], name: &str) -> Option<Entity> {
        if text.first() != Some(&'{') {
            return None;
        }
        let last = pair(text, 0)?;
        let entity = self.new_entity(name);
        let schema = entity.schema();
        let mut idx = 1;
        loop {
            idx = skip_separators(text, idx, last);
            if idx >= last {
                break;
            }
            if text[idx] != '"' {
                return None;
            }
            let key_end = next(text, idx)?;
            let key: String = text[idx..=key_end].iter().collect();
            let key = remove_quotes(&key)?.trim().to_string();
            if key.is_empty() {
                return None;
            }
            idx = skip_whitespace(text, key_end + 1, last);
            if text.get(idx) != Some(&':') {
                return None;
            }
            idx = skip_whitespace(text, idx + 1, last);
            if idx >= last {
                return None;
            }
            let (value, end) = self.value(text, idx, &key)?;
            idx = end;
            match schema.as_ref().and_then(|t| t.column(&key)) {
                Some(column) => {
                    let value = coerce(&value, column.data_type).unwrap_or(value);
                    entity.push_item(column.name.clone(), value);
                }
                None => entity.push_item(key, value),
            }
        }
        Some(entity)
    }

    /// Value starting at `idx`, and the index just past it
    fn value(&self, text: &[char], idx: usize, key: &str) -> Option<(Value, usize)> {
        match text[idx] {
            '"' => {
                let end = next(text, idx)?;
                let raw: String = text[idx..=end].iter().collect();
                let inner = remove_quotes(&raw)?;
                Some((self.quoted(inner.trim_matches([' ', '\t', '\r', '\n'])), end + 1))
            }
            '{' => {
                let end = pair(text, idx)?;
                let body = &text[idx..=end];
                let value = if body.get(1) == Some(&'#') {
                    Value::Collection(self.collection(body)?)
                } else {
                    Value::Entity(self.entity(body, key)?)
                };
                Some((value, end + 1))
            }
            '[' => {
                let end = pair(text, idx)?;
                Some((Value::Array(self.array(&text[idx..=end], key)?), end + 1))
            }
            _ => {
                let token = text_for_value(text, idx);
                if token.is_empty() {
                    return None;
                }
                let len = token.chars().count();
                Some((self.parser.infer(&token), idx + len))
            }
        }
    }

    /// Quoted text stays text unless it is an option-set or reference form
    fn quoted(&self, text: &str) -> Value {
        if let Some(option) = OptionSetValue::parse(text) {
            return Value::OptionSet(option);
        }
        if let Some(reference) = EntityReference::parse(text) {
            return Value::Reference(reference);
        }
        Value::String(text.to_string())
    }

    fn collection(&self, text: &[char]) -> Option<EntityCollection> {
        if text.first() != Some(&'{') || text.get(1) != Some(&'#') {
            return None;
        }
        let last = pair(text, 0)?;
        let open = (2..last).find(|&i| text[i] == '[')?;
        let close = pair(text, open)?;
        let name: String = text[2..open].iter().collect();
        let name = name.trim();
        let mut collection = EntityCollection::named(name);
        let mut idx = open + 1;
        loop {
            idx = skip_separators(text, idx, close);
            if idx >= close {
                break;
            }
            let Some(end) = pair(text, idx) else {
                log::warn!("{}: unbalanced entity text at {}", name, idx);
                break;
            };
            let body = &text[idx..=end];
            match self.entity(body, name) {
                Some(entity) => collection.push(entity),
                None => log::warn!(
                    "{}: skipping malformed entity {}",
                    name,
                    body.iter().collect::<String>()
                ),
            }
            idx = end + 1;
        }
        Some(collection)
    }

    fn array(&self, text: &[char], name: &str) -> Option<Vec<Value>> {
        if text.first() != Some(&'[') {
            return None;
        }
        let last = pair(text, 0)?;
        let mut values = Vec::new();
        let mut idx = 1;
        loop {
            idx = skip_separators(text, idx, last);
            if idx >= last {
                break;
            }
            let (value, end) = self.value(text, idx, name)?;
            values.push(value);
            idx = end;
        }
        Some(values)
    }
}

/// Decode an entity with the default parser
pub fn parse_entity(text: &str, name: &str) -> Option<Entity> {
    Decoder::new().decode_entity(text, name)
}

/// Decode a named collection with the default parser
pub fn parse_collection(text: &str) -> Option<EntityCollection> {
    Decoder::new().decode_collection(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn test_encode_omits_empty_values() {
        let e = Entity::new("Order");
        e.set_item_value("OrderId", 7i64);
        e.set_item_value("Note", "");
        e.set_item_value("Qty", 0i32);
        e.set_item_value("Ref", Uuid::nil());
        e.set_item_value("Paid", false);
        assert_eq!(encode_entity(&e), r#"{"OrderId":7,"Paid":false}"#);
    }

    #[test]
    fn test_encode_value_forms() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 30, 0).unwrap();
        assert_eq!(encode_value(&Value::from(dt)), "2024-03-01T08:30:00");
        assert_eq!(encode_value(&Value::from(12.5f64)), "12.50");
        assert_eq!(encode_value(&Value::from(r#"a "b""#)), r#""a ""b""""#);
        assert_eq!(
            encode_value(&Value::from(OptionSetValue::with_text(2, "Open"))),
            "\"#SET=2/#TXT=Open\""
        );
        assert_eq!(
            encode_value(&Value::from(vec![Value::from(1i32), Value::Null, Value::from("x")])),
            r#"[1,"x"]"#
        );
    }

    #[test]
    fn test_encode_decimal_keeps_every_digit() {
        let big = rust_decimal::Decimal::new(1234567890123456789, 2);
        assert_eq!(encode_value(&Value::Decimal(big)), "12345678901234567.89");
        assert_eq!(encode_value(&Value::Currency(rust_decimal::Decimal::new(125, 1))), "12.50");
    }

    #[test]
    fn test_decode_scalars() {
        let text = r#"{ "Id" : 42, "Name":"Acme ""Ltd""", "Rate":-12.50, "Active":true,
                        "When":2024-03-01T08:30:00, "Code":"0123", "Big":9000000000}"#;
        let e = parse_entity(text, "Company").unwrap();
        assert_eq!(e.entity_name(), "Company");
        assert_eq!(e.get_item_value("Id"), Some(Value::Int32(42)));
        assert_eq!(e.get_item_value("Name"), Some(Value::from(r#"Acme "Ltd""#)));
        assert_eq!(e.get_item_value("Rate"), Some(Value::Double(-12.5)));
        assert_eq!(e.get_item_value("Active"), Some(Value::Bool(true)));
        assert!(matches!(e.get_item_value("When"), Some(Value::DateTime(_))));
        assert_eq!(e.get_item_value("Code"), Some(Value::from("0123")));
        assert_eq!(e.get_item_value("Big"), Some(Value::Int64(9_000_000_000)));
    }

    #[test]
    fn test_decode_nested() {
        let text = r#"{"Owner":{"Name":"Ann"},"Lines":{#Line[{"Qty":2},{"Qty":3}]},"Tags":["a",1,{"X":1}]}"#;
        let e = parse_entity(text, "Order").unwrap();
        let owner = match e.get_item_value("Owner") {
            Some(Value::Entity(owner)) => owner,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(owner.entity_name(), "Owner");
        assert_eq!(owner.get_item_text("Name"), "Ann");
        match e.get_item_value("Lines") {
            Some(Value::Collection(lines)) => {
                assert_eq!(lines.entity_name(), "Line");
                assert_eq!(lines.len(), 2);
                assert_eq!(lines.get(1).map(|l| l.get_item_text("Qty")), Some("3".to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
        match e.get_item_value("Tags") {
            Some(Value::Array(tags)) => {
                assert_eq!(tags.len(), 3);
                assert_eq!(tags[0], Value::from("a"));
                assert!(matches!(&tags[2], Value::Entity(t) if t.entity_name() == "Tags"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_restores_structured_strings() {
        let text = r##"{"Status":"#SET=2/#TXT=Open","Owner":"#REF=User/#TXT=Ann/#ID=5"}"##;
        let e = parse_entity(text, "Task").unwrap();
        assert!(matches!(e.get_item_value("Status"), Some(Value::OptionSet(o)) if o.value == 2));
        assert!(matches!(e.get_item_value("Owner"), Some(Value::Reference(r)) if r.id == "5"));
    }

    #[test]
    fn test_decode_unquoted_structured_values() {
        let e = parse_entity(r#"{"Owner":#REF=User/#ID=5,"Status":#SET=2/#TXT=Open,"Name":"a"}"#, "Task").unwrap();
        assert!(matches!(e.get_item_value("Owner"), Some(Value::Reference(r)) if r.entity_name == "User" && r.id == "5"));
        assert!(matches!(e.get_item_value("Status"), Some(Value::OptionSet(o)) if o.value == 2));
        assert_eq!(e.get_item_text("Name"), "a");
    }

    #[test]
    fn test_decode_array_keeps_zero() {
        let values = Decoder::new().decode_array("[0,1]", "Item").unwrap();
        assert_eq!(values, vec![Value::Int32(0), Value::Int32(1)]);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(parse_entity("", "X").is_none());
        assert!(parse_entity("[1]", "X").is_none());
        assert!(parse_entity(r#"{"A":1"#, "X").is_none());
        assert!(parse_entity(r#"{A:1}"#, "X").is_none());
        assert!(parse_entity(r#"{"A":}"#, "X").is_none());
        assert!(parse_entity(r#"{"A":"open}"#, "X").is_none());
        assert!(parse_entity("{}", "X").is_some_and(|e| e.items().is_empty()));
    }

    #[test]
    fn test_collection_round_trip_and_skip() {
        let mut c = EntityCollection::named("Line");
        for qty in [2i32, 3] {
            let e = Entity::new("Line");
            e.set_item_value("Qty", qty);
            c.push(e);
        }
        let text = encode_collection(&c);
        assert_eq!(text, r#"{#Line[{"Qty":2},{"Qty":3}]}"#);
        let back = parse_collection(&text).unwrap();
        assert_eq!(back.len(), 2);

        let damaged = parse_collection(r#"{#Line[{"Qty":2},{Qty:3},{"Qty":4}]}"#).unwrap();
        assert_eq!(damaged.len(), 2);
        assert!(parse_collection(r#"{"Qty":2}"#).is_none());
    }
}
