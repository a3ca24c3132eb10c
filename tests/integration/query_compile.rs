//! One query, three consumers: OData, SQL and in-memory evaluation.

use sea_query::PostgresQueryBuilder;

use datacore::{
    ConditionOperator, DataType, Entity, LogicalOperator, OrderType, Query, Requirement, SchemaBuilder,
};

fn adults() -> Query {
    let mut query = Query::new("Customer");
    query.add_column("Name").add_column("Age");
    query
        .criteria_mut()
        .add_condition("Age", ConditionOperator::GreaterThan, 18)
        .add_condition("Age", ConditionOperator::LessThan, 65);
    query.add_order("Name", OrderType::Ascending);
    query.top = 10;
    query
}

fn customer(name: &str, age: i64) -> Entity {
    let e = Entity::actual("Customer");
    e.set_item_value("Name", name);
    e.set_item_value("Age", age);
    e
}

// ============================================================================
// Compilers
// ============================================================================

#[test]
fn odata_url() {
    assert_eq!(
        adults().to_odata("https://api.example.com/Customer"),
        "https://api.example.com/Customer?$select=Name,Age&$filter=Age gt 18 and Age lt 65&$orderby=Name&$top=10"
    );
}

#[test]
fn sql_select() {
    let sql = adults().to_select_statement().to_string(PostgresQueryBuilder);
    assert_eq!(
        sql,
        r#"SELECT "Name", "Age" FROM "Customer" WHERE "Age" > 18 AND "Age" < 65 ORDER BY "Name" ASC LIMIT 10"#
    );
}

#[test]
fn odata_options_parse_back() {
    let schema = SchemaBuilder::new("crm")
        .table("Customer")
        .column("Name", DataType::String, Requirement::REQUIRED)
        .column("Age", DataType::Int32, Requirement::NONE)
        .build()
        .unwrap();
    let mut source = adults();
    source.skip = 30;

    let parsed = Query::from_odata(&schema, "Customer", &source.odata_options()).unwrap();
    assert_eq!(parsed.columns, source.columns);
    assert_eq!(parsed.orders, source.orders);
    assert_eq!(parsed.top, 10);
    assert_eq!(parsed.skip, 30);
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn filter_selects_the_same_rows_sql_would() {
    let query = adults();
    let criteria = query.criteria.as_ref().unwrap();
    let rows = [customer("Ann", 30), customer("Bob", 17), customer("Cy", 65), customer("Di", 64)];

    let kept: Vec<String> = rows
        .iter()
        .filter(|e| criteria.matches(e))
        .map(|e| e.get_item_text("Name"))
        .collect();
    assert_eq!(kept, ["Ann", "Di"]);
}

#[test]
fn nested_or_group() {
    let mut query = Query::new("Customer");
    let criteria = query.criteria_mut();
    criteria.add_condition("Age", ConditionOperator::GreaterEqual, 18);
    criteria
        .add_filter(LogicalOperator::Or)
        .add_condition("Name", ConditionOperator::Equal, "Ann")
        .add_condition("Name", ConditionOperator::Like, "o");

    let criteria = query.criteria.as_ref().unwrap();
    assert!(criteria.matches(&customer("Ann", 40)));
    assert!(criteria.matches(&customer("Bob", 40)));
    assert!(!criteria.matches(&customer("Cy", 40)));
    assert!(!criteria.matches(&customer("Bob", 12)));

    let sql = query.to_select_statement().to_string(PostgresQueryBuilder);
    assert_eq!(
        sql,
        r#"SELECT * FROM "Customer" WHERE "Age" >= 18 AND ("Name" = 'Ann' OR "Name" LIKE '%o%')"#
    );
}
