//! OData compilation of a [`Query`].
//!
//! Options are emitted in the order `$select`, `$filter`, `$expand`,
//! `$orderby`, `$top`, `$skip` and joined by `&`. Conditions on one filter
//! level are joined by a space-delimited `and`/`or`,
//! e.g. `$filter=Age gt 18 and Age lt 65`. Strings are quoted with `'`.

use super::model::{ConditionOperator, Filter, OrderType, Query};
use crate::metrics::METRICS;
use crate::value::{Value, DATE_TIME_FORMAT};

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// OData literal for a condition value
pub fn odata_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Guid(g) => g.hyphenated().to_string(),
        Value::DateTime(dt) => dt.format(DATE_TIME_FORMAT).to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Byte(_) | Value::Int16(_) | Value::Int32(_) | Value::Int64(_) => value.to_string(),
        Value::Double(v) => format!("{:.2}", v),
        Value::Decimal(v) | Value::Currency(v) => format!("{:.2}", v),
        _ => "null".to_string(),
    }
}

impl Query {
    /// `url?options`, or just `url` when the query has no options
    pub fn to_odata(&self, url: &str) -> String {
        let options = self.odata_options();
        if options.is_empty() {
            url.to_string()
        } else {
            format!("{}?{}", url, options)
        }
    }

    /// The `&`-joined option string without a leading `?`
    pub fn odata_options(&self) -> String {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::compile_span(&self.entity_name, "odata").entered();

        let mut parts = Vec::new();
        if !self.columns.is_empty() {
            parts.push(format!("$select={}", self.columns.join(",")));
        }
        if let Some(criteria) = self.criteria.as_ref().filter(|c| !c.is_empty()) {
            let mut out = String::from("$filter=");
            append_filter(&mut out, criteria);
            parts.push(out);
        }
        if !self.links.is_empty() {
            let links: Vec<String> = self
                .links
                .iter()
                .map(|link| {
                    let mut out = String::new();
                    if link.from_entity_name != self.entity_name {
                        out.push_str(&link.from_entity_name);
                        out.push('/');
                    }
                    out.push_str(&link.to_entity_name);
                    out.push('.');
                    out.push_str(&link.to_item_name);
                    out
                })
                .collect();
            parts.push(format!("$expand={}", links.join(",")));
        }
        if !self.orders.is_empty() {
            let orders: Vec<String> = self
                .orders
                .iter()
                .map(|order| match order.order_type {
                    OrderType::Ascending => order.item_name.clone(),
                    OrderType::Descending => format!("{} desc", order.item_name),
                })
                .collect();
            parts.push(format!("$orderby={}", orders.join(",")));
        }
        if let Some(top) = self.effective_top() {
            parts.push(format!("$top={}", top));
        }
        if let Some(skip) = self.effective_skip() {
            parts.push(format!("$skip={}", skip));
        }
        METRICS.record_compile();
        parts.join("&")
    }
}

fn append_filter(out: &mut String, filter: &Filter) {
    let token = format!(" {} ", filter.operator.token());
    let mut first = true;
    for condition in &filter.conditions {
        if !first {
            out.push_str(&token);
        }
        first = false;
        let field = &condition.item_name;
        let value = odata_value(&condition.value);
        match condition.operator {
            ConditionOperator::Equal => out.push_str(&format!("{} eq {}", field, value)),
            ConditionOperator::NotEqual => out.push_str(&format!("{} ne {}", field, value)),
            ConditionOperator::GreaterThan => out.push_str(&format!("{} gt {}", field, value)),
            ConditionOperator::GreaterEqual => out.push_str(&format!("{} ge {}", field, value)),
            ConditionOperator::LessThan => out.push_str(&format!("{} lt {}", field, value)),
            ConditionOperator::LessEqual => out.push_str(&format!("{} le {}", field, value)),
            ConditionOperator::Like => out.push_str(&format!("contains({},{})", field, value)),
            ConditionOperator::NotLike => out.push_str(&format!("not contains({},{})", field, value)),
            ConditionOperator::Null => out.push_str(&format!("{} eq null", field)),
            ConditionOperator::NotNull => out.push_str(&format!("{} ne null", field)),
        }
    }
    for child in filter.filters.iter().filter(|f| !f.is_empty()) {
        if !first {
            out.push_str(&token);
        }
        first = false;
        out.push('(');
        append_filter(out, child);
        out.push(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{JoinOperator, LogicalOperator, PagingInfo};
    use uuid::Uuid;

    #[test]
    fn test_customer_query() {
        let mut q = Query::new("Customer");
        q.criteria_mut()
            .add_condition("Age", ConditionOperator::GreaterThan, 18i32)
            .add_condition("Age", ConditionOperator::LessThan, 65i32);
        q.add_order("Name", OrderType::Ascending);
        q.top = 10;
        assert_eq!(
            q.odata_options(),
            "$filter=Age gt 18 and Age lt 65&$orderby=Name&$top=10"
        );
        assert_eq!(
            q.to_odata("https://host/odata/Customer"),
            "https://host/odata/Customer?$filter=Age gt 18 and Age lt 65&$orderby=Name&$top=10"
        );
    }

    #[test]
    fn test_all_segments_in_order() {
        let mut q = Query::new("Order");
        q.add_column("Id").add_column("Total");
        q.criteria_mut()
            .add_condition("Note", ConditionOperator::Like, "o'k")
            .add_condition("Closed", ConditionOperator::Null, Value::Null);
        q.add_link("Customer", "CustomerId", "Id", JoinOperator::Inner);
        q.add_order("Total", OrderType::Descending).add_order("Id", OrderType::Ascending);
        q.page_info = Some(PagingInfo::new(25, 3));
        assert_eq!(
            q.odata_options(),
            "$select=Id,Total&$filter=contains(Note,'o''k') and Closed eq null\
             &$expand=Customer.Id&$orderby=Total desc,Id&$top=25&$skip=50"
        );
    }

    #[test]
    fn test_nested_filters_parenthesized() {
        let mut q = Query::new("Customer");
        let root = q.criteria_mut();
        root.add_condition("Active", ConditionOperator::Equal, true);
        root.add_filter(LogicalOperator::Or)
            .add_condition("City", ConditionOperator::Equal, "Oslo")
            .add_condition("City", ConditionOperator::NotEqual, "Bergen");
        assert_eq!(
            q.odata_options(),
            "$filter=Active eq true and (City eq 'Oslo' or City ne 'Bergen')"
        );
    }

    #[test]
    fn test_value_literals() {
        assert_eq!(odata_value(&Value::from(2.5f64)), "2.50");
        assert_eq!(odata_value(&Value::from(Uuid::nil())), "00000000-0000-0000-0000-000000000000");
        assert_eq!(odata_value(&Value::Null), "null");
        assert_eq!(odata_value(&Value::from(vec![1u8])), "null");
        assert_eq!(odata_value(&Value::from("O'Hara")), "'O''Hara'");
    }

    #[test]
    fn test_decimal_literal_keeps_precision() {
        let big = Value::Decimal(rust_decimal::Decimal::new(1234567890123456789, 2));
        assert_eq!(odata_value(&big), "12345678901234567.89");
        assert_eq!(odata_value(&Value::Currency(rust_decimal::Decimal::new(5, 1))), "0.50");
    }

    #[test]
    fn test_empty_query_is_bare_url() {
        assert_eq!(Query::new("Customer").to_odata("/odata"), "/odata");
    }
}
