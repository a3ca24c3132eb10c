//! Query tree: columns, criteria, orders, links and paging.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Sort direction of an [`Order`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderType {
    #[default]
    Ascending,
    Descending,
}

/// How the conditions and child filters of a [`Filter`] combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn token(self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }
}

/// Join kind of a [`Link`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JoinOperator {
    #[default]
    Inner,
    LeftOuter,
    Natural,
}

/// Comparison applied by a [`Condition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ConditionOperator {
    Equal = 0,
    NotEqual = 1,
    GreaterThan = 2,
    LessThan = 3,
    GreaterEqual = 4,
    LessEqual = 5,
    Like = 6,
    NotLike = 7,
    Null = 12,
    NotNull = 13,
}

impl ConditionOperator {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let op = match code {
            0 => ConditionOperator::Equal,
            1 => ConditionOperator::NotEqual,
            2 => ConditionOperator::GreaterThan,
            3 => ConditionOperator::LessThan,
            4 => ConditionOperator::GreaterEqual,
            5 => ConditionOperator::LessEqual,
            6 => ConditionOperator::Like,
            7 => ConditionOperator::NotLike,
            12 => ConditionOperator::Null,
            13 => ConditionOperator::NotNull,
            _ => return None,
        };
        Some(op)
    }
}

/// Condition values travel as their grammar text
mod value_text {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::grammar::{encode_value, remove_quotes, ValueParser};
    use crate::value::{EntityReference, OptionSetValue, Value};

    pub fn serialize<S: Serializer>(value: &Value, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&encode_value(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Value, D::Error> {
        let text = String::deserialize(d)?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        if let Some(inner) = remove_quotes(&text) {
            if let Some(option) = OptionSetValue::parse(&inner) {
                return Ok(Value::OptionSet(option));
            }
            if let Some(reference) = EntityReference::parse(&inner) {
                return Ok(Value::Reference(reference));
            }
            return Ok(Value::String(inner));
        }
        Ok(ValueParser::new().infer(&text))
    }
}

/// `item operator value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub item_name: String,
    pub operator: ConditionOperator,
    #[serde(with = "value_text", default)]
    pub value: Value,
}

impl Condition {
    pub fn new(item_name: impl Into<String>, operator: ConditionOperator, value: impl Into<Value>) -> Self {
        Self {
            item_name: item_name.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Conditions and nested filters joined by one logical operator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub operator: LogicalOperator,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl Filter {
    pub fn new(operator: LogicalOperator) -> Self {
        Self {
            operator,
            ..Default::default()
        }
    }

    pub fn add_condition(
        &mut self,
        item_name: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.conditions.push(Condition::new(item_name, operator, value));
        self
    }

    pub fn push_condition(&mut self, condition: Condition) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    /// Append a child filter and return it for filling
    pub fn add_filter(&mut self, operator: LogicalOperator) -> &mut Filter {
        self.filters.push(Filter::new(operator));
        let last = self.filters.len() - 1;
        &mut self.filters[last]
    }

    pub fn push_filter(&mut self, filter: Filter) -> &mut Self {
        self.filters.push(filter);
        self
    }

    /// No conditions anywhere in the tree
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.filters.iter().all(Filter::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub item_name: String,
    #[serde(default)]
    pub order_type: OrderType,
}

impl Order {
    pub fn new(item_name: impl Into<String>, order_type: OrderType) -> Self {
        Self {
            item_name: item_name.into(),
            order_type,
        }
    }
}

/// Single-hop join from one entity to another
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub from_entity_name: String,
    pub to_entity_name: String,
    pub from_item_name: String,
    pub to_item_name: String,
    #[serde(default)]
    pub join_operator: JoinOperator,
    /// Columns taken from the linked entity
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub criteria: Option<Filter>,
}

impl Link {
    pub fn new(
        from_entity_name: impl Into<String>,
        to_entity_name: impl Into<String>,
        from_item_name: impl Into<String>,
        to_item_name: impl Into<String>,
        join_operator: JoinOperator,
    ) -> Self {
        Self {
            from_entity_name: from_entity_name.into(),
            to_entity_name: to_entity_name.into(),
            from_item_name: from_item_name.into(),
            to_item_name: to_item_name.into(),
            join_operator,
            ..Default::default()
        }
    }
}

/// Page size and page number; used only when `top`/`skip` are unset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub count: i64,
    pub page_number: i64,
    #[serde(default)]
    pub paging_cookie: Option<String>,
    #[serde(default)]
    pub return_total_count: bool,
}

impl PagingInfo {
    pub fn new(count: i64, page_number: i64) -> Self {
        Self {
            count,
            page_number,
            ..Default::default()
        }
    }
}

/// Retrieval request for one entity type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub entity_name: String,
    /// Selected columns; empty selects all
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub criteria: Option<Filter>,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default)]
    pub no_lock: bool,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub page_info: Option<PagingInfo>,
    #[serde(default)]
    pub top: i64,
    #[serde(default)]
    pub skip: i64,
}

impl Query {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Default::default()
        }
    }

    pub fn add_column(&mut self, name: impl Into<String>) -> &mut Self {
        self.columns.push(name.into());
        self
    }

    pub fn add_order(&mut self, item_name: impl Into<String>, order_type: OrderType) -> &mut Self {
        self.orders.push(Order::new(item_name, order_type));
        self
    }

    /// Append a link from this query's entity and return it for filling
    pub fn add_link(
        &mut self,
        to_entity_name: impl Into<String>,
        from_item_name: impl Into<String>,
        to_item_name: impl Into<String>,
        join_operator: JoinOperator,
    ) -> &mut Link {
        self.links.push(Link::new(
            self.entity_name.clone(),
            to_entity_name,
            from_item_name,
            to_item_name,
            join_operator,
        ));
        let last = self.links.len() - 1;
        &mut self.links[last]
    }

    /// Root filter, created as an `And` filter on first use
    pub fn criteria_mut(&mut self) -> &mut Filter {
        self.criteria.get_or_insert_with(Filter::default)
    }

    /// Row limit: `top`, else the page size
    pub fn effective_top(&self) -> Option<u64> {
        let top = match &self.page_info {
            Some(page) if self.top <= 0 => page.count,
            _ => self.top,
        };
        u64::try_from(top).ok().filter(|&t| t > 0)
    }

    /// Rows to skip: `skip`, else the rows on earlier pages, saturating at
    /// `i64::MAX`
    pub fn effective_skip(&self) -> Option<u64> {
        let skip = match &self.page_info {
            Some(page) if self.skip <= 0 && page.page_number > 1 => {
                page.count.saturating_mul(page.page_number - 1)
            }
            _ => self.skip,
        };
        u64::try_from(skip).ok().filter(|&s| s > 0)
    }
}
