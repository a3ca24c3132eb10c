//! In-memory evaluation of a [`Filter`] against an entity.

use std::cmp::Ordering;

use rust_decimal::prelude::ToPrimitive;

use super::model::{Condition, ConditionOperator, Filter, LogicalOperator};
use crate::entity::Entity;
use crate::value::Value;

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Double(v) => Some(*v),
        Value::Decimal(v) | Value::Currency(v) => v.to_f64(),
        Value::OptionSet(o) => Some(f64::from(o.value)),
        other => other.as_i64().map(|v| v as f64),
    }
}

/// Ordering of two values: numerically, chronologically, or by text
pub(crate) fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (as_f64(left), as_f64(right)) {
        return a.partial_cmp(&b);
    }
    match (left, right) {
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
        (Value::Null, _) | (_, Value::Null) => None,
        _ => Some(left.to_string().cmp(&right.to_string())),
    }
}

impl Condition {
    /// Whether the entity's attribute satisfies this condition.
    ///
    /// A missing attribute counts as null.
    pub fn matches(&self, entity: &Entity) -> bool {
        let actual = entity.get_item_value(&self.item_name).unwrap_or_default();
        match self.operator {
            ConditionOperator::Null => actual.is_null(),
            ConditionOperator::NotNull => !actual.is_null(),
            ConditionOperator::Like => !actual.is_null() && actual.to_string().contains(&self.value.to_string()),
            ConditionOperator::NotLike => {
                actual.is_null() || !actual.to_string().contains(&self.value.to_string())
            }
            op => match compare(&actual, &self.value) {
                None => false,
                Some(ord) => match op {
                    ConditionOperator::Equal => ord == Ordering::Equal,
                    ConditionOperator::NotEqual => ord != Ordering::Equal,
                    ConditionOperator::GreaterThan => ord == Ordering::Greater,
                    ConditionOperator::GreaterEqual => ord != Ordering::Less,
                    ConditionOperator::LessThan => ord == Ordering::Less,
                    ConditionOperator::LessEqual => ord != Ordering::Greater,
                    _ => false,
                },
            },
        }
    }
}

impl Filter {
    /// Whether the entity satisfies the whole filter tree; an empty filter
    /// matches everything
    pub fn matches(&self, entity: &Entity) -> bool {
        let mut results = self
            .conditions
            .iter()
            .map(|c| c.matches(entity))
            .chain(
                self.filters
                    .iter()
                    .filter(|f| !f.is_empty())
                    .map(|f| f.matches(entity)),
            )
            .peekable();
        if results.peek().is_none() {
            return true;
        }
        match self.operator {
            LogicalOperator::And => results.all(|r| r),
            LogicalOperator::Or => results.any(|r| r),
        }
    }
}
