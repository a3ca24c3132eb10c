//! SQL compilation of a [`Query`] through `sea-query`.
//!
//! Item names may be qualified as `Table.Column`. Conditions inside a
//! link's criteria are qualified with the link's alias or target table.

use sea_query::{Asterisk, Condition as SqlCondition, DynIden, Expr, ExprTrait, JoinType, Order as SqlOrder, SelectStatement};

use super::model::{Condition, ConditionOperator, Filter, JoinOperator, LogicalOperator, OrderType, Query};
use crate::metrics::METRICS;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

fn iden(name: &str) -> DynIden {
    DynIden::from(name.to_string())
}

fn column(table: Option<&str>, item_name: &str) -> Expr {
    match (table, item_name.split_once('.')) {
        (_, Some((t, c))) => Expr::col((iden(t), iden(c))),
        (Some(t), None) => Expr::col((iden(t), iden(item_name))),
        (None, None) => Expr::col(iden(item_name)),
    }
}

fn condition_expr(table: Option<&str>, condition: &Condition) -> Expr {
    let col = column(table, &condition.item_name);
    let value = condition.value.to_sql_value();
    match condition.operator {
        ConditionOperator::Equal => col.eq(value),
        ConditionOperator::NotEqual => col.ne(value),
        ConditionOperator::GreaterThan => col.gt(value),
        ConditionOperator::GreaterEqual => col.gte(value),
        ConditionOperator::LessThan => col.lt(value),
        ConditionOperator::LessEqual => col.lte(value),
        ConditionOperator::Like => col.like(format!("%{}%", condition.value)),
        ConditionOperator::NotLike => col.not_like(format!("%{}%", condition.value)),
        ConditionOperator::Null => col.is_null(),
        ConditionOperator::NotNull => col.is_not_null(),
    }
}

/// `sea-query` condition tree for a filter
pub fn filter_condition(table: Option<&str>, filter: &Filter) -> SqlCondition {
    let mut cond = match filter.operator {
        LogicalOperator::And => SqlCondition::all(),
        LogicalOperator::Or => SqlCondition::any(),
    };
    for condition in &filter.conditions {
        cond = cond.add(condition_expr(table, condition));
    }
    for child in filter.filters.iter().filter(|f| !f.is_empty()) {
        cond = cond.add(filter_condition(table, child));
    }
    cond
}

impl Query {
    /// `SELECT` statement for this query.
    ///
    /// Without columns every column is selected. Limit and offset follow
    /// the same `top`/`skip`/paging rules as the OData form.
    pub fn to_select_statement(&self) -> SelectStatement {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::compile_span(&self.entity_name, "sql").entered();

        let mut stmt = SelectStatement::new();
        stmt.from(iden(&self.entity_name));
        if self.distinct {
            stmt.distinct();
        }
        if self.columns.is_empty() {
            stmt.column(Asterisk);
        }
        for name in &self.columns {
            stmt.expr(column(None, name));
        }

        for link in &self.links {
            let target = link.alias.as_deref().unwrap_or(&link.to_entity_name);
            for name in &link.columns {
                stmt.expr(column(Some(target), name));
            }
            let mut on = SqlCondition::all().add(
                Expr::col((iden(&link.from_entity_name), iden(&link.from_item_name)))
                    .equals((iden(target), iden(&link.to_item_name))),
            );
            if let Some(criteria) = link.criteria.as_ref().filter(|c| !c.is_empty()) {
                on = on.add(filter_condition(Some(target), criteria));
            }
            let join = match link.join_operator {
                JoinOperator::Inner => JoinType::InnerJoin,
                JoinOperator::LeftOuter => JoinType::LeftJoin,
                JoinOperator::Natural => JoinType::Join,
            };
            match &link.alias {
                Some(alias) => {
                    stmt.join_as(join, iden(&link.to_entity_name), iden(alias), on);
                }
                None => {
                    stmt.join(join, iden(&link.to_entity_name), on);
                }
            }
        }

        if let Some(criteria) = self.criteria.as_ref().filter(|c| !c.is_empty()) {
            stmt.cond_where(filter_condition(None, criteria));
        }
        for order in &self.orders {
            let direction = match order.order_type {
                OrderType::Ascending => SqlOrder::Asc,
                OrderType::Descending => SqlOrder::Desc,
            };
            stmt.order_by_expr(column(None, &order.item_name), direction);
        }
        if let Some(top) = self.effective_top() {
            stmt.limit(top);
        }
        if let Some(skip) = self.effective_skip() {
            stmt.offset(skip);
        }
        METRICS.record_compile();
        stmt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::PagingInfo;
    use sea_query::PostgresQueryBuilder;

    #[test]
    fn test_customer_select() {
        let mut q = Query::new("Customer");
        q.add_column("Name").add_column("Age");
        q.criteria_mut()
            .add_condition("Age", ConditionOperator::GreaterThan, 18i32)
            .add_condition("Age", ConditionOperator::LessThan, 65i32);
        q.add_order("Name", OrderType::Ascending);
        q.top = 10;
        let sql = q.to_select_statement().to_string(PostgresQueryBuilder);
        assert_eq!(
            sql,
            r#"SELECT "Name", "Age" FROM "Customer" WHERE "Age" > 18 AND "Age" < 65 ORDER BY "Name" ASC LIMIT 10"#
        );
    }

    #[test]
    fn test_select_all_with_paging() {
        let mut q = Query::new("Customer");
        q.page_info = Some(PagingInfo::new(20, 2));
        let sql = q.to_select_statement().to_string(PostgresQueryBuilder);
        assert_eq!(sql, r#"SELECT * FROM "Customer" LIMIT 20 OFFSET 20"#);
    }

    #[test]
    fn test_nested_or_and_like() {
        let mut q = Query::new("Customer");
        let root = q.criteria_mut();
        root.add_condition("Name", ConditionOperator::Like, "ac");
        root.add_filter(LogicalOperator::Or)
            .add_condition("City", ConditionOperator::Equal, "Oslo")
            .add_condition("City", ConditionOperator::Null, crate::value::Value::Null);
        let sql = q.to_select_statement().to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#""Name" LIKE '%ac%'"#), "{}", sql);
        assert!(sql.contains(r#"("City" = 'Oslo' OR "City" IS NULL)"#), "{}", sql);
    }

    #[test]
    fn test_link_join() {
        let mut q = Query::new("Order");
        let link = q.add_link("Customer", "CustomerId", "Id", JoinOperator::LeftOuter);
        link.columns.push("Name".to_string());
        let sql = q.to_select_statement().to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#"LEFT JOIN "Customer" ON "Order"."CustomerId" = "Customer"."Id""#), "{}", sql);
        assert!(sql.contains(r#""Customer"."Name""#), "{}", sql);
    }
}
