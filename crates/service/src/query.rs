//! Typed filters shared by every store.
//!
//! A [`Query`] is translated into a SeaORM `Condition` for the database store and
//! evaluated directly against `ModelTrait::get` values by the in-memory store, so
//! both backends answer the same question the same way.

use std::cmp::Ordering;

use common::pagination::Pagination;
use models::{ColumnOf, Record};
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl From<Direction> for sea_orm::Order {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Asc => sea_orm::Order::Asc,
            Direction::Desc => sea_orm::Order::Desc,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Predicate<R: Record> {
    Eq(ColumnOf<R>, Value),
    Ne(ColumnOf<R>, Value),
    Gt(ColumnOf<R>, Value),
    Gte(ColumnOf<R>, Value),
    Lt(ColumnOf<R>, Value),
    Lte(ColumnOf<R>, Value),
    /// Inclusive on both ends.
    Between(ColumnOf<R>, Value, Value),
    In(ColumnOf<R>, Vec<Value>),
    IsNull(ColumnOf<R>),
    ContainsIgnoreCase(ColumnOf<R>, String),
}

impl<R: Record> Predicate<R> {
    pub fn eq(col: ColumnOf<R>, v: impl Into<Value>) -> Self { Self::Eq(col, v.into()) }
    pub fn ne(col: ColumnOf<R>, v: impl Into<Value>) -> Self { Self::Ne(col, v.into()) }
    pub fn gt(col: ColumnOf<R>, v: impl Into<Value>) -> Self { Self::Gt(col, v.into()) }
    pub fn gte(col: ColumnOf<R>, v: impl Into<Value>) -> Self { Self::Gte(col, v.into()) }
    pub fn lt(col: ColumnOf<R>, v: impl Into<Value>) -> Self { Self::Lt(col, v.into()) }
    pub fn lte(col: ColumnOf<R>, v: impl Into<Value>) -> Self { Self::Lte(col, v.into()) }

    pub fn between(col: ColumnOf<R>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::Between(col, low.into(), high.into())
    }

    pub fn is_in<V: Into<Value>>(col: ColumnOf<R>, values: impl IntoIterator<Item = V>) -> Self {
        Self::In(col, values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(col: ColumnOf<R>) -> Self { Self::IsNull(col) }

    pub fn contains(col: ColumnOf<R>, needle: impl Into<String>) -> Self {
        Self::ContainsIgnoreCase(col, needle.into())
    }

    fn to_expr(&self) -> SimpleExpr {
        match self {
            Self::Eq(c, v) => c.eq(v.clone()),
            Self::Ne(c, v) => c.ne(v.clone()),
            Self::Gt(c, v) => c.gt(v.clone()),
            Self::Gte(c, v) => c.gte(v.clone()),
            Self::Lt(c, v) => c.lt(v.clone()),
            Self::Lte(c, v) => c.lte(v.clone()),
            Self::Between(c, low, high) => c.between(low.clone(), high.clone()),
            Self::In(c, values) => c.is_in(values.clone()),
            Self::IsNull(c) => c.is_null(),
            Self::ContainsIgnoreCase(c, needle) => {
                Expr::expr(Func::lower(Expr::col((c.entity_name(), *c))))
                    .like(LikeExpr::new(like_pattern(needle)).escape('\\'))
            }
        }
    }

    /// SQL semantics: comparisons against NULL never match.
    pub fn matches(&self, record: &R) -> bool {
        use Ordering::*;
        match self {
            Self::Eq(c, v) => compare(&record.get(*c), v) == Some(Equal),
            Self::Ne(c, v) => matches!(compare(&record.get(*c), v), Some(Less | Greater)),
            Self::Gt(c, v) => compare(&record.get(*c), v) == Some(Greater),
            Self::Gte(c, v) => matches!(compare(&record.get(*c), v), Some(Greater | Equal)),
            Self::Lt(c, v) => compare(&record.get(*c), v) == Some(Less),
            Self::Lte(c, v) => matches!(compare(&record.get(*c), v), Some(Less | Equal)),
            Self::Between(c, low, high) => {
                let value = record.get(*c);
                matches!(compare(&value, low), Some(Greater | Equal))
                    && matches!(compare(&value, high), Some(Less | Equal))
            }
            Self::In(c, values) => {
                let value = record.get(*c);
                values.iter().any(|v| compare(&value, v) == Some(Equal))
            }
            Self::IsNull(c) => is_null(&record.get(*c)),
            Self::ContainsIgnoreCase(c, needle) => match record.get(*c) {
                Value::String(Some(s)) => s.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
        }
    }
}

/// `%needle%` over the lowercased needle, with LIKE wildcards taken literally.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.to_lowercase().chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Conjunction of predicates with optional ordering and paging.
#[derive(Clone, Debug)]
pub struct Query<R: Record> {
    predicates: Vec<Predicate<R>>,
    order: Option<(ColumnOf<R>, Direction)>,
    page: Option<Pagination>,
}

impl<R: Record> Default for Query<R> {
    fn default() -> Self {
        Self { predicates: Vec::new(), order: None, page: None }
    }
}

impl<R: Record> Query<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: Predicate<R>) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, col: ColumnOf<R>, direction: Direction) -> Self {
        self.order = Some((col, direction));
        self
    }

    pub fn paginate(mut self, page: Pagination) -> Self {
        self.page = Some(page);
        self
    }

    pub fn predicates(&self) -> &[Predicate<R>] {
        &self.predicates
    }

    pub fn ordering(&self) -> Option<(ColumnOf<R>, Direction)> {
        self.order
    }

    pub fn page(&self) -> Option<Pagination> {
        self.page
    }

    pub fn condition(&self) -> Condition {
        self.predicates
            .iter()
            .fold(Condition::all(), |cond, p| cond.add(p.to_expr()))
    }

    pub fn matches(&self, record: &R) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Sort and page already filtered rows.
    pub fn arrange(&self, mut rows: Vec<R>) -> Vec<R> {
        if let Some((col, direction)) = self.order {
            rows.sort_by(|a, b| {
                let ord = compare(&a.get(col), &b.get(col)).unwrap_or(Ordering::Equal);
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }
        match self.page {
            Some(page) => {
                let (_, per_page) = page.normalize();
                rows.into_iter()
                    .skip(page.offset() as usize)
                    .take(per_page as usize)
                    .collect()
            }
            None => rows,
        }
    }
}

fn integer(v: &Value) -> Option<i64> {
    match v {
        Value::TinyInt(Some(x)) => Some(i64::from(*x)),
        Value::SmallInt(Some(x)) => Some(i64::from(*x)),
        Value::Int(Some(x)) => Some(i64::from(*x)),
        Value::BigInt(Some(x)) => Some(*x),
        Value::TinyUnsigned(Some(x)) => Some(i64::from(*x)),
        Value::SmallUnsigned(Some(x)) => Some(i64::from(*x)),
        Value::Unsigned(Some(x)) => Some(i64::from(*x)),
        Value::BigUnsigned(Some(x)) => i64::try_from(*x).ok(),
        _ => None,
    }
}

/// Total order over the value kinds entities use; `None` for NULLs and mismatched kinds.
pub(crate) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Bool(Some(x)), Value::Bool(Some(y))) => Some(x.cmp(y)),
        (Value::String(Some(x)), Value::String(Some(y))) => Some(x.cmp(y)),
        (Value::Uuid(Some(x)), Value::Uuid(Some(y))) => Some(x.cmp(y)),
        (Value::Decimal(Some(x)), Value::Decimal(Some(y))) => Some(x.cmp(y)),
        (Value::ChronoDate(Some(x)), Value::ChronoDate(Some(y))) => Some(x.cmp(y)),
        (Value::ChronoTime(Some(x)), Value::ChronoTime(Some(y))) => Some(x.cmp(y)),
        (Value::ChronoDateTimeWithTimeZone(Some(x)), Value::ChronoDateTimeWithTimeZone(Some(y))) => Some(x.cmp(y)),
        (Value::Double(Some(x)), Value::Double(Some(y))) => x.partial_cmp(y),
        _ => match (integer(a), integer(b)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => None,
        },
    }
}

fn is_null(v: &Value) -> bool {
    matches!(
        v,
        Value::Bool(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Uuid(None)
            | Value::Decimal(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTimeWithTimeZone(None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use models::{customer, sales_order};
    use models::enums::OrderStatus;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn order(total: i64, day: u32, invoice: Option<Uuid>) -> sales_order::Model {
        let now = Utc::now().into();
        sales_order::Model {
            id: Uuid::new_v4(),
            order_number: format!("SO-{day}"),
            customer_id: Uuid::new_v4(),
            invoice_id: invoice,
            order_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            total_amount: Decimal::new(total, 0),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn range_predicates_follow_sql_semantics() {
        let o = order(150, 10, None);
        assert!(Predicate::<sales_order::Model>::gt(sales_order::Column::TotalAmount, Decimal::new(100, 0)).matches(&o));
        assert!(!Predicate::<sales_order::Model>::gt(sales_order::Column::TotalAmount, Decimal::new(150, 0)).matches(&o));
        assert!(Predicate::<sales_order::Model>::between(
            sales_order::Column::OrderDate,
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
        )
        .matches(&o));
        // NULL never equals anything, not even through Ne
        assert!(!Predicate::<sales_order::Model>::ne(sales_order::Column::InvoiceId, Uuid::new_v4()).matches(&o));
        assert!(Predicate::<sales_order::Model>::is_null(sales_order::Column::InvoiceId).matches(&o));
    }

    #[test]
    fn enum_and_in_predicates() {
        let o = order(10, 1, Some(Uuid::new_v4()));
        assert!(Predicate::<sales_order::Model>::eq(sales_order::Column::Status, OrderStatus::Pending).matches(&o));
        assert!(!Predicate::<sales_order::Model>::eq(sales_order::Column::Status, OrderStatus::Shipped).matches(&o));
        assert!(Predicate::<sales_order::Model>::is_in(sales_order::Column::Id, vec![Uuid::new_v4(), o.id]).matches(&o));
        assert!(!Predicate::<sales_order::Model>::is_in(sales_order::Column::Id, Vec::<Uuid>::new()).matches(&o));
    }

    #[test]
    fn contains_is_case_insensitive() {
        let now = Utc::now().into();
        let c = customer::Model {
            id: Uuid::new_v4(),
            name: "ACME Industries".into(),
            email: "ops@acme.test".into(),
            phone: None,
            address: None,
            created_at: now,
            updated_at: now,
        };
        assert!(Predicate::<customer::Model>::contains(customer::Column::Name, "industr").matches(&c));
        assert!(!Predicate::<customer::Model>::contains(customer::Column::Phone, "1").matches(&c));
    }

    #[test]
    fn like_wildcards_in_needles_are_literal() {
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("A_b\\c"), "%a\\_b\\\\c%");

        let now = Utc::now().into();
        let c = customer::Model {
            id: Uuid::new_v4(),
            name: "Discount 500 units".into(),
            email: "ops@acme.test".into(),
            phone: None,
            address: None,
            created_at: now,
            updated_at: now,
        };
        assert!(!Predicate::<customer::Model>::contains(customer::Column::Name, "50%").matches(&c));
        assert!(Predicate::<customer::Model>::contains(customer::Column::Name, "500").matches(&c));

        let cond = Query::<customer::Model>::new()
            .filter(Predicate::contains(customer::Column::Name, "50%"))
            .condition();
        let sql = sea_orm::sea_query::Query::select()
            .column(customer::Column::Id)
            .from(customer::Entity)
            .cond_where(cond)
            .to_string(sea_orm::sea_query::PostgresQueryBuilder);
        assert!(sql.contains("ESCAPE"), "{sql}");
    }

    #[test]
    fn arrange_orders_and_pages() {
        let rows = vec![order(30, 3, None), order(10, 1, None), order(20, 2, None)];
        let q = Query::<sales_order::Model>::new()
            .order_by(sales_order::Column::TotalAmount, Direction::Desc)
            .paginate(Pagination::new(1, 2));
        let out = q.arrange(rows);
        let totals: Vec<_> = out.iter().map(|o| o.total_amount).collect();
        assert_eq!(totals, vec![Decimal::new(30, 0), Decimal::new(20, 0)]);
    }

    #[test]
    fn mixed_integer_widths_compare() {
        assert_eq!(compare(&Value::Int(Some(5)), &Value::BigInt(Some(5))), Some(Ordering::Equal));
        assert_eq!(compare(&Value::Int(None), &Value::Int(Some(1))), None);
    }
}
