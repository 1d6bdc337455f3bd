//! Order-by compiler

use super::errors::{Clause, QueryResult};
use super::values::CompileContext;
use crate::document::{Document, Value};
use crate::query::{Direction, OrderBy};

/// Store sort direction
pub fn direction_value(direction: Direction) -> i64 {
    match direction {
        Direction::Asc => 1,
        Direction::Desc => -1,
    }
}

/// Flattens every order-by clause into one direction document
pub(crate) fn compile(ctx: &CompileContext<'_>, order_bys: &[Vec<OrderBy>]) -> QueryResult<Document> {
    let pairs = order_bys
        .iter()
        .flatten()
        .map(|item| {
            let key = ctx.field(&item.expr, Clause::Order)?;
            Ok((key, Value::from(direction_value(item.direction))))
        })
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(Document::from_pairs(pairs))
}

/// Pairs filter and sort as `{"$query": .., "$orderby": ..}`.
///
/// The filter is always present (possibly empty); only an empty order
/// leaves the filter unwrapped.
pub(crate) fn with_filter(filter: Document, order: Document) -> Document {
    if order.is_empty() {
        return filter;
    }
    Document::from_pairs(vec![
        ("$query".to_string(), Value::Document(filter)),
        ("$orderby".to_string(), Value::Document(order)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::encoder::DefaultEncoder;
    use crate::doc;
    use crate::query::Expr;

    #[test]
    fn test_directions_in_clause_order() {
        let encoder = DefaultEncoder::default();
        let ctx = CompileContext::new(&encoder, &[], Some("id"), "_id");
        let order_bys = vec![
            vec![OrderBy::desc(Expr::field("name")), OrderBy::asc(Expr::field("id"))],
            vec![OrderBy::asc(Expr::field("name"))],
        ];
        let order = compile(&ctx, &order_bys).unwrap();
        assert_eq!(order.to_json(), r#"{"name":-1,"_id":1,"name":1}"#);
    }

    #[test]
    fn test_non_field_order_is_invalid() {
        let encoder = DefaultEncoder::default();
        let ctx = CompileContext::new(&encoder, &[], None, "_id");
        let err = compile(&ctx, &[vec![OrderBy::asc(Expr::literal(1))]]).unwrap_err();
        assert_eq!(err.clause_name(), "order clause");
    }

    #[test]
    fn test_composite_only_with_order() {
        let filter = doc! { "a" => 1 };
        assert_eq!(with_filter(filter.clone(), Document::Empty), filter);

        let wrapped = with_filter(filter, doc! { "b" => 1 });
        assert_eq!(wrapped.to_json(), r#"{"$query":{"a":1},"$orderby":{"b":1}}"#);

        let unfiltered = with_filter(Document::Empty, doc! { "b" => -1 });
        assert_eq!(unfiltered.to_json(), r#"{"$query":{},"$orderby":{"b":-1}}"#);

        assert_eq!(with_filter(Document::Empty, Document::Empty), Document::Empty);
    }
}
