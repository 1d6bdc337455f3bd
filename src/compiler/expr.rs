//! Boolean expression compiler
//!
//! Turns filter expressions into `(key, value)` pairs. Dispatch order
//! (first match wins):
//!
//! 1. `and`/`or` → `("$and" | "$or", [...])`
//! 2. `field in params[i..i+n]` → `(field, {"$in": [...]})`
//! 3. `is_nil(field)` → `(field, null)`
//! 4. `field == v` → `(field, v)`
//! 5. `field <op> v` → `(field, {"$op": v})`
//! 6. `not(field in params[i..i+n])` → `(field, {"$nin": [...]})`
//! 7. `not(field in v)` → `(field, {"$nin": v})`
//! 8. `not(is_nil(field))` → `(field, {"$ne": null})`
//! 9. `not(field == v)` → `(field, {"$ne": v})`
//! 10. `not(expr)` → `("$not", {expr})`
//! 11. `^param` holding raw code → `("$where", code)`
//! 12. anything else is an invalid expression
//!
//! Negation is pushed into the comparison where the store has a direct
//! operator; `$not` only wraps what is left.

use bson::Bson;

use super::errors::{Clause, QueryError, QueryResult};
use super::values::CompileContext;
use crate::document::{Document, Value};
use crate::query::{CompareOp, Expr};

/// Store operator per comparison; equality has no operator key
const OPERATORS: [(CompareOp, &str); 7] = [
    (CompareOp::Eq, "$eq"),
    (CompareOp::Ne, "$ne"),
    (CompareOp::Gt, "$gt"),
    (CompareOp::Gte, "$gte"),
    (CompareOp::Lt, "$lt"),
    (CompareOp::Lte, "$lte"),
    (CompareOp::In, "$in"),
];

/// Store operator symbol for `op`
pub fn operator(op: CompareOp) -> &'static str {
    OPERATORS
        .iter()
        .find(|(candidate, _)| *candidate == op)
        .map_or("$eq", |(_, symbol)| *symbol)
}

/// A compiled boolean node
pub type Pair = (String, Value);

/// Compiles every where clause into one flat document.
///
/// Clauses become sibling keys; no `$and` is added, and an empty clause
/// list yields `Document::Empty`.
pub(crate) fn compile_filter(
    ctx: &CompileContext<'_>,
    wheres: &[Expr],
    clause: Clause,
) -> QueryResult<Document> {
    let pairs = wheres
        .iter()
        .map(|expr| compile(ctx, expr, clause))
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(Document::from_pairs(pairs))
}

/// Compiles one boolean expression
pub(crate) fn compile(ctx: &CompileContext<'_>, expr: &Expr, clause: Clause) -> QueryResult<Pair> {
    match expr {
        Expr::And(args) => connective(ctx, "$and", args, clause),
        Expr::Or(args) => connective(ctx, "$or", args, clause),
        Expr::IsNil(field) => Ok((ctx.field(field, clause)?, Value::NULL)),
        Expr::Compare { op, left, right } => comparison(ctx, *op, left, right, clause),
        Expr::Not(inner) => negation(ctx, inner, clause),
        Expr::Param(_) => match ctx.value(expr, clause)? {
            code @ Value::Bson(Bson::JavaScriptCode(_)) => Ok(("$where".to_string(), code)),
            _ => Err(QueryError::invalid(clause, expr)),
        },
        Expr::Field(_)
        | Expr::Source
        | Expr::Literal(_)
        | Expr::ParamRange { .. }
        | Expr::Tagged { .. } => Err(QueryError::invalid(clause, expr)),
    }
}

fn connective(
    ctx: &CompileContext<'_>,
    op: &str,
    args: &[Expr],
    clause: Clause,
) -> QueryResult<Pair> {
    let operands = args
        .iter()
        .map(|arg| {
            if arg.is_operator() {
                Ok(Value::Document(Document::from(compile(ctx, arg, clause)?)))
            } else {
                ctx.value(arg, clause)
            }
        })
        .collect::<QueryResult<Vec<_>>>()?;
    Ok((op.to_string(), Value::Array(operands)))
}

fn comparison(
    ctx: &CompileContext<'_>,
    op: CompareOp,
    left: &Expr,
    right: &Expr,
    clause: Clause,
) -> QueryResult<Pair> {
    let key = ctx.field(left, clause)?;
    match (op, right) {
        (CompareOp::In, Expr::ParamRange { start, len }) => {
            let values = ctx.param_range(*start, *len, clause)?;
            Ok((key, Document::single("$in", values).into()))
        }
        (CompareOp::Eq, _) => Ok((key, ctx.value(right, clause)?)),
        (op, _) => Ok((key, Document::single(operator(op), ctx.value(right, clause)?).into())),
    }
}

fn negation(ctx: &CompileContext<'_>, inner: &Expr, clause: Clause) -> QueryResult<Pair> {
    match inner {
        Expr::Compare {
            op: CompareOp::In,
            left,
            right,
        } => {
            let key = ctx.field(left, clause)?;
            let values = match &**right {
                Expr::ParamRange { start, len } => Value::Array(ctx.param_range(*start, *len, clause)?),
                other => ctx.value(other, clause)?,
            };
            Ok((key, Document::single("$nin", values).into()))
        }
        Expr::IsNil(field) => Ok((ctx.field(field, clause)?, Document::single("$ne", Value::NULL).into())),
        Expr::Compare {
            op: CompareOp::Eq,
            left,
            right,
        } => {
            let key = ctx.field(left, clause)?;
            Ok((key, Document::single("$ne", ctx.value(right, clause)?).into()))
        }
        other => {
            let compiled = compile(ctx, other, clause)?;
            Ok(("$not".to_string(), Document::from(compiled).into()))
        }
    }
}
