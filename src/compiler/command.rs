//! Write payload compiler
//!
//! Inserts become the encoded document itself; updates are wrapped in
//! their operator (`$set` for record updates).

use super::errors::{Clause, QueryResult};
use super::values::CompileContext;
use crate::document::{Document, Value};
use crate::query::{UpdateExpr, UpdateOp};

/// Store operator for an update group
pub fn update_operator(op: UpdateOp) -> &'static str {
    match op {
        UpdateOp::Set => "$set",
        UpdateOp::Inc => "$inc",
        UpdateOp::Push => "$push",
        UpdateOp::Pull => "$pull",
    }
}

/// Insert body; an empty payload encodes to `Document::Empty`
pub(crate) fn insert(ctx: &CompileContext<'_>, document: &[(String, Value)]) -> QueryResult<Document> {
    ctx.encode_pairs(document, Clause::InsertCommand)
        .map(Document::from_pairs)
}

/// `{"$set": ..}` for a single pre-resolved record
pub(crate) fn update(ctx: &CompileContext<'_>, values: &[(String, Value)]) -> QueryResult<Document> {
    let pairs = ctx.encode_pairs(values, Clause::UpdateCommand)?;
    Ok(set_command(pairs))
}

/// Update command for bulk updates, encoded against the query params.
///
/// Groups sharing an operator are merged in first-appearance order, so a
/// payload of only `set` groups is a single `{"$set": ..}`. No updates at
/// all is `{"$set": {}}`, never a bare empty document.
pub(crate) fn update_all(ctx: &CompileContext<'_>, updates: &[UpdateExpr]) -> QueryResult<Document> {
    let mut groups: Vec<(UpdateOp, Vec<(String, Value)>)> = Vec::new();

    for update in updates {
        let encoded = ctx.encode_payload(&update.fields, Clause::UpdateCommand)?;
        match groups.iter_mut().find(|(op, _)| *op == update.op) {
            Some((_, pairs)) => pairs.extend(encoded),
            None => groups.push((update.op, encoded)),
        }
    }

    if groups.is_empty() {
        return Ok(set_command(Vec::new()));
    }
    Ok(groups
        .into_iter()
        .map(|(op, pairs)| (update_operator(op), Value::Document(Document::from_pairs(pairs))))
        .collect())
}

fn set_command(pairs: Vec<(String, Value)>) -> Document {
    Document::single(update_operator(UpdateOp::Set), Document::from_pairs(pairs))
}
