//! Select clause compiler
//!
//! Produces the projection document and, in parallel, the output-field
//! list the result stage uses to rebuild rows positionally.

use super::descriptors::OutputField;
use super::errors::{Clause, QueryResult};
use super::values::CompileContext;
use crate::document::{Document, Value};
use crate::query::{Expr, Source};

/// Compiled select clause
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Projection {
    pub document: Document,
    pub fields: Vec<OutputField>,
}

/// No select clause means "all fields" with no output descriptors.
///
/// Selecting the whole record anywhere in the list empties the projection:
/// a field-level restriction means nothing once everything is requested.
pub(crate) fn compile(
    ctx: &CompileContext<'_>,
    select: Option<&[Expr]>,
    from: &Source,
) -> QueryResult<Projection> {
    let Some(items) = select else {
        return Ok(Projection::default());
    };

    let mut includes = Vec::new();
    let mut whole_record = false;
    let mut fields = Vec::with_capacity(items.len());

    for item in items {
        let field = match item {
            Expr::Source => {
                whole_record = true;
                OutputField::Model {
                    model: from.model.clone(),
                    coll: from.coll.clone(),
                }
            }
            Expr::Field(_) => {
                let key = ctx.field(item, Clause::Select)?;
                includes.push((key.clone(), Value::from(true)));
                OutputField::Field(key)
            }
            other => OutputField::Value(ctx.value(other, Clause::Select)?),
        };
        fields.push(field);
    }

    let document = if whole_record {
        Document::Empty
    } else {
        Document::from_pairs(includes)
    };
    Ok(Projection { document, fields })
}
