//! Read and write options
//!
//! `num_return == 0` means unbounded to the driver.

use serde::Serialize;

use super::errors::{Clause, QueryError, QueryResult};
use super::values::CompileContext;
use crate::doc;
use crate::document::Document;
use crate::query::Expr;

/// Skip/limit for reads and counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReadOptions {
    pub num_return: i64,
    pub num_skip: i64,
}

impl ReadOptions {
    pub fn to_document(&self) -> Document {
        doc! {
            "num_return" => self.num_return,
            "num_skip" => self.num_skip,
        }
    }
}

/// Flags for writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WriteOptions {
    pub multi: bool,
}

impl WriteOptions {
    /// Bulk writes touch every matching document
    pub fn multi() -> Self {
        Self { multi: true }
    }

    /// Single-record writes carry no options
    pub fn single() -> Self {
        Self { multi: false }
    }

    pub fn to_document(&self) -> Document {
        if self.multi {
            doc! { "multi" => true }
        } else {
            Document::Empty
        }
    }
}

pub(crate) fn read_options(
    ctx: &CompileContext<'_>,
    limit: Option<&Expr>,
    offset: Option<&Expr>,
) -> QueryResult<ReadOptions> {
    Ok(ReadOptions {
        num_return: integer(ctx, limit, Clause::Limit)?,
        num_skip: integer(ctx, offset, Clause::Offset)?,
    })
}

fn integer(ctx: &CompileContext<'_>, node: Option<&Expr>, clause: Clause) -> QueryResult<i64> {
    let Some(node) = node else {
        return Ok(0);
    };
    ctx.value(node, clause)?
        .as_i64()
        .ok_or_else(|| QueryError::invalid(clause, node))
}
