//! Input query representation
//!
//! The node vocabulary is deliberately small: field references, bound
//! parameters (single or contiguous range), tagged values, n-ary
//! connectives, comparisons, null tests and negation.

mod ast;

pub use ast::{
    Cast, CompareOp, Direction, Expr, Join, OrderBy, QueryAst, Source, UpdateExpr, UpdateOp,
};
