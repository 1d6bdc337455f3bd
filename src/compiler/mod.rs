//! Query compiler subsystem
//!
//! Translates relational query ASTs into the document store's native
//! query documents, projections, sort specs, options and commands.
//!
//! # Design Principles
//!
//! - Deterministic: same AST and params → same descriptor
//! - Explicit: unsupported clauses are rejected, never approximated
//! - Injected: primary keys come from a `SchemaRegistry`, values from an
//!   `Encoder`
//!
//! # Stages (fixed order for reads)
//!
//! 1. Validation
//! 2. Filter
//! 3. Order (wrapped with the filter when present)
//! 4. Projection
//! 5. Options

mod command;
#[allow(clippy::module_inception)]
mod compiler;
mod descriptors;
mod encoder;
mod errors;
mod explain;
mod expr;
mod options;
mod order;
mod projection;
mod schema;
mod validator;
mod values;

pub use command::update_operator;
pub use compiler::QueryCompiler;
pub use descriptors::{CountQuery, OutputField, ReadQuery, WriteQuery};
pub use encoder::{apply_cast, DefaultEncoder, Encoder};
pub use errors::{
    Clause, ClauseKind, EncodeError, EncodeErrorKind, QueryError, QueryErrorCode, QueryResult,
};
pub use explain::ExplainQuery;
pub use expr::operator;
pub use options::{ReadOptions, WriteOptions};
pub use order::direction_value;
pub use schema::{SchemaRegistry, StaticSchemaRegistry};
pub use validator::QueryValidator;
