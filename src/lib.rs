//! docwire - compiles relational query ASTs for a document store
//!
//! Reads become a filter/sort document plus projection and skip/limit;
//! writes become a filter plus an insert body or update operators.

pub mod cli;
pub mod compiler;
pub mod config;
pub mod document;
pub mod observability;
pub mod query;

pub use compiler::{
    CountQuery, DefaultEncoder, Encoder, QueryCompiler, QueryError, QueryResult, ReadQuery,
    SchemaRegistry, StaticSchemaRegistry, WriteQuery,
};
pub use config::CompilerConfig;
pub use document::{Document, Value};
pub use query::{Expr, QueryAst};
