//! Document model for compiled store commands
//!
//! Compiler output is expressed as [`Document`]s: empty, or an ordered
//! list of `(key, Value)` pairs where keys may repeat. Scalars are BSON.

mod document;
mod value;

pub use document::Document;
pub use value::Value;
