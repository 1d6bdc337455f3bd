//! Compiled query descriptors
//!
//! Immutable records handed to the driver. Created once per compilation,
//! never mutated afterwards.

use serde::Serialize;

use super::options::{ReadOptions, WriteOptions};
use crate::document::{Document, Value};

/// How the result stage rebuilds one selected item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputField {
    /// Constant or bound parameter, already resolved
    Value(Value),
    /// The whole source record
    Model {
        model: Option<String>,
        coll: String,
    },
    /// A document key (primary key already renamed)
    Field(String),
}

/// Compiled find operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadQuery {
    pub coll: String,
    pub pk: Option<String>,
    pub params: Vec<Value>,
    /// Filter, or `{"$query": filter, "$orderby": order}`
    pub query: Document,
    pub projection: Document,
    pub fields: Vec<OutputField>,
    pub opts: ReadOptions,
}

impl ReadQuery {
    /// Filter part of the query, unwrapping the composite form
    pub fn filter(&self) -> &Document {
        match self.query.get("$query") {
            Some(Value::Document(filter)) if self.is_composite() => filter,
            _ => &self.query,
        }
    }

    /// Sort part of the query, empty when unordered
    pub fn order(&self) -> Option<&Document> {
        match self.query.get("$orderby") {
            Some(Value::Document(order)) if self.is_composite() => Some(order),
            _ => None,
        }
    }

    fn is_composite(&self) -> bool {
        self.query.keys().eq(["$query", "$orderby"])
    }
}

/// Compiled insert, update or delete
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteQuery {
    pub coll: String,
    /// Filter; empty for inserts
    pub query: Document,
    /// Command body; `None` for deletes
    pub command: Option<Document>,
    pub opts: WriteOptions,
}

/// Compiled count operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountQuery {
    pub coll: String,
    pub pk: Option<String>,
    pub query: Document,
    pub opts: ReadOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn read(query: Document) -> ReadQuery {
        ReadQuery {
            coll: "users".into(),
            pk: None,
            params: Vec::new(),
            query,
            projection: Document::Empty,
            fields: Vec::new(),
            opts: ReadOptions::default(),
        }
    }

    #[test]
    fn test_filter_and_order_accessors() {
        let plain = read(doc! { "a" => 1 });
        assert_eq!(plain.filter(), &doc! { "a" => 1 });
        assert!(plain.order().is_none());

        let composite = read(doc! {
            "$query" => doc! { "a" => 1 },
            "$orderby" => doc! { "b" => -1 },
        });
        assert_eq!(composite.filter(), &doc! { "a" => 1 });
        assert_eq!(composite.order(), Some(&doc! { "b" => -1 }));
    }

    #[test]
    fn test_serializes_in_field_order() {
        let json = serde_json::to_string(&read(doc! { "a" => 1 })).unwrap();
        assert!(json.starts_with(r#"{"coll":"users","pk":null"#));
        assert!(json.contains(r#""query":{"a":1}"#));
        assert!(json.contains(r#""opts":{"num_return":0,"num_skip":0}"#));
    }

    #[test]
    fn test_output_field_json() {
        let field = OutputField::Model {
            model: Some("User".into()),
            coll: "users".into(),
        };
        assert_eq!(
            serde_json::to_string(&field).unwrap(),
            r#"{"model":{"model":"User","coll":"users"}}"#
        );
    }
}
