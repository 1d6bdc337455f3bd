//! Explain output for compiled queries
//!
//! Deterministic, human-readable rendering of a descriptor or a
//! rejection.

use std::fmt;

use super::descriptors::{CountQuery, ReadQuery, WriteQuery};
use super::errors::QueryError;

/// Explain output
#[derive(Debug, Clone)]
pub struct ExplainQuery {
    /// Whether compilation succeeded
    pub accepted: bool,
    pub collection: Option<String>,
    /// Filter document as extended JSON
    pub filter: Option<String>,
    pub order: Option<String>,
    pub projection: Option<String>,
    pub command: Option<String>,
    /// Options document as extended JSON
    pub options: Option<String>,
    pub rejection_reason: Option<String>,
    pub rejection_code: Option<String>,
}

impl ExplainQuery {
    fn accepted(collection: &str) -> Self {
        Self {
            accepted: true,
            collection: Some(collection.to_string()),
            filter: None,
            order: None,
            projection: None,
            command: None,
            options: None,
            rejection_reason: None,
            rejection_code: None,
        }
    }

    pub fn from_read(query: &ReadQuery) -> Self {
        Self {
            filter: Some(query.filter().to_json()),
            order: query.order().map(|order| order.to_json()),
            projection: Some(query.projection.to_json()),
            options: Some(query.opts.to_document().to_json()),
            ..Self::accepted(&query.coll)
        }
    }

    pub fn from_write(query: &WriteQuery) -> Self {
        Self {
            filter: Some(query.query.to_json()),
            command: query.command.as_ref().map(|command| command.to_json()),
            options: Some(query.opts.to_document().to_json()),
            ..Self::accepted(&query.coll)
        }
    }

    pub fn from_count(query: &CountQuery) -> Self {
        Self {
            filter: Some(query.query.to_json()),
            options: Some(query.opts.to_document().to_json()),
            ..Self::accepted(&query.coll)
        }
    }

    /// Creates explain output from a compile error
    pub fn from_error(err: &QueryError) -> Self {
        Self {
            accepted: false,
            collection: None,
            filter: None,
            order: None,
            projection: None,
            command: None,
            options: None,
            rejection_reason: Some(err.to_string()),
            rejection_code: Some(err.code().code().to_string()),
        }
    }
}

impl fmt::Display for ExplainQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN ===")?;

        if self.accepted {
            writeln!(f, "Status: ACCEPTED")?;
            if let Some(coll) = &self.collection {
                writeln!(f, "Collection: {}", coll)?;
            }
            if let Some(filter) = &self.filter {
                writeln!(f, "Filter: {}", filter)?;
            }
            if let Some(order) = &self.order {
                writeln!(f, "Order: {}", order)?;
            }
            if let Some(projection) = &self.projection {
                writeln!(f, "Projection: {}", projection)?;
            }
            if let Some(command) = &self.command {
                writeln!(f, "Command: {}", command)?;
            }
            if let Some(options) = &self.options {
                writeln!(f, "Options: {}", options)?;
            }
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }

        Ok(())
    }
}
