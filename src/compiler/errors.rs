//! Compiler error types
//!
//! Error codes:
//! - DOCWIRE_UNSUPPORTED_CLAUSE (REJECT)
//! - DOCWIRE_INVALID_EXPRESSION (REJECT)
//!
//! Both are synchronous and non-retryable; a failing stage aborts the whole
//! compilation. Out-of-range parameter indexes are a caller contract
//! violation and panic instead.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::query::{Cast, Expr};

/// Clauses the document store cannot express
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    Distinct,
    Lock,
    Joins,
    GroupBy,
    Having,
}

impl ClauseKind {
    /// Fixed human-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            ClauseKind::Distinct => "distinct clauses",
            ClauseKind::Lock => "locking",
            ClauseKind::Joins => "join clauses",
            ClauseKind::GroupBy => "group_by clauses",
            ClauseKind::Having => "having clauses",
        }
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Clause being compiled, reported with invalid expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Clause {
    Where,
    Select,
    Order,
    Limit,
    Offset,
    UpdateCommand,
    InsertCommand,
}

impl Clause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Clause::Where => "where clause",
            Clause::Select => "select clause",
            Clause::Order => "order clause",
            Clause::Limit => "limit clause",
            Clause::Offset => "offset clause",
            Clause::UpdateCommand => "update command",
            Clause::InsertCommand => "insert command",
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the encoder refused a node
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeErrorKind {
    /// Node is not a value (field reference, operator, parameter range, ...)
    #[error("not a value")]
    NotAValue,
    /// Cast does not apply to the resolved value
    #[error("cannot cast to {0}")]
    InvalidCast(Cast),
    /// Document key the store refuses (empty, `$`-prefixed, dotted)
    #[error("invalid document key")]
    InvalidKey,
}

/// Encoder failure carrying the offending node
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot encode {node:?}: {kind}")]
pub struct EncodeError {
    pub node: Box<Expr>,
    pub kind: EncodeErrorKind,
}

impl EncodeError {
    pub fn new(node: Expr, kind: EncodeErrorKind) -> Self {
        Self {
            node: Box::new(node),
            kind,
        }
    }
}

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorCode {
    UnsupportedClause,
    InvalidExpression,
}

impl QueryErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::UnsupportedClause => "DOCWIRE_UNSUPPORTED_CLAUSE",
            QueryErrorCode::InvalidExpression => "DOCWIRE_INVALID_EXPRESSION",
        }
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Compilation failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Validator rejected a clause
    #[error("document store does not support {clause}")]
    UnsupportedClause { clause: ClauseKind },

    /// A stage met a node it cannot translate
    #[error("invalid expression in {clause}: {node:?}")]
    InvalidExpression {
        clause: Clause,
        node: Box<Expr>,
        detail: Option<EncodeErrorKind>,
    },
}

impl QueryError {
    pub fn unsupported(clause: ClauseKind) -> Self {
        QueryError::UnsupportedClause { clause }
    }

    pub fn invalid(clause: Clause, node: &Expr) -> Self {
        QueryError::InvalidExpression {
            clause,
            node: Box::new(node.clone()),
            detail: None,
        }
    }

    /// Wraps an encoder failure, keeping the node the encoder reported
    pub fn from_encode(clause: Clause, err: EncodeError) -> Self {
        QueryError::InvalidExpression {
            clause,
            node: err.node,
            detail: Some(err.kind),
        }
    }

    pub fn code(&self) -> QueryErrorCode {
        match self {
            QueryError::UnsupportedClause { .. } => QueryErrorCode::UnsupportedClause,
            QueryError::InvalidExpression { .. } => QueryErrorCode::InvalidExpression,
        }
    }

    /// Clause name for invalid expressions, reason for unsupported clauses
    pub fn clause_name(&self) -> &'static str {
        match self {
            QueryError::UnsupportedClause { clause } => clause.reason(),
            QueryError::InvalidExpression { clause, .. } => clause.as_str(),
        }
    }
}

/// Result type for compiler operations
pub type QueryResult<T> = Result<T, QueryError>;
