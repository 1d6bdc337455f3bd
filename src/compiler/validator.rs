//! Rejects query shapes the document store cannot express.
//!
//! Checks run in a fixed order and stop at the first violation.

use super::errors::{ClauseKind, QueryError, QueryResult};
use crate::query::QueryAst;

/// Validates a query before compilation
pub struct QueryValidator;

impl QueryValidator {
    pub fn validate(query: &QueryAst) -> QueryResult<()> {
        Self::check(query.distinct.is_none(), ClauseKind::Distinct)?;
        Self::check(query.lock.is_none(), ClauseKind::Lock)?;
        Self::check(query.joins.is_empty(), ClauseKind::Joins)?;
        Self::check(query.group_bys.is_empty(), ClauseKind::GroupBy)?;
        Self::check(query.havings.is_empty(), ClauseKind::Having)
    }

    fn check(supported: bool, clause: ClauseKind) -> QueryResult<()> {
        if supported {
            Ok(())
        } else {
            Err(QueryError::unsupported(clause))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Expr;

    #[test]
    fn test_plain_query_passes() {
        assert!(QueryValidator::validate(&QueryAst::new("users")).is_ok());
    }

    #[test]
    fn test_each_clause_rejected() {
        let cases = [
            (QueryAst::new("u").distinct(Expr::literal(true)), ClauseKind::Distinct),
            (QueryAst::new("u").lock("FOR UPDATE"), ClauseKind::Lock),
            (QueryAst::new("u").join("posts", Expr::literal(true)), ClauseKind::Joins),
            (QueryAst::new("u").group_by(Expr::field("a")), ClauseKind::GroupBy),
            (QueryAst::new("u").having(Expr::literal(true)), ClauseKind::Having),
        ];
        for (query, clause) in cases {
            assert_eq!(
                QueryValidator::validate(&query),
                Err(QueryError::unsupported(clause))
            );
        }
    }

    #[test]
    fn test_first_violation_wins() {
        let query = QueryAst::new("u")
            .having(Expr::literal(true))
            .lock("FOR UPDATE")
            .distinct(Expr::literal(true));
        assert_eq!(
            QueryValidator::validate(&query),
            Err(QueryError::unsupported(ClauseKind::Distinct))
        );
    }
}
