//! Value and field resolution
//!
//! Shared by every compiler stage: values go through the encoder, and the
//! primary key is renamed to the identity key wherever it appears as a key
//! (field references, filters, payloads). The identity key comes from the
//! compiler config only.

use super::encoder::Encoder;
use super::errors::{Clause, QueryError, QueryResult};
use crate::document::Value;
use crate::query::Expr;

/// Inputs common to all stages of one compilation
pub(crate) struct CompileContext<'a> {
    pub encoder: &'a dyn Encoder,
    pub params: &'a [Value],
    pub pk: Option<&'a str>,
    pub identity_key: &'a str,
}

impl<'a> CompileContext<'a> {
    pub fn new(
        encoder: &'a dyn Encoder,
        params: &'a [Value],
        pk: Option<&'a str>,
        identity_key: &'a str,
    ) -> Self {
        Self {
            encoder,
            params,
            pk,
            identity_key,
        }
    }

    /// Resolves a literal, bound parameter or tagged value
    pub fn value(&self, node: &Expr, clause: Clause) -> QueryResult<Value> {
        self.encoder
            .encode_value(node, self.params)
            .map_err(|err| QueryError::from_encode(clause, err))
    }

    /// Resolves each parameter of `params[start..start + len]`
    pub fn param_range(&self, start: usize, len: usize, clause: Clause) -> QueryResult<Vec<Value>> {
        let end = start
            .checked_add(len)
            .ok_or_else(|| QueryError::invalid(clause, &Expr::ParamRange { start, len }))?;
        (start..end)
            .map(|index| self.value(&Expr::Param(index), clause))
            .collect()
    }

    /// Output key for a field name
    pub fn key(&self, name: &str) -> String {
        match self.pk {
            Some(pk) if pk == name => self.identity_key.to_string(),
            _ => name.to_string(),
        }
    }

    /// Output key for a field reference
    pub fn field(&self, node: &Expr, clause: Clause) -> QueryResult<String> {
        match node {
            Expr::Field(name) => Ok(self.key(name)),
            other => Err(QueryError::invalid(clause, other)),
        }
    }

    /// Encodes pre-resolved pairs, then renames the primary key
    pub fn encode_pairs(
        &self,
        values: &[(String, Value)],
        clause: Clause,
    ) -> QueryResult<Vec<(String, Value)>> {
        let encoded = self
            .encoder
            .encode_values(values)
            .map_err(|err| QueryError::from_encode(clause, err))?;
        Ok(self.rename(encoded))
    }

    /// Encodes payload fields against the params, then renames the primary key
    pub fn encode_payload(
        &self,
        fields: &[(String, Expr)],
        clause: Clause,
    ) -> QueryResult<Vec<(String, Value)>> {
        let encoded = self
            .encoder
            .encode_fields(fields, self.params)
            .map_err(|err| QueryError::from_encode(clause, err))?;
        Ok(self.rename(encoded))
    }

    fn rename(&self, pairs: Vec<(String, Value)>) -> Vec<(String, Value)> {
        pairs
            .into_iter()
            .map(|(key, value)| (self.key(&key), value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::encoder::DefaultEncoder;

    #[test]
    fn test_field_renames_pk() {
        let encoder = DefaultEncoder::default();
        let ctx = CompileContext::new(&encoder, &[], Some("id"), "_id");
        assert_eq!(ctx.field(&Expr::field("id"), Clause::Where).unwrap(), "_id");
        assert_eq!(ctx.field(&Expr::field("name"), Clause::Where).unwrap(), "name");
    }

    #[test]
    fn test_field_without_pk() {
        let encoder = DefaultEncoder::default();
        let ctx = CompileContext::new(&encoder, &[], None, "_id");
        assert_eq!(ctx.field(&Expr::field("id"), Clause::Where).unwrap(), "id");
    }

    #[test]
    fn test_non_field_is_invalid() {
        let encoder = DefaultEncoder::default();
        let ctx = CompileContext::new(&encoder, &[], None, "_id");
        let err = ctx.field(&Expr::literal(1), Clause::Order).unwrap_err();
        assert_eq!(err, QueryError::invalid(Clause::Order, &Expr::literal(1)));
    }

    #[test]
    fn test_value_failure_names_clause() {
        let encoder = DefaultEncoder::default();
        let ctx = CompileContext::new(&encoder, &[], None, "_id");
        let err = ctx.value(&Expr::Source, Clause::Select).unwrap_err();
        assert_eq!(err.clause_name(), "select clause");
    }

    #[test]
    fn test_param_range() {
        let encoder = DefaultEncoder::default();
        let params = vec![Value::NULL, Value::NULL, Value::from(10), Value::from(20)];
        let ctx = CompileContext::new(&encoder, &params, None, "_id");
        assert_eq!(
            ctx.param_range(2, 2, Clause::Where).unwrap(),
            vec![Value::from(10), Value::from(20)]
        );
        assert!(ctx.param_range(0, 0, Clause::Where).unwrap().is_empty());
    }

    #[test]
    fn test_param_range_overflow_is_invalid() {
        let encoder = DefaultEncoder::default();
        let ctx = CompileContext::new(&encoder, &[], None, "_id");
        let err = ctx.param_range(usize::MAX, 2, Clause::Where).unwrap_err();
        assert_eq!(err.clause_name(), "where clause");
    }

    #[test]
    fn test_payload_uses_configured_identity_key() {
        let encoder = DefaultEncoder::default();
        let params = vec![Value::from(2)];
        let ctx = CompileContext::new(&encoder, &params, Some("id"), "_key");
        let fields = vec![("id".to_string(), Expr::param(0))];
        assert_eq!(
            ctx.encode_payload(&fields, Clause::UpdateCommand).unwrap(),
            vec![("_key".to_string(), Value::from(2))]
        );

        let filter = vec![("id".to_string(), Value::from(1)), ("v".to_string(), Value::from(3))];
        assert_eq!(
            ctx.encode_pairs(&filter, Clause::Where).unwrap(),
            vec![("_key".to_string(), Value::from(1)), ("v".to_string(), Value::from(3))]
        );
    }
}
