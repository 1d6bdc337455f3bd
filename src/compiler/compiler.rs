//! Read/write query assemblers
//!
//! Entry points of the compiler. Each run validates the query, resolves
//! the primary key through the schema registry, runs the stage compilers
//! over the same AST and parameters, and returns an immutable descriptor.
//!
//! Compilation is pure: same inputs → same descriptor.

use super::command;
use super::descriptors::{CountQuery, ReadQuery, WriteQuery};
use super::encoder::Encoder;
use super::errors::{Clause, QueryResult};
use super::expr;
use super::options::{self, WriteOptions};
use super::order;
use super::projection;
use super::schema::SchemaRegistry;
use super::validator::QueryValidator;
use super::values::CompileContext;
use crate::config::CompilerConfig;
use crate::document::{Document, Value};
use crate::observability::{Logger, Severity};
use crate::query::QueryAst;

/// Compiles query ASTs into document-store descriptors
pub struct QueryCompiler<'a, S: SchemaRegistry, E: Encoder> {
    schema_registry: &'a S,
    encoder: &'a E,
    config: &'a CompilerConfig,
}

impl<'a, S: SchemaRegistry, E: Encoder> QueryCompiler<'a, S, E> {
    /// Creates a new compiler
    pub fn new(schema_registry: &'a S, encoder: &'a E, config: &'a CompilerConfig) -> Self {
        Self {
            schema_registry,
            encoder,
            config,
        }
    }

    /// Compiles a find.
    ///
    /// # Panics
    ///
    /// Panics if the AST references a parameter index outside `params`.
    pub fn all(&self, query: &QueryAst, params: &[Value]) -> QueryResult<ReadQuery> {
        let result = self.compile_all(query, params);
        self.observe("all", &query.from.coll, &result);
        result
    }

    /// Compiles a filtered count with skip/limit
    pub fn count(&self, query: &QueryAst, params: &[Value]) -> QueryResult<CountQuery> {
        let result = self.compile_count(query, params);
        self.observe("count", &query.from.coll, &result);
        result
    }

    /// Compiles a bulk update over every matching document
    pub fn update_all(&self, query: &QueryAst, params: &[Value]) -> QueryResult<WriteQuery> {
        let result = self.compile_update_all(query, params);
        self.observe("update_all", &query.from.coll, &result);
        result
    }

    /// Compiles a bulk delete over every matching document
    pub fn delete_all(&self, query: &QueryAst, params: &[Value]) -> QueryResult<WriteQuery> {
        let result = self.compile_delete_all(query, params);
        self.observe("delete_all", &query.from.coll, &result);
        result
    }

    /// Compiles a single-record update from a pre-built filter
    pub fn update(
        &self,
        coll: &str,
        values: &[(String, Value)],
        filter: &[(String, Value)],
        pk: Option<&str>,
    ) -> QueryResult<WriteQuery> {
        let ctx = self.context(&[], pk);
        let result = Self::record_filter(&ctx, filter).and_then(|query| {
            Ok(WriteQuery {
                coll: coll.to_string(),
                query,
                command: Some(command::update(&ctx, values)?),
                opts: WriteOptions::single(),
            })
        });
        self.observe("update", coll, &result);
        result
    }

    /// Compiles a single-record delete from a pre-built filter
    pub fn delete(
        &self,
        coll: &str,
        filter: &[(String, Value)],
        pk: Option<&str>,
    ) -> QueryResult<WriteQuery> {
        let ctx = self.context(&[], pk);
        let result = Self::record_filter(&ctx, filter).map(|query| WriteQuery {
            coll: coll.to_string(),
            query,
            command: None,
            opts: WriteOptions::single(),
        });
        self.observe("delete", coll, &result);
        result
    }

    /// Compiles an insert
    pub fn insert(
        &self,
        coll: &str,
        document: &[(String, Value)],
        pk: Option<&str>,
    ) -> QueryResult<WriteQuery> {
        let ctx = self.context(&[], pk);
        let result = command::insert(&ctx, document).map(|command| WriteQuery {
            coll: coll.to_string(),
            query: Document::Empty,
            command: Some(command),
            opts: WriteOptions::single(),
        });
        self.observe("insert", coll, &result);
        result
    }

    fn compile_all(&self, query: &QueryAst, params: &[Value]) -> QueryResult<ReadQuery> {
        QueryValidator::validate(query)?;
        let pk = self.primary_key(query);
        let ctx = self.context(params, pk);

        let filter = expr::compile_filter(&ctx, &query.wheres, Clause::Where)?;
        let order = order::compile(&ctx, &query.order_bys)?;
        let projection = projection::compile(&ctx, query.select.as_deref(), &query.from)?;
        let opts = options::read_options(&ctx, query.limit.as_ref(), query.offset.as_ref())?;

        Ok(ReadQuery {
            coll: query.from.coll.clone(),
            pk: pk.map(str::to_owned),
            params: params.to_vec(),
            query: order::with_filter(filter, order),
            projection: projection.document,
            fields: projection.fields,
            opts,
        })
    }

    fn compile_count(&self, query: &QueryAst, params: &[Value]) -> QueryResult<CountQuery> {
        QueryValidator::validate(query)?;
        let pk = self.primary_key(query);
        let ctx = self.context(params, pk);

        Ok(CountQuery {
            coll: query.from.coll.clone(),
            pk: pk.map(str::to_owned),
            query: expr::compile_filter(&ctx, &query.wheres, Clause::Where)?,
            opts: options::read_options(&ctx, query.limit.as_ref(), query.offset.as_ref())?,
        })
    }

    fn compile_update_all(&self, query: &QueryAst, params: &[Value]) -> QueryResult<WriteQuery> {
        QueryValidator::validate(query)?;
        let ctx = self.context(params, self.primary_key(query));

        Ok(WriteQuery {
            coll: query.from.coll.clone(),
            query: expr::compile_filter(&ctx, &query.wheres, Clause::Where)?,
            command: Some(command::update_all(&ctx, &query.updates)?),
            opts: WriteOptions::multi(),
        })
    }

    fn compile_delete_all(&self, query: &QueryAst, params: &[Value]) -> QueryResult<WriteQuery> {
        QueryValidator::validate(query)?;
        let ctx = self.context(params, self.primary_key(query));

        Ok(WriteQuery {
            coll: query.from.coll.clone(),
            query: expr::compile_filter(&ctx, &query.wheres, Clause::Where)?,
            command: None,
            opts: WriteOptions::multi(),
        })
    }

    fn record_filter(ctx: &CompileContext<'_>, filter: &[(String, Value)]) -> QueryResult<Document> {
        ctx.encode_pairs(filter, Clause::Where).map(Document::from_pairs)
    }

    fn primary_key(&self, query: &QueryAst) -> Option<&'a str> {
        query
            .from
            .model
            .as_deref()
            .and_then(|model| self.schema_registry.primary_key(model))
    }

    /// Every stage renames the primary key to the configured identity key
    fn context<'q>(&'q self, params: &'q [Value], pk: Option<&'q str>) -> CompileContext<'q> {
        CompileContext::new(self.encoder, params, pk, &self.config.identity_key)
    }

    fn observe<T>(&self, kind: &str, coll: &str, result: &QueryResult<T>) {
        let threshold = self.config.log_level;
        match result {
            Ok(_) => Logger::log_at(
                threshold,
                Severity::Trace,
                "QUERY_COMPILED",
                &[("kind", kind), ("collection", coll)],
            ),
            Err(err) => {
                let message = err.to_string();
                Logger::log_at(
                    threshold,
                    Severity::Warn,
                    "QUERY_REJECTED",
                    &[
                        ("kind", kind),
                        ("collection", coll),
                        ("code", err.code().code()),
                        ("message", message.as_str()),
                    ],
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::encoder::DefaultEncoder;
    use crate::compiler::errors::{ClauseKind, QueryError};
    use crate::compiler::schema::StaticSchemaRegistry;
    use crate::doc;
    use crate::query::{Expr, OrderBy};

    struct Fixture {
        registry: StaticSchemaRegistry,
        encoder: DefaultEncoder,
        config: CompilerConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: StaticSchemaRegistry::new().with_primary_key("User", "id"),
                encoder: DefaultEncoder::default(),
                config: CompilerConfig::default(),
            }
        }

        fn compiler(&self) -> QueryCompiler<'_, StaticSchemaRegistry, DefaultEncoder> {
            QueryCompiler::new(&self.registry, &self.encoder, &self.config)
        }
    }

    #[test]
    fn test_all_assembles_every_stage() {
        let fixture = Fixture::new();
        let query = QueryAst::new("users")
            .with_model("User")
            .filter(Expr::eq(Expr::field("id"), Expr::param(0)))
            .order_by(vec![OrderBy::desc(Expr::field("name"))])
            .select(vec![Expr::field("id"), Expr::field("name")])
            .limit(Expr::literal(10))
            .offset(Expr::literal(20));
        let params = vec![Value::from(7)];

        let read = fixture.compiler().all(&query, &params).unwrap();
        assert_eq!(read.coll, "users");
        assert_eq!(read.pk.as_deref(), Some("id"));
        assert_eq!(read.params, params);
        assert_eq!(
            read.query.to_json(),
            r#"{"$query":{"_id":7},"$orderby":{"name":-1}}"#
        );
        assert_eq!(read.projection, doc! { "_id" => true, "name" => true });
        assert_eq!(read.fields.len(), 2);
        assert_eq!(read.opts.num_return, 10);
        assert_eq!(read.opts.num_skip, 20);
    }

    #[test]
    fn test_unknown_model_has_no_pk() {
        let fixture = Fixture::new();
        let query = QueryAst::new("posts")
            .with_model("Post")
            .filter(Expr::eq(Expr::field("id"), Expr::literal(1)));
        let read = fixture.compiler().all(&query, &[]).unwrap();
        assert_eq!(read.pk, None);
        assert_eq!(read.query, doc! { "id" => 1 });
    }

    #[test]
    fn test_validation_runs_first() {
        let fixture = Fixture::new();
        let query = QueryAst::new("users")
            .filter(Expr::field("broken"))
            .group_by(Expr::field("a"));
        let err = fixture.compiler().all(&query, &[]).unwrap_err();
        assert_eq!(err, QueryError::unsupported(ClauseKind::GroupBy));
    }

    #[test]
    fn test_update_all_and_delete_all() {
        let fixture = Fixture::new();
        let query = QueryAst::new("users")
            .with_model("User")
            .filter(Expr::gt(Expr::field("age"), Expr::literal(18)))
            .filter(Expr::lt(Expr::field("age"), Expr::literal(65)))
            .update(crate::query::UpdateOp::Set, vec![("flag".into(), Expr::param(0))]);
        let params = vec![Value::from(true)];

        let update = fixture.compiler().update_all(&query, &params).unwrap();
        assert_eq!(update.query.to_json(), r#"{"age":{"$gt":18},"age":{"$lt":65}}"#);
        assert_eq!(update.command.unwrap().to_json(), r#"{"$set":{"flag":true}}"#);
        assert!(update.opts.multi);

        let delete = fixture.compiler().delete_all(&query, &params).unwrap();
        assert_eq!(delete.query, update.query);
        assert!(delete.command.is_none());
        assert!(delete.opts.multi);
    }

    #[test]
    fn test_single_record_writes() {
        let fixture = Fixture::new();
        let compiler = fixture.compiler();
        let filter = doc! { "id" => 3 };

        let update = compiler
            .update("users", doc! { "name" => "z" }.pairs(), filter.pairs(), Some("id"))
            .unwrap();
        assert_eq!(update.query, doc! { "_id" => 3 });
        assert_eq!(update.command.unwrap().to_json(), r#"{"$set":{"name":"z"}}"#);
        assert!(!update.opts.multi);

        let delete = compiler.delete("users", filter.pairs(), Some("id")).unwrap();
        assert_eq!(delete.query, doc! { "_id" => 3 });
        assert!(delete.command.is_none());

        let insert = compiler
            .insert("users", doc! { "id" => 3, "name" => "z" }.pairs(), Some("id"))
            .unwrap();
        assert_eq!(insert.query, Document::Empty);
        assert_eq!(insert.command, Some(doc! { "_id" => 3, "name" => "z" }));
    }

    #[test]
    fn test_count() {
        let fixture = Fixture::new();
        let query = QueryAst::new("users")
            .filter(Expr::is_nil(Expr::field("deleted_at")))
            .order_by(vec![OrderBy::asc(Expr::field("name"))])
            .limit(Expr::literal(5));
        let count = fixture.compiler().count(&query, &[]).unwrap();
        assert_eq!(count.query, doc! { "deleted_at" => Value::NULL });
        assert_eq!(count.opts.num_return, 5);
    }

    #[test]
    fn test_configured_identity_key() {
        let mut fixture = Fixture::new();
        fixture.config = CompilerConfig::default().with_identity_key("_key");
        let query = QueryAst::new("users")
            .with_model("User")
            .filter(Expr::eq(Expr::field("id"), Expr::literal(1)));
        let read = fixture.compiler().all(&query, &[]).unwrap();
        assert_eq!(read.query, doc! { "_key" => 1 });
    }

    #[test]
    fn test_identity_key_applies_to_every_write() {
        let mut fixture = Fixture::new();
        fixture.config = CompilerConfig::default().with_identity_key("_key");
        let compiler = fixture.compiler();

        let query = QueryAst::new("users")
            .with_model("User")
            .filter(Expr::eq(Expr::field("id"), Expr::literal(1)))
            .update(crate::query::UpdateOp::Set, vec![("id".into(), Expr::literal(2))]);
        let bulk = compiler.update_all(&query, &[]).unwrap();
        assert_eq!(bulk.query.to_json(), r#"{"_key":1}"#);
        assert_eq!(bulk.command.unwrap().to_json(), r#"{"$set":{"_key":2}}"#);

        let filter = doc! { "id" => 1 };
        let update = compiler
            .update("users", doc! { "id" => 2 }.pairs(), filter.pairs(), Some("id"))
            .unwrap();
        assert_eq!(update.query.to_json(), r#"{"_key":1}"#);
        assert_eq!(update.command.unwrap().to_json(), r#"{"$set":{"_key":2}}"#);

        let delete = compiler.delete("users", filter.pairs(), Some("id")).unwrap();
        assert_eq!(delete.query.to_json(), r#"{"_key":1}"#);

        let insert = compiler.insert("users", filter.pairs(), Some("id")).unwrap();
        assert_eq!(insert.command.unwrap().to_json(), r#"{"_key":1}"#);
    }

    #[test]
    fn test_empty_update_all_is_empty_set() {
        let fixture = Fixture::new();
        let query = QueryAst::new("users").filter(Expr::eq(Expr::field("a"), Expr::literal(1)));
        let write = fixture.compiler().update_all(&query, &[]).unwrap();
        assert_eq!(write.command.unwrap().to_json(), r#"{"$set":{}}"#);
    }
}
