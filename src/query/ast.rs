//! Query AST consumed by the compiler
//!
//! Produced upstream by the query planner; the compiler never builds or
//! mutates these, it only reads them. Builders exist for callers and tests.

use serde::{Deserialize, Serialize};

use crate::document::Value;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Membership: field in list
    In,
}

impl CompareOp {
    /// Operator name for explain output
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::In => "in",
        }
    }
}

/// Cast applied by a tagged value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cast {
    /// 24-char hex string → object id
    ObjectId,
    /// UUID string → binary subtype 4
    Uuid,
    /// String → generic binary
    Binary,
    /// RFC 3339 string or epoch millis → date
    DateTime,
    /// Integer → float
    Float,
}

impl Cast {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cast::ObjectId => "object_id",
            Cast::Uuid => "uuid",
            Cast::Binary => "binary",
            Cast::DateTime => "datetime",
            Cast::Float => "float",
        }
    }
}

impl std::fmt::Display for Cast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Field of the source record
    Field(String),
    /// The whole source record
    Source,
    /// Literal value
    Literal(Value),
    /// Bound parameter by position
    Param(usize),
    /// Contiguous run of bound parameters, `params[start..start + len]`
    ParamRange { start: usize, len: usize },
    /// Value with an explicit cast
    Tagged { value: Box<Expr>, cast: Cast },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Null test
    IsNil(Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn field(name: impl Into<String>) -> Self {
        Expr::Field(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn param(index: usize) -> Self {
        Expr::Param(index)
    }

    pub fn param_range(start: usize, len: usize) -> Self {
        Expr::ParamRange { start, len }
    }

    pub fn tagged(value: Expr, cast: Cast) -> Self {
        Expr::Tagged {
            value: Box::new(value),
            cast,
        }
    }

    pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Self {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Equality: left == right
    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::Eq, left, right)
    }

    pub fn ne(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::Ne, left, right)
    }

    pub fn gt(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::Gt, left, right)
    }

    pub fn gte(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::Gte, left, right)
    }

    pub fn lt(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::Lt, left, right)
    }

    pub fn lte(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::Lte, left, right)
    }

    /// Membership: left in right
    pub fn is_in(left: Expr, right: Expr) -> Self {
        Self::compare(CompareOp::In, left, right)
    }

    pub fn is_nil(expr: Expr) -> Self {
        Expr::IsNil(Box::new(expr))
    }

    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    pub fn and(args: Vec<Expr>) -> Self {
        Expr::And(args)
    }

    pub fn or(args: Vec<Expr>) -> Self {
        Expr::Or(args)
    }

    /// True for nodes that compile to a filter pair rather than a value
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Expr::And(_) | Expr::Or(_) | Expr::Compare { .. } | Expr::IsNil(_) | Expr::Not(_)
        )
    }
    /// One past the highest parameter index this node reads; 0 if none.
    ///
    /// Saturates, so a range running past `usize::MAX` is never in bounds.
    pub fn param_bound(&self) -> usize {
        match self {
            Expr::Param(index) => index.saturating_add(1),
            Expr::ParamRange { len: 0, .. } => 0,
            Expr::ParamRange { start, len } => start.saturating_add(*len),
            Expr::Tagged { value, .. } => value.param_bound(),
            Expr::And(args) | Expr::Or(args) => max_bound(args),
            Expr::Compare { left, right, .. } => left.param_bound().max(right.param_bound()),
            Expr::IsNil(inner) | Expr::Not(inner) => inner.param_bound(),
            Expr::Field(_) | Expr::Source | Expr::Literal(_) => 0,
        }
    }
}

fn max_bound<'a>(exprs: impl IntoIterator<Item = &'a Expr>) -> usize {
    exprs.into_iter().map(Expr::param_bound).max().unwrap_or(0)
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// One order-by item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub direction: Direction,
    pub expr: Expr,
}

impl OrderBy {
    pub fn asc(expr: Expr) -> Self {
        Self {
            direction: Direction::Asc,
            expr,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            direction: Direction::Desc,
            expr,
        }
    }
}

/// Update operators for bulk update payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOp {
    Set,
    Inc,
    Push,
    Pull,
}

/// One group of updates sharing an operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateExpr {
    pub op: UpdateOp,
    pub fields: Vec<(String, Expr)>,
}

/// A join clause; only its presence matters here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub coll: String,
    pub on: Expr,
}

/// Query source: collection plus optional model identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub coll: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// Normalized query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAst {
    pub from: Source,
    /// Where clauses, implicitly conjoined
    #[serde(default)]
    pub wheres: Vec<Expr>,
    /// Order-by clauses, flattened in order
    #[serde(default)]
    pub order_bys: Vec<Vec<OrderBy>>,
    #[serde(default)]
    pub select: Option<Vec<Expr>>,
    #[serde(default)]
    pub limit: Option<Expr>,
    #[serde(default)]
    pub offset: Option<Expr>,
    #[serde(default)]
    pub updates: Vec<UpdateExpr>,
    #[serde(default)]
    pub distinct: Option<Expr>,
    #[serde(default)]
    pub lock: Option<String>,
    #[serde(default)]
    pub joins: Vec<Join>,
    #[serde(default)]
    pub group_bys: Vec<Expr>,
    #[serde(default)]
    pub havings: Vec<Expr>,
}

impl QueryAst {
    /// Creates an unconstrained query over `coll`
    pub fn new(coll: impl Into<String>) -> Self {
        Self {
            from: Source {
                coll: coll.into(),
                model: None,
            },
            wheres: Vec::new(),
            order_bys: Vec::new(),
            select: None,
            limit: None,
            offset: None,
            updates: Vec::new(),
            distinct: None,
            lock: None,
            joins: Vec::new(),
            group_bys: Vec::new(),
            havings: Vec::new(),
        }
    }

    /// Number of params this query needs to compile without panicking
    pub fn param_bound(&self) -> usize {
        let order = self.order_bys.iter().flatten().map(|item| &item.expr);
        let select = self.select.iter().flatten();
        let updates = self.updates.iter().flat_map(|update| update.fields.iter().map(|(_, expr)| expr));
        let joins = self.joins.iter().map(|join| &join.on);

        max_bound(
            self.wheres
                .iter()
                .chain(order)
                .chain(select)
                .chain(self.limit.iter())
                .chain(self.offset.iter())
                .chain(updates)
                .chain(self.distinct.iter())
                .chain(joins)
                .chain(self.group_bys.iter())
                .chain(self.havings.iter()),
        )
    }

    /// Sets the model identity used for primary key lookup
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.from.model = Some(model.into());
        self
    }

    /// Adds a where clause
    pub fn filter(mut self, expr: Expr) -> Self {
        self.wheres.push(expr);
        self
    }

    /// Adds an order-by clause
    pub fn order_by(mut self, items: Vec<OrderBy>) -> Self {
        self.order_bys.push(items);
        self
    }

    pub fn select(mut self, items: Vec<Expr>) -> Self {
        self.select = Some(items);
        self
    }

    pub fn limit(mut self, expr: Expr) -> Self {
        self.limit = Some(expr);
        self
    }

    pub fn offset(mut self, expr: Expr) -> Self {
        self.offset = Some(expr);
        self
    }

    /// Adds an update group
    pub fn update(mut self, op: UpdateOp, fields: Vec<(String, Expr)>) -> Self {
        self.updates.push(UpdateExpr { op, fields });
        self
    }

    pub fn distinct(mut self, expr: Expr) -> Self {
        self.distinct = Some(expr);
        self
    }

    pub fn lock(mut self, lock: impl Into<String>) -> Self {
        self.lock = Some(lock.into());
        self
    }

    pub fn join(mut self, coll: impl Into<String>, on: Expr) -> Self {
        self.joins.push(Join {
            coll: coll.into(),
            on,
        });
        self
    }

    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_bys.push(expr);
        self
    }

    pub fn having(mut self, expr: Expr) -> Self {
        self.havings.push(expr);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = QueryAst::new("users")
            .with_model("User")
            .filter(Expr::gt(Expr::field("age"), Expr::literal(18)))
            .order_by(vec![OrderBy::desc(Expr::field("name"))])
            .limit(Expr::literal(10));

        assert_eq!(query.from.coll, "users");
        assert_eq!(query.from.model.as_deref(), Some("User"));
        assert_eq!(query.wheres.len(), 1);
        assert_eq!(query.order_bys[0][0].direction, Direction::Desc);
        assert!(query.select.is_none());
        assert!(query.distinct.is_none());
    }

    #[test]
    fn test_is_operator() {
        assert!(Expr::is_nil(Expr::field("a")).is_operator());
        assert!(Expr::not(Expr::field("a")).is_operator());
        assert!(Expr::and(vec![]).is_operator());
        assert!(!Expr::param(0).is_operator());
        assert!(!Expr::literal(true).is_operator());
        assert!(!Expr::field("a").is_operator());
    }

    #[test]
    fn test_param_bound() {
        assert_eq!(Expr::field("a").param_bound(), 0);
        assert_eq!(Expr::param(2).param_bound(), 3);
        assert_eq!(Expr::param_range(4, 0).param_bound(), 0);
        assert_eq!(Expr::param_range(usize::MAX, 2).param_bound(), usize::MAX);
        assert_eq!(
            Expr::not(Expr::is_in(Expr::field("id"), Expr::param_range(1, 3))).param_bound(),
            4
        );

        let query = QueryAst::new("users")
            .filter(Expr::eq(Expr::field("a"), Expr::param(0)))
            .update(UpdateOp::Set, vec![("b".into(), Expr::tagged(Expr::param(5), Cast::Float))])
            .limit(Expr::param(1));
        assert_eq!(query.param_bound(), 6);
        assert_eq!(QueryAst::new("users").param_bound(), 0);
    }

    #[test]
    fn test_query_from_json() {
        let json = r#"{
            "from": {"coll": "users", "model": "User"},
            "wheres": [{"compare": {"op": "eq", "left": {"field": "name"}, "right": {"param": 0}}}],
            "limit": {"literal": 5}
        }"#;
        let query: QueryAst = serde_json::from_str(json).unwrap();
        assert_eq!(
            query.wheres[0],
            Expr::eq(Expr::field("name"), Expr::param(0))
        );
        assert_eq!(query.limit, Some(Expr::literal(5)));
        assert!(query.joins.is_empty());
    }
}
