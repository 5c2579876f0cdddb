use crate::{
    AsParam, Model, ModelDescriptor, Param, PartialMatch, Result, RowNames, SelectQuery,
    SqlWriter, StatementError, Value,
};
use std::{borrow::Cow, collections::HashSet, convert::Infallible, marker::PhantomData};

/// What executing a builder query produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Any number of rows.
    Set,
    /// Exactly one row.
    Single,
    /// A row count.
    Count,
}

/// Data computed while rendering a query and needed again to rebuild rows from the
/// output of `EXECUTE`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Labels of the selected columns as written in the model.
    pub columns: RowNames,
}

/// Query text with `%s` markers and one parameter for each marker.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub text: String,
    pub params: Vec<Param>,
}

/// Query produced by a query builder, rendered only when it gets prepared.
pub trait BuilderQuery: Send + Sync {
    fn render(&self, writer: &dyn SqlWriter) -> Result<RenderedQuery>;
    fn kind(&self) -> QueryKind;
    fn compiled(&self) -> CompiledQuery;
    fn model(&self) -> &'static ModelDescriptor;
    /// True when placeholders reach the rendered parameters untouched, instead of being
    /// coerced to the column type.
    fn supports_deferred_values(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "<>",
            CompareOp::Less => "<",
            CompareOp::LessEqual => "<=",
            CompareOp::Greater => ">",
            CompareOp::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column(pub Cow<'static, str>);

pub fn col(name: impl Into<Cow<'static, str>>) -> Column {
    Column(name.into())
}

impl Column {
    fn compare(self, op: CompareOp, value: impl AsParam) -> Condition {
        Condition::Compare {
            column: self,
            op,
            value: value.as_param(),
        }
    }
    pub fn eq(self, value: impl AsParam) -> Condition {
        self.compare(CompareOp::Equal, value)
    }
    pub fn ne(self, value: impl AsParam) -> Condition {
        self.compare(CompareOp::NotEqual, value)
    }
    pub fn lt(self, value: impl AsParam) -> Condition {
        self.compare(CompareOp::Less, value)
    }
    pub fn le(self, value: impl AsParam) -> Condition {
        self.compare(CompareOp::LessEqual, value)
    }
    pub fn gt(self, value: impl AsParam) -> Condition {
        self.compare(CompareOp::Greater, value)
    }
    pub fn ge(self, value: impl AsParam) -> Condition {
        self.compare(CompareOp::GreaterEqual, value)
    }
    /// Set membership, the value is a list (constant or `ListPlaceholder`).
    pub fn is_in(self, values: impl AsParam) -> Condition {
        Condition::In {
            column: self,
            values: values.as_param(),
        }
    }
    /// Case insensitive partial match.
    pub fn contains(self, value: impl AsParam) -> Condition {
        let pattern = match value.as_param() {
            Param::Placeholder(v) => Param::PartialMatch(PartialMatch::contains(&v)),
            Param::Constant(Value::Varchar(Some(v))) => {
                Param::Constant(Value::Varchar(Some(format!("%{v}%"))))
            }
            v => v,
        };
        Condition::Contains {
            column: self,
            pattern,
        }
    }
    pub fn is_null(self) -> Condition {
        Condition::IsNull(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: Column,
        op: CompareOp,
        value: Param,
    },
    In {
        column: Column,
        values: Param,
    },
    Contains {
        column: Column,
        pattern: Param,
    },
    IsNull(Column),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::And(conditions.into_iter().collect())
    }
    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Or(conditions.into_iter().collect())
    }
    pub fn not(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }
    pub(crate) fn columns<'a>(&'a self, out: &mut Vec<&'a Column>) {
        match self {
            Condition::Compare { column, .. }
            | Condition::In { column, .. }
            | Condition::Contains { column, .. }
            | Condition::IsNull(column) => out.push(column),
            Condition::And(v) | Condition::Or(v) => v.iter().for_each(|c| c.columns(out)),
            Condition::Not(v) => v.columns(out),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub column: Column,
    pub descending: bool,
}

/// Select query over the rows of `M` that can be prepared.
///
/// Values in conditions may be constants or placeholders. Operations that have no
/// meaning for a prepared select fail with `UnsupportedOperation`.
#[derive(Debug)]
pub struct QuerySet<M: Model> {
    pub conditions: Vec<Condition>,
    pub ordering: Vec<Ordering>,
    pub limit: Option<u32>,
    pub kind: QueryKind,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Clone for QuerySet<M> {
    fn clone(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            ordering: self.ordering.clone(),
            limit: self.limit,
            kind: self.kind,
            _model: PhantomData,
        }
    }
}

impl<M: Model> Default for QuerySet<M> {
    fn default() -> Self {
        Self {
            conditions: vec![],
            ordering: vec![],
            limit: None,
            kind: QueryKind::Set,
            _model: PhantomData,
        }
    }
}

fn unsupported(operation: &'static str) -> Result<Infallible> {
    Err(StatementError::UnsupportedOperation(operation).into())
}

impl<M: Model> QuerySet<M> {
    pub fn all() -> Self {
        Self::default()
    }
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
    pub fn order_by(mut self, column: impl Into<Cow<'static, str>>) -> Self {
        self.ordering.push(Ordering {
            column: col(column),
            descending: false,
        });
        self
    }
    pub fn order_by_desc(mut self, column: impl Into<Cow<'static, str>>) -> Self {
        self.ordering.push(Ordering {
            column: col(column),
            descending: true,
        });
        self
    }
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
    /// Exactly one row matching `condition`.
    pub fn get(self, condition: Condition) -> Self {
        let mut result = self.filter(condition);
        result.kind = QueryKind::Single;
        result
    }
    /// Row with the lowest primary key.
    pub fn first(self) -> Self {
        self.edge(false)
    }
    /// Row with the highest primary key.
    pub fn last(self) -> Self {
        self.edge(true)
    }
    fn edge(mut self, descending: bool) -> Self {
        let column = M::model().primary_key().map(|c| c.name).unwrap_or("id");
        self.ordering = vec![Ordering {
            column: col(column),
            descending,
        }];
        self.limit = Some(1);
        self.kind = QueryKind::Single;
        self
    }
    pub fn count(mut self) -> Self {
        self.kind = QueryKind::Count;
        self
    }

    pub fn aggregate(&self) -> Result<Infallible> {
        unsupported("aggregate")
    }
    pub fn in_bulk(&self) -> Result<Infallible> {
        unsupported("in_bulk")
    }
    pub fn create(&self) -> Result<Infallible> {
        unsupported("create")
    }
    pub fn bulk_create(&self) -> Result<Infallible> {
        unsupported("bulk_create")
    }
    pub fn bulk_update(&self) -> Result<Infallible> {
        unsupported("bulk_update")
    }
    pub fn get_or_create(&self) -> Result<Infallible> {
        unsupported("get_or_create")
    }
    pub fn update_or_create(&self) -> Result<Infallible> {
        unsupported("update_or_create")
    }
    pub fn delete(&self) -> Result<Infallible> {
        unsupported("delete")
    }
    pub fn update(&self) -> Result<Infallible> {
        unsupported("update")
    }
    pub fn exists(&self) -> Result<Infallible> {
        unsupported("exists")
    }
    pub fn explain(&self) -> Result<Infallible> {
        unsupported("explain")
    }
    /// Related rows must be fetched on the result of the execution instead.
    pub fn prefetch_related(&self) -> Result<Infallible> {
        unsupported("prefetch_related")
    }
    /// Project the executed rows instead.
    pub fn values_list(&self) -> Result<Infallible> {
        unsupported("values_list")
    }

    fn check_columns(&self) -> Result<()> {
        let model = M::model();
        let mut columns = vec![];
        self.conditions.iter().for_each(|c| c.columns(&mut columns));
        columns.extend(self.ordering.iter().map(|o| &o.column));
        if let Some(column) = columns.into_iter().find(|c| model.column(&c.0).is_none()) {
            return Err(StatementError::InvalidInput(format!(
                "Column `{}` does not exist in model {}",
                column.0, model.name
            ))
            .into());
        }
        Ok(())
    }
}

impl<M: Model> BuilderQuery for QuerySet<M> {
    fn render(&self, writer: &dyn SqlWriter) -> Result<RenderedQuery> {
        self.check_columns()?;
        let mut text = String::with_capacity(256);
        let mut params = vec![];
        writer.write_select(
            &mut text,
            &mut params,
            SelectQuery {
                model: M::model(),
                kind: self.kind,
                conditions: &self.conditions,
                ordering: &self.ordering,
                limit: self.limit,
            },
        );
        let mut names = HashSet::new();
        for name in params.iter().flat_map(Param::placeholder_names) {
            if !names.insert(name) {
                return Err(StatementError::DuplicatePlaceholderName(name.to_string()).into());
            }
        }
        Ok(RenderedQuery { text, params })
    }
    fn kind(&self) -> QueryKind {
        self.kind
    }
    fn compiled(&self) -> CompiledQuery {
        CompiledQuery {
            columns: match self.kind {
                QueryKind::Count => RowNames::from([]),
                _ => M::model().columns.iter().map(|c| c.name.to_string()).collect(),
            },
        }
    }
    fn model(&self) -> &'static ModelDescriptor {
        M::model()
    }
    fn supports_deferred_values(&self) -> bool {
        true
    }
}
