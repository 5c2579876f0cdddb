use crate::{
    Args, BuilderQuery, CompiledQuery, Executor, FailureBehaviour, ModelDescriptor, Param,
    QueryKind, Result, RowLabeled, SqlWriter, Statement, StatementError, StatementOutput, Value,
};
use regex::Regex;
use std::{borrow::Cow, collections::BTreeMap, sync::LazyLock};

static SET_MEMBERSHIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bIN\s*\(%s\)").expect("valid set membership regex"));

/// `column IN (%s)` becomes `column = ANY(%s)`, so that a single array argument binds
/// a whole list.
pub fn rewrite_set_membership(text: &str) -> Cow<'_, str> {
    SET_MEMBERSHIP.replace_all(text, "= ANY(%s)")
}

/// Prepared statement built from a query builder.
///
/// The builder parameters are kept: constants are sent again at every execution while
/// placeholders are filled from the named arguments.
#[derive(Debug)]
pub struct OrmStatement {
    statement: Statement,
    model: &'static ModelDescriptor,
    compiled: CompiledQuery,
    kind: QueryKind,
    params: Vec<Param>,
    params_required: bool,
}

impl OrmStatement {
    pub fn new(
        name: impl Into<String>,
        query: &dyn BuilderQuery,
        writer: &dyn SqlWriter,
    ) -> Result<Self> {
        let name = name.into();
        if !query.supports_deferred_values() {
            return Err(StatementError::InvalidInput(format!(
                "Statement {name} must be built from a query that accepts placeholders"
            ))
            .into());
        }
        let rendered = query.render(writer)?;
        let text = rewrite_set_membership(&rendered.text).into_owned();
        let params_required = rendered.params.iter().any(Param::is_deferred);
        Ok(Self {
            statement: Statement::new(name, text),
            model: query.model(),
            compiled: query.compiled(),
            kind: query.kind(),
            params: rendered.params,
            params_required,
        })
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }
    pub fn model(&self) -> &'static ModelDescriptor {
        self.model
    }
    pub fn compiled(&self) -> &CompiledQuery {
        &self.compiled
    }
    pub fn kind(&self) -> QueryKind {
        self.kind
    }
    pub fn params(&self) -> &[Param] {
        &self.params
    }
    /// True when at least one parameter is a placeholder.
    pub fn params_required(&self) -> bool {
        self.params_required
    }

    pub async fn prepare<E: Executor>(
        &mut self,
        executor: &mut E,
        on_failure: FailureBehaviour,
    ) -> Result<()> {
        self.statement.prepare(executor, on_failure).await
    }

    /// Final parameter values, placeholders replaced by the named arguments.
    pub fn bind(&self, args: Args) -> Result<Vec<Value>> {
        if !args.positional.is_empty() {
            return Err(StatementError::ExcessParameters {
                expected: 0,
                supplied: args.positional.len(),
            }
            .into());
        }
        if args.named.is_empty() {
            if self.params_required {
                return Err(StatementError::InsufficientParameters {
                    expected: self.params.iter().filter(|p| p.is_deferred()).count(),
                    supplied: 0,
                }
                .into());
            }
            return Ok(self
                .params
                .iter()
                .filter_map(|p| match p {
                    Param::Constant(v) => Some(v.clone()),
                    _ => None,
                })
                .collect());
        }
        let mut named: BTreeMap<String, Value> = args.named;
        let mut values = Vec::with_capacity(self.params.len());
        for param in &self.params {
            let value = match param {
                Param::Constant(v) => v.clone(),
                Param::Placeholder(p) => named
                    .remove(p.name())
                    .ok_or_else(|| StatementError::MissingParameter(p.name().to_string()))?,
                Param::List(p) => named
                    .remove(p.name())
                    .ok_or_else(|| StatementError::MissingParameter(p.name().to_string()))?,
                Param::PartialMatch(p) => p.resolve(&mut named)?,
            };
            values.push(value);
        }
        if !named.is_empty() {
            return Err(StatementError::UnknownParameters(named.into_keys().collect()).into());
        }
        Ok(values)
    }

    pub async fn execute<E: Executor>(
        &mut self,
        executor: &mut E,
        args: Args,
    ) -> Result<StatementOutput> {
        let values = self.bind(args)?;
        let rows = self.statement.run(executor, &values).await?;
        self.materialize(rows)
    }

    fn materialize(&self, rows: Vec<RowLabeled>) -> Result<StatementOutput> {
        if self.kind == QueryKind::Count {
            let Some(count) = rows
                .first()
                .and_then(|r| r.values().first())
                .and_then(Value::as_i64)
            else {
                return Err(StatementError::InvalidInput(format!(
                    "Statement {} did not return a row count",
                    self.statement.name()
                ))
                .into());
            };
            return Ok(StatementOutput::Count(count));
        }
        let mut rows: Vec<RowLabeled> = rows
            .into_iter()
            .map(|row| {
                if row.values.len() == self.compiled.columns.len() {
                    RowLabeled::new(self.compiled.columns.clone(), row.values)
                } else {
                    row
                }
            })
            .collect();
        if self.kind == QueryKind::Set {
            return Ok(StatementOutput::Rows(rows));
        }
        match rows.len() {
            0 => Err(StatementError::NotFound(self.model.name).into()),
            1 => Ok(StatementOutput::Single(rows.remove(0))),
            n => Err(StatementError::MultipleResults(self.model.name, n).into()),
        }
    }
}
