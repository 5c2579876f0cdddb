#![allow(dead_code)]

use prepkit_core::{
    AsValue, ColumnDef, Connection, Driver, Error, Executor, GenericSqlWriter, Model,
    ModelDescriptor, QueryResult, Result, RowLabeled, RowNames, RowsAffected, StatementError,
    Transaction, Value,
    stream::{self, Stream},
};
use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MockError {
    #[error("prepared statement \"{0}\" does not exist")]
    UnknownStatement(String),
    #[error("{0}")]
    Failure(String),
}

#[derive(Default, Debug, Clone, Copy)]
pub struct MockDriver;

impl Driver for MockDriver {
    type Connection = MockConnection;
    type SqlWriter = GenericSqlWriter;
    type Transaction<'c> = MockTransaction<'c>;

    const NAME: &'static str = "mock";

    fn sql_writer(&self) -> GenericSqlWriter {
        GenericSqlWriter::new()
    }

    fn is_stale_statement(&self, error: &Error) -> bool {
        error.chain().any(|e| {
            matches!(
                e.downcast_ref::<MockError>(),
                Some(MockError::UnknownStatement(..))
            )
        })
    }
}

/// Session with an in memory prepared statements catalog.
#[derive(Default, Debug)]
pub struct MockConnection {
    /// Statements prepared in the current session: backend name -> body.
    pub prepared: HashMap<String, String>,
    /// Rows returned by `EXECUTE` of a statement.
    pub results: HashMap<String, Vec<RowLabeled>>,
    /// `PREPARE` of these statements fails.
    pub failing_prepares: HashSet<String>,
    /// `PREPARE` of these statements succeeds without preparing anything.
    pub phantom_prepares: HashSet<String>,
    /// `EXECUTE` of these statements fails even when prepared.
    pub failing_executes: HashSet<String>,
    /// `EXECUTE` of these statements reports an unknown statement even when prepared.
    pub stale_executes: HashSet<String>,
    /// `DEALLOCATE` of these statements fails.
    pub failing_deallocates: HashSet<String>,
    /// Every query received.
    pub log: Vec<String>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// The connection now talks to a brand new session.
    pub fn swap_session(&mut self) {
        self.prepared.clear();
    }

    pub fn queries_starting_with(&self, prefix: &str) -> Vec<&str> {
        self.log
            .iter()
            .filter(|q| q.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    fn answer(&mut self, query: &str) -> Result<Vec<QueryResult>> {
        self.log.push(query.to_string());
        let statement_name = |rest: &str| {
            rest.split(['(', ';', ' '])
                .next()
                .unwrap_or_default()
                .to_string()
        };
        if let Some(rest) = query.strip_prefix("PREPARE ") {
            let name = statement_name(rest);
            let body = rest.split_once(" AS ").map(|v| v.1).unwrap_or_default();
            if self.prepared.contains_key(&name) {
                return Err(MockError::Failure(format!(
                    "prepared statement \"{name}\" already exists"
                ))
                .into());
            }
            if self.failing_prepares.contains(&name) {
                return Err(MockError::Failure(format!("cannot prepare \"{name}\"")).into());
            }
            if !self.phantom_prepares.contains(&name) {
                self.prepared.insert(name, body.to_string());
            }
            return Ok(vec![RowsAffected::default().into()]);
        }
        if let Some(rest) = query.strip_prefix("EXECUTE ") {
            let name = statement_name(rest);
            if !self.prepared.contains_key(&name) || self.stale_executes.contains(&name) {
                return Err(MockError::UnknownStatement(name).into());
            }
            if self.failing_executes.contains(&name) {
                return Err(MockError::Failure(format!("division by zero in \"{name}\"")).into());
            }
            return Ok(self
                .results
                .get(&name)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect());
        }
        if let Some(rest) = query.strip_prefix("DEALLOCATE ") {
            let name = statement_name(rest);
            if self.failing_deallocates.contains(&name) || self.prepared.remove(&name).is_none()
            {
                return Err(MockError::Failure(format!("cannot deallocate \"{name}\"")).into());
            }
            return Ok(vec![RowsAffected::default().into()]);
        }
        if let Some(rest) =
            query.strip_prefix("SELECT COUNT(*) FROM pg_prepared_statements WHERE name = '")
        {
            let name = rest.trim_end_matches("';");
            let count = self.prepared.contains_key(name) as i64;
            return Ok(vec![
                RowLabeled::new(
                    RowNames::from(["count".to_string()]),
                    Box::new([Value::Int64(Some(count))]),
                )
                .into(),
            ]);
        }
        Err(MockError::Failure(format!("unsupported query: {query}")).into())
    }
}

impl Executor for MockConnection {
    type Driver = MockDriver;

    fn driver(&self) -> &Self::Driver {
        &MockDriver
    }

    fn run(&mut self, query: String) -> impl Stream<Item = Result<QueryResult>> + Send {
        let items: Vec<Result<QueryResult>> = match self.answer(&query) {
            Ok(v) => v.into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        };
        stream::iter(items)
    }
}

impl Connection for MockConnection {
    #[allow(refining_impl_trait)]
    async fn connect(_url: Cow<'static, str>) -> Result<MockConnection> {
        Ok(MockConnection::new())
    }

    #[allow(refining_impl_trait)]
    fn begin(&mut self) -> impl Future<Output = Result<MockTransaction<'_>>> {
        async { Ok(MockTransaction(self)) }
    }
}

pub struct MockTransaction<'c>(pub &'c mut MockConnection);

impl<'c> Executor for MockTransaction<'c> {
    type Driver = MockDriver;

    fn driver(&self) -> &Self::Driver {
        &MockDriver
    }

    fn run(&mut self, query: String) -> impl Stream<Item = Result<QueryResult>> + Send {
        self.0.run(query)
    }
}

impl<'c> Transaction<'c> for MockTransaction<'c> {
    async fn commit(self) -> Result<()> {
        Ok(())
    }
    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

pub fn row(labels: &[&str], values: Vec<Value>) -> RowLabeled {
    RowLabeled::new(
        labels.iter().map(ToString::to_string).collect(),
        values.into_boxed_slice(),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub id: i32,
    pub name: String,
    pub lifespan: Option<i32>,
}

impl Model for Species {
    fn model() -> &'static ModelDescriptor {
        static MODEL: ModelDescriptor = ModelDescriptor {
            name: "Species",
            schema: "zoo",
            table: "species",
            columns: &[
                ColumnDef {
                    name: "id",
                    field: "id",
                    primary_key: true,
                },
                ColumnDef {
                    name: "name",
                    field: "name",
                    primary_key: false,
                },
                ColumnDef {
                    name: "lifespan",
                    field: "lifespan",
                    primary_key: false,
                },
            ],
        };
        &MODEL
    }

    fn from_row(row: RowLabeled) -> Result<Self> {
        let column = |name: &str| {
            row.get_column(name).cloned().ok_or_else(|| {
                Error::from(StatementError::InvalidInput(format!("Missing column {name}")))
            })
        };
        Ok(Self {
            id: i32::try_from_value(column("id")?)?,
            name: String::try_from_value(column("name")?)?,
            lifespan: Option::<i32>::try_from_value(column("lifespan")?)?,
        })
    }
}

pub fn species_row(id: i32, name: &str, lifespan: Option<i32>) -> RowLabeled {
    row(
        &["id", "name", "lifespan"],
        vec![
            Value::Int32(Some(id)),
            Value::Varchar(Some(name.into())),
            Value::Int32(lifespan),
        ],
    )
}
