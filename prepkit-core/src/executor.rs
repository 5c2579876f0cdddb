use crate::{
    Driver, ExecuteOutcome, QueryResult, Result, RowLabeled, RowsAffected,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::future::Future;

/// Something that can send SQL to the database: a connection or a transaction.
///
/// Every call to `run` executes in a transaction scope of its own (a transaction when
/// called on a connection, a savepoint when called on a transaction). A failing query
/// rolls back only that scope and leaves any enclosing transaction usable.
pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// General method to send any query and return any result type (either row or count)
    fn run(&mut self, query: String) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Execute the query and returns the rows.
    fn fetch(&mut self, query: String) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(query).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the query and collect all the rows.
    fn fetch_all(
        &mut self,
        query: String,
    ) -> impl Future<Output = Result<Vec<RowLabeled>>> + Send {
        self.fetch(query).try_collect()
    }

    /// Execute the query and return the total number of rows affected.
    fn execute(&mut self, query: String) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(query)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }

    /// Run an `EXECUTE` and classify its failure, telling apart the statement missing
    /// from the session from every other error.
    fn execute_prepared(&mut self, query: String) -> impl Future<Output = ExecuteOutcome> + Send {
        async move {
            match self.fetch_all(query).await {
                Ok(rows) => ExecuteOutcome::Rows(rows),
                Err(e) if self.driver().is_stale_statement(&e) => ExecuteOutcome::Stale(e),
                Err(e) => ExecuteOutcome::Failed(e),
            }
        }
    }
}
