use crate::{
    PostgresConnection, PostgresDriver,
    util::{query_error, stream_query},
};
use async_stream::try_stream;
use prepkit_core::{
    Error, Executor, QueryResult, Result, Transaction,
    future::TryFutureExt,
    stream::{Stream, StreamExt, TryStreamExt},
    truncate_long,
};
use std::pin::pin;

/// Transaction of a [`PostgresConnection`]. Each query run on it is wrapped in a
/// savepoint: a failing query leaves the transaction usable.
pub struct PostgresTransaction<'c>(pub(crate) tokio_postgres::Transaction<'c>);

impl<'c> PostgresTransaction<'c> {
    pub async fn new(connection: &'c mut PostgresConnection) -> Result<Self> {
        Ok(Self(connection.client.transaction().await?))
    }
}

impl<'c> Executor for PostgresTransaction<'c> {
    type Driver = PostgresDriver;

    fn driver(&self) -> &Self::Driver {
        &PostgresDriver {}
    }

    fn run(&mut self, query: String) -> impl Stream<Item = Result<QueryResult>> + Send {
        let context = format!("While running the query:\n{}", truncate_long!(query));
        try_stream! {
            let savepoint = self.0.transaction().await?;
            {
                let mut stream = pin!(stream_query(&savepoint, query));
                while let Some(value) = stream.next().await.transpose()? {
                    yield value;
                }
            }
            savepoint.commit().await?;
        }
        .map_err(move |e: Error| query_error(e, &context))
    }
}

impl<'c> Transaction<'c> for PostgresTransaction<'c> {
    fn commit(self) -> impl Future<Output = Result<()>> {
        self.0.commit().map_err(Into::into)
    }
    fn rollback(self) -> impl Future<Output = Result<()>> {
        self.0.rollback().map_err(Into::into)
    }
}
